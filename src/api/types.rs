//! Shared request context handed to every handler.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::ingest::RedditClient;
use crate::llm::GrokClient;
use crate::pipeline::orchestrator::PipelineModels;

#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub llm: Arc<GrokClient>,
    pub reddit: Arc<RedditClient>,
    /// Plain HTTP client for downloading candidate images.
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
}

impl ApiContext {
    pub fn new(config: AppConfig, conn: Connection) -> Self {
        let llm = Arc::new(GrokClient::from_config(&config));
        let reddit = Arc::new(RedditClient::from_config(&config));
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            db: Arc::new(Mutex::new(conn)),
            llm,
            reddit,
            http,
            config: Arc::new(config),
        }
    }

    pub fn models(&self) -> PipelineModels {
        PipelineModels {
            vision: self.config.vision_model.clone(),
        }
    }
}
