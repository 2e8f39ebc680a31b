use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Memecheck";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "memecheck=info,tower_http=info".to_string()
}

/// Get the application data directory (~/Memecheck/ on all platforms)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Memecheck")
}

/// Runtime configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// xAI API key. `XAI_API_KEY` with `GROK_API_KEY` as legacy alias.
    pub api_key: Option<String>,
    pub llm_base_url: String,
    pub vision_model: String,
    pub text_model: String,
    pub llm_timeout_secs: u64,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub admin_token: Option<String>,
    pub database_path: PathBuf,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("XAI_API_KEY")
                .or_else(|_| env::var("GROK_API_KEY"))
                .ok(),
            llm_base_url: env::var("XAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.x.ai/v1".to_string()),
            vision_model: env::var("MEMECHECK_VISION_MODEL")
                .unwrap_or_else(|_| "grok-2-vision-latest".to_string()),
            text_model: env::var("MEMECHECK_TEXT_MODEL")
                .unwrap_or_else(|_| "grok-2-latest".to_string()),
            llm_timeout_secs: env::var("MEMECHECK_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            reddit_client_id: env::var("REDDIT_CLIENT_ID").ok(),
            reddit_client_secret: env::var("REDDIT_CLIENT_SECRET").ok(),
            reddit_user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "web:memecheck:v1.0.0 (by /u/memecheck)".to_string()),
            admin_token: env::var("MEMECHECK_ADMIN_TOKEN").ok(),
            database_path: env::var("MEMECHECK_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| app_data_dir().join("memecheck.db")),
            bind_addr: env::var("MEMECHECK_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        }
    }

    /// Config for tests: no credentials, in-memory-style paths, fixed admin token.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            api_key: None,
            llm_base_url: "https://api.x.ai/v1".to_string(),
            vision_model: "grok-2-vision-latest".to_string(),
            text_model: "grok-2-latest".to_string(),
            llm_timeout_secs: 5,
            reddit_client_id: None,
            reddit_client_secret: None,
            reddit_user_agent: "web:memecheck:test".to_string(),
            admin_token: Some("test-admin-token".to_string()),
            database_path: PathBuf::from(":memory:"),
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Memecheck"));
    }

    #[test]
    fn test_config_has_admin_token() {
        let config = AppConfig::for_tests();
        assert!(config.api_key.is_none());
        assert_eq!(config.admin_token.as_deref(), Some("test-admin-token"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
