use memecheck::api::{api_router, ApiContext};
use memecheck::config::AppConfig;
use memecheck::db::repository::ensure_default_prompts;
use memecheck::db::sqlite::open_database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    memecheck::init_tracing();

    let config = AppConfig::from_env();
    tracing::info!(
        version = memecheck::config::APP_VERSION,
        db = %config.database_path.display(),
        "Memecheck starting"
    );

    if config.api_key.is_none() {
        tracing::warn!("XAI_API_KEY is not set; analysis endpoints will return service_not_configured");
    }

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = open_database(&config.database_path)?;
    ensure_default_prompts(&conn)?;

    let bind_addr = config.bind_addr.clone();
    let ctx = ApiContext::new(config, conn);
    let app = api_router(ctx);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
