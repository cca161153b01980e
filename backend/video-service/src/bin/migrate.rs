use anyhow::{Context, Result};
use tracing::info;
use video_service::config::SERVICE_NAME;
use video_service::{build_state, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "video_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!(service = SERVICE_NAME, "Running database migrations");

    let settings = Settings::from_env().context("Failed to load configuration")?;
    settings.database.log_config();

    let pool = db_pool::create_pool(settings.database.clone())
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    // Fails fast on unusable key material or bucket settings
    build_state(&settings, pool.clone()).await?;

    pool.close().await;
    Ok(())
}
