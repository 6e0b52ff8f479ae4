// src/main.rs
use poll_api::{config::Config, error::StartupError};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    dotenvy::dotenv().ok(); // Load environment variables from .env file

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("poll_api=info,tower_http=info"));
    fmt().with_env_filter(filter).init();

    let config = Config::load()?;
    poll_api::serve(config).await
}
