use cnd_sync::cli;
use cnd_sync::errors::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

fn main() -> AppResult<()> {
    // Credentials may live in a local .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Requests are strictly sequential, one thread is enough
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::IoError(e.to_string()))?;

    rt.block_on(cli::cli())
}
