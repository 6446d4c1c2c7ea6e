use serde_json::json;
use tokio::time::{sleep, Duration};
use tracing::error;

use devsmith_logger::env::{env_or, DEVSMITH_API_KEY_ENV, DEVSMITH_API_URL_ENV};
use devsmith_logger::init::init_tracing;
use devsmith_logger::{shutdown_all, Context, Logger, LoggerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoggerConfig::new(
        env_or(DEVSMITH_API_KEY_ENV, "dev-key"),
        env_or(DEVSMITH_API_URL_ENV, "http://localhost:3000"),
        "my-project",
        "api-server",
    )
    .with_flush_interval(Duration::from_secs(2));

    let logger = Logger::new(config)?;
    init_tracing(&logger)?;

    let mut context = Context::new();
    context.insert("user_id".into(), json!(123));
    logger.info("User logged in", Some(context), &["auth"])?;

    // goes through the tracing bridge
    error!(code = "ECONNREFUSED", "database error");

    sleep(Duration::from_secs(3)).await;
    println!("stats after first tick: {:?}", logger.stats());

    shutdown_all().await;
    Ok(())
}
