//! Smoke test entry point.

use saga::EXIT_FAILURE;
use smoketest::config::{Config, LogFormat};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing(level: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")));
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    match &config {
        Ok(c) => init_tracing(&c.log_level, c.log_format),
        Err(_) => init_tracing("info", LogFormat::default()),
    }

    // 2. Run the saga
    let code = match config {
        Ok(config) => match smoketest::run(&config).await {
            Ok(outcome) => smoketest::report(&outcome),
            Err(e) => {
                tracing::error!(error = %e, exit_code = EXIT_FAILURE, "smoke test could not start");
                EXIT_FAILURE
            }
        },
        Err(e) => {
            tracing::error!(error = %e, exit_code = EXIT_FAILURE, "invalid configuration");
            EXIT_FAILURE
        }
    };

    // 3. Exit with the verdict
    std::process::exit(code);
}
