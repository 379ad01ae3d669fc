use balance_sentinel::config::Config;
use balance_sentinel::services::monitor::ShutdownSignal;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Config is read before logging so LOG_FILE can be honoured
    let config = Config::from_env();
    init_tracing(config.as_ref().ok().and_then(|c| c.log_file.as_deref()));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    config.log_summary();

    let mut engine = match balance_sentinel::create_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to set up notification channels: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();

    engine.run(&shutdown).await;
}

fn init_tracing(log_file: Option<&Path>) {
    let mut file_error = None;
    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            ),
            Err(e) => {
                file_error = Some(format!("Cannot open log file {}: {}", path.display(), e));
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balance_sentinel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!("{}", e);
    }
}
