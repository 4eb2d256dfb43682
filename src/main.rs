use std::sync::Arc;

use teloxide::Bot;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use expense_tracker_bot::config::Config;
use expense_tracker_bot::expenses::{
    FirebaseClient, MetadataServerToken, RequestHandler, StaticToken, TelegramClient, TokenProvider,
};
use expense_tracker_bot::server;

#[tokio::main]
async fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path),
        None => Config::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let _guard = init_logging(&config);

    info!("🚀 Starting expense tracker bot...");
    info!("Document store: {}", config.firebase_url);

    let tokens: Arc<dyn TokenProvider> = match config.access_token.clone() {
        Some(token) => {
            info!("Using static database token");
            Arc::new(StaticToken::new(token))
        }
        None => {
            info!("Using metadata server credentials ({})", config.metadata_url);
            Arc::new(MetadataServerToken::new(config.metadata_url.clone()))
        }
    };

    let store = FirebaseClient::new(config.firebase_url.clone(), tokens);
    let telegram = TelegramClient::new(Bot::new(&config.bot_token));

    if let Some(url) = config.webhook_url.clone() {
        if let Err(e) = telegram.register_webhook(url).await {
            warn!("Continuing without webhook registration: {e}");
        }
    }

    let handler = Arc::new(RequestHandler::new(store, telegram));
    let app = server::router(handler);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {e}", config.listen_addr);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Stdout always, plus a log file when `log_dir` is configured.
/// The returned guard must live as long as logging is needed.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let filter = || {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into())
    };

    let stdout = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter());

    let file = config.log_dir.as_ref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {e}", dir.display());
            return None;
        }
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("expense-bot.log"))
        {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file in {}: {e}", dir.display());
                None
            }
        }
    });

    match file {
        Some(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(stdout)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_filter(filter()),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(stdout).init();
            None
        }
    }
}
