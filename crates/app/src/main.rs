use chrono::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use services::{Clock, QuizService};
use storage::question_source::QuestionSource;
use storage::repository::Storage;

mod config;
mod error;
mod http;

use config::{Command, Config, prepare_sqlite_file, print_usage};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let command = Config::parse(|key| std::env::var(key).ok(), std::env::args().skip(1))
        .inspect_err(|e| {
            eprintln!("{e}");
            print_usage();
        })?;
    let config = match command {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Serve(config) => config,
    };

    let source = QuestionSource::new(&config.upload_dir);
    source.ensure_dir()?;

    // Open + migrate SQLite here so the library crates stay free of process setup.
    let storage = match &config.db_url {
        Some(url) => {
            prepare_sqlite_file(url)?;
            Storage::sqlite(url).await?
        }
        None => Storage::in_memory(),
    };

    let quiz = QuizService::from_storage(Clock::system(), source, &storage)
        .with_session_ttl(Duration::minutes(config.session_ttl_minutes));
    let app = http::router(http::AppState::new(quiz));

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %config.bind,
        upload_dir = %config.upload_dir.display(),
        persistent = config.db_url.is_some(),
        session_ttl_minutes = config.session_ttl_minutes,
        "quiz server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "quiz server stopped");
        std::process::exit(2);
    }
}
