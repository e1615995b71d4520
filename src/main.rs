use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pomobot::cli::args::Cli;
use pomobot::config::{Config, Paths};
use pomobot::core::UserId;
use pomobot::features::advice::create_advisor;
use pomobot::gateway::{run_console, ConsoleSink, GatewayNotifier, MessageSink};
use pomobot::storage::{self, Database, PersistenceSync, SnapshotStore};
use pomobot::{Conversation, FocusScheduler};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {e:#}", "error".red().bold());
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over the configured level.
fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn open_store(config: &Config, paths: &Paths) -> Result<Arc<dyn SnapshotStore>> {
    let path = config.database_path(paths);

    match paths.ensure_dirs().and_then(|()| Database::open_at(&path)) {
        Ok(db) => {
            let schema = db.schema_version().context("Failed to read schema version")?;
            info!(path = %path.display(), schema, "database opened");
            Ok(Arc::new(db))
        },
        Err(e) => {
            warn!(error = %e, "database unavailable, state will not survive a restart");
            let db = Database::open_in_memory().context("Failed to open fallback database")?;
            Ok(Arc::new(db))
        },
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => Paths::with_root(dir),
        None => Paths::new()?,
    };
    let config_path = cli.config.unwrap_or_else(|| paths.config_file.clone());
    let config = Config::load_from_path(&config_path)?;

    setup_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));
    info!(config = %config_path.display(), "configuration loaded");

    let store = open_store(&config, &paths)?;
    let state = storage::load(store.as_ref(), &config.focus);
    let sync = Arc::new(PersistenceSync::new(store, &state));

    let sink: Arc<dyn MessageSink> = Arc::new(ConsoleSink::new(tokio::io::stdout()));
    let history_sync = Arc::clone(&sync);
    let scheduler = FocusScheduler::new(
        Arc::clone(&state.settings),
        Arc::clone(&state.history),
        Arc::new(GatewayNotifier::new(Arc::clone(&sink))),
        config.focus.sessions_until_long_break,
    )
    .with_record_hook(Arc::new(move |_: &UserId| history_sync.save_history()));

    let advisor = create_advisor(&config.assistant);
    let conversation = Arc::new(Conversation::new(&state, scheduler, advisor, sync));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_console(stdin, conversation, sink).await?;

    info!("shutting down");
    Ok(())
}
