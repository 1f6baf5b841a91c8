mod bridge;
mod config;
mod wire;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use quiz_core::model::Catalog;
use services::{Durability, ProgressCache, ProgressCoordinator};
use storage::repository::Storage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Overrides, Settings, StoreTarget};

#[derive(Debug, Parser)]
#[command(
    name = "quizbot",
    version,
    about = "Multiple-choice quiz bot speaking newline-delimited JSON over stdio"
)]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long)]
    db: Option<String>,

    /// Keep progress in memory only; it is lost on restart
    #[arg(long, conflicts_with = "db")]
    cache_only: bool,

    /// Upper bound on each progress store call, in milliseconds
    #[arg(long)]
    store_timeout_ms: Option<u64>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            db: self.db.clone(),
            cache_only: self.cache_only,
            store_timeout_ms: self.store_timeout_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref(), &cli.overrides(), |key| {
        std::env::var(key).ok()
    })
    .context("invalid configuration")?;

    // stdout is reserved for protocol frames
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(settings).await
}

async fn run(settings: Settings) -> Result<()> {
    let catalog = Arc::new(Catalog::builtin().context("built-in catalog is invalid")?);

    let durability = match &settings.store {
        StoreTarget::Sqlite(url) => {
            prepare_sqlite_file(url)?;
            let storage = Storage::sqlite(url)
                .await
                .with_context(|| format!("opening progress store at {url}"))?;
            Durability::Reconciled(storage.progress)
        }
        StoreTarget::CacheOnly => {
            warn!("no progress store configured; progress will be lost on restart");
            Durability::CacheOnly
        }
    };

    let coordinator = ProgressCoordinator::new(Arc::new(ProgressCache::new()), durability)
        .with_store_timeout(settings.store_timeout);
    info!(
        tasks = catalog.len(),
        durable = coordinator.durability().is_durable(),
        store_timeout_ms = settings.store_timeout_ms(),
        "quizbot ready"
    );

    bridge::run(
        tokio::io::stdin(),
        tokio::io::stdout(),
        catalog,
        Arc::new(coordinator),
    )
    .await?;
    info!("quizbot stopped");
    Ok(())
}

/// Create the database file (and its directory) so SQLite can open it.
fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        // in-memory URLs need nothing on disk
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url:?}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_flags_become_overrides() {
        let cli = Cli::parse_from(["quizbot", "--db", "quiz.db", "--store-timeout-ms", "500"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.db.as_deref(), Some("quiz.db"));
        assert_eq!(overrides.store_timeout_ms, Some(500));
        assert!(!overrides.cache_only);
    }

    #[test]
    fn cache_only_conflicts_with_db() {
        assert!(Cli::try_parse_from(["quizbot", "--db", "quiz.db", "--cache-only"]).is_err());
    }

    #[test]
    fn prepare_creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("quiz.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        prepare_sqlite_file(&url).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn prepare_ignores_memory_urls() {
        prepare_sqlite_file("sqlite::memory:").unwrap();
    }
}
