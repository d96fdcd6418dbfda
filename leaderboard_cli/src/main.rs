use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use leaderboard_core::config::DEFAULT_PAGE_SIZE;
use leaderboard_core::enrichment::fetcher::{HttpImageFetcher, ImageFetcher, NoImageFetcher};
use leaderboard_core::identity::StaticIdentity;
use leaderboard_core::{LeaderboardView, ScoreStore, ViewConfig};
use score_schema::Metric;

mod logging;
mod render;

use logging::{init_logging, LogArgs};

#[derive(Debug, Parser)]
#[command(name = "leaderboard")]
#[command(about = "Ranked leaderboard viewer", long_about = None)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print one page of the leaderboard
    Show {
        records: PathBuf,
        #[arg(short, long, default_value = "easy", value_parser = parse_metric)]
        metric: Metric,
        #[arg(short, long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Id of the signed-in user
        #[arg(short, long)]
        user: Option<String>,
        /// Avatar of the signed-in user
        #[arg(long)]
        profile_picture: Option<String>,
        /// Download avatars over HTTP instead of skipping them
        #[arg(long)]
        fetch_avatars: bool,
        /// How long to wait for avatars before printing
        #[arg(long, default_value_t = 3000)]
        wait_ms: u64,
        /// Per-avatar request limit
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print a user's rank
    Rank {
        records: PathBuf,
        #[arg(short, long)]
        user: String,
        #[arg(short, long, default_value = "easy", value_parser = parse_metric)]
        metric: Metric,
    },
    /// Check that a record file loads into a store
    Validate { records: PathBuf },
}

/// Unknown names fall back to Easy instead of failing.
fn parse_metric(value: &str) -> Result<Metric, std::convert::Infallible> {
    Ok(Metric::from_name(value))
}

fn load_store(path: &Path) -> anyhow::Result<ScoreStore> {
    let records = score_loader::load_records_json_from_path(path)?;
    let mut store = ScoreStore::new();
    store
        .replace_all(records)
        .with_context(|| format!("invalid records: {}", path.display()))?;
    Ok(store)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    match cli.command {
        Command::Show {
            records,
            metric,
            page,
            page_size,
            user,
            profile_picture,
            fetch_avatars,
            wait_ms,
            timeout_ms,
        } => {
            let mut config = ViewConfig::new(page_size).context("invalid --page-size")?;
            if let Some(ms) = timeout_ms {
                config = config.with_fetch_timeout(Duration::from_millis(ms));
            }

            let fetcher: Arc<dyn ImageFetcher> = if fetch_avatars {
                Arc::new(HttpImageFetcher::new())
            } else {
                Arc::new(NoImageFetcher)
            };

            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            let store = load_store(&records)?;
            tracing::info!(records = store.len(), path = %records.display(), "loaded records");

            let mut view = LeaderboardView::new(
                config,
                fetcher,
                Arc::new(StaticIdentity(user)),
                runtime.handle().clone(),
            )
            .with_store(store);

            if let Some(url) = &profile_picture {
                view.set_profile_picture(url);
            }
            view.set_page(page, metric);

            let updates = view.wait_idle(Duration::from_millis(wait_ms));
            tracing::info!(updates = updates.len(), stats = ?view.stats(), "avatar loading finished");

            print!("{}", render::render_page(view.page()));
            if profile_picture.is_some() {
                println!("Profile picture: {}", render::render_image(view.profile_picture()));
            }
        }
        Command::Rank {
            records,
            user,
            metric,
        } => {
            let mut store = load_store(&records)?;
            store.reorder(metric);
            match store.rank(&user) {
                Some(rank) => println!("#{rank}"),
                None => bail!("user `{user}` is not ranked on {metric}"),
            }
        }
        Command::Validate { records } => {
            let store = load_store(&records)?;
            println!("ok: {} records", store.len());
        }
    }

    Ok(())
}
