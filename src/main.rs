use anyhow::{Context, Result};
use coinsnap::{
    dataset::{write_snapshot, Dataset},
    fetch,
    journal::Journal,
};
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

// Paths where data files are created / updated, relative to the working
// directory of the crontab entry.
const DATA_FILE: &str = "daily_top_100.csv";
const LOG_FILE: &str = "logging.txt";

// Column order of the dataset. Don't change once the first data has been
// written to DATA_FILE.
const METRIC_ORDER: &[&str] = &[
    "rank",
    "mcUSD",
    "mcBTC",
    "priceUSD",
    "priceBTC",
    "vol24h",
    "percChange1h",
    "percChange24h",
    "percChange7d",
];

// Per-row progress messages while appending.
const VERBOSE: bool = false;

#[tokio::main]
async fn main() -> Result<()> {
    // ─── init logging ────────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    let journal = Journal::new(LOG_FILE);
    if let Err(err) = run(&journal).await {
        error!("run failed: {:#}", err);
        let _ = journal.append(&format!("Run failed: {:#}", err));
        return Err(err);
    }
    Ok(())
}

async fn run(journal: &Journal) -> Result<()> {
    // ─── scrape the ranking page ─────────────────────────────────────
    let client = Client::builder()
        .user_agent(fetch::top100::USER_AGENT)
        .build()
        .context("building HTTP client")?;

    let snapshot = fetch::fetch_top100_snapshot(&client, Some(journal))
        .await
        .context("scraping the top-100 snapshot")?;
    info!("scraped metrics for {} assets", snapshot.len());

    // ─── append it to the dataset ────────────────────────────────────
    let mut dataset =
        Dataset::open(DATA_FILE).with_context(|| format!("opening dataset {}", DATA_FILE))?;
    let summary = write_snapshot(&snapshot, &mut dataset, METRIC_ORDER, VERBOSE, Some(journal))
        .with_context(|| format!("appending the snapshot to {}", DATA_FILE))?;

    info!(rows = summary.rows_added, file = DATA_FILE, "done");
    Ok(())
}
