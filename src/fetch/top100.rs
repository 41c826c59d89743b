// src/fetch/top100.rs

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::dataset::{MetricRecord, Snapshot};
use crate::journal::Journal;

/// Ranking page carrying the top-100 table.
pub const TOP100_URL: &str = "https://www.coingecko.com/en";

/// The site serves a trimmed page to unknown clients; present a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36";

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("CSS selector for table rows should be valid"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("CSS selector for table cells should be valid"));

// Fixed cell positions in the ranking table. Cell 0 is the watchlist star.
const RANK_CELL: usize = 1;
const COIN_CELL: usize = 2;
const PRICE_CELL: usize = 3;
const CHANGE_1H_CELL: usize = 4;
const CHANGE_24H_CELL: usize = 5;
const CHANGE_7D_CELL: usize = 6;
const VOLUME_CELL: usize = 7;
const MARKET_CAP_CELL: usize = 8;

/// Metrics a fully scraped record carries, USD and BTC-denominated ones
/// included.
const FULL_METRIC_COUNT: usize = 9;

/// Fetch the ranking page and scrape it into a snapshot. One shot, no
/// retries: a failed fetch fails the whole run.
pub async fn fetch_top100_snapshot(
    client: &Client,
    journal: Option<&Journal>,
) -> Result<Snapshot> {
    let url = Url::parse(TOP100_URL)?;
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .with_context(|| format!("fetching {}", TOP100_URL))?;
    parse_snapshot(&html, journal)
}

/// Scrape every row of the ranking table out of `html`.
///
/// The first body row is Bitcoin; its price cell anchors the
/// BTC-denominated metrics of every other asset. Individual metric cells
/// that can't be read leave the metric absent from that asset's record;
/// a page without usable rows, or one where a symbol or the BTC reference
/// price can't be located, fails the whole snapshot.
pub fn parse_snapshot(html: &str, journal: Option<&Journal>) -> Result<Snapshot> {
    let document = Html::parse_document(html);
    let rows: Vec<ElementRef> = document.select(&ROW_SELECTOR).collect();
    if rows.is_empty() {
        bail!("no table rows found on the ranking page; the website may have been restructured");
    }

    let first_cells: Vec<ElementRef> = rows[0].select(&CELL_SELECTOR).collect();
    let btc_price = cell_number(&first_cells, PRICE_CELL).context(
        "couldn't read the BTC reference price from the first table row; \
         the website may have been restructured",
    )?;

    let mut snapshot = Snapshot::new();
    for row in &rows {
        let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
        let symbol = cells
            .get(COIN_CELL)
            .and_then(symbol_from_coin_cell)
            .context(
                "couldn't read an asset symbol out of the ranking table; \
                 the website may have been restructured",
            )?;

        let record = metrics_from_row(&cells, btc_price);
        if record.len() < FULL_METRIC_COUNT {
            let message =
                format!("Couldn't scrape all metrics for {}. Maybe the website changed?", symbol);
            warn!("{}", message);
            if let Some(journal) = journal {
                journal.append(&message)?;
            }
        }
        snapshot.insert(symbol, record);
    }

    Ok(snapshot)
}

/// Pull every readable metric out of one table row. Unreadable cells are
/// skipped, not guessed at.
fn metrics_from_row(cells: &[ElementRef], btc_price: f64) -> MetricRecord {
    let mut record = MetricRecord::new();
    let mut put = |name: &str, value: Option<f64>| {
        if let Some(value) = value {
            record.insert(name.to_string(), value);
        }
    };

    put("rank", cell_number(cells, RANK_CELL));
    let price = cell_number(cells, PRICE_CELL);
    put("priceUSD", price);
    put("priceBTC", price.map(|p| p / btc_price));
    put("percChange1h", cell_number(cells, CHANGE_1H_CELL));
    put("percChange24h", cell_number(cells, CHANGE_24H_CELL));
    put("percChange7d", cell_number(cells, CHANGE_7D_CELL));
    put("vol24h", cell_number(cells, VOLUME_CELL));
    let market_cap = cell_number(cells, MARKET_CAP_CELL);
    put("mcUSD", market_cap);
    put("mcBTC", market_cap.map(|m| m / btc_price));

    record
}

/// The coin cell holds the asset name and its ticker on separate text
/// lines; the ticker comes last.
fn symbol_from_coin_cell(cell: &ElementRef) -> Option<String> {
    let text = cell.text().collect::<String>();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
}

fn cell_number(cells: &[ElementRef], index: usize) -> Option<f64> {
    cells
        .get(index)
        .and_then(|cell| clean(&cell.text().collect::<String>()))
}

/// Strip `$`, `%`, and thousands separators, then parse what's left.
fn clean(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | ','))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn row(rank: &str, name: &str, symbol: &str, cells: &[&str]) -> String {
        let tds: String = cells
            .iter()
            .map(|c| format!("<td>{}</td>", c))
            .collect();
        format!(
            "<tr><td></td><td>{}</td><td><a>\n{}\n{}\n</a></td>{}</tr>",
            rank, name, symbol, tds
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            "<html><body><table><thead><tr><th>#</th></tr></thead><tbody>{}</tbody></table></body></html>",
            rows.join("")
        )
    }

    fn sample_page() -> String {
        page(&[
            row(
                "1",
                "Bitcoin",
                "BTC",
                &["$34,000.00", "0.1%", "-1.2%", "5.6%", "$32,100,000,000", "$640,000,000,000"],
            ),
            row(
                "2",
                "Ethereum",
                "ETH",
                &["$1,700.00", "0.2%", "2.4%", "-7.8%", "$18,000,000,000", "$200,000,000,000"],
            ),
        ])
    }

    #[test]
    fn parses_full_rows_and_derives_btc_metrics() -> Result<()> {
        let snapshot = parse_snapshot(&sample_page(), None)?;
        assert_eq!(snapshot.len(), 2);

        let btc = &snapshot["BTC"];
        assert_eq!(btc["rank"], 1.0);
        assert_eq!(btc["priceUSD"], 34_000.0);
        assert_eq!(btc["priceBTC"], 1.0);
        assert_eq!(btc["percChange24h"], -1.2);
        assert_eq!(btc["mcUSD"], 640_000_000_000.0);

        let eth = &snapshot["ETH"];
        assert_eq!(eth["priceBTC"], 1_700.0 / 34_000.0);
        assert_eq!(eth["mcBTC"], 200_000_000_000.0 / 34_000.0);
        assert_eq!(eth["vol24h"], 18_000_000_000.0);
        Ok(())
    }

    #[test]
    fn unreadable_cells_leave_metrics_absent() -> Result<()> {
        let dir = tempdir()?;
        let journal = Journal::new(dir.path().join("logging.txt"));

        let html = page(&[
            row(
                "1",
                "Bitcoin",
                "BTC",
                &["$34,000.00", "0.1%", "-1.2%", "5.6%", "$32,100,000,000", "$640,000,000,000"],
            ),
            row(
                "3",
                "Ripple",
                "XRP",
                &["$0.50", "0.3%", "?", "1.1%", "$2,000,000,000", "$25,000,000,000"],
            ),
        ]);

        let snapshot = parse_snapshot(&html, Some(&journal))?;
        let xrp = &snapshot["XRP"];
        assert!(!xrp.contains_key("percChange24h"));
        assert_eq!(xrp["priceUSD"], 0.5);
        assert_eq!(xrp.len(), 8);

        let logged = fs::read_to_string(journal.path())?;
        assert!(logged.contains("Couldn't scrape all metrics for XRP."));
        Ok(())
    }

    #[test]
    fn unusable_btc_reference_price_fails_the_snapshot() {
        let html = page(&[row(
            "1",
            "Bitcoin",
            "BTC",
            &["n/a", "0.1%", "-1.2%", "5.6%", "$1", "$2"],
        )]);
        let err = parse_snapshot(&html, None).unwrap_err();
        assert!(err.to_string().contains("BTC reference price"));
    }

    #[test]
    fn a_page_without_rows_fails_the_snapshot() {
        let err = parse_snapshot("<html><body></body></html>", None).unwrap_err();
        assert!(err.to_string().contains("no table rows"));
    }

    #[test]
    fn cleans_currency_and_percent_markup() {
        assert_eq!(clean(" $1,234.56 "), Some(1234.56));
        assert_eq!(clean("-7.8%"), Some(-7.8));
        assert_eq!(clean(""), None);
        assert_eq!(clean("n/a"), None);
    }
}
