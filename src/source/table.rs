//! HTML table fetcher
//!
//! Downloads a page and reads listings out of a rendered table with CSS
//! selectors. No JavaScript rendering: the table must be in the served HTML.

use super::types::{Fetcher, SourceConfig, TableLayout};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, BROWSER_USER_AGENT};
use crate::types::Listing;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

/// Fetches listings from HTML tables over HTTP
#[derive(Debug)]
pub struct TableFetcher {
    client: HttpClient,
}

impl TableFetcher {
    /// Create a fetcher whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let config = HttpClientConfig::builder()
            .timeout(timeout)
            .max_retries(2)
            .user_agent(BROWSER_USER_AGENT)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .build();

        Ok(Self {
            client: HttpClient::with_config(config)?,
        })
    }

    /// Create a fetcher over an existing client
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for TableFetcher {
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<Listing>> {
        let html = self.client.get_text(&source.url).await?;
        let listings = parse_table(&html, source)?;
        info!(source = %source.name, count = listings.len(), "Fetched listings");
        Ok(listings)
    }
}

/// Read up to `source.max_rows` listings from the table in `html`.
///
/// Rows with too few cells are skipped. A company cell holding the layout's
/// continuation marker takes the company of the previous listing.
pub fn parse_table(html: &str, source: &SourceConfig) -> Result<Vec<Listing>> {
    let layout = &source.table;
    let selectors = Selectors::compile(layout)?;
    let document = Html::parse_document(html);

    let container = document
        .select(&selectors.container)
        .next()
        .ok_or_else(|| Error::table_parse(&source.name, "Could not find internship table"))?;

    let body = container
        .select(&selectors.body)
        .next()
        .ok_or_else(|| Error::table_parse(&source.name, "Could not find table body"))?;

    let columns = layout.columns;
    let min_cells = columns.min_cells();
    let mut listings: Vec<Listing> = Vec::new();

    for row in body.select(&selectors.row).take(source.max_rows) {
        let cells: Vec<ElementRef<'_>> = row.select(&selectors.cell).collect();
        if cells.len() < min_cells {
            debug!(source = %source.name, cells = cells.len(), "Skipping short row");
            continue;
        }

        let mut company = cell_text(cells[columns.company]);
        if company.starts_with(&layout.continuation_marker) {
            if let Some(previous) = listings.last() {
                company.clone_from(&previous.company);
            }
        }

        let apply_link = cells[columns.apply_link]
            .select(&selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        listings.push(Listing {
            company,
            role: cell_text(cells[columns.role]),
            location: cell_text(cells[columns.location]),
            apply_link,
            date_posted: cell_text(cells[columns.date_posted]),
        });
    }

    Ok(listings)
}

struct Selectors {
    container: Selector,
    body: Selector,
    row: Selector,
    cell: Selector,
    link: Selector,
}

impl Selectors {
    fn compile(layout: &TableLayout) -> Result<Self> {
        Ok(Self {
            container: selector(&layout.container)?,
            body: selector(&layout.body)?,
            row: selector(&layout.row)?,
            cell: selector(&layout.cell)?,
            link: selector("a[href]")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::config(format!("Invalid CSS selector '{css}': {e}")))
}

/// Cell text with whitespace runs collapsed
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
