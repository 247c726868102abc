//! Source descriptors and the fetch capability

use crate::error::Result;
use crate::types::Listing;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Rows read from the top of a table when not configured
pub const DEFAULT_MAX_ROWS: usize = 20;

/// Static descriptor of one polled listing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Key under which the checkpoint is stored (e.g. "us_internships")
    pub name: String,

    /// Human-readable label used in notification text
    pub label: String,

    /// Page holding the table
    pub url: String,

    /// Where the table lives and how its columns map to listing fields
    #[serde(default)]
    pub table: TableLayout,

    /// Rows read from the top of the table
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

impl SourceConfig {
    /// Create a source with the default GitHub README table layout
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            url: url.into(),
            table: TableLayout::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Set the row limit
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }
}

/// CSS selectors and column indices describing a listing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    /// Element wrapping the table
    pub container: String,
    /// Table body within the container
    pub body: String,
    /// Rows within the body
    pub row: String,
    /// Cells within a row
    pub cell: String,
    /// Column index of each field
    pub columns: ColumnMap,
    /// Company cell text meaning "same company as the row above"
    pub continuation_marker: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            // GitHub's own spelling of the wrapper element.
            container: "markdown-accessiblity-table".to_string(),
            body: "tbody".to_string(),
            row: "tr".to_string(),
            cell: "td".to_string(),
            columns: ColumnMap::default(),
            continuation_marker: "↳".to_string(),
        }
    }
}

/// Column index per listing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub company: usize,
    pub role: usize,
    pub location: usize,
    pub apply_link: usize,
    pub date_posted: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            company: 0,
            role: 1,
            location: 2,
            apply_link: 3,
            date_posted: 4,
        }
    }
}

impl ColumnMap {
    /// Minimum cell count a row needs to yield a listing
    pub fn min_cells(&self) -> usize {
        [
            self.company,
            self.role,
            self.location,
            self.apply_link,
            self.date_posted,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
            + 1
    }
}

/// Sources watched when the configuration names none
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(
            "canadian_internships",
            "Canadian Tech Internships 2026",
            "https://github.com/negarprh/Canadian-Tech-Internships-2026",
        ),
        SourceConfig::new(
            "us_internships",
            "Summer 2026 Tech Internships",
            "https://github.com/SimplifyJobs/Summer2026-Internships/tree/dev",
        ),
    ]
}

/// Capability that turns a source descriptor into its current listings,
/// newest first.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the current top of the source's table
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<Listing>>;
}
