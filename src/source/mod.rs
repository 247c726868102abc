//! Listing sources
//!
//! A source is a static descriptor of one listing table. The [`Fetcher`]
//! capability turns a descriptor into its current listings; the
//! [`TableFetcher`] implementation reads them from rendered HTML tables.

mod table;
mod types;

pub use table::{parse_table, TableFetcher};
pub use types::{
    default_sources, ColumnMap, Fetcher, SourceConfig, TableLayout, DEFAULT_MAX_ROWS,
};
