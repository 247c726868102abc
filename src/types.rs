//! Common types used throughout listing-watch
//!
//! This module contains the listing data model shared by the fetcher,
//! the change detector, the state blob and the notifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================================
// Listing
// ============================================================================

/// One posted opportunity scraped from a listing table.
///
/// Identity is the `(company, role, location)` triple. `apply_link` and
/// `date_posted` are informational only: two listings that differ only in
/// those fields compare equal and hash identically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    pub company: String,
    pub role: String,
    pub location: String,
    #[serde(default)]
    pub apply_link: String,
    #[serde(default)]
    pub date_posted: String,
}

impl Listing {
    /// Create a listing from its identity triple with empty informational fields
    pub fn new(
        company: impl Into<String>,
        role: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
            location: location.into(),
            apply_link: String::new(),
            date_posted: String::new(),
        }
    }

    /// Set the apply link
    #[must_use]
    pub fn with_apply_link(mut self, link: impl Into<String>) -> Self {
        self.apply_link = link.into();
        self
    }

    /// Set the posting date
    #[must_use]
    pub fn with_date_posted(mut self, date: impl Into<String>) -> Self {
        self.date_posted = date.into();
        self
    }

    /// The identity triple
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.company, &self.role, &self.location)
    }
}

impl PartialEq for Listing {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Listing {}

impl Hash for Listing {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.company, self.role, self.location)
    }
}
