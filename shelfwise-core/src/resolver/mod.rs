//! Title resolution.
//!
//! Maps free text typed by a user onto the catalog:
//!
//! - an exact, case-sensitive title match resolves to its row;
//! - otherwise case-insensitive substring matches come first, followed by
//!   fuzzy matches scored with [`similarity::similarity`], de-duplicated and
//!   capped;
//! - otherwise nothing.
//!
//! Substring matching scans every title on each query. That is fine for a
//! catalog of a few thousand titles; a prefix index would be faster but would
//! stop matching words in the middle of a title.

pub mod similarity;

use std::collections::HashSet;

pub use similarity::{close_matches, similarity, SequenceMatcher};

/// Minimum similarity for a fuzzy candidate.
pub const DEFAULT_CUTOFF: f64 = 0.6;

/// Fuzzy candidates considered per query.
pub const DEFAULT_FUZZY_LIMIT: usize = 5;

/// Suggestions returned after merging substring and fuzzy matches.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Outcome of resolving a query against the known titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The query is a known title; holds its row.
    Exact(usize),
    /// Candidate titles, most literal first.
    Approximate(Vec<String>),
    /// Nothing resembles the query.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleResolver {
    cutoff: f64,
    fuzzy_limit: usize,
    max_suggestions: usize,
}

impl Default for TitleResolver {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            fuzzy_limit: DEFAULT_FUZZY_LIMIT,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

impl TitleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    #[must_use]
    pub fn with_fuzzy_limit(mut self, limit: usize) -> Self {
        self.fuzzy_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn resolve<S: AsRef<str>>(&self, query: &str, titles: &[S]) -> Resolution {
        if let Some(row) = titles.iter().position(|t| t.as_ref() == query) {
            return Resolution::Exact(row);
        }

        let suggestions = self.suggest(query, titles);
        if suggestions.is_empty() {
            Resolution::NoMatch
        } else {
            Resolution::Approximate(suggestions)
        }
    }

    /// Substring matches then fuzzy matches, de-duplicated, capped.
    pub fn suggest<S: AsRef<str>>(&self, query: &str, titles: &[S]) -> Vec<String> {
        // An empty query is a substring of everything; treat it as no query.
        let substring: Vec<&str> = if query.is_empty() {
            Vec::new()
        } else {
            let needle = query.to_lowercase();
            titles
                .iter()
                .map(AsRef::as_ref)
                .filter(|t| t.to_lowercase().contains(&needle))
                .collect()
        };
        let fuzzy = close_matches(query, titles, self.fuzzy_limit, self.cutoff);

        let mut seen = HashSet::new();
        substring
            .into_iter()
            .chain(fuzzy)
            .filter(|t| seen.insert(*t))
            .take(self.max_suggestions)
            .map(str::to_string)
            .collect()
    }
}

/// Resolve with the default cutoff and limits.
pub fn resolve<S: AsRef<str>>(query: &str, titles: &[S]) -> Resolution {
    TitleResolver::default().resolve(query, titles)
}
