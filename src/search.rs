//! Region name search: case-insensitive substring, source order, capped result count.

use crate::models::RegionRef;

/// Default number of results shown in the search panel.
pub const DEFAULT_LIMIT: usize = 5;

/// Precomputed lowercase names for a fixed region list.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<(String, RegionRef)>,
    limit: usize,
}

impl SearchIndex {
    pub fn new<I>(regions: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = RegionRef>,
    {
        let entries = regions
            .into_iter()
            .map(|r| (r.name.to_lowercase(), r))
            .collect();
        Self { entries, limit }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Regions whose name contains the trimmed `query`, ignoring case, in list order.
    /// A blank query returns nothing (the panel is hidden rather than listing everything).
    pub fn search(&self, query: &str) -> Vec<RegionRef> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|(lower, _)| lower.contains(&needle))
            .map(|(_, r)| r.clone())
            .take(self.limit)
            .collect()
    }
}

/// Live query plus its current result list, owned by the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<RegionRef>,
}

impl SearchState {
    pub fn is_open(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
    }
}
