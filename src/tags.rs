//! The per-collection tag accumulator.
//!
//! A [`TagIndex`] is owned by the collection-build routine and lives for
//! exactly one collection: page generation holds the only mutable
//! reference while it registers tagged pages, then listing generation
//! reads the completed index through shared references. Tags never leak
//! across collections. Both maps are ordered so iteration, and therefore
//! the generated output, is deterministic.

use std::collections::BTreeMap;

/// Maps tag names to the pages seen carrying each tag.
#[derive(Debug, Default)]
pub struct TagIndex {
    entries: BTreeMap<String, TagEntry>,
}

/// One tag's accumulated data.
#[derive(Debug)]
pub struct TagEntry {
    /// Canonical URL of the tag's listing page
    /// (`{base_path}/{collection_dir}/tag_{tag}.html`).
    pub url: String,

    /// Output path of each tagged page, mapped to that page's title.
    pages: BTreeMap<String, String>,
}

impl TagIndex {
    pub fn new() -> TagIndex {
        TagIndex::default()
    }

    /// Records `page_path` and `title` under `tag`. The tag's entry is
    /// created lazily, capturing `url`, the first time the tag is seen.
    pub fn register(&mut self, tag: &str, url: &str, page_path: &str, title: &str) {
        let entry = self
            .entries
            .entry(tag.to_string())
            .or_insert_with(|| TagEntry {
                url: url.to_string(),
                pages: BTreeMap::new(),
            });
        entry.pages.insert(page_path.to_string(), title.to_string());
    }

    /// Tag names in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(name, entry)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TagEntry {
    /// Number of pages recorded under this tag.
    pub fn count(&self) -> usize {
        self.pages.len()
    }

    /// `(page_path, title)` pairs in sorted order.
    pub fn pages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages
            .iter()
            .map(|(path, title)| (path.as_str(), title.as_str()))
    }
}
