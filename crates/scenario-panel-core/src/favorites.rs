use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub scenario_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    ByCode,
    ByName,
}

#[must_use]
pub fn parse_sort_mode(raw: &str) -> Option<SortMode> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "by-code" | "by_code" | "bycode" | "code" => Some(SortMode::ByCode),
        "by-name" | "by_name" | "byname" | "name" => Some(SortMode::ByName),
        _ => None,
    }
}

fn compare_names(left: &FavoriteEntry, right: &FavoriteEntry) -> Ordering {
    left.name
        .to_lowercase()
        .cmp(&right.name.to_lowercase())
        .then_with(|| left.name.cmp(&right.name))
}

fn compare_by_code(left: &FavoriteEntry, right: &FavoriteEntry) -> Ordering {
    let left_code = left.scenario_code.trim();
    let right_code = right.scenario_code.trim();
    match (left_code.is_empty(), right_code.is_empty()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => compare_names(left, right),
        (false, false) => left_code
            .to_lowercase()
            .cmp(&right_code.to_lowercase())
            .then_with(|| compare_names(left, right)),
    }
}

/// Sorted projection of `entries`; the input order is left alone.
#[must_use]
pub fn sort(entries: &[FavoriteEntry], mode: SortMode) -> Vec<FavoriteEntry> {
    let mut sorted = entries.to_vec();
    match mode {
        SortMode::ByName => sorted.sort_by(compare_names),
        SortMode::ByCode => sorted.sort_by(compare_by_code),
    }
    sorted
}

/// Local cache of the host-owned favorites list.
#[derive(Debug, Clone, Default)]
pub struct FavoritesRegistry {
    entries: Vec<FavoriteEntry>,
    sort_mode: SortMode,
}

impl FavoritesRegistry {
    #[must_use]
    pub fn with_sort_mode(sort_mode: SortMode) -> Self {
        Self {
            entries: Vec::new(),
            sort_mode,
        }
    }

    /// Authoritative snapshot from the host. Entries without a uri are dropped,
    /// later duplicates of a uri lose to the first one.
    pub fn replace(&mut self, entries: Vec<FavoriteEntry>, sort_mode: SortMode) {
        let mut kept: Vec<FavoriteEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.uri.trim().is_empty() {
                tracing::warn!(name = %entry.name, "skipping favorite without uri");
                continue;
            }
            if kept.iter().any(|existing| existing.uri == entry.uri) {
                tracing::warn!(uri = %entry.uri, "skipping duplicate favorite");
                continue;
            }
            kept.push(entry);
        }
        self.entries = kept;
        self.sort_mode = sort_mode;
    }

    #[must_use]
    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Returns `true` when the mode actually changed.
    pub fn set_sort_mode(&mut self, sort_mode: SortMode) -> bool {
        if self.sort_mode == sort_mode {
            return false;
        }
        self.sort_mode = sort_mode;
        true
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.entries.iter().any(|entry| entry.uri == uri)
    }

    /// Optimistically drops the entry until the host confirms.
    pub fn remove_optimistic(&mut self, uri: &str) -> Option<FavoriteEntry> {
        let index = self.entries.iter().position(|entry| entry.uri == uri)?;
        Some(self.entries.remove(index))
    }

    #[must_use]
    pub fn sorted(&self) -> Vec<FavoriteEntry> {
        sort(&self.entries, self.sort_mode)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
