/// Identifier-keyed store of fetched video details
use std::collections::HashSet;

use super::models::RawVideoItem;

/// Append-only detail cache; at most one item per video id is ever added
#[derive(Debug, Clone, Default)]
pub struct DetailCache {
    items: Vec<RawVideoItem>,
    known_ids: HashSet<String>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap items loaded from disk; existing entries are kept as they are
    pub fn from_items(items: Vec<RawVideoItem>) -> Self {
        let known_ids = items.iter().map(|item| item.id.clone()).collect();
        Self { items, known_ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known_ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids not yet cached, deduplicated, in first-seen order
    pub fn missing<'a, I>(&self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut queued = HashSet::new();
        ids.into_iter()
            .filter(|id| !id.is_empty() && !self.contains(id))
            .filter(|id| queued.insert(*id))
            .map(str::to_string)
            .collect()
    }

    /// Append items whose id is new; returns how many were added
    pub fn extend(&mut self, items: impl IntoIterator<Item = RawVideoItem>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.known_ids.insert(item.id.clone()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    pub fn items(&self) -> &[RawVideoItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<RawVideoItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_is_deduplicated_and_ordered() {
        let cache = DetailCache::from_items(vec![RawVideoItem::new("b")]);
        let missing = cache.missing(["a", "b", "c", "a", "", "d"]);
        assert_eq!(missing, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_extend_keeps_one_item_per_id() {
        let mut cache = DetailCache::from_items(vec![RawVideoItem::new("a")]);
        let added = cache.extend(vec![
            RawVideoItem::new("a"),
            RawVideoItem::new("b"),
            RawVideoItem::new("b"),
        ]);

        assert_eq!(added, 1);
        let ids: Vec<_> = cache.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
