//! Tags gathered across every stored page.
//!
//! Nothing is cached: each query walks the page store, so results always
//! reflect what is on disk.

use crate::models::Tag;
use crate::store::{PageSet, PageStore, TagFilter};
use std::collections::BTreeMap;

pub struct TagIndex<'a> {
    store: &'a PageStore,
}

impl<'a> TagIndex<'a> {
    pub fn new(store: &'a PageStore) -> Self {
        Self { store }
    }

    /// Distinct tags in lexicographic order of name.
    pub fn all_tags(&self) -> Vec<Tag> {
        let mut tags: BTreeMap<String, Tag> = BTreeMap::new();
        for page in self.store.enumerate(None) {
            for tag in page.tags {
                tags.entry(tag.name.clone()).or_insert(tag);
            }
        }
        tags.into_values().collect()
    }

    /// Pages carrying `name`, in slug order, loaded as they are iterated.
    pub fn pages_for_tag(&self, name: &str) -> PageSet<'a> {
        self.store.enumerate(Some(TagFilter::new([name])))
    }

    /// Number of pages carrying each tag.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for page in self.store.enumerate(None) {
            let mut names: Vec<String> = page.tags.into_iter().map(|t| t.name).collect();
            names.sort();
            names.dedup();
            for name in names {
                *counts.entry(name).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WikiConfig;
    use tempfile::tempdir;

    fn fixture(root: &std::path::Path) -> PageStore {
        let store = PageStore::from_config(&WikiConfig::with_paths(root, root.join("_files")));
        store.save("p1", "---\ntags: [rust, web]\n---\n").unwrap();
        store.save("p2", "---\ntags: [web, web]\n---\n").unwrap();
        store.save("p3", "no tags").unwrap();
        store
    }

    #[test]
    fn test_all_tags_sorted_and_distinct() {
        let dir = tempdir().unwrap();
        let store = fixture(dir.path());
        let names: Vec<_> = TagIndex::new(&store)
            .all_tags()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["rust", "web"]);
    }

    #[test]
    fn test_pages_for_tag() {
        let dir = tempdir().unwrap();
        let store = fixture(dir.path());
        let index = TagIndex::new(&store);

        let slugs: Vec<_> = index.pages_for_tag("web").into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["p1", "p2"]);
        assert_eq!(index.pages_for_tag("missing").into_iter().count(), 0);
    }

    #[test]
    fn test_counts_pages_not_occurrences() {
        let dir = tempdir().unwrap();
        let store = fixture(dir.path());
        let counts = TagIndex::new(&store).counts();
        assert_eq!(counts.get("web"), Some(&2));
        assert_eq!(counts.get("rust"), Some(&1));
    }

    #[test]
    fn test_reflects_new_saves() {
        let dir = tempdir().unwrap();
        let store = fixture(dir.path());
        let index = TagIndex::new(&store);
        store.save("p4", "---\ntags: zig\n---\n").unwrap();
        assert!(index.all_tags().iter().any(|t| t.name == "zig"));
    }
}
