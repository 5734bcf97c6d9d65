//! Process-local continuation cursors.
//!
//! The remote list API is cursor based: page N+1 can only be reached with the
//! cursor returned while fetching page N. The store remembers those cursors so
//! later requests resume without replaying earlier pages. It is best-effort
//! and never persisted; a missing cursor only makes the pager walk from an
//! earlier page.
//!
//! A cursor is only meaningful for the page size it was produced with, so
//! the store also remembers that size per source. Binding a source to a new
//! size drops its cursors.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

#[derive(Debug, Default)]
struct Cursors {
    tokens: HashMap<(String, u32), String>,
    page_sizes: HashMap<String, usize>,
}

/// Shared map from `(source_id, page_number)` to the cursor that fetches
/// that page.
///
/// Cloning yields another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Cursors>>,
}

impl TokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor that fetches `page_number` of `source_id`, if known.
    #[must_use]
    pub fn get_token(&self, source_id: &str, page_number: u32) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.tokens.get(&(source_id.to_string(), page_number)).cloned()
    }

    /// Remember the cursor that fetches `page_number` of `source_id`.
    pub fn set_token(&self, source_id: &str, page_number: u32, token: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .tokens
            .insert((source_id.to_string(), page_number), token.into());
    }

    /// Forget the cursor for one page.
    pub fn remove_token(&self, source_id: &str, page_number: u32) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.tokens.remove(&(source_id.to_string(), page_number));
    }

    /// Forget every cursor of `source_id`.
    pub fn clear(&self, source_id: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.page_sizes.remove(source_id);
        let removed = Self::drop_cursors(&mut inner, source_id);
        debug!(source_id, removed, "cleared continuation tokens");
    }

    /// Tie the cursors of `source_id` to `page_size`.
    ///
    /// Cursors recorded under a different page size point at the wrong
    /// offsets and are dropped. Returns `true` when that happened.
    pub fn bind_page_size(&self, source_id: &str, page_size: usize) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = inner.page_sizes.insert(source_id.to_string(), page_size);
        match previous {
            Some(previous) if previous != page_size => {
                let removed = Self::drop_cursors(&mut inner, source_id);
                debug!(
                    source_id,
                    previous,
                    page_size,
                    removed,
                    "page size changed, dropped continuation tokens"
                );
                true
            },
            _ => false,
        }
    }

    /// Page size the cursors of `source_id` belong to, if bound.
    #[must_use]
    pub fn page_size(&self, source_id: &str) -> Option<usize> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.page_sizes.get(source_id).copied()
    }

    fn drop_cursors(inner: &mut Cursors, source_id: &str) -> usize {
        let before = inner.tokens.len();
        inner.tokens.retain(|(source, _), _| source != source_id);
        before - inner.tokens.len()
    }

    /// Number of cursors held across all sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tokens
            .len()
    }

    /// Whether no cursors are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_none() {
        let store = TokenStore::new();
        assert_eq!(store.get_token("src", 2), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let store = TokenStore::new();
        store.set_token("src", 2, "CAUQAA");
        assert_eq!(store.get_token("src", 2).as_deref(), Some("CAUQAA"));
        assert_eq!(store.get_token("src", 3), None);
        assert_eq!(store.get_token("other", 2), None);
    }

    #[test]
    fn test_overwrite_replaces_token() {
        let store = TokenStore::new();
        store.set_token("src", 2, "old");
        store.set_token("src", 2, "new");
        assert_eq!(store.get_token("src", 2).as_deref(), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_only_affects_one_source() {
        let store = TokenStore::new();
        store.set_token("a", 2, "a2");
        store.set_token("a", 3, "a3");
        store.set_token("b", 2, "b2");

        store.clear("a");
        assert_eq!(store.get_token("a", 2), None);
        assert_eq!(store.get_token("a", 3), None);
        assert_eq!(store.get_token("b", 2).as_deref(), Some("b2"));
    }

    #[test]
    fn test_remove_token() {
        let store = TokenStore::new();
        store.set_token("a", 2, "a2");
        store.remove_token("a", 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_new_page_size_drops_cursors() {
        let store = TokenStore::new();
        assert!(!store.bind_page_size("a", 10));
        store.set_token("a", 2, "a2-at-10");
        store.set_token("b", 2, "b2");

        assert!(!store.bind_page_size("a", 10));
        assert_eq!(store.get_token("a", 2).as_deref(), Some("a2-at-10"));

        assert!(store.bind_page_size("a", 5));
        assert_eq!(store.get_token("a", 2), None);
        assert_eq!(store.page_size("a"), Some(5));
        assert_eq!(store.get_token("b", 2).as_deref(), Some("b2"));
    }

    #[test]
    fn test_clear_forgets_page_size() {
        let store = TokenStore::new();
        store.bind_page_size("a", 10);
        store.clear("a");
        assert_eq!(store.page_size("a"), None);
    }

    #[test]
    fn test_clones_share_state() {
        let store = TokenStore::new();
        let handle = store.clone();
        handle.set_token("a", 2, "a2");
        assert_eq!(store.get_token("a", 2).as_deref(), Some("a2"));
    }
}
