// src/blocklist.rs
// =============================================================================
// This module decides whether a domain is excluded from crawling.
//
// Matching rules:
// - A domain is blocked if it equals a blocklist entry exactly
// - A domain is also blocked if it ends with a blocklist entry
//   (blocking "ngrok.io" also blocks "a.ngrok.io")
//
// Domains are compared verbatim. No case folding, trailing-dot stripping
// or IDNA conversion happens here.
//
// The list is small, so a linear scan per check is all we need.
// =============================================================================

use std::sync::Arc;

/// Read-only list of blocked domain suffixes, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    entries: Arc<[String]>,
}

impl Blocklist {
    /// Builds a blocklist from an ordered list of suffixes.
    ///
    /// Empty entries are dropped, since an empty suffix would match every domain.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries
            .into_iter()
            .map(Into::into)
            .filter(|entry| !entry.is_empty())
            .collect();

        Self {
            entries: entries.into(),
        }
    }

    /// Returns true if the domain is excluded from crawling.
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| domain == entry || domain.ends_with(entry.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocklist() -> Blocklist {
        Blocklist::new(["localhost", "ngrok.io"])
    }

    #[test]
    fn test_exact_match_is_blocked() {
        assert!(blocklist().is_blocked("localhost"));
        assert!(blocklist().is_blocked("ngrok.io"));
    }

    #[test]
    fn test_subdomain_is_blocked() {
        let blocklist = blocklist();
        assert!(blocklist.is_blocked("a.ngrok.io"));
        assert!(blocklist.is_blocked("subdomain.localhost"));
        assert!(blocklist.is_blocked("reallylong.toto.subdomain.ngrok.io"));
    }

    #[test]
    fn test_lookalike_is_not_blocked() {
        let blocklist = blocklist();
        assert!(!blocklist.is_blocked("ngrokio.com"));
        assert!(!blocklist.is_blocked("mastodon.social"));
    }

    #[test]
    fn test_comparison_is_verbatim() {
        // no normalization: case and trailing dots make a different domain
        let blocklist = blocklist();
        assert!(!blocklist.is_blocked("NGROK.IO"));
        assert!(!blocklist.is_blocked("ngrok.io."));
    }

    #[test]
    fn test_empty_entries_are_ignored() {
        let blocklist = Blocklist::new(["", "ngrok.io"]);
        assert_eq!(blocklist.len(), 1);
        assert!(!blocklist.is_blocked("mastodon.social"));
    }

    #[test]
    fn test_empty_blocklist_blocks_nothing() {
        let blocklist = Blocklist::default();
        assert!(blocklist.is_empty());
        assert!(!blocklist.is_blocked("localhost"));
    }
}
