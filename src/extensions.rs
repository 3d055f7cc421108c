//! Extension tokens and the per-author touch table.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Classifies a touched file path.
///
/// The token is the text after the last `.`; without a dot it is the text after
/// the last `/`; otherwise the whole path.
pub fn extension_token(path: &str) -> &str {
    if let Some((_, ext)) = path.rsplit_once('.') {
        ext
    } else if let Some((_, name)) = path.rsplit_once('/') {
        name
    } else {
        path
    }
}

/// Touch counts per author email and extension token, plus every token ever
/// observed in discovery order.
///
/// A token only enters the discovered set through [`ExtensionTable::record`], so
/// each discovered token has at least one non-zero counter somewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionTable {
    discovered: Vec<String>,
    #[serde(skip)]
    seen: HashSet<String>,
    authors: Vec<String>,
    counts: HashMap<String, HashMap<String, u64>>,
}

impl ExtensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, author_email: &str, token: &str) {
        if self.seen.insert(token.to_string()) {
            self.discovered.push(token.to_string());
        }
        if !self.counts.contains_key(author_email) {
            self.authors.push(author_email.to_string());
        }
        *self
            .counts
            .entry(author_email.to_string())
            .or_default()
            .entry(token.to_string())
            .or_insert(0) += 1;
    }

    /// Tokens in the order they were first observed.
    pub fn discovered(&self) -> &[String] {
        &self.discovered
    }

    /// Author emails in the order of their first recorded touch.
    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn count(&self, author_email: &str, token: &str) -> u64 {
        self.counts
            .get(author_email)
            .and_then(|per_author| per_author.get(token))
            .copied()
            .unwrap_or(0)
    }

    /// One row per author: the email followed by a count for every discovered token.
    pub fn rows(&self) -> impl Iterator<Item = (&str, Vec<u64>)> + '_ {
        self.authors.iter().map(move |author| {
            let counts = self
                .discovered
                .iter()
                .map(|token| self.count(author, token))
                .collect();
            (author.as_str(), counts)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_suffix_after_last_dot() {
        assert_eq!(extension_token("src/app.ts"), "ts");
        assert_eq!(extension_token("archive.tar.gz"), "gz");
    }

    #[test]
    fn token_falls_back_to_file_name_then_whole_path() {
        assert_eq!(extension_token("a/b/README"), "README");
        assert_eq!(extension_token("Makefile"), "Makefile");
        assert_eq!(extension_token("Dockerfile"), "Dockerfile");
    }

    #[test]
    fn discovered_tokens_keep_first_seen_order() {
        let mut table = ExtensionTable::new();
        table.record("a@example.com", "rs");
        table.record("b@example.com", "md");
        table.record("a@example.com", "rs");
        table.record("b@example.com", "rs");

        assert_eq!(table.discovered(), &["rs".to_string(), "md".to_string()]);
        assert_eq!(table.authors(), &["a@example.com".to_string(), "b@example.com".to_string()]);
        assert_eq!(table.count("a@example.com", "rs"), 2);
        assert_eq!(table.count("a@example.com", "md"), 0);

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0], ("a@example.com", vec![2, 0]));
        assert_eq!(rows[1], ("b@example.com", vec![1, 1]));
    }
}
