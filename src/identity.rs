//! Identity resolution for commit authors.
//!
//! Contributors are keyed by display name, but whether two commits belong to the
//! same person is decided by email. A name already owned by a different email is
//! treated as a different person and gets a distinguished key.
//!
//! Before a commit is applied, its prior state is looked up under the author
//! email first and the resolved key second. A suffixed key never reads the
//! unsuffixed entry, which belongs to somebody else. The email lookup can still
//! hit an entry other than the one being written (the email is used as somebody's
//! display name); [`PriorState::source_key`] reports where the state came from so
//! callers can flag it.

use tracing::debug;

use crate::model::{Contributor, ContributorMap};

pub const DUPLICATE_MARKER: &str = "(duplicate)";

/// Returns the key a commit by `name` / `email` should be recorded under.
///
/// First seen wins: the unsuffixed name stays with the email that claimed it.
pub fn resolve_identity(name: &str, email: &str, contributors: &ContributorMap) -> String {
    let collides = contributors
        .get(name)
        .is_some_and(|contributor| contributor.email != email);
    if collides {
        debug!(name, email, "Display name already claimed by another email");
        format!("{name}{DUPLICATE_MARKER}")
    } else {
        name.to_string()
    }
}

/// Aggregate state carried forward into a commit's update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorState {
    /// Map key the state was read from.
    pub source_key: String,
    pub contributions_count: u64,
    pub repos_contributed_to: Vec<String>,
}

/// Looks up existing state for a commit author, email key before the key
/// returned by [`resolve_identity`].
///
/// The returned value is a copy; the map is never touched here.
pub fn prior_state(key: &str, email: &str, contributors: &ContributorMap) -> Option<PriorState> {
    let (source_key, contributor) = contributors
        .get_key_value(email)
        .or_else(|| contributors.get_key_value(key))?;
    Some(PriorState {
        source_key: source_key.clone(),
        contributions_count: contributor.contributions_count,
        repos_contributed_to: contributor.repos_contributed_to.clone(),
    })
}

/// Builds the contributor entry for one commit from its prior state.
pub fn next_state(prior: Option<PriorState>, email: &str, label: &str) -> Contributor {
    let (contributions_count, mut repos_contributed_to) = match prior {
        Some(PriorState {
            contributions_count,
            repos_contributed_to,
            ..
        }) => (contributions_count + 1, repos_contributed_to),
        None => (1, Vec::new()),
    };
    if !repos_contributed_to.iter().any(|repo| repo == label) {
        repos_contributed_to.push(label.to_string());
    }
    Contributor {
        email: email.to_string(),
        contributions_count,
        repos_contributed_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(name: &str, email: &str, count: u64, repos: &[&str]) -> ContributorMap {
        let mut map = ContributorMap::new();
        map.insert(
            name.to_string(),
            Contributor {
                email: email.to_string(),
                contributions_count: count,
                repos_contributed_to: repos.iter().map(|r| r.to_string()).collect(),
            },
        );
        map
    }

    #[test]
    fn same_name_same_email_keeps_plain_key() {
        let map = map_with("Ada", "ada@example.com", 3, &["org/a(private)"]);
        assert_eq!(resolve_identity("Ada", "ada@example.com", &map), "Ada");
    }

    #[test]
    fn same_name_other_email_is_suffixed() {
        let map = map_with("Ada", "ada@example.com", 3, &["org/a(private)"]);
        assert_eq!(resolve_identity("Ada", "ada@other.org", &map), "Ada(duplicate)");
    }

    #[test]
    fn unknown_name_is_returned_unchanged() {
        assert_eq!(resolve_identity("Grace", "g@example.com", &ContributorMap::new()), "Grace");
    }

    #[test]
    fn email_key_takes_precedence_over_name_key() {
        let mut map = map_with("Ada", "ada@example.com", 3, &["org/a(private)"]);
        map.insert(
            "ada@example.com".to_string(),
            Contributor {
                email: "ada@example.com".to_string(),
                contributions_count: 7,
                repos_contributed_to: vec!["org/b(public)".to_string()],
            },
        );
        let prior = prior_state("Ada", "ada@example.com", &map).unwrap();
        assert_eq!(prior.source_key, "ada@example.com");
        assert_eq!(prior.contributions_count, 7);
    }

    #[test]
    fn suffixed_key_does_not_read_the_unsuffixed_entry() {
        let mut map = map_with("Sam", "sam@one.example", 4, &["o/a(private)"]);
        let key = resolve_identity("Sam", "sam@two.example", &map);
        assert_eq!(prior_state(&key, "sam@two.example", &map), None);

        map.insert(
            key.clone(),
            Contributor {
                email: "sam@two.example".to_string(),
                contributions_count: 2,
                repos_contributed_to: vec!["o/b(public)".to_string()],
            },
        );
        let prior = prior_state(&key, "sam@two.example", &map).unwrap();
        assert_eq!(prior.source_key, "Sam(duplicate)");
        assert_eq!(prior.contributions_count, 2);
        assert_eq!(prior.repos_contributed_to, vec!["o/b(public)".to_string()]);
    }

    #[test]
    fn next_state_dedups_labels_and_counts() {
        let prior = Some(PriorState {
            source_key: "Ada".to_string(),
            contributions_count: 1,
            repos_contributed_to: vec!["org/a(private)".to_string()],
        });
        let next = next_state(prior, "ada@example.com", "org/a(private)");
        assert_eq!(next.contributions_count, 2);
        assert_eq!(next.repos_contributed_to, vec!["org/a(private)".to_string()]);

        let fresh = next_state(None, "ada@example.com", "org/b(public)");
        assert_eq!(fresh.contributions_count, 1);
        assert_eq!(fresh.repos_contributed_to, vec!["org/b(public)".to_string()]);
    }
}
