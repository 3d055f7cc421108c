use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const GITLAB_DEFAULT_URL: &str = "https://gitlab.com/";

/// What to scan. Exactly one scope is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetScope {
    /// A single project addressed by its path with namespace, e.g. `org/repo`.
    Project(String),
    /// One or more group identifiers; may be partial or display names.
    Groups(Vec<String>),
    /// Every project the credential can see.
    AllVisible,
}

/// Host, credential and scope of one contributor count.
#[derive(Debug, Clone)]
pub struct Target {
    pub url: String,
    pub token: String,
    pub scope: TargetScope,
}

impl Target {
    pub fn new(url: impl Into<String>, token: impl Into<String>, scope: TargetScope) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            scope,
        }
    }

    pub fn trace_loaded(&self) {
        let scope = match &self.scope {
            TargetScope::Project(_) => "project",
            TargetScope::Groups(_) => "groups",
            TargetScope::AllVisible => "all_visible",
        };
        info!(url = %self.url, scope, token_set = !self.token.is_empty(), "Loaded target");
    }
}

/// A group returned by the group search. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub full_path: String,
}

/// A project to scan. Only `path_with_namespace` is guaranteed; the single-project
/// path starts with nothing else filled in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Project {
    pub path_with_namespace: String,
    pub id: Option<u64>,
    pub visibility: Option<String>,
    pub default_branch: Option<String>,
}

impl Project {
    pub fn from_path(path_with_namespace: impl Into<String>) -> Self {
        Self {
            path_with_namespace: path_with_namespace.into(),
            ..Default::default()
        }
    }

    /// The `path(visibility)` label recorded in a contributor's repository list.
    pub fn label(&self) -> String {
        format!(
            "{}({})",
            self.path_with_namespace,
            self.visibility.as_deref().unwrap_or("unknown")
        )
    }
}

/// Deserializes every value that matches `T`, dropping the ones that do not.
pub(crate) fn decode_records<T: DeserializeOwned>(
    values: Vec<serde_json::Value>,
    context: &str,
) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, context, "Dropping malformed record");
                None
            }
        })
        .collect()
}

/// Raw project record as the API returns it; converted to [`Project`] only when
/// both the path and the id are present.
#[derive(Debug, Deserialize)]
pub(crate) struct ProjectRecord {
    pub path_with_namespace: Option<String>,
    pub id: Option<u64>,
    pub visibility: Option<String>,
    pub default_branch: Option<String>,
}

impl ProjectRecord {
    pub(crate) fn into_project(self) -> Option<Project> {
        match (self.path_with_namespace, self.id) {
            (Some(path), Some(id)) if !path.is_empty() => Some(Project {
                path_with_namespace: path,
                id: Some(id),
                visibility: self.visibility,
                default_branch: self.default_branch,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub full_path: Option<String>,
}

impl GroupRecord {
    pub(crate) fn into_group(self) -> Option<Group> {
        match (self.id, self.name, self.full_path) {
            (Some(id), Some(name), Some(full_path)) if !name.is_empty() && !full_path.is_empty() => {
                Some(Group {
                    id,
                    name,
                    full_path,
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
}

/// One changed file of a commit diff. The old path is authoritative, also for
/// renames and newly created files.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffEntry {
    pub old_path: String,
}

/// Aggregate state for one display identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub email: String,
    pub contributions_count: u64,
    /// Distinct `path(visibility)` labels in order of first appearance.
    pub repos_contributed_to: Vec<String>,
}

/// Contributors keyed by display identity; iteration is always in key order.
pub type ContributorMap = BTreeMap<String, Contributor>;

/// A fetch failure that was absorbed: the result is complete except for `scope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub scope: String,
    pub reason: String,
}

impl Degradation {
    pub fn new(scope: impl Into<String>, reason: &impl std::fmt::Display) -> Self {
        Self {
            scope: scope.into(),
            reason: reason.to_string(),
        }
    }
}
