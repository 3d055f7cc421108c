//! Contributor aggregation: walks projects → commits → diffs and accumulates the
//! contributor map and the extension touch table.
//!
//! # Flow
//! 1. Resolve the target into projects ([`crate::projects::resolve_projects`]).
//! 2. For every project, list commits created on or after the window start.
//! 3. For every commit, carry forward prior state, resolve the display key and,
//!    unless the author is excluded, write the contributor entry and count the
//!    extension of every file in the commit's diff.
//!
//! # Failure isolation
//! A project's commits and diffs are all fetched before any of them is applied
//! to the running aggregates. A failed commit or diff fetch therefore leaves no
//! contributions from that project behind. Nothing here aborts the run: the
//! result is always well-formed, possibly partial, with the absorbed failures
//! listed in [`Aggregation::degraded`].
//!
//! Projects, commits and diffs are visited strictly one after another.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::api;
use crate::contract::{FetchError, PagedFetcher};
use crate::extensions::{extension_token, ExtensionTable};
use crate::identity::{next_state, prior_state, resolve_identity};
use crate::model::{decode_records, Commit, ContributorMap, Degradation, DiffEntry, Project, Target};
use crate::projects::{fetch_project_details, resolve_projects};

/// Commits from addresses with this suffix are never counted.
pub const NOREPLY_SUFFIX: &str = "@users.noreply.github.com";
/// Automation account whose commits are never counted.
pub const BOT_EMAIL: &str = "snyk-bot@snyk.io";

pub fn is_excluded(email: &str) -> bool {
    email.ends_with(NOREPLY_SUFFIX) || email == BOT_EMAIL
}

/// Result of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub contributors: ContributorMap,
    pub extensions: ExtensionTable,
    pub projects_scanned: usize,
    pub degraded: Vec<Degradation>,
}

impl Aggregation {
    pub fn is_partial(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Running aggregates owned by one run.
#[derive(Debug, Default)]
struct Tally {
    contributors: ContributorMap,
    extensions: ExtensionTable,
}

/// Everything read from one project, not yet applied. Excluded commits carry no
/// diff since theirs is never fetched.
struct ProjectScan {
    label: String,
    commits: Vec<(Commit, Option<Vec<DiffEntry>>)>,
}

impl ProjectScan {
    fn apply(self, tally: &mut Tally) -> usize {
        let applied = self.commits.len();
        for (commit, diff) in self.commits {
            if record_commit(&mut tally.contributors, &commit, &self.label).is_none() {
                continue;
            }
            if let Some(diff) = diff {
                record_diff(&mut tally.extensions, &commit.author_email, &diff);
            }
        }
        applied
    }
}

/// Applies one commit's identity update to `contributors`.
///
/// Returns the key the commit was recorded under, or `None` for an excluded
/// author, in which case nothing was written.
pub fn record_commit(contributors: &mut ContributorMap, commit: &Commit, label: &str) -> Option<String> {
    let name = commit.author_name.as_str();
    let email = commit.author_email.as_str();

    if is_excluded(email) {
        debug!(commit = %commit.id, email, "Skipping excluded author");
        return None;
    }

    let key = resolve_identity(name, email, contributors);
    let prior = prior_state(&key, email, contributors);

    if let Some(prior) = &prior {
        if prior.source_key != key {
            warn!(
                read_from = %prior.source_key,
                written_to = %key,
                email,
                "Contributor state carried over from a different entry than the one being updated"
            );
        }
    }

    contributors.insert(key.clone(), next_state(prior, email, label));
    Some(key)
}

/// Counts every file of a diff against `author_email`.
pub fn record_diff(extensions: &mut ExtensionTable, author_email: &str, diff: &[DiffEntry]) {
    for entry in diff {
        extensions.record(author_email, extension_token(&entry.old_path));
    }
}

pub struct Aggregator<'a, F: ?Sized> {
    fetcher: &'a F,
    target: &'a Target,
    since: DateTime<Utc>,
}

impl<'a, F> Aggregator<'a, F>
where
    F: PagedFetcher + ?Sized,
{
    pub fn new(fetcher: &'a F, target: &'a Target, since: DateTime<Utc>) -> Self {
        Self {
            fetcher,
            target,
            since,
        }
    }

    pub async fn run(&self) -> Aggregation {
        info!(since = %self.since, "Starting contributor aggregation");
        let mut degraded = Vec::new();
        let projects = resolve_projects(self.fetcher, self.target, &mut degraded).await;

        let mut tally = Tally::default();
        let mut projects_scanned = 0;
        for project in projects {
            let project = self.complete(project, &mut degraded).await;
            match self.scan_project(&project).await {
                Ok(scan) => {
                    let commits = scan.apply(&mut tally);
                    info!(project = %project.path_with_namespace, commits, "Scanned project");
                    projects_scanned += 1;
                }
                Err(e) => {
                    error!(
                        error = %e,
                        project = %project.path_with_namespace,
                        "Failed to retrieve commits from GitLab"
                    );
                    degraded.push(Degradation::new(
                        format!("project:{}", project.path_with_namespace),
                        &e,
                    ));
                }
            }
        }

        info!(
            projects_scanned,
            contributors = tally.contributors.len(),
            extensions = tally.extensions.discovered().len(),
            degraded = degraded.len(),
            "Contributor aggregation finished"
        );
        Aggregation {
            contributors: tally.contributors,
            extensions: tally.extensions,
            projects_scanned,
            degraded,
        }
    }

    /// Projects given only by path carry no id or visibility; look them up.
    async fn complete(&self, project: Project, degraded: &mut Vec<Degradation>) -> Project {
        if project.id.is_some() {
            return project;
        }
        match fetch_project_details(self.fetcher, self.target, &project).await {
            Ok(details) => details,
            Err(e) => {
                warn!(
                    error = %e,
                    project = %project.path_with_namespace,
                    "Failed to retrieve project details, scanning without visibility"
                );
                degraded.push(Degradation::new(
                    format!("project-details:{}", project.path_with_namespace),
                    &e,
                ));
                project
            }
        }
    }

    async fn scan_project(&self, project: &Project) -> Result<ProjectScan, FetchError> {
        let path = project.path_with_namespace.as_str();
        debug!(project = path, id = ?project.id, "Fetching commits for project");

        let url = api::commits_since(&self.target.url, path, &self.since)?;
        let values = self
            .fetcher
            .fetch_all_pages(&url, &self.target.token, path)
            .await?;
        let commits: Vec<Commit> = decode_records(values, path);

        let mut scanned = Vec::with_capacity(commits.len());
        for commit in commits {
            if is_excluded(&commit.author_email) {
                scanned.push((commit, None));
                continue;
            }
            let diff_url = api::commit_diff(&self.target.url, path, &commit.id)?;
            let context = format!("{path}/{}/diff", commit.id);
            let values = self
                .fetcher
                .fetch_all_pages(&diff_url, &self.target.token, &context)
                .await?;
            let diff: Vec<DiffEntry> = decode_records(values, &context);
            scanned.push((commit, Some(diff)));
        }
        Ok(ProjectScan {
            label: project.label(),
            commits: scanned,
        })
    }
}

/// Runs one aggregation over `target` for commits since `since`.
pub async fn aggregate<F>(fetcher: &F, target: &Target, since: DateTime<Utc>) -> Aggregation
where
    F: PagedFetcher + ?Sized,
{
    Aggregator::new(fetcher, target, since).run().await
}
