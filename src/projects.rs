//! Project resolution: turns a [`Target`] into the concrete list of projects to scan.
//!
//! # Sources per scope
//! - `Project(path)`: exactly that project, nothing else filled in.
//! - `Groups(queries)`: every query is expanded to matching groups; projects of
//!   each group's canonical path are listed, followed by the projects owned by
//!   the authenticated user.
//! - `AllVisible`: every project the credential can see (memberships only on
//!   gitlab.com).
//!
//! Each source is fetched independently. A failed source is logged and adds no
//! projects; the others are still listed. Groups matched by several queries are
//! listed once, and a project reached through several sources is kept at its
//! first appearance only, so no project is scanned twice.

use std::collections::HashSet;

use tracing::{debug, error, info};

use crate::api;
use crate::contract::{FetchError, PagedFetcher};
use crate::groups::expand_groups;
use crate::model::{decode_records, CurrentUser, Degradation, Project, ProjectRecord, Target, TargetScope};

pub async fn resolve_projects<F>(
    fetcher: &F,
    target: &Target,
    degraded: &mut Vec<Degradation>,
) -> Vec<Project>
where
    F: PagedFetcher + ?Sized,
{
    let host = target.url.as_str();
    let sources: Vec<(String, Result<String, FetchError>)> = match &target.scope {
        TargetScope::Project(path) => {
            info!(project = %path, "Counting contributors for single project");
            return vec![Project::from_path(path.clone())];
        }
        TargetScope::Groups(queries) => {
            let mut group_paths: Vec<String> = Vec::new();
            for query in queries {
                for group in expand_groups(fetcher, host, &target.token, query, degraded).await {
                    if !group_paths.contains(&group.full_path) {
                        group_paths.push(group.full_path);
                    }
                }
            }
            info!(groups = group_paths.len(), "Resolved group queries");

            let mut sources: Vec<_> = group_paths
                .iter()
                .map(|path| (format!("group:{path}"), api::group_projects(host, path)))
                .collect();
            match current_user(fetcher, target).await {
                Ok(user) => sources.push((
                    format!("user:{}", user.id),
                    api::user_projects(host, user.id),
                )),
                Err(e) => {
                    error!(error = %e, "Failed to retrieve current user from GitLab");
                    degraded.push(Degradation::new("user", &e));
                }
            }
            sources
        }
        TargetScope::AllVisible => vec![("visible".to_string(), api::visible_projects(host))],
    };

    let mut projects: Vec<Project> = Vec::new();
    let mut seen = HashSet::new();
    for (scope, url) in sources {
        let listed = match url {
            Ok(url) => list_projects(fetcher, &url, &target.token).await,
            Err(e) => Err(e),
        };
        match listed {
            Ok(found) => {
                info!(scope = %scope, found = found.len(), "Listed projects");
                for project in found {
                    if seen.insert(project.path_with_namespace.clone()) {
                        projects.push(project);
                    } else {
                        debug!(project = %project.path_with_namespace, scope = %scope, "Skipping project already listed");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, scope = %scope, "Failed to retrieve project list from GitLab");
                degraded.push(Degradation::new(format!("projects:{scope}"), &e));
            }
        }
    }
    info!(projects = projects.len(), "Found projects");
    projects
}

/// Lists projects at `url`, keeping only records with both a path and an id.
pub async fn list_projects<F>(fetcher: &F, url: &str, token: &str) -> Result<Vec<Project>, FetchError>
where
    F: PagedFetcher + ?Sized,
{
    let values = fetcher.fetch_all_pages(url, token, "Projects").await?;
    Ok(decode_records::<ProjectRecord>(values, "Projects")
        .into_iter()
        .filter_map(ProjectRecord::into_project)
        .collect())
}

async fn current_user<F>(fetcher: &F, target: &Target) -> Result<CurrentUser, FetchError>
where
    F: PagedFetcher + ?Sized,
{
    let url = api::current_user(&target.url)?;
    let values = fetcher.fetch_all_pages(&url, &target.token, "User").await?;
    decode_records::<CurrentUser>(values, "User")
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Decode {
            url,
            reason: "no user record in response".to_string(),
        })
}

/// Fills id, visibility and default branch of a project known only by path.
pub async fn fetch_project_details<F>(
    fetcher: &F,
    target: &Target,
    project: &Project,
) -> Result<Project, FetchError>
where
    F: PagedFetcher + ?Sized,
{
    let url = api::project(&target.url, &project.path_with_namespace)?;
    let context = project.path_with_namespace.as_str();
    let values = fetcher.fetch_all_pages(&url, &target.token, context).await?;
    decode_records::<ProjectRecord>(values, context)
        .into_iter()
        .find_map(ProjectRecord::into_project)
        .ok_or_else(|| FetchError::Decode {
            url,
            reason: "no project record in response".to_string(),
        })
}
