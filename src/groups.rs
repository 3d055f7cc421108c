//! Group expansion: turns a user-supplied group name (possibly partial) into the
//! matching groups and their canonical full paths.

use tracing::{debug, error, info};

use crate::api;
use crate::contract::{FetchError, PagedFetcher};
use crate::model::{decode_records, Degradation, Group, GroupRecord};

/// Searches the host's group directory for `query`.
///
/// Records missing any of id, name or full path are dropped.
pub async fn search_groups<F>(
    fetcher: &F,
    host: &str,
    token: &str,
    query: &str,
) -> Result<Vec<Group>, FetchError>
where
    F: PagedFetcher + ?Sized,
{
    let url = api::group_search(host, query)?;
    let values = fetcher.fetch_all_pages(&url, token, "Groups").await?;
    let total = values.len();
    let groups: Vec<Group> = decode_records::<GroupRecord>(values, "Groups")
        .into_iter()
        .filter_map(GroupRecord::into_group)
        .collect();
    if groups.len() < total {
        debug!(query, dropped = total - groups.len(), "Dropped incomplete group records");
    }
    Ok(groups)
}

/// Like [`search_groups`], but a failed search is logged, noted in `degraded`
/// and yields no groups.
pub async fn expand_groups<F>(
    fetcher: &F,
    host: &str,
    token: &str,
    query: &str,
    degraded: &mut Vec<Degradation>,
) -> Vec<Group>
where
    F: PagedFetcher + ?Sized,
{
    match search_groups(fetcher, host, token, query).await {
        Ok(groups) => {
            info!(query, found = groups.len(), "Expanded group query");
            groups
        }
        Err(e) => {
            error!(error = %e, query, "Failed to retrieve groups from GitLab");
            degraded.push(Degradation::new(format!("groups:{query}"), &e));
            Vec::new()
        }
    }
}
