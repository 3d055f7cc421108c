//! GitLab v4 endpoint URLs used by the resolvers and the aggregator.
//!
//! Path components such as `org/sub/repo` are pushed as a single segment, which
//! percent-encodes the slashes the way the API expects for namespaced ids.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;

use crate::contract::FetchError;

const PER_PAGE: &str = "100";

fn endpoint(host: &str, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = Url::parse(host).map_err(|_| FetchError::InvalidUrl(host.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(host.to_string()))?;
        path.pop_if_empty().extend(["api", "v4"]).extend(segments);
    }
    Ok(url)
}

fn paged(mut url: Url) -> Url {
    url.query_pairs_mut().append_pair("per_page", PER_PAGE);
    url
}

/// Whether `host` is the public gitlab.com instance rather than a self-managed one.
pub fn is_public_instance(host: &str) -> bool {
    Url::parse(host)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == "gitlab.com" || h.ends_with(".gitlab.com")))
        .unwrap_or(false)
}

pub fn current_user(host: &str) -> Result<String, FetchError> {
    Ok(endpoint(host, &["user"])?.to_string())
}

/// Searches every group available to the credential, not only memberships.
pub fn group_search(host: &str, query: &str) -> Result<String, FetchError> {
    let mut url = endpoint(host, &["groups"])?;
    url.query_pairs_mut()
        .append_pair("all_available", "true")
        .append_pair("search", query);
    Ok(url.to_string())
}

pub fn group_projects(host: &str, group_full_path: &str) -> Result<String, FetchError> {
    Ok(paged(endpoint(host, &["groups", group_full_path, "projects"])?).to_string())
}

pub fn user_projects(host: &str, user_id: u64) -> Result<String, FetchError> {
    let id = user_id.to_string();
    Ok(paged(endpoint(host, &["users", id.as_str(), "projects"])?).to_string())
}

/// All projects the credential can see. gitlab.com lists every public project on
/// the instance, so there the listing is restricted to memberships.
pub fn visible_projects(host: &str) -> Result<String, FetchError> {
    let mut url = paged(endpoint(host, &["projects"])?);
    if is_public_instance(host) {
        url.query_pairs_mut().append_pair("membership", "true");
    }
    Ok(url.to_string())
}

pub fn project(host: &str, path_with_namespace: &str) -> Result<String, FetchError> {
    Ok(endpoint(host, &["projects", path_with_namespace])?.to_string())
}

pub fn commits_since(
    host: &str,
    path_with_namespace: &str,
    since: &DateTime<Utc>,
) -> Result<String, FetchError> {
    let mut url = endpoint(host, &["projects", path_with_namespace, "repository", "commits"])?;
    url.query_pairs_mut()
        .append_pair("since", &since.to_rfc3339_opts(SecondsFormat::Secs, true))
        .append_pair("per_page", PER_PAGE);
    Ok(url.to_string())
}

pub fn commit_diff(host: &str, path_with_namespace: &str, sha: &str) -> Result<String, FetchError> {
    Ok(endpoint(
        host,
        &["projects", path_with_namespace, "repository", "commits", sha, "diff"],
    )?
    .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn namespaced_paths_are_encoded_as_one_segment() {
        assert_eq!(
            group_projects("https://gitlab.com/", "acme/platform").unwrap(),
            "https://gitlab.com/api/v4/groups/acme%2Fplatform/projects?per_page=100"
        );
        assert_eq!(
            commit_diff("https://git.example.org", "org/repo", "abc123").unwrap(),
            "https://git.example.org/api/v4/projects/org%2Frepo/repository/commits/abc123/diff"
        );
    }

    #[test]
    fn membership_filter_only_on_public_instance() {
        assert!(visible_projects("https://gitlab.com/")
            .unwrap()
            .ends_with("membership=true"));
        assert_eq!(
            visible_projects("https://git.internal.example").unwrap(),
            "https://git.internal.example/api/v4/projects?per_page=100"
        );
    }

    #[test]
    fn commits_query_carries_window_start() {
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            commits_since("https://gitlab.com", "org/repo", &since).unwrap(),
            "https://gitlab.com/api/v4/projects/org%2Frepo/repository/commits?since=2024-01-01T00%3A00%3A00Z&per_page=100"
        );
    }

    #[test]
    fn group_search_encodes_query() {
        assert_eq!(
            group_search("https://gitlab.com/", "my team").unwrap(),
            "https://gitlab.com/api/v4/groups?all_available=true&search=my+team"
        );
    }

    #[test]
    fn rejects_unparseable_host() {
        assert!(matches!(current_user("not a url"), Err(FetchError::InvalidUrl(_))));
    }
}
