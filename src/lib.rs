#![doc = "gitlab-contributors: count active contributors across GitLab groups and projects."]

//! The library walks groups → projects → commits → diffs over a rolling window,
//! merges author identities into a contributor map and counts the file
//! extensions each author touched.
//!
//! HTTP and file output sit behind the traits in [`contract`], so the
//! aggregation core in [`aggregate`] can be driven by mocks in tests.

pub mod aggregate;
pub mod api;
pub mod cli;
pub mod config;
pub mod contract;
pub mod extensions;
pub mod gitlab;
pub mod groups;
pub mod identity;
pub mod load_config;
pub mod model;
pub mod projects;
pub mod report;

pub use aggregate::{aggregate, Aggregation, Aggregator};
pub use cli::{run, Cli, Commands};
