use chrono::{DateTime, Months, Utc};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::model::Target;

/// Everything one `count` invocation needs, after file, flags and env are merged.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: Target,
    /// Commits created on or after this instant are counted.
    pub since: DateTime<Utc>,
    pub output_dir: PathBuf,
}

impl RunConfig {
    pub fn trace_loaded(&self) {
        self.target.trace_loaded();
        info!(
            since = %self.since,
            output_dir = %self.output_dir.display(),
            "Loaded run configuration"
        );
        debug!(scope = ?self.target.scope, "Run configuration scope (full debug)");
    }
}

/// Start of the default window: three months before `now`.
pub fn default_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(3)).unwrap_or(now)
}
