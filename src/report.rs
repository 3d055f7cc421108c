//! CSV rendering of an aggregation: the production [`ReportEmitter`].
//!
//! Two files are written into the output directory:
//! - `contributor-breakdown.csv`: `author` followed by one column per discovered
//!   extension (discovery order); one row per author email, `0` when untouched.
//! - `contributors.csv`: `name,email,contributions,repositories`, in key order,
//!   repositories joined with `;`.

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use crate::contract::{EmitError, ReportEmitter};
use crate::extensions::ExtensionTable;
use crate::model::ContributorMap;

pub const BREAKDOWN_FILE: &str = "contributor-breakdown.csv";
pub const CONTRIBUTORS_FILE: &str = "contributors.csv";

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = fields
        .into_iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    out
}

/// Extension breakdown table, header row first.
pub fn breakdown_csv(extensions: &ExtensionTable) -> String {
    let mut out = line(std::iter::once("author").chain(extensions.discovered().iter().map(String::as_str)));
    for (author, counts) in extensions.rows() {
        out.push_str(&line(
            std::iter::once(author.to_string()).chain(counts.iter().map(u64::to_string)),
        ));
    }
    out
}

pub fn contributors_csv(contributors: &ContributorMap) -> String {
    let mut out = line(["name", "email", "contributions", "repositories"]);
    for (name, contributor) in contributors {
        out.push_str(&line([
            name.clone(),
            contributor.email.clone(),
            contributor.contributions_count.to_string(),
            contributor.repos_contributed_to.join(";"),
        ]));
    }
    out
}

pub struct CsvReportEmitter {
    output_dir: PathBuf,
}

impl CsvReportEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn write(&self, file_name: &str, content: &str) -> Result<(), EmitError> {
        let path = self.output_dir.join(file_name);
        fs::write(&path, content).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to write report file");
            Box::new(e) as EmitError
        })?;
        info!(path = %path.display(), "Wrote report file");
        Ok(())
    }
}

#[async_trait]
impl ReportEmitter for CsvReportEmitter {
    async fn emit(
        &self,
        contributors: &ContributorMap,
        extensions: &ExtensionTable,
    ) -> Result<(), EmitError> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).map_err(|e| {
                error!(error = ?e, path = %self.output_dir.display(), "Failed to create output directory");
                Box::new(e) as EmitError
            })?;
        }
        self.write(CONTRIBUTORS_FILE, &contributors_csv(contributors))?;
        self.write(BREAKDOWN_FILE, &breakdown_csv(extensions))
    }
}
