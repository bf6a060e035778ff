use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::SiteInfoError;
use crate::loader::load_file;
use crate::model::{SiteDefinition, LOCAL_SOURCE};

/// Outcome of fetching one external source.
#[derive(Debug)]
pub struct SourceLoad {
    /// Locator the definitions came from; becomes their `sourceUrl`.
    pub source: String,
    pub result: Result<Vec<SiteDefinition>, SiteInfoError>,
}

impl SourceLoad {
    pub fn new(source: impl Into<String>, result: Result<Vec<SiteDefinition>, SiteInfoError>) -> Self {
        Self {
            source: source.into(),
            result,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// Merged definition list plus what went wrong producing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub definitions: Vec<SiteDefinition>,
    pub failures: Vec<SourceFailure>,
    pub last_updated: DateTime<Utc>,
}

impl MergeReport {
    pub fn total(&self) -> usize {
        self.definitions.len()
    }

    pub fn external_count(&self) -> usize {
        self.definitions.iter().filter(|def| !def.is_local()).count()
    }
}

/// Concatenate external batches (configured order) followed by the local one.
///
/// Every definition is stamped with its provenance. A failed source adds
/// nothing and is recorded in the report; the others are unaffected. There
/// is no precedence between sources: overlapping patterns all survive.
pub fn merge_sources(
    external: Vec<SourceLoad>,
    local: Option<Result<Vec<SiteDefinition>, SiteInfoError>>,
) -> MergeReport {
    let mut definitions = Vec::new();
    let mut failures = Vec::new();

    for load in external {
        match load.result {
            Ok(batch) => definitions.extend(batch.into_iter().map(|mut def| {
                def.source_url = load.source.clone();
                def
            })),
            Err(err) => {
                error!(source = %load.source, "siteinfo source rejected: {err}");
                failures.push(SourceFailure {
                    source: load.source,
                    reason: err.to_string(),
                });
            }
        }
    }

    match local {
        Some(Ok(batch)) => definitions.extend(batch.into_iter().map(|mut def| {
            def.source_url = LOCAL_SOURCE.to_string();
            def
        })),
        Some(Err(err)) => {
            error!("local siteinfo rejected: {err}");
            failures.push(SourceFailure {
                source: LOCAL_SOURCE.to_string(),
                reason: err.to_string(),
            });
        }
        None => {}
    }

    let report = MergeReport {
        definitions,
        failures,
        last_updated: Utc::now(),
    };
    info!(
        total = report.total(),
        failed = report.failures.len(),
        "siteinfo merge completed"
    );
    report
}

/// Load every configured file source plus the optional local file and merge.
pub fn merge_files(sources: &[String], local: Option<&Path>) -> MergeReport {
    let external = sources
        .iter()
        .map(|source| SourceLoad::new(source.clone(), load_file(source)))
        .collect();
    merge_sources(external, local.map(|path| load_file(path)))
}
