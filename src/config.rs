//! Config module.
//!
//! This module contains the run configuration shared by the
//! reconciliation engine and the report generator.

use std::{env, path::PathBuf, result};
use thiserror::Error;

use crate::store::RetryPolicy;

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_REPORT_DIR_NAME: &str = "mailvault";

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot expand report directory {1}")]
    ExpandReportDirError(#[source] shellexpand::LookupError<env::VarError>, String),
    #[error("cannot get XDG_DATA_HOME directory")]
    GetDataDirError,
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the configuration of one reconciliation run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReconcileConfig {
    /// Represents the directory the report artifacts are written
    /// to. Shell variables and `~` are expanded. Defaults to the
    /// XDG data directory.
    pub report_dir: Option<String>,
    /// Represents the maximum folder depth the traversals descend
    /// to.
    pub max_depth: usize,
    /// Represents the retry applied to copy operations.
    pub retry: RetryPolicy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            report_dir: None,
            max_depth: DEFAULT_MAX_DEPTH,
            retry: RetryPolicy::default(),
        }
    }
}

impl ReconcileConfig {
    /// Resolves the report directory.
    pub fn report_dir(&self) -> Result<PathBuf> {
        match &self.report_dir {
            Some(dir) => {
                let dir = shellexpand::full(dir)
                    .map_err(|err| Error::ExpandReportDirError(err, dir.clone()))?;
                Ok(PathBuf::from(dir.to_string()))
            }
            None => dirs::data_dir()
                .map(|dir| dir.join(DEFAULT_REPORT_DIR_NAME))
                .ok_or(Error::GetDataDirError),
        }
    }
}
