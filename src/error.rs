//! Error taxonomy for the sync pipeline.
//!
//! Configuration, catalog and state errors abort the run; acquisition and
//! tag errors are isolated per item by the callers.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("catalog request failed: {0}")]
    Catalog(String),

    #[error("download failed for \"{query}\": {reason}")]
    Acquisition { query: String, reason: String },

    #[error("cannot access {path}: {source}")]
    Folder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("state file {path}: {reason}")]
    State { path: PathBuf, reason: String },

    #[error("tagging {file}: {reason}")]
    Tag { file: String, reason: String },
}
