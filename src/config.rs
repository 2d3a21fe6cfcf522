//! Runtime configuration, resolved once at startup and passed by
//! reference into every component.

use std::env;
use std::path::PathBuf;

use crate::error::SyncError;

/// Everything the operations need. The binary seeds the environment from
/// a `.env` file before calling `from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub playlist: String,
    pub download_dir: PathBuf,
    pub state_file: PathBuf,
}

impl Config {
    /// Resolve all required settings; any missing or blank variable is a
    /// fatal configuration error, reported before any other work.
    pub fn from_env() -> Result<Self, SyncError> {
        Ok(Self {
            client_id: require("SPOTIFY_CLIENT_ID")?,
            client_secret: require("SPOTIFY_CLIENT_SECRET")?,
            playlist: require("PLAYLIST_URL")?,
            download_dir: PathBuf::from(require("DOWNLOAD_FOLDER")?),
            state_file: PathBuf::from(require("STATE_FILE")?),
        })
    }
}

fn require(name: &'static str) -> Result<String, SyncError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SyncError::MissingVar(name)),
    }
}
