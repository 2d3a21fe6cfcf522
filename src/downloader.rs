//! Audio acquisition through the external yt-dlp downloader.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SyncError;

const DOWNLOADER_BIN: &str = "yt-dlp";

/// Acquisition collaborator: given a search query, retrieves one
/// best-matching audio source into the output directory.
pub struct Downloader {
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Search for the query and extract the best hit as an MP3 named after
    /// the source title. Reports success or failure only; failure reasons
    /// are not classified further.
    pub fn fetch(&self, query: &str) -> Result<(), SyncError> {
        let template = self.output_dir.join("%(title)s.%(ext)s");
        let output = Command::new(DOWNLOADER_BIN)
            .arg("--no-playlist")
            .arg("--quiet")
            .args(["--format", "bestaudio/best"])
            .arg("--extract-audio")
            .args(["--audio-format", "mp3"])
            .args(["--audio-quality", "0"])
            .arg("--output")
            .arg(&template)
            .arg(format!("ytsearch1:{query}"))
            .output()
            .map_err(|e| SyncError::Acquisition {
                query: query.to_string(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("downloader exited with failure")
                .trim()
                .to_string();
            Err(SyncError::Acquisition {
                query: query.to_string(),
                reason,
            })
        }
    }
}
