//! Top-level error of a bootstrap run

use std::path::PathBuf;

use launchpad_schema::TargetError;
use thiserror::Error;

use crate::io::download::DownloadError;
use crate::io::extract::ExtractError;
use crate::io::locate::LocateError;
use crate::launch::LaunchError;
use crate::verify::VerifyError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    UnsupportedPlatform(#[from] TargetError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to determine asset url: {0}")]
    Locate(#[from] LocateError),

    #[error("Failed to prepare working directory {}: {source}", .path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Unpack failed: {0}")]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("Launch failed: {0}")]
    Launch(#[from] LaunchError),
}

impl Error {
    /// Short name of the stage that failed, for diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform(_) => "resolve",
            Self::Client(_) | Self::Locate(_) => "locate",
            Self::WorkDir { .. } | Self::Download(_) => "download",
            Self::Extract(_) => "extract",
            Self::Verify(_) => "verify",
            Self::Launch(_) => "launch",
        }
    }
}
