//! Runtime configuration.
//!
//! Every field has a default, so an empty (or absent) TOML file is a valid
//! configuration. The CLI layers environment variables and flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::release::ReleaseSpec;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Overrides the release-metadata endpoint of the [`ReleaseSpec`].
    pub release_url: Option<String>,
    /// Overrides [`crate::USER_AGENT`].
    pub user_agent: Option<String>,
    /// Overrides [`crate::paths::default_work_dir`].
    pub work_dir: Option<PathBuf>,
    /// Redirects followed before a download is abandoned.
    pub max_redirects: usize,
    pub connect_timeout_secs: u64,
    /// Applies to the whole release-metadata request.
    pub request_timeout_secs: u64,
    /// A download fails once no body bytes arrived for this long.
    pub idle_timeout_secs: u64,
    pub extract_timeout_secs: u64,
    /// Unset means the companion may run for as long as it likes.
    pub launch_timeout_secs: Option<u64>,
    /// Replaces the platform extraction tool. The archive name is appended
    /// as the last argument.
    pub extract_command: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            release_url: None,
            user_agent: None,
            work_dir: None,
            max_redirects: 5,
            connect_timeout_secs: 30,
            request_timeout_secs: 60,
            idle_timeout_secs: 300,
            extract_timeout_secs: 300,
            launch_timeout_secs: None,
            extract_command: None,
        }
    }
}

impl Config {
    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn release_url<'a>(&'a self, release: &'a ReleaseSpec) -> &'a str {
        self.release_url.as_deref().unwrap_or(&release.metadata_url)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(crate::USER_AGENT)
    }

    pub fn work_dir(&self, release: &ReleaseSpec) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| crate::paths::default_work_dir(&release.display_name))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn launch_timeout(&self) -> Option<Duration> {
        self.launch_timeout_secs.map(Duration::from_secs)
    }

    /// HTTP client shared by every request of a run.
    ///
    /// Automatic redirects are off; the downloader follows them itself with
    /// a bounded hop count.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent())
            .connect_timeout(self.connect_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
    }
}
