//! Wire format of the release-metadata endpoint.
//!
//! Only the fields the locator needs are modelled; everything else in the
//! response body is ignored.

use serde::{Deserialize, Serialize};

/// A published release and its downloadable assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    /// Tag the release was published under, if reported.
    #[serde(default)]
    pub tag_name: Option<String>,
    /// Files attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A named downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name of the asset.
    pub name: String,
    /// Asset-specific download endpoint.
    pub url: String,
    /// Size in bytes, if reported.
    #[serde(default)]
    pub size: Option<u64>,
}

impl ReleaseMetadata {
    /// Find the asset whose name equals `name` exactly (case-sensitive).
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}
