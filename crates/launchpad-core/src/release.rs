//! Description of the companion release this bootstrapper fetches.

use launchpad_schema::{DigestError, ExpectedHashes, Sha512Digest, Target};

/// Name the companion goes by in logs and diagnostics.
pub const PACKAGES_ACTION_DISPLAY_NAME: &str = "PackagesAction";

const PACKAGES_ACTION_RELEASE_URL: &str =
    "https://api.github.com/repos/Ma-Vin/packages-action-app/releases/tags/v1.0";

const PACKAGES_ACTION_LINUX_AMD64: &str = "db412e6353e3fb963da7418b0f05c75d13e16c519a3dd479eb573ead48e02dee9e43efb4bfd23678c486a0940311372b55a4edb9f1df94753073d34d894f19a4";
const PACKAGES_ACTION_LINUX_ARM64: &str = "39e7e45b66c708b2a9ff49dd2ac6e255d0cf8e0a52fcc81286e1a8b9ee44bc2cce4f258f752aa68888525656bac10fe16ff3cb33b8c77ce5f555cee9e5040ca8";
const PACKAGES_ACTION_WINDOWS_AMD64: &str = "7f17d7d622117182b266b9bf5d1f98973f67e0a890fccad567a6a85e166f9b282c978f6ab1b6f776a453a0552345929fae24c765fb3f725ec20dad32688c3988";
const PACKAGES_ACTION_WINDOWS_ARM64: &str = "9bc43ea26c21fc69665d98d60bcd6287205893116251a9ce93f35bcb73016dd6a99b140bd967481de4055bb1cb8cc432b7c9a87a4a9a8e54cd9082a1423c80ac";

/// A version-pinned upstream release and the digests its executables must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpec {
    /// Project name used as the stem of every asset file name.
    pub project: String,
    /// Human-readable name, used in logs and for the working directory name.
    pub display_name: String,
    /// Release-metadata endpoint, including the version tag.
    pub metadata_url: String,
    /// Expected executable digest per target.
    pub hashes: ExpectedHashes,
}

impl ReleaseSpec {
    /// The `packages-action` v1.0 release.
    pub fn packages_action() -> Result<Self, DigestError> {
        Ok(Self {
            project: "packages-action".to_string(),
            display_name: PACKAGES_ACTION_DISPLAY_NAME.to_string(),
            metadata_url: PACKAGES_ACTION_RELEASE_URL.to_string(),
            hashes: ExpectedHashes {
                linux_amd64: Sha512Digest::new(PACKAGES_ACTION_LINUX_AMD64)?,
                linux_arm64: Sha512Digest::new(PACKAGES_ACTION_LINUX_ARM64)?,
                windows_amd64: Sha512Digest::new(PACKAGES_ACTION_WINDOWS_AMD64)?,
                windows_arm64: Sha512Digest::new(PACKAGES_ACTION_WINDOWS_ARM64)?,
            },
        })
    }

    /// Digest the executable for `target` must hash to.
    pub fn expected_hash(&self, target: &Target) -> &Sha512Digest {
        self.hashes.for_target(target)
    }
}
