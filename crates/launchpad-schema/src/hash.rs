//! SHA-512 digest newtype and the per-target digest table.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::target::{Arch, Platform, Target};

/// Length of a hex-encoded SHA-512 digest.
pub const SHA512_HEX_LEN: usize = 128;

/// Error returned when a string is not a valid SHA-512 hex digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The hex portion has the wrong length.
    #[error("Invalid SHA512 digest: expected 128 hex characters, got {len} in '{value}'")]
    Length {
        /// Number of characters found.
        len: usize,
        /// Offending input.
        value: String,
    },
    /// The input contains characters outside `[0-9a-fA-F]`.
    #[error("Invalid SHA512 digest: contains non-hex characters in '{0}'")]
    NonHex(String),
}

/// A validated SHA-512 digest (128 hex characters, stored lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha512Digest(String);

impl Sha512Digest {
    /// Create a new `Sha512Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha512:` prefix.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        let hex = s.strip_prefix("sha512:").unwrap_or(&s).trim();

        if hex.len() != SHA512_HEX_LEN {
            return Err(DigestError::Length {
                len: hex.len(),
                value: s.clone(),
            });
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(s.clone()));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Get the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against another hex digest, ignoring case.
    pub fn matches(&self, hex: &str) -> bool {
        self.0.eq_ignore_ascii_case(hex)
    }

    /// The exact line fragment a hash manifest must contain for this digest,
    /// trailing space included: `sha512: <hex> `.
    pub fn manifest_entry(&self) -> String {
        format!("sha512: {} ", self.0)
    }
}

impl<'de> Deserialize<'de> for Sha512Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha512Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha512Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Sha512Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The expected executable digest for each supported target.
///
/// One field per target, so a target without a digest cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedHashes {
    /// Digest of the `linux/amd64` executable.
    pub linux_amd64: Sha512Digest,
    /// Digest of the `linux/arm64` executable.
    pub linux_arm64: Sha512Digest,
    /// Digest of the `windows/amd64` executable.
    pub windows_amd64: Sha512Digest,
    /// Digest of the `windows/arm64` executable.
    pub windows_arm64: Sha512Digest,
}

impl ExpectedHashes {
    /// Select the digest published for `target`.
    pub fn for_target(&self, target: &Target) -> &Sha512Digest {
        match (target.platform, target.arch) {
            (Platform::Linux, Arch::Amd64) => &self.linux_amd64,
            (Platform::Linux, Arch::Arm64) => &self.linux_arm64,
            (Platform::Windows, Arch::Amd64) => &self.windows_amd64,
            (Platform::Windows, Arch::Arm64) => &self.windows_arm64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_of(c: char) -> String {
        std::iter::repeat_n(c, SHA512_HEX_LEN).collect()
    }

    #[test]
    fn digest_is_normalised_to_lowercase() {
        let d = Sha512Digest::new(hex_of('A')).unwrap();
        assert_eq!(d.as_str(), hex_of('a'));
        assert!(d.matches(&hex_of('A')));
        assert!(d.matches(&hex_of('a')));
        assert!(!d.matches(&hex_of('b')));
    }

    #[test]
    fn digest_accepts_prefix() {
        let d = Sha512Digest::new(format!("sha512:{}", hex_of('1'))).unwrap();
        assert_eq!(d.as_str(), hex_of('1'));
    }

    #[test]
    fn digest_rejects_bad_input() {
        assert!(matches!(
            Sha512Digest::new("abc"),
            Err(DigestError::Length { len: 3, .. })
        ));
        assert!(matches!(
            Sha512Digest::new(hex_of('z')),
            Err(DigestError::NonHex(_))
        ));
        // A SHA256 digest is not accepted in place of a SHA512 one.
        assert!(Sha512Digest::new("0".repeat(64)).is_err());
    }

    #[test]
    fn manifest_entry_has_trailing_space() {
        let d = Sha512Digest::new(hex_of('f')).unwrap();
        assert_eq!(d.manifest_entry(), format!("sha512: {} ", hex_of('f')));
    }

    #[test]
    fn digest_deserializes_with_validation() {
        let ok: Sha512Digest = serde_json::from_str(&format!("\"{}\"", hex_of('c'))).unwrap();
        assert_eq!(ok.as_str(), hex_of('c'));
        assert!(serde_json::from_str::<Sha512Digest>("\"nothex\"").is_err());
    }

    #[test]
    fn each_target_selects_its_own_digest() {
        let hashes = ExpectedHashes {
            linux_amd64: Sha512Digest::new(hex_of('1')).unwrap(),
            linux_arm64: Sha512Digest::new(hex_of('2')).unwrap(),
            windows_amd64: Sha512Digest::new(hex_of('3')).unwrap(),
            windows_arm64: Sha512Digest::new(hex_of('4')).unwrap(),
        };
        let selected: Vec<&str> = Target::ALL
            .iter()
            .map(|t| hashes.for_target(t).as_str())
            .collect();
        assert_eq!(
            selected,
            vec![
                hex_of('1').as_str(),
                hex_of('2').as_str(),
                hex_of('3').as_str(),
                hex_of('4').as_str()
            ]
        );
    }
}
