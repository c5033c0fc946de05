//! Integrity checks on the extracted executable.
//!
//! Two independent checks, both always attempted:
//!
//! 1. the hash manifest shipped in the archive contains `sha512: <expected> `
//! 2. the SHA-512 of the executable equals the expected digest
//!
//! Every failing check is reported in one [`VerifyError`].

use std::io::Read;
use std::path::{Path, PathBuf};

use launchpad_schema::Sha512Digest;
use sha2::{Digest, Sha512};
use thiserror::Error;

/// One failed integrity check.
#[derive(Error, Debug)]
pub enum HashCheckFailure {
    #[error("cannot read hash manifest {}: {source}", .path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected hash value not found in {}", .path.display())]
    ManifestEntryMissing { path: PathBuf },

    #[error("cannot read executable {}: {source}", .path.display())]
    ExecutableUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected hash value not determined at {}: got {actual}", .path.display())]
    DigestMismatch { path: PathBuf, actual: String },
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("hash verification failed: {}", join_failures(.0))]
    HashMismatch(Vec<HashCheckFailure>),
}

impl VerifyError {
    pub fn failures(&self) -> &[HashCheckFailure] {
        match self {
            Self::HashMismatch(failures) => failures,
        }
    }
}

fn join_failures(failures: &[HashCheckFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check that the manifest at `path` contains the literal entry for `expected`.
pub async fn check_manifest(path: &Path, expected: &Sha512Digest) -> Result<(), HashCheckFailure> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| HashCheckFailure::ManifestUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let entry = expected.manifest_entry();
    if contains(&data, entry.as_bytes()) {
        Ok(())
    } else {
        Err(HashCheckFailure::ManifestEntryMissing {
            path: path.to_path_buf(),
        })
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Stream `path` through SHA-512 and return the lowercase hex digest.
pub async fn sha512_file(path: &Path) -> std::io::Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut hasher = Sha512::new();
        let mut file = std::fs::File::open(&path)?;
        let mut buffer = [0u8; 8192];
        loop {
            let count = file.read(&mut buffer)?;
            if count == 0 {
                break;
            }
            hasher.update(&buffer[..count]);
        }
        Ok::<String, std::io::Error>(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(std::io::Error::other)?
}

/// Check that the executable at `path` hashes to `expected`, returning the
/// computed digest.
pub async fn check_executable(
    path: &Path,
    expected: &Sha512Digest,
) -> Result<String, HashCheckFailure> {
    let actual = sha512_file(path)
        .await
        .map_err(|source| HashCheckFailure::ExecutableUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    if expected.matches(&actual) {
        Ok(actual)
    } else {
        Err(HashCheckFailure::DigestMismatch {
            path: path.to_path_buf(),
            actual,
        })
    }
}

/// Run both checks and fail if either does.
pub async fn verify(
    manifest: &Path,
    executable: &Path,
    expected: &Sha512Digest,
) -> Result<(), VerifyError> {
    tracing::info!("check hash values");

    let mut failures = Vec::new();
    if let Err(failure) = check_manifest(manifest, expected).await {
        tracing::warn!("{failure}");
        failures.push(failure);
    }
    match check_executable(executable, expected).await {
        Ok(actual) => tracing::debug!("sha512 of {} is {actual}", executable.display()),
        Err(failure) => {
            tracing::warn!("{failure}");
            failures.push(failure);
        }
    }

    if failures.is_empty() {
        tracing::info!("hash verify done");
        Ok(())
    } else {
        Err(VerifyError::HashMismatch(failures))
    }
}
