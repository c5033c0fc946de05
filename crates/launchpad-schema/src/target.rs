//! Host platform and architecture resolution.
//!
//! A [`Target`] is derived once from host introspection and then passed to
//! every stage by value. Only four combinations exist:
//! `{linux, windows} x {amd64, arm64}`.

use thiserror::Error;

/// Error returned when the host is not one of the supported targets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The host operating system or CPU architecture has no release asset.
    #[error("unsupported platform {os} and arch {arch}")]
    Unsupported {
        /// Operating system as reported by the host.
        os: String,
        /// CPU architecture as reported by the host.
        arch: String,
    },
}

/// Operating system family of a release asset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Any Linux distribution.
    Linux,
    /// Microsoft Windows.
    Windows,
}

impl Platform {
    /// Canonical name used in asset file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Suffix appended to the executable name on this platform.
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Self::Linux => "",
            Self::Windows => ".exe",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" | "win32" => Ok(Self::Windows),
            _ => Err(format!("Unknown platform: {s}")),
        }
    }
}

/// CPU architecture of a release asset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit x86 (`x86_64`, `x64`).
    Amd64,
    /// 64-bit ARM (`aarch64`).
    Arm64,
}

impl Arch {
    /// Canonical name used in asset file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "x64" | "amd64" => Ok(Self::Amd64),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

/// The resolved `(platform, arch)` pair describing the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Target {
    /// Operating system family.
    pub platform: Platform,
    /// CPU architecture.
    pub arch: Arch,
}

impl Target {
    /// Every target a release is published for.
    pub const ALL: [Target; 4] = [
        Target::new(Platform::Linux, Arch::Amd64),
        Target::new(Platform::Linux, Arch::Arm64),
        Target::new(Platform::Windows, Arch::Amd64),
        Target::new(Platform::Windows, Arch::Arm64),
    ];

    /// Build a target from its parts.
    pub const fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }

    /// Map host-reported OS and architecture names onto a supported target.
    ///
    /// Accepts both Rust (`x86_64`, `aarch64`) and Node-style (`x64`,
    /// `win32`) spellings.
    pub fn from_host(os: &str, arch: &str) -> Result<Self, TargetError> {
        let unsupported = || TargetError::Unsupported {
            os: os.to_string(),
            arch: arch.to_string(),
        };
        let platform = os.parse::<Platform>().map_err(|_| unsupported())?;
        let arch = arch.parse::<Arch>().map_err(|_| unsupported())?;
        Ok(Self::new(platform, arch))
    }

    /// Resolve the target of the running process.
    pub fn current() -> Result<Self, TargetError> {
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Derive the release file names for `project` on this target.
    pub fn asset_names(&self, project: &str) -> AssetNames {
        let stem = format!("{project}-{}-{}", self.platform, self.arch);
        AssetNames {
            archive: format!("{stem}.zip"),
            executable: format!("{stem}{}", self.platform.executable_suffix()),
            manifest: format!("{stem}-hash.txt"),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.platform, self.arch)
    }
}

/// File names of one release target: the archive and what it unpacks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetNames {
    /// Release asset to download, e.g. `proj-linux-amd64.zip`.
    pub archive: String,
    /// Executable contained in the archive, e.g. `proj-windows-amd64.exe`.
    pub executable: String,
    /// Hash manifest contained in the archive, e.g. `proj-linux-amd64-hash.txt`.
    pub manifest: String,
}
