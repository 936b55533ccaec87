//! Platform targets a release ships binaries for.
//!
//! The set is fixed at compile time. Every per-platform loop walks
//! [`PlatformTarget::ALL`] so that repeated runs against the same store state
//! visit platforms in the same order and produce identical plans.

pub mod arch;
pub mod os;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use arch::Arch;
pub use os::Os;

/// One OS/architecture combination with its own binary artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformTarget {
  pub os: Os,
  pub arch: Arch,
}

impl PlatformTarget {
  pub const DARWIN_AMD64: Self = Self::new(Os::Darwin, Arch::Amd64);
  pub const DARWIN_ARM64: Self = Self::new(Os::Darwin, Arch::Arm64);
  pub const LINUX_AMD64: Self = Self::new(Os::Linux, Arch::Amd64);
  pub const LINUX_ARM64: Self = Self::new(Os::Linux, Arch::Arm64);
  pub const WINDOWS_AMD64: Self = Self::new(Os::Windows, Arch::Amd64);

  /// Every supported target, in processing order.
  pub const ALL: [Self; 5] = [
    Self::DARWIN_AMD64,
    Self::DARWIN_ARM64,
    Self::LINUX_AMD64,
    Self::LINUX_ARM64,
    Self::WINDOWS_AMD64,
  ];

  pub const fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Key used for this platform in `binary_sources` and `binaries`.
  ///
  /// Windows keys keep their `.exe` suffix (`windows-amd64.exe`) because
  /// installers already read the mapping with that spelling.
  pub fn key(&self) -> String {
    format!("{}-{}{}", self.os, self.arch, self.os.exe_suffix())
  }

  /// File name of the stored binary, e.g. `tool-linux-amd64`.
  pub fn artifact_name(&self, binary_name: &str) -> String {
    format!("{}-{}", binary_name, self.key())
  }

  /// Inverse of [`PlatformTarget::key`].
  pub fn parse(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|p| p.key() == key)
  }
}

impl fmt::Display for PlatformTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.key())
  }
}

impl Serialize for PlatformTarget {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.key())
  }
}

impl<'de> Deserialize<'de> for PlatformTarget {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let key = String::deserialize(deserializer)?;
    Self::parse(&key).ok_or_else(|| serde::de::Error::custom(format!("unknown platform '{}'", key)))
  }
}
