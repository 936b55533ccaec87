use std::fmt;

/// CPU architectures a release publishes binaries for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arch {
  Amd64,
  Arm64,
}

impl Arch {
  /// Returns the identifier used in artifact names (Go-style naming)
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
      Self::Arm64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
