use std::fmt;

/// Operating systems a release publishes binaries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
  Darwin,
  Linux,
  Windows,
}

impl Os {
  /// Returns the identifier used in artifact names
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Darwin => "darwin",
      Self::Linux => "linux",
      Self::Windows => "windows",
    }
  }

  /// File suffix carried by executables on this OS
  pub fn exe_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".exe",
      _ => "",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
