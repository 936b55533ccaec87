//! Key layout of the release bucket.
//!
//! These names are read by installers and other consumers, so they must not
//! change.

use crate::platform::PlatformTarget;
use crate::version::is_release_version;

/// Prefix under which every versioned object lives.
pub const RELEASES_PREFIX: &str = "releases/";

/// Global binary mapping at the bucket root.
pub const BINARY_MAPPING_KEY: &str = "binary-mapping.json";

/// Plain-text pointer to the current version.
pub const LATEST_VERSION_KEY: &str = "latest-version.txt";

/// Installer script mirrored at the bucket root.
pub const INSTALL_SCRIPT_KEY: &str = "install.sh";

const METADATA_FILENAME: &str = "metadata.json";

/// Folder holding everything published for `version`: `releases/v<version>`.
pub fn version_dir(version: &str) -> String {
  format!("{}v{}", RELEASES_PREFIX, version)
}

/// `releases/v<version>/<binary>-<platform>`
pub fn artifact_key(version: &str, platform: PlatformTarget, binary_name: &str) -> String {
  format!("{}/{}", version_dir(version), platform.artifact_name(binary_name))
}

/// `releases/v<version>/metadata.json`
pub fn metadata_key(version: &str) -> String {
  format!("{}/{}", version_dir(version), METADATA_FILENAME)
}

/// Extracts the version from `releases/v<version>/<artifact_name>`.
///
/// Returns `None` for keys of any other shape, for other artifacts, and for
/// folders whose name is not a release version.
pub fn parse_artifact_key<'a>(key: &'a str, artifact_name: &str) -> Option<&'a str> {
  let rest = key.strip_prefix(RELEASES_PREFIX)?.strip_prefix('v')?;
  let (version, file) = rest.split_once('/')?;
  if file != artifact_name || !is_release_version(version) {
    return None;
  }
  Some(version)
}
