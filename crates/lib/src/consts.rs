/// Config file looked up in the project root when `--config` is not given.
pub const CONFIG_FILENAME: &str = "shipshape.toml";

/// Overrides `store.location` from the config file.
pub const STORE_ENV: &str = "SHIPSHAPE_STORE";

/// Overrides `store.public_url` from the config file.
pub const PUBLIC_URL_ENV: &str = "SHIPSHAPE_PUBLIC_URL";

/// Number of hex characters shown when a fingerprint is abbreviated.
pub const SHORT_HASH_LEN: usize = 8;
