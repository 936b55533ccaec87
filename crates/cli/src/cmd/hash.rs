use anyhow::Result;
use serde::Serialize;

use shipshape_lib::config::ReleaseConfig;
use shipshape_lib::fingerprint::{ContentFingerprint, collect_sources, fingerprint_files};

use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Debug, Serialize)]
struct HashOutput {
  fingerprint: ContentFingerprint,
  files: Vec<String>,
}

pub fn cmd_hash(config: &ReleaseConfig, output: OutputFormat) -> Result<()> {
  let sources = config.source_set();
  let files = collect_sources(&sources);
  let fingerprint = fingerprint_files(&sources.root, &files);

  if output.is_json() {
    print_json(&HashOutput { fingerprint, files })?;
  } else {
    println!("{}", fingerprint);
    print_stat("Files", &files.len().to_string());
  }

  Ok(())
}
