//! Implementation of the `ship publish` command.
//!
//! Runs the full release pipeline against the configured store and prints
//! where the release landed. With `--mapping-out`, the updated binary mapping
//! is also written locally so a CI job can archive it.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use shipshape_lib::config::ReleaseConfig;
use shipshape_lib::publish::{PublishRequest, Publisher};

use crate::cmd::check::print_plan;
use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_success, print_warning};

pub struct PublishArgs {
  pub version: String,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub force_reuse: bool,
  pub mapping_out: Option<PathBuf>,
}

pub fn cmd_publish(config: &ReleaseConfig, args: PublishArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let publisher = Publisher::from_config(config)?;

  let mut request = PublishRequest::new(args.version);
  request.summary = args.summary;
  request.description = args.description;
  request.force_reuse = args.force_reuse;

  let report = publisher
    .publish(&request)
    .with_context(|| format!("Publishing {} failed", request.version))?;

  if let Some(path) = &args.mapping_out {
    let json = serde_json::to_string_pretty(report.mapping()).context("Failed to serialize binary mapping")?;
    fs::write(path, json).with_context(|| format!("Failed to write mapping to {}", path.display()))?;
    info!(path = %path.display(), "binary mapping written");
  }

  if output.is_json() {
    print_json(&report)?;
    return Ok(());
  }

  println!();
  print_success(&format!("Published {}", report.version));
  print_stat("Fingerprint", report.fingerprint.short());
  print_plan(&report.plan, &report.settlement);
  println!();
  print_stat("Binaries uploaded", &report.uploaded.len().to_string());
  print_stat("Installer mirrored", if report.installer_mirrored { "yes" } else { "no" });
  print_stat("Release", &report.release_url);
  print_stat("Duration", &format_duration(start.elapsed()));

  let corrections = report.settlement.corrections().count();
  if corrections > 0 {
    print_warning(&format!("Mapping entries corrected: {}", corrections));
  }

  Ok(())
}
