//! Implementation of the `ship status` command.
//!
//! Shows the latest release and checks that every platform claim in the
//! binary mapping points at an object that exists.

use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::{OwoColorize, Stream};

use shipshape_lib::config::ReleaseConfig;
use shipshape_lib::publish::Publisher;

use crate::output::{
  OutputFormat, format_age, print_info, print_json, print_stat, print_success, print_warning, symbols,
};

pub fn cmd_status(config: &ReleaseConfig, output: OutputFormat) -> Result<()> {
  let publisher = Publisher::from_config(config)?;
  let report = publisher.status().context("Failed to read store state")?;

  if output.is_json() {
    print_json(&report)?;
    return Ok(());
  }

  match &report.latest {
    Some(latest) => {
      print_success(&format!("Latest release: {}", latest.version));
      print_stat("Created", &latest.created_at.to_rfc3339());
      print_stat("Fingerprint", latest.content_hash.short());
      if let Some(summary) = &latest.release_summary {
        print_stat("Summary", summary);
      }
    }
    None => {
      print_info("No releases published yet.");
    }
  }

  if let Some(updated) = report.mapping.last_updated {
    let age = (Utc::now() - updated).to_std().unwrap_or_default();
    print_stat("Mapping updated", &format!("{} ago", format_age(age)));
  }

  println!();
  println!("Binaries:");
  for platform in &report.platforms {
    match (&platform.claim, platform.present) {
      (Some(version), true) => println!(
        "  {} {} {} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        platform.platform,
        symbols::ARROW,
        version
      ),
      (Some(version), false) => println!(
        "  {} {} {} {} {}",
        symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()),
        platform.platform,
        symbols::ARROW,
        version,
        "(missing)".if_supports_color(Stream::Stdout, |s| s.red())
      ),
      (None, _) => println!(
        "  {} {} {}",
        symbols::WARNING.if_supports_color(Stream::Stdout, |s| s.yellow()),
        platform.platform,
        "(unmapped)".if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
    }
  }

  if report.latest.is_some() && !report.is_consistent() {
    println!();
    print_warning("Binary mapping is out of sync; the next publish will repair it");
  }

  Ok(())
}
