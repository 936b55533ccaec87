//! Implementation of the `ship check` command.
//!
//! Resolves a release without writing anything, showing which platforms
//! would be built and where reused binaries would come from.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use shipshape_lib::config::ReleaseConfig;
use shipshape_lib::mapping::SourceOutcome;
use shipshape_lib::publish::{PublishRequest, Publisher};
use shipshape_lib::resolve::{PlanReason, Provision, ResolutionPlan, Settlement};

use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

pub fn cmd_check(config: &ReleaseConfig, version: &str, force_reuse: bool, output: OutputFormat) -> Result<()> {
  let publisher = Publisher::from_config(config)?;
  let mut request = PublishRequest::new(version);
  request.force_reuse = force_reuse;

  let report = publisher.check(&request).context("Check failed")?;

  if output.is_json() {
    print_json(&report)?;
    return Ok(());
  }

  print_info(&format!("Release {}", version));
  print_stat("Fingerprint", report.fingerprint.short());
  print_plan(&report.plan, &report.settlement);

  let builds = report.plan.builds().len();
  println!();
  if builds == 0 {
    print_info("No builds needed");
  } else {
    print_info(&format!("{} platform(s) need a build", builds));
  }

  Ok(())
}

pub(crate) fn describe_reason(plan: &ResolutionPlan) -> String {
  let source = plan.reuse_source.as_deref().unwrap_or("the latest release");
  match plan.reason {
    PlanReason::FirstRelease => "first release".to_string(),
    PlanReason::ContentChanged => "content changed".to_string(),
    PlanReason::ContentUnchanged => format!("content unchanged since {}", source),
    PlanReason::Forced => format!("reuse forced from {}", source),
  }
}

/// One line per platform: built here, or reused from which folder.
pub(crate) fn print_plan(plan: &ResolutionPlan, settlement: &Settlement) {
  print_stat("Decision", &describe_reason(plan));
  println!();

  for entry in &settlement.platforms {
    match &entry.provision {
      Provision::Upload => println!(
        "  {} {} {}",
        symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
        entry.platform,
        "(build)".if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
      Provision::Existing { outcome, .. } => {
        let note = match outcome {
          SourceOutcome::Verified => String::new(),
          SourceOutcome::Repaired { stale: Some(stale) } => format!(" (repaired, was {})", stale),
          SourceOutcome::Repaired { stale: None } => " (recovered from history)".to_string(),
          SourceOutcome::Fallback { .. } => " (unverified fallback)".to_string(),
        };
        let symbol = if note.is_empty() { symbols::INFO } else { symbols::MODIFY };
        println!(
          "  {} {} {} {}{}",
          symbol.if_supports_color(Stream::Stdout, |s| s.cyan()),
          entry.platform,
          symbols::ARROW,
          entry.authoritative,
          note.if_supports_color(Stream::Stdout, |s| s.yellow())
        );
      }
    }
  }
}
