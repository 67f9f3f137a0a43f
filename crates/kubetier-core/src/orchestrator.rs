//! Runs tier installs in order and folds the ledger into a run summary.

use chrono::Utc;

use crate::context::InstallContext;
use crate::report::RunSummary;
use crate::status;
use crate::tier::Tier;

/// Install `tiers` in the order given. A tier that returns an error, or
/// one that aborted under `fail_fast`, ends the run.
pub fn run_install(ctx: &mut InstallContext, tiers: &[Box<dyn Tier>]) -> RunSummary {
    let started_at = Utc::now();
    let mut reports = Vec::new();
    let mut aborted = None;

    for tier in tiers {
        tracing::debug!(tier = tier.number(), "installing tier");
        match tier.install(ctx) {
            Ok(report) => {
                if let Some(at) = &report.aborted_at {
                    aborted = Some(format!("tier {} stopped at {at}", tier.number()));
                }
                reports.push(report);
            }
            Err(e) => {
                status::error(format!("Tier {} failed: {e}", tier.number()));
                aborted = Some(format!("tier {}: {e}", tier.number()));
            }
        }
        if aborted.is_some() {
            break;
        }
    }

    RunSummary {
        started_at,
        finished_at: Utc::now(),
        policy: ctx.policy,
        tiers: reports,
        failures: ctx.ledger.entries().to_vec(),
        aborted,
    }
}

pub fn print_summary(summary: &RunSummary) {
    status::header("Installation summary");
    let elapsed = summary.finished_at - summary.started_at;
    status::detail(format!(
        "{} tier(s) in {}s, policy {}",
        summary.tiers.len(),
        elapsed.num_seconds(),
        summary.policy.as_str()
    ));

    if summary.failures.is_empty() {
        status::success("No component failures recorded");
    } else {
        status::error(format!(
            "{} component(s) need attention:",
            summary.failures.len()
        ));
        for entry in &summary.failures {
            status::detail(format!("{}: {}", entry.component, entry.kind));
        }
    }
    if let Some(reason) = &summary.aborted {
        status::warn(format!("Run stopped early: {reason}"));
    }
}
