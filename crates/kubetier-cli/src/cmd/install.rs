use crate::output::print_json;
use anyhow::Context;
use kubetier_core::config::FailurePolicy;
use kubetier_core::poll::SystemClock;
use kubetier_core::{io, orchestrator, tier, InstallContext};
use std::path::Path;

pub fn run(
    root: &Path,
    tier: Option<u8>,
    fail_fast: bool,
    report: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let tiers = tier::select(tier)?;
    let (config, cluster) = super::connect(root)?;

    let mut ctx = InstallContext::new(root, &config, &cluster, &SystemClock);
    if fail_fast {
        ctx = ctx.with_policy(FailurePolicy::FailFast);
    }

    let summary = orchestrator::run_install(&mut ctx, &tiers);

    if let Some(path) = report {
        let data = serde_json::to_vec_pretty(&summary)?;
        io::atomic_write(path, &data)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    if json {
        print_json(&summary)?;
    } else {
        orchestrator::print_summary(&summary);
    }

    if !summary.succeeded() {
        anyhow::bail!(
            "{} component failure(s){}",
            summary.failures.len(),
            if summary.aborted.is_some() {
                ", run stopped early"
            } else {
                ""
            }
        );
    }
    Ok(())
}
