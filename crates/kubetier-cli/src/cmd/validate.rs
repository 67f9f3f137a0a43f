use crate::output::print_json;
use anyhow::Context;
use kubetier_core::poll::SystemClock;
use kubetier_core::tier;
use kubetier_core::{status, InstallContext};
use std::path::Path;

pub fn run(root: &Path, tier: Option<u8>, json: bool) -> anyhow::Result<()> {
    let tiers = tier::select(tier)?;
    let (config, cluster) = super::connect(root)?;
    let ctx = InstallContext::new(root, &config, &cluster, &SystemClock);

    let mut per_tier = Vec::with_capacity(tiers.len());
    let mut total = 0u32;
    for t in &tiers {
        let issues = t
            .validate(&ctx)
            .with_context(|| format!("failed to validate tier {}", t.number()))?;
        total += issues;
        per_tier.push(serde_json::json!({ "tier": t.number(), "issues": issues }));
    }

    if json {
        print_json(&serde_json::json!({ "tiers": per_tier, "issues": total }))?;
    } else if total == 0 {
        status::success("No issues found");
    }

    if total > 0 {
        anyhow::bail!("{total} namespace(s) with failing pods");
    }
    Ok(())
}
