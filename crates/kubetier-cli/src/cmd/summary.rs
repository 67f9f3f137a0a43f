use crate::output::print_json;
use kubetier_core::poll::SystemClock;
use kubetier_core::tier;
use kubetier_core::verify::NamespaceStatus;
use kubetier_core::InstallContext;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct TierSummary {
    tier: u8,
    name: &'static str,
    namespaces: Vec<NamespaceStatus>,
}

pub fn run(root: &Path, tier: Option<u8>, json: bool) -> anyhow::Result<()> {
    let tiers = tier::select(tier)?;
    let (config, cluster) = super::connect(root)?;
    let ctx = InstallContext::new(root, &config, &cluster, &SystemClock);

    let mut out = Vec::with_capacity(tiers.len());
    for t in &tiers {
        out.push(TierSummary {
            tier: t.number(),
            name: t.name(),
            namespaces: t.summary(&ctx)?,
        });
    }

    if json {
        print_json(&out)?;
    }
    Ok(())
}
