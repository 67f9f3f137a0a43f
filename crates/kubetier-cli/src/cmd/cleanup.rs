use kubetier_core::poll::SystemClock;
use kubetier_core::tier;
use kubetier_core::{status, InstallContext};
use std::path::Path;

/// Tear down in reverse tier order. Removal errors never fail the command.
pub fn run(root: &Path, tier: Option<u8>) -> anyhow::Result<()> {
    let tiers = tier::select(tier)?;
    let (config, cluster) = super::connect(root)?;
    let ctx = InstallContext::new(root, &config, &cluster, &SystemClock);

    for t in tiers.iter().rev() {
        t.cleanup(&ctx);
    }
    status::success("Cleanup finished");
    Ok(())
}
