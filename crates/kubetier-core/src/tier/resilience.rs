use super::{begin, Tier};
use crate::component::Component;
use crate::context::InstallContext;
use crate::error::Result;
use crate::report::TierReport;
use crate::status;

/// Tier 4: fault injection. Reserved namespaces only.
pub struct ResilienceTier;

impl Tier for ResilienceTier {
    fn number(&self) -> u8 {
        4
    }

    fn name(&self) -> &'static str {
        "Chaos & resilience"
    }

    fn rationale(&self) -> &'static str {
        "Break things on purpose once the rest can observe and recover."
    }

    fn implemented(&self) -> bool {
        false
    }

    fn namespaces(&self) -> &'static [&'static str] {
        &["chaos-mesh", "litmus"]
    }

    fn components(&self) -> &'static [Component] {
        &[]
    }

    fn install(&self, ctx: &mut InstallContext) -> Result<TierReport> {
        let report = begin(self, ctx, 0);
        status::warn("Tier 4 is not yet implemented; nothing to install");
        Ok(report)
    }
}
