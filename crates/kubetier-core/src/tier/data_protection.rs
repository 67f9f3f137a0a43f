use super::{begin, Tier};
use crate::component::Component;
use crate::context::InstallContext;
use crate::error::Result;
use crate::report::TierReport;
use crate::status;

/// Tier 2: backup and object storage. Namespaces are reserved so summary,
/// cleanup and validate already cover them.
pub struct DataProtectionTier;

impl Tier for DataProtectionTier {
    fn number(&self) -> u8 {
        2
    }

    fn name(&self) -> &'static str {
        "Data protection"
    }

    fn rationale(&self) -> &'static str {
        "Backups and restore targets before anything stateful is trusted."
    }

    fn implemented(&self) -> bool {
        false
    }

    fn namespaces(&self) -> &'static [&'static str] {
        &["velero", "minio"]
    }

    fn components(&self) -> &'static [Component] {
        &[]
    }

    fn install(&self, ctx: &mut InstallContext) -> Result<TierReport> {
        let report = begin(self, ctx, 0);
        status::warn("Tier 2 is not yet implemented; nothing to install");
        Ok(report)
    }
}
