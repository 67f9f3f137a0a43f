//! Tiers and the shared install helpers they are built from.
//!
//! A tier is a fixed group of components installed together. Each tier
//! module provides one `Tier` implementation; `all()` returns them in the
//! only order they may be installed.

mod data_protection;
mod resilience;
mod security;
mod zero_trust;

pub use data_protection::DataProtectionTier;
pub use resilience::ResilienceTier;
pub use security::SecurityTier;
pub use zero_trust::ZeroTrustTier;

use crate::cluster::PodCondition;
use crate::component::Component;
use crate::config::FailurePolicy;
use crate::context::InstallContext;
use crate::error::{Result, TierError};
use crate::helm;
use crate::ledger::FailureKind;
use crate::report::{ComponentOutcome, ComponentResult, TierReport};
use crate::status;
use crate::verify::{self, NamespaceStatus};

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

pub trait Tier {
    fn number(&self) -> u8;

    fn name(&self) -> &'static str;

    /// One line on why this tier exists, shown by `tiers` and in headers.
    fn rationale(&self) -> &'static str;

    /// Stub tiers return false; their install is a no-op.
    fn implemented(&self) -> bool {
        true
    }

    fn namespaces(&self) -> &'static [&'static str];

    fn components(&self) -> &'static [Component];

    /// Payload files this tier reads, relative to the values directory.
    fn payloads(&self) -> Vec<&'static str> {
        self.components().iter().filter_map(|c| c.payload).collect()
    }

    fn install(&self, ctx: &mut InstallContext) -> Result<TierReport>;

    /// Print a health badge per namespace. Read-only.
    fn summary(&self, ctx: &InstallContext) -> Result<Vec<NamespaceStatus>> {
        header(self);
        self.namespaces()
            .iter()
            .map(|ns| verify::print_namespace_status(ctx.cluster, ns))
            .collect()
    }

    /// Remove every release in reverse install order, then the namespaces.
    /// Removal errors are logged and ignored.
    fn cleanup(&self, ctx: &InstallContext) {
        header(self);
        for c in self.components().iter().rev() {
            uninstall(ctx, c);
        }
        delete_namespaces(ctx, self.namespaces());
    }

    /// Count namespaces with failing pods. Namespaces that do not exist
    /// are reported as not deployed and are not issues.
    fn validate(&self, ctx: &InstallContext) -> Result<u32> {
        header(self);
        let mut issues = 0;
        for ns in self.namespaces() {
            if !ctx.cluster.namespace_exists(ns)? {
                status::detail(format!("{ns}: not deployed"));
                continue;
            }
            let pods = ctx.cluster.list_pods(ns, None)?;
            let failing: Vec<_> = pods
                .iter()
                .filter(|p| p.condition() == PodCondition::Failing)
                .collect();
            if failing.is_empty() {
                status::success(format!("{ns}: {} pod(s), none failing", pods.len()));
            } else {
                issues += 1;
                status::error(format!("{ns}: {} failing pod(s)", failing.len()));
                for pod in failing {
                    status::detail(pod.listing_line());
                }
            }
        }
        Ok(issues)
    }
}

fn header<T: Tier + ?Sized>(tier: &T) {
    status::header(format!("Tier {}: {}", tier.number(), tier.name()));
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Every tier, in install order.
pub fn all() -> Vec<Box<dyn Tier>> {
    vec![
        Box::new(SecurityTier),
        Box::new(DataProtectionTier),
        Box::new(ZeroTrustTier),
        Box::new(ResilienceTier),
    ]
}

pub fn by_number(n: u8) -> Option<Box<dyn Tier>> {
    all().into_iter().find(|t| t.number() == n)
}

/// `None` selects every tier; `Some(n)` selects exactly tier `n`.
pub fn select(n: Option<u8>) -> Result<Vec<Box<dyn Tier>>> {
    match n {
        None => Ok(all()),
        Some(n) => by_number(n)
            .map(|t| vec![t])
            .ok_or(TierError::UnknownTier(n)),
    }
}

// ---------------------------------------------------------------------------
// Install helpers
// ---------------------------------------------------------------------------

/// Start a tier: print its header, reset progress to `steps`, and return
/// an empty report.
pub fn begin<T: Tier + ?Sized>(tier: &T, ctx: &mut InstallContext, steps: u32) -> TierReport {
    header(tier);
    status::detail(tier.rationale());
    ctx.progress.set_total_steps(steps);
    TierReport::new(tier.number(), tier.name(), tier.implemented())
}

/// Repository setup step. Under `best_effort` a failure is only a warning,
/// since charts may already be cached locally.
pub fn prepare_repositories(ctx: &mut InstallContext, components: &[Component]) -> Result<()> {
    ctx.progress.progress("Configuring Helm repositories");
    match helm::setup_repositories(ctx, components) {
        Ok(()) => Ok(()),
        Err(e) if ctx.policy == FailurePolicy::BestEffort => {
            status::warn(format!("repository setup failed, continuing: {e}"));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Install one component and verify it. Install failures are recorded in
/// the ledger here; verification failures are recorded by `verify_install`.
pub fn install_component(
    ctx: &mut InstallContext,
    component: &Component,
    extra_args: &[&str],
) -> ComponentOutcome {
    ctx.progress.progress(&format!("Installing {}", component.name));
    if let Err(e) = helm::helm_install(ctx, component, extra_args) {
        return install_failed(ctx, component.name, &e);
    }
    let verdict = verify::verify_install(
        ctx,
        component.namespace,
        component.name,
        component.selector,
    );
    ComponentOutcome::new(component.name, ComponentResult::Installed { verdict })
}

pub(crate) fn install_failed(
    ctx: &mut InstallContext,
    name: &str,
    err: &TierError,
) -> ComponentOutcome {
    status::error(format!("{name}: install failed"));
    status::detail(err);
    ctx.ledger.record_failure(name, FailureKind::InstallFailed);
    ComponentOutcome::new(
        name,
        ComponentResult::InstallFailed {
            error: err.to_string(),
        },
    )
}

/// Add `outcome` to the report. Returns false when the failure policy
/// says the tier stops here, in which case `remaining` is marked skipped.
pub fn proceed(
    ctx: &InstallContext,
    report: &mut TierReport,
    outcome: ComponentOutcome,
    remaining: &[&str],
) -> bool {
    let ok = outcome.is_success();
    let name = outcome.component.clone();
    report.push(outcome);
    if ok || ctx.policy == FailurePolicy::BestEffort {
        return true;
    }
    status::error(format!("Stopping tier {} at {name} (fail_fast)", report.tier));
    report.abort(&name, remaining);
    false
}

/// Install `components` in order, honoring the failure policy. Returns
/// false if the tier was aborted.
pub fn install_all(
    ctx: &mut InstallContext,
    report: &mut TierReport,
    components: &[Component],
) -> bool {
    for (i, c) in components.iter().enumerate() {
        let outcome = install_component(ctx, c, &[]);
        let remaining: Vec<&str> = components[i + 1..].iter().map(|c| c.name).collect();
        if !proceed(ctx, report, outcome, &remaining) {
            return false;
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Cleanup helpers
// ---------------------------------------------------------------------------

pub(crate) fn uninstall(ctx: &InstallContext, component: &Component) {
    status::info(format!("Removing {}", component.name));
    if let Err(e) = ctx.cluster.helm_uninstall(component.release, component.namespace) {
        tracing::debug!(release = component.release, error = %e, "uninstall failed, ignoring");
    }
}

pub(crate) fn delete_namespaces(ctx: &InstallContext, namespaces: &[&str]) {
    for ns in namespaces {
        status::info(format!("Deleting namespace '{ns}'"));
        if let Err(e) = ctx.cluster.delete_namespace(ns) {
            tracing::debug!(namespace = ns, error = %e, "namespace delete failed, ignoring");
        }
    }
}
