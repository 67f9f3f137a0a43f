//! Tier 3: certificates, service mesh, and secret delivery.
//!
//! Istio is the one multi-phase install. Its CRDs come from a separate
//! chart and the control plane chart fails to render until the API server
//! has established them, so the sequence is: `istio-base`, wait for every
//! `*.istio.io` CRD to report `Established`, `istiod` with pod
//! verification, and finally the mesh-wide mTLS policy.

use std::time::Duration;

use super::{begin, delete_namespaces, install_component, install_failed, prepare_repositories};
use super::{proceed, uninstall, Tier};
use crate::cluster::ObjectQuery;
use crate::component::{Component, HelmRepo};
use crate::context::InstallContext;
use crate::error::Result;
use crate::helm;
use crate::report::{ComponentOutcome, ComponentResult, TierReport};
use crate::status;
use crate::verify;

const JETSTACK_REPO: HelmRepo = HelmRepo {
    name: "jetstack",
    url: "https://charts.jetstack.io",
};
const ISTIO_REPO: HelmRepo = HelmRepo {
    name: "istio",
    url: "https://istio-release.storage.googleapis.com/charts",
};
const EXTERNAL_SECRETS_REPO: HelmRepo = HelmRepo {
    name: "external-secrets",
    url: "https://charts.external-secrets.io",
};

pub const CERT_MANAGER: Component = Component {
    name: "cert-manager",
    release: "cert-manager",
    chart: "jetstack/cert-manager",
    repo: JETSTACK_REPO,
    version: None,
    namespace: "cert-manager",
    payload: Some("tier3/cert-manager.yaml"),
    timeout: Duration::from_secs(300),
    selector: None,
    args: &["--set", "crds.enabled=true"],
};

pub const ISTIO_BASE: Component = Component {
    name: "Istio base",
    release: "istio-base",
    chart: "istio/base",
    repo: ISTIO_REPO,
    version: None,
    namespace: "istio-system",
    payload: None,
    timeout: Duration::from_secs(300),
    selector: None,
    args: &["--set", "defaultRevision=default"],
};

pub const ISTIOD: Component = Component {
    name: "Istio control plane",
    release: "istiod",
    chart: "istio/istiod",
    repo: ISTIO_REPO,
    version: None,
    namespace: "istio-system",
    payload: Some("tier3/istiod.yaml"),
    timeout: Duration::from_secs(600),
    selector: Some("app=istiod"),
    args: &[],
};

pub const EXTERNAL_SECRETS: Component = Component {
    name: "External Secrets",
    release: "external-secrets",
    chart: "external-secrets/external-secrets",
    repo: EXTERNAL_SECRETS_REPO,
    version: None,
    namespace: "external-secrets",
    payload: Some("tier3/external-secrets.yaml"),
    timeout: Duration::from_secs(300),
    selector: None,
    args: &["--set", "installCRDs=true"],
};

const COMPONENTS: &[Component] = &[CERT_MANAGER, ISTIO_BASE, ISTIOD, EXTERNAL_SECRETS];

pub const ISTIO_CRDS: ObjectQuery = ObjectQuery {
    resource: "customresourcedefinitions",
    name_suffix: ".istio.io",
    condition: "Established",
};

/// Ledger name for the CRD wait, kept distinct from the release so one
/// Istio problem never shows up twice under the same name.
const ISTIO_CRDS_NAME: &str = "Istio CRDs";

const MESH_POLICY: &str = "Mesh mTLS policy";
const MESH_POLICY_PAYLOAD: &str = "tier3/peer-authentication.yaml";

pub struct ZeroTrustTier;

impl ZeroTrustTier {
    /// Phase one: the CRD chart, then the established-CRD wait.
    fn install_istio_base(&self, ctx: &mut InstallContext) -> ComponentOutcome {
        ctx.progress
            .progress(&format!("Installing {} (CRDs)", ISTIO_BASE.name));
        if let Err(e) = helm::helm_install(ctx, &ISTIO_BASE, &[]) {
            return install_failed(ctx, ISTIO_BASE.name, &e);
        }
        let ready = verify::wait_for_objects(ctx, ISTIO_CRDS_NAME, &ISTIO_CRDS);
        ComponentOutcome::new(ISTIO_BASE.name, ComponentResult::Applied { ready })
    }

    /// Phase three: apply the mesh policy payload. An absent payload is not
    /// an error; the mesh then runs in Istio's default permissive mode.
    fn apply_mesh_policy(&self, ctx: &mut InstallContext) -> Option<ComponentOutcome> {
        ctx.progress.progress(&format!("Applying {MESH_POLICY}"));
        let path = ctx.payload_path(MESH_POLICY_PAYLOAD);
        if !path.exists() {
            status::warn(format!(
                "{MESH_POLICY}: '{}' not found, skipping",
                path.display()
            ));
            return None;
        }
        let outcome = match ctx.cluster.apply_file(&path) {
            Ok(()) => {
                status::success(format!("{MESH_POLICY} applied"));
                ComponentOutcome::new(MESH_POLICY, ComponentResult::Applied { ready: true })
            }
            Err(e) => install_failed(ctx, MESH_POLICY, &e),
        };
        Some(outcome)
    }
}

impl Tier for ZeroTrustTier {
    fn number(&self) -> u8 {
        3
    }

    fn name(&self) -> &'static str {
        "Zero-trust networking"
    }

    fn rationale(&self) -> &'static str {
        "Every workload gets an identity, mutual TLS between services, and secrets from outside the cluster."
    }

    fn namespaces(&self) -> &'static [&'static str] {
        &["cert-manager", "istio-system", "external-secrets"]
    }

    fn components(&self) -> &'static [Component] {
        COMPONENTS
    }

    fn payloads(&self) -> Vec<&'static str> {
        let mut payloads: Vec<&'static str> =
            COMPONENTS.iter().filter_map(|c| c.payload).collect();
        payloads.push(MESH_POLICY_PAYLOAD);
        payloads
    }

    fn install(&self, ctx: &mut InstallContext) -> Result<TierReport> {
        let mut report = begin(self, ctx, 6);
        prepare_repositories(ctx, COMPONENTS)?;

        let outcome = install_component(ctx, &CERT_MANAGER, &[]);
        let rest = [ISTIO_BASE.name, ISTIOD.name, MESH_POLICY, EXTERNAL_SECRETS.name];
        if !proceed(ctx, &mut report, outcome, &rest) {
            return Ok(report);
        }

        let outcome = self.install_istio_base(ctx);
        if !proceed(ctx, &mut report, outcome, &rest[1..]) {
            return Ok(report);
        }

        let outcome = install_component(ctx, &ISTIOD, &[]);
        if !proceed(ctx, &mut report, outcome, &rest[2..]) {
            return Ok(report);
        }

        if let Some(outcome) = self.apply_mesh_policy(ctx) {
            if !proceed(ctx, &mut report, outcome, &rest[3..]) {
                return Ok(report);
            }
        }

        let outcome = install_component(ctx, &EXTERNAL_SECRETS, &[]);
        proceed(ctx, &mut report, outcome, &[]);
        Ok(report)
    }

    /// Reverse install order, with the mesh policy removed while the
    /// control plane that enforces it is still present.
    fn cleanup(&self, ctx: &InstallContext) {
        status::header(format!("Tier {}: {}", self.number(), self.name()));
        uninstall(ctx, &EXTERNAL_SECRETS);

        let policy = ctx.payload_path(MESH_POLICY_PAYLOAD);
        if policy.exists() {
            status::info(format!("Removing {MESH_POLICY}"));
            if let Err(e) = ctx.cluster.delete_file(&policy) {
                tracing::debug!(error = %e, "policy delete failed, ignoring");
            }
        }

        uninstall(ctx, &ISTIOD);
        uninstall(ctx, &ISTIO_BASE);
        uninstall(ctx, &CERT_MANAGER);
        delete_namespaces(ctx, self.namespaces());
    }
}
