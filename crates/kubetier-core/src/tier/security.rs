//! Tier 1: observability and runtime security.
//!
//! Metrics and logs go in first so that Falco, installed third, has
//! somewhere to send events. Policy enforcement and scanners follow and
//! do not depend on each other.

use std::time::Duration;

use super::{begin, install_all, prepare_repositories, Tier};
use crate::component::{Component, HelmRepo};
use crate::context::InstallContext;
use crate::error::Result;
use crate::report::TierReport;

const PROMETHEUS_REPO: HelmRepo = HelmRepo {
    name: "prometheus-community",
    url: "https://prometheus-community.github.io/helm-charts",
};
const GRAFANA_REPO: HelmRepo = HelmRepo {
    name: "grafana",
    url: "https://grafana.github.io/helm-charts",
};
const FALCO_REPO: HelmRepo = HelmRepo {
    name: "falcosecurity",
    url: "https://falcosecurity.github.io/charts",
};
const KYVERNO_REPO: HelmRepo = HelmRepo {
    name: "kyverno",
    url: "https://kyverno.github.io/kyverno",
};
const AQUA_REPO: HelmRepo = HelmRepo {
    name: "aqua",
    url: "https://aquasecurity.github.io/helm-charts",
};
const KUBESCAPE_REPO: HelmRepo = HelmRepo {
    name: "kubescape",
    url: "https://kubescape.github.io/helm-charts",
};

pub const PROMETHEUS_STACK: Component = Component {
    name: "Prometheus Stack",
    release: "kube-prometheus-stack",
    chart: "prometheus-community/kube-prometheus-stack",
    repo: PROMETHEUS_REPO,
    version: None,
    namespace: "monitoring",
    payload: Some("tier1/prometheus-stack.yaml"),
    timeout: Duration::from_secs(600),
    selector: None,
    args: &[],
};

pub const LOKI: Component = Component {
    name: "Loki",
    release: "loki",
    chart: "grafana/loki",
    repo: GRAFANA_REPO,
    version: None,
    namespace: "logging",
    payload: Some("tier1/loki.yaml"),
    timeout: Duration::from_secs(600),
    selector: None,
    args: &[],
};

pub const FALCO: Component = Component {
    name: "Falco",
    release: "falco",
    chart: "falcosecurity/falco",
    repo: FALCO_REPO,
    version: None,
    namespace: "falco",
    payload: Some("tier1/falco.yaml"),
    timeout: Duration::from_secs(600),
    selector: None,
    args: &[
        "--set",
        "falcosidekick.enabled=true",
        "--set",
        "falcosidekick.config.loki.hostport=http://loki-gateway.logging.svc.cluster.local",
        "--set",
        "falcosidekick.serviceMonitor.enabled=true",
    ],
};

pub const KYVERNO: Component = Component {
    name: "Kyverno",
    release: "kyverno",
    chart: "kyverno/kyverno",
    repo: KYVERNO_REPO,
    version: None,
    namespace: "kyverno",
    payload: Some("tier1/kyverno.yaml"),
    timeout: Duration::from_secs(300),
    selector: None,
    args: &[],
};

pub const TRIVY_OPERATOR: Component = Component {
    name: "Trivy Operator",
    release: "trivy-operator",
    chart: "aqua/trivy-operator",
    repo: AQUA_REPO,
    version: None,
    namespace: "trivy-system",
    payload: Some("tier1/trivy-operator.yaml"),
    timeout: Duration::from_secs(300),
    selector: None,
    args: &[],
};

pub const KUBESCAPE: Component = Component {
    name: "Kubescape",
    release: "kubescape",
    chart: "kubescape/kubescape-operator",
    repo: KUBESCAPE_REPO,
    version: None,
    namespace: "kubescape",
    payload: Some("tier1/kubescape.yaml"),
    timeout: Duration::from_secs(300),
    selector: None,
    args: &["--set", "clusterName=kubetier"],
};

const COMPONENTS: &[Component] = &[
    PROMETHEUS_STACK,
    LOKI,
    FALCO,
    KYVERNO,
    TRIVY_OPERATOR,
    KUBESCAPE,
];

pub struct SecurityTier;

impl Tier for SecurityTier {
    fn number(&self) -> u8 {
        1
    }

    fn name(&self) -> &'static str {
        "Security foundations"
    }

    fn rationale(&self) -> &'static str {
        "Visibility first: metrics, logs, runtime detection, admission policy, and scanning."
    }

    fn namespaces(&self) -> &'static [&'static str] {
        &[
            "monitoring",
            "logging",
            "falco",
            "kyverno",
            "trivy-system",
            "kubescape",
        ]
    }

    fn components(&self) -> &'static [Component] {
        COMPONENTS
    }

    fn install(&self, ctx: &mut InstallContext) -> Result<TierReport> {
        let mut report = begin(self, ctx, COMPONENTS.len() as u32 + 1);
        prepare_repositories(ctx, COMPONENTS)?;
        install_all(ctx, &mut report, COMPONENTS);
        Ok(report)
    }
}
