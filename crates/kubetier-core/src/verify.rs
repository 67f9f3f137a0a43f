//! Post-install health verification.
//!
//! Helm reports success once resources are created, even when the created
//! workload crash-loops a minute later. `verify_install` polls the
//! namespace independently: it fails fast on terminal pod errors, waits
//! patiently on pending pods, and gives up after a fixed window.

use console::style;
use serde::Serialize;

use crate::cluster::{Cluster, ObjectQuery, PodCondition, PodInfo};
use crate::context::InstallContext;
use crate::error::Result;
use crate::ledger::FailureKind;
use crate::poll::{poll_until, PollOutcome, Probe};
use crate::status;

// ---------------------------------------------------------------------------
// HealthVerdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum HealthVerdict {
    /// Every observed pod is running or completed.
    Healthy { running: usize, total: usize },
    /// At least one pod hit a terminal error. Carries the offending pods.
    Failing { pods: Vec<PodInfo> },
    /// The window elapsed with pods still pending. Carries the last listing.
    Unready { pods: Vec<PodInfo> },
}

impl HealthVerdict {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthVerdict::Healthy { .. })
    }
}

/// Pods from one tick, or `None` when the query itself failed.
fn observe(cluster: &dyn Cluster, namespace: &str, selector: Option<&str>) -> Option<Vec<PodInfo>> {
    match cluster.list_pods(namespace, selector) {
        Ok(pods) => Some(pods),
        Err(e) => {
            tracing::warn!(namespace, error = %e, "pod listing failed, treating tick as inconclusive");
            None
        }
    }
}

fn count(pods: &[PodInfo], condition: PodCondition) -> usize {
    pods.iter().filter(|p| p.condition() == condition).count()
}

// ---------------------------------------------------------------------------
// verify_install
// ---------------------------------------------------------------------------

/// Wait for `namespace` to produce pods, then for them to settle.
///
/// Failures are printed and recorded in the ledger under `display_name`;
/// nothing is returned as an error, so callers that only want diagnostics
/// can ignore the verdict.
pub fn verify_install(
    ctx: &mut InstallContext,
    namespace: &str,
    display_name: &str,
    selector: Option<&str>,
) -> HealthVerdict {
    let cluster = ctx.cluster;
    let clock = ctx.clock;
    let verify = ctx.config.verify.clone();

    status::info(format!("Verifying {display_name} pods in '{namespace}'"));

    let appeared = poll_until(
        clock,
        verify.existence_interval(),
        verify.existence_wait(),
        || match observe(cluster, namespace, selector) {
            Some(pods) if !pods.is_empty() => Probe::Ready(()),
            _ => Probe::Pending(()),
        },
    );
    if !matches!(appeared, PollOutcome::Ready(())) {
        status::warn(format!(
            "{display_name}: no pods in '{namespace}' after {}s",
            verify.existence_wait_seconds
        ));
    }

    // An inconclusive tick keeps the last listing that did succeed.
    let mut last_seen: Vec<PodInfo> = Vec::new();
    let outcome = poll_until(clock, verify.poll_interval(), verify.window(), || {
        let Some(pods) = observe(cluster, namespace, selector) else {
            return Probe::Pending(last_seen.clone());
        };
        last_seen = pods.clone();
        if count(&pods, PodCondition::Failing) > 0 {
            Probe::Failed(pods)
        } else if count(&pods, PodCondition::Pending) == 0 {
            Probe::Ready(pods)
        } else {
            Probe::Pending(pods)
        }
    });

    match outcome {
        PollOutcome::Ready(pods) => {
            let running = count(&pods, PodCondition::Ready);
            let total = pods.len();
            if total == 0 {
                status::warn(format!(
                    "{display_name}: nothing to verify (0 pods in '{namespace}')"
                ));
            } else {
                status::success(format!("{display_name}: {running}/{total} pods running"));
            }
            HealthVerdict::Healthy { running, total }
        }
        PollOutcome::Failed(pods) => {
            let failing: Vec<PodInfo> = pods
                .into_iter()
                .filter(|p| p.condition() == PodCondition::Failing)
                .collect();
            status::error(format!(
                "{display_name}: {} pod(s) in a terminal error state",
                failing.len()
            ));
            for pod in &failing {
                status::detail(pod.listing_line());
                print_log_tail(cluster, namespace, pod, verify.log_tail_lines);
            }
            ctx.ledger.record_failure(display_name, FailureKind::Failing);
            HealthVerdict::Failing { pods: failing }
        }
        PollOutcome::TimedOut(pods) => {
            status::warn(format!(
                "{display_name}: pods not ready after {}s",
                verify.window_seconds
            ));
            if pods.is_empty() {
                status::detail("(no pod listing available)");
            }
            for pod in &pods {
                status::detail(pod.listing_line());
            }
            ctx.ledger.record_failure(display_name, FailureKind::Unready);
            HealthVerdict::Unready { pods }
        }
    }
}

/// A pod that has restarted is asked for its previous container's output,
/// which is where the crash is.
fn print_log_tail(cluster: &dyn Cluster, namespace: &str, pod: &PodInfo, tail: u32) {
    if tail == 0 {
        return;
    }
    match cluster.pod_logs(namespace, &pod.name, tail, pod.restarts > 0) {
        Ok(logs) => {
            for line in logs.lines() {
                status::detail(format!("  | {line}"));
            }
        }
        Err(e) => status::detail(format!("  (logs unavailable: {e})")),
    }
}

// ---------------------------------------------------------------------------
// wait_for_objects
// ---------------------------------------------------------------------------

/// Wait until every object matched by `query` reports its condition as
/// true. There is no fail-fast branch: this only ends on full health or
/// when the window elapses.
pub fn wait_for_objects(ctx: &mut InstallContext, display_name: &str, query: &ObjectQuery) -> bool {
    let cluster = ctx.cluster;
    let objects = ctx.config.objects.clone();

    status::info(format!(
        "Waiting for {display_name} ({} '*{}' {})",
        query.resource, query.name_suffix, query.condition
    ));

    let outcome = poll_until(ctx.clock, objects.poll_interval(), objects.window(), || {
        match cluster.object_health(query) {
            Ok(health) if health.all_healthy() => Probe::Ready(Some(health)),
            Ok(health) => {
                tracing::debug!(healthy = health.healthy, total = health.total, "objects not ready");
                Probe::Pending(Some(health))
            }
            Err(e) => {
                tracing::warn!(error = %e, "object status query failed");
                Probe::Pending(None)
            }
        }
    });

    match outcome {
        PollOutcome::Ready(health) | PollOutcome::Failed(health) => {
            let health = health.unwrap_or_default();
            status::success(format!(
                "{display_name}: {}/{} {}",
                health.healthy, health.total, query.condition
            ));
            true
        }
        PollOutcome::TimedOut(last) => {
            let (healthy, total) = last
                .map(|h| (h.healthy, h.total))
                .unwrap_or((0, 0));
            status::warn(format!(
                "{display_name}: {healthy}/{total} {} after {}s",
                query.condition, objects.window_seconds
            ));
            ctx.ledger
                .record_failure(display_name, FailureKind::ObjectsUnready);
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Namespace status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Badge {
    Ok,
    Fail,
    Skip,
}

impl Badge {
    pub fn as_str(self) -> &'static str {
        match self {
            Badge::Ok => "OK",
            Badge::Fail => "FAIL",
            Badge::Skip => "SKIP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceStatus {
    pub namespace: String,
    pub badge: Badge,
    pub total: usize,
    pub running: usize,
    pub failing: usize,
}

impl NamespaceStatus {
    pub fn from_pods(namespace: &str, pods: &[PodInfo]) -> Self {
        let total = pods.len();
        let running = count(pods, PodCondition::Ready);
        let failing = count(pods, PodCondition::Failing);
        let badge = if total == 0 {
            Badge::Skip
        } else if failing > 0 {
            Badge::Fail
        } else {
            Badge::Ok
        };
        Self {
            namespace: namespace.to_string(),
            badge,
            total,
            running,
            failing,
        }
    }
}

/// One-line health rollup for `namespace`. Read-only.
pub fn print_namespace_status(cluster: &dyn Cluster, namespace: &str) -> Result<NamespaceStatus> {
    let pods = cluster.list_pods(namespace, None)?;
    let ns = NamespaceStatus::from_pods(namespace, &pods);
    let label = format!("[{:^4}]", ns.badge.as_str());
    let badge = match ns.badge {
        Badge::Ok => style(label).green().bold(),
        Badge::Fail => style(label).red().bold(),
        Badge::Skip => style(label).yellow(),
    };
    if ns.badge == Badge::Skip {
        status::line(format!("  {badge} {namespace:<20} no pods"));
    } else {
        status::line(format!(
            "  {badge} {namespace:<20} {}/{} running, {} failing",
            ns.running, ns.total, ns.failing
        ));
    }
    Ok(ns)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ObjectHealth;
    use crate::config::Config;
    use crate::testing::{context, pod, running, FakeCluster, ManualClock};
    use std::time::Duration;
    use tempfile::TempDir;

    const CRDS: ObjectQuery = ObjectQuery {
        resource: "customresourcedefinitions",
        name_suffix: ".istio.io",
        condition: "Established",
    };

    #[test]
    fn healthy_when_all_pods_running() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let cluster = FakeCluster::new().with_pods(
            "falco",
            vec![vec![running("falco-a"), running("falco-b"), pod("job-x", "Completed")]],
        );
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "falco", "Falco", None);
        assert_eq!(verdict, HealthVerdict::Healthy { running: 3, total: 3 });
        assert!(ctx.ledger.is_empty());
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn waits_for_pods_to_appear_then_for_pending_to_settle() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let cluster = FakeCluster::new().with_pods(
            "logging",
            vec![
                vec![],
                vec![],
                vec![pod("loki-0", "ContainerCreating")],
                vec![pod("loki-0", "ContainerCreating")],
                vec![running("loki-0")],
            ],
        );
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "logging", "Loki", None);
        assert!(verdict.is_healthy());
        // existence: probes at 0s, 1s, 2s (found); stabilization: 2s, 7s
        assert_eq!(clock.elapsed(), Duration::from_secs(7));
        assert!(!ctx.ledger.contains("Loki"));
    }

    #[test]
    fn terminal_error_fails_fast_on_the_next_tick() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        // first listing satisfies the existence wait, then ticks at 0s, 5s, 10s
        let cluster = FakeCluster::new().with_pods(
            "kyverno",
            vec![
                vec![pod("kyverno-0", "Pending")],
                vec![pod("kyverno-0", "Pending")],
                vec![pod("kyverno-0", "ContainerCreating")],
                vec![pod("kyverno-0", "CrashLoopBackOff")],
            ],
        );
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "kyverno", "Kyverno", None);
        match verdict {
            HealthVerdict::Failing { pods } => {
                assert_eq!(pods.len(), 1);
                assert_eq!(pods[0].status, "CrashLoopBackOff");
            }
            other => panic!("expected Failing, got {other:?}"),
        }
        assert_eq!(clock.elapsed(), Duration::from_secs(10));
        assert!(clock.elapsed() < config.verify.window());
        assert_eq!(ctx.ledger.names(), vec!["Kyverno"]);
        assert_eq!(ctx.ledger.entries()[0].kind, FailureKind::Failing);
        let tail = format!("logs kyverno-0 {}", config.verify.log_tail_lines);
        assert_eq!(cluster.calls(), vec![tail]);
    }

    #[test]
    fn log_tail_is_fetched_for_each_failing_pod_only() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let restarted = PodInfo {
            restarts: 6,
            ..pod("falco-b", "CrashLoopBackOff")
        };
        let cluster = FakeCluster::new().with_pods(
            "falco",
            vec![vec![running("falco-a"), restarted, pod("falco-c", "Evicted")]],
        );
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "falco", "Falco", None);
        assert!(matches!(verdict, HealthVerdict::Failing { ref pods } if pods.len() == 2));
        let n = config.verify.log_tail_lines;
        assert_eq!(
            cluster.calls(),
            vec![
                format!("logs falco-b {n} previous"),
                format!("logs falco-c {n}"),
            ]
        );
    }

    #[test]
    fn zero_log_tail_skips_the_fetch() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.verify.log_tail_lines = 0;
        let cluster =
            FakeCluster::new().with_pods("kyverno", vec![vec![pod("kyverno-0", "Error")]]);
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "kyverno", "Kyverno", None);
        assert!(matches!(verdict, HealthVerdict::Failing { .. }));
        assert!(cluster.calls().is_empty());
        assert!(ctx.ledger.contains("Kyverno"));
    }

    #[test]
    fn error_appearing_late_is_caught_within_one_interval() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let mut script = vec![vec![pod("trivy-0", "Pending")]];
        // stabilization ticks 0..=8 pending (0s..40s), error visible from tick 9 (45s)
        script.extend((0..9).map(|_| vec![pod("trivy-0", "Pending")]));
        script.push(vec![pod("trivy-0", "ImagePullBackOff")]);
        let cluster = FakeCluster::new().with_pods("trivy-system", script);
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "trivy-system", "Trivy Operator", None);
        assert!(matches!(verdict, HealthVerdict::Failing { .. }));
        assert_eq!(clock.elapsed(), Duration::from_secs(45));
    }

    #[test]
    fn pending_past_window_is_unready() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let cluster = FakeCluster::new()
            .with_pods("monitoring", vec![vec![running("prom-0"), pod("grafana-0", "Pending")]]);
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "monitoring", "Prometheus Stack", None);
        match verdict {
            HealthVerdict::Unready { pods } => assert_eq!(pods.len(), 2),
            other => panic!("expected Unready, got {other:?}"),
        }
        assert_eq!(clock.elapsed(), Duration::from_secs(60));
        assert_eq!(ctx.ledger.entries()[0].kind, FailureKind::Unready);
    }

    #[test]
    fn no_pods_at_all_is_healthy_after_existence_wait() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let cluster = FakeCluster::new();
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "empty", "CRD-only chart", None);
        assert_eq!(verdict, HealthVerdict::Healthy { running: 0, total: 0 });
        assert_eq!(clock.elapsed(), Duration::from_secs(15));
        assert!(ctx.ledger.is_empty());
    }

    #[test]
    fn listing_errors_are_inconclusive_until_window_ends() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let cluster = FakeCluster::new().with_list_error("falco");
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "falco", "Falco", None);
        assert_eq!(verdict, HealthVerdict::Unready { pods: vec![] });
        assert_eq!(clock.elapsed(), Duration::from_secs(75));
        assert!(ctx.ledger.contains("Falco"));
    }

    #[test]
    fn unready_report_keeps_last_listing_when_later_ticks_fail() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        // existence probe and the first two stabilization ticks succeed
        let cluster = FakeCluster::new()
            .with_pods("monitoring", vec![vec![running("prom-0"), pod("grafana-0", "Pending")]])
            .with_list_error_after("monitoring", 3);
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        let verdict = verify_install(&mut ctx, "monitoring", "Prometheus Stack", None);
        match verdict {
            HealthVerdict::Unready { pods } => {
                assert_eq!(pods.len(), 2);
                assert_eq!(pods[1].name, "grafana-0");
            }
            other => panic!("expected Unready, got {other:?}"),
        }
        assert_eq!(clock.elapsed(), Duration::from_secs(60));
        assert_eq!(ctx.ledger.entries()[0].kind, FailureKind::Unready);
    }

    #[test]
    fn objects_wait_succeeds_once_all_healthy() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let cluster = FakeCluster::new().with_objects(vec![
            ObjectHealth { healthy: 0, total: 0 },
            ObjectHealth { healthy: 10, total: 14 },
            ObjectHealth { healthy: 14, total: 14 },
        ]);
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        assert!(wait_for_objects(&mut ctx, "Istio CRDs", &CRDS));
        assert_eq!(clock.elapsed(), Duration::from_secs(20));
        assert!(ctx.ledger.is_empty());
    }

    #[test]
    fn objects_wait_never_fails_fast() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let cluster = FakeCluster::new().with_objects(vec![ObjectHealth { healthy: 3, total: 14 }]);
        let clock = ManualClock::new();
        let mut ctx = context(dir.path(), &config, &cluster, &clock);

        assert!(!wait_for_objects(&mut ctx, "Istio CRDs", &CRDS));
        assert_eq!(clock.elapsed(), Duration::from_secs(120));
        assert_eq!(ctx.ledger.entries()[0].kind, FailureKind::ObjectsUnready);
    }

    #[test]
    fn empty_namespace_is_skip_not_fail() {
        let cluster = FakeCluster::new();
        let ns = print_namespace_status(&cluster, "velero").unwrap();
        assert_eq!(ns.badge, Badge::Skip);
        assert_eq!(ns.total, 0);
    }

    #[test]
    fn namespace_badges() {
        let ok = NamespaceStatus::from_pods("a", &[running("x"), pod("y", "Pending")]);
        assert_eq!(ok.badge, Badge::Ok);
        assert_eq!((ok.running, ok.total), (1, 2));

        let fail = NamespaceStatus::from_pods("b", &[running("x"), pod("y", "Error")]);
        assert_eq!(fail.badge, Badge::Fail);
        assert_eq!(fail.failing, 1);
    }

    #[test]
    fn badge_serializes_uppercase() {
        let json = serde_json::to_string(&Badge::Skip).unwrap();
        assert_eq!(json, "\"SKIP\"");
    }
}
