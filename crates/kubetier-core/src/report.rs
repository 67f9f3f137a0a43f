use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::FailurePolicy;
use crate::ledger::LedgerEntry;
use crate::verify::HealthVerdict;

// ---------------------------------------------------------------------------
// ComponentOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentResult {
    /// Helm succeeded; `verdict` is what health verification observed.
    Installed { verdict: HealthVerdict },
    /// Created without pods of its own (CRDs, policy objects). `ready` is
    /// the result of the status-object wait, if one followed.
    Applied { ready: bool },
    InstallFailed { error: String },
    /// Not attempted because an earlier step aborted the tier.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentOutcome {
    pub component: String,
    #[serde(flatten)]
    pub result: ComponentResult,
}

impl ComponentOutcome {
    pub fn new(component: impl Into<String>, result: ComponentResult) -> Self {
        Self {
            component: component.into(),
            result,
        }
    }

    /// Installed and verified healthy.
    pub fn is_success(&self) -> bool {
        match &self.result {
            ComponentResult::Installed { verdict } => verdict.is_healthy(),
            ComponentResult::Applied { ready } => *ready,
            ComponentResult::InstallFailed { .. } | ComponentResult::Skipped => false,
        }
    }
}

// ---------------------------------------------------------------------------
// TierReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierReport {
    pub tier: u8,
    pub name: String,
    pub implemented: bool,
    pub outcomes: Vec<ComponentOutcome>,
    /// Component whose failure stopped the tier under `fail_fast`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_at: Option<String>,
}

impl TierReport {
    pub fn new(tier: u8, name: &str, implemented: bool) -> Self {
        Self {
            tier,
            name: name.to_string(),
            implemented,
            outcomes: Vec::new(),
            aborted_at: None,
        }
    }

    pub fn push(&mut self, outcome: ComponentOutcome) {
        self.outcomes.push(outcome);
    }

    /// Stop the tier at `component`; everything in `remaining` is skipped.
    pub fn abort(&mut self, component: &str, remaining: &[&str]) {
        self.aborted_at = Some(component.to_string());
        for name in remaining {
            self.outcomes
                .push(ComponentOutcome::new(*name, ComponentResult::Skipped));
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Everything an `install` run produced. Written as the JSON run report.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub policy: FailurePolicy,
    pub tiers: Vec<TierReport>,
    pub failures: Vec<LedgerEntry>,
    /// Set when the run stopped before every selected tier was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FailureKind;

    fn healthy() -> ComponentResult {
        ComponentResult::Installed {
            verdict: HealthVerdict::Healthy { running: 2, total: 2 },
        }
    }

    #[test]
    fn only_healthy_installs_count_as_success() {
        assert!(ComponentOutcome::new("Loki", healthy()).is_success());
        assert!(!ComponentOutcome::new(
            "Loki",
            ComponentResult::Installed {
                verdict: HealthVerdict::Unready { pods: vec![] }
            }
        )
        .is_success());
        assert!(!ComponentOutcome::new(
            "Loki",
            ComponentResult::InstallFailed {
                error: "timeout".into()
            }
        )
        .is_success());
        assert!(!ComponentOutcome::new("Loki", ComponentResult::Skipped).is_success());
        assert!(ComponentOutcome::new("Istio base", ComponentResult::Applied { ready: true })
            .is_success());
    }

    #[test]
    fn abort_marks_remaining_skipped() {
        let mut report = TierReport::new(1, "Security foundations", true);
        report.push(ComponentOutcome::new("Falco", healthy()));
        report.abort("Kyverno", &["Trivy Operator", "Kubescape"]);
        assert!(report.is_aborted());
        assert_eq!(report.aborted_at.as_deref(), Some("Kyverno"));
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[2].result, ComponentResult::Skipped);
    }

    #[test]
    fn outcome_serializes_flat() {
        let json = serde_json::to_value(ComponentOutcome::new("Falco", healthy())).unwrap();
        assert_eq!(json["component"], "Falco");
        assert_eq!(json["status"], "installed");
        assert_eq!(json["verdict"]["verdict"], "healthy");
        assert_eq!(json["verdict"]["running"], 2);
    }

    #[test]
    fn exit_code_follows_ledger() {
        let now = Utc::now();
        let mut summary = RunSummary {
            started_at: now,
            finished_at: now,
            policy: FailurePolicy::BestEffort,
            tiers: vec![],
            failures: vec![],
            aborted: None,
        };
        assert_eq!(summary.exit_code(), 0);
        summary.failures.push(LedgerEntry {
            component: "Falco".into(),
            kind: FailureKind::Failing,
        });
        assert_eq!(summary.exit_code(), 1);
    }
}
