use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a component landed in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The package manager returned non-zero.
    InstallFailed,
    /// A pod reached a terminal error state.
    Failing,
    /// The stabilization window elapsed with pods still pending.
    Unready,
    /// Custom status objects never all reported healthy.
    ObjectsUnready,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::InstallFailed => "install failed",
            FailureKind::Failing => "pods failing",
            FailureKind::Unready => "pods not ready",
            FailureKind::ObjectsUnready => "status objects not ready",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub component: String,
    pub kind: FailureKind,
}

/// Ordered, append-only record of the components that failed during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureLedger {
    entries: Vec<LedgerEntry>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, component: impl Into<String>, kind: FailureKind) {
        let component = component.into();
        tracing::debug!(%component, %kind, "recorded failure");
        self.entries.push(LedgerEntry { component, kind });
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.component.as_str()).collect()
    }

    pub fn contains(&self, component: &str) -> bool {
        self.entries.iter().any(|e| e.component == component)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
