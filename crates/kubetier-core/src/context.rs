use crate::cluster::Cluster;
use crate::config::{Config, FailurePolicy};
use crate::ledger::FailureLedger;
use crate::poll::Clock;
use crate::progress::Progress;
use std::path::{Path, PathBuf};

/// Everything one run needs, owned in one place and passed by reference.
///
/// The progress counter and failure ledger live here rather than in
/// globals, so a tier's effects are visible only through the context it
/// was handed.
pub struct InstallContext<'a> {
    pub root: PathBuf,
    pub config: &'a Config,
    pub cluster: &'a dyn Cluster,
    pub clock: &'a dyn Clock,
    pub policy: FailurePolicy,
    pub progress: Progress,
    pub ledger: FailureLedger,
}

impl<'a> InstallContext<'a> {
    pub fn new(
        root: &Path,
        config: &'a Config,
        cluster: &'a dyn Cluster,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            cluster,
            clock,
            policy: config.failure_policy,
            progress: Progress::new(),
            ledger: FailureLedger::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn payload_path(&self, payload: &str) -> PathBuf {
        self.config.payload_path(&self.root, payload)
    }
}
