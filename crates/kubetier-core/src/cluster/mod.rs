//! The cluster seam.
//!
//! Reads (pods, logs, namespaces, custom-object status) and every mutation
//! go through the `Cluster` trait. Mutations are limited to package-manager
//! operations plus applying and deleting opaque payload files; the core
//! never builds Kubernetes objects itself.

mod kubectl;
mod pod;

pub use kubectl::KubectlCluster;
pub use pod::{parse_pod_list, PodCondition, PodInfo};

use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// HelmInstall
// ---------------------------------------------------------------------------

/// A fully-resolved `helm upgrade --install` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct HelmInstall {
    pub release: String,
    pub chart: String,
    pub namespace: String,
    pub version: Option<String>,
    /// Only set when the payload file exists.
    pub values: Option<PathBuf>,
    pub timeout: Duration,
    pub extra_args: Vec<String>,
}

impl HelmInstall {
    /// Helm arguments, excluding the binary and any kube context flag.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "upgrade".to_string(),
            "--install".to_string(),
            self.release.clone(),
            self.chart.clone(),
            "--namespace".to_string(),
            self.namespace.clone(),
            "--create-namespace".to_string(),
            "--wait".to_string(),
            "--timeout".to_string(),
            format!("{}s", self.timeout.as_secs()),
        ];
        if let Some(version) = &self.version {
            args.push("--version".to_string());
            args.push(version.clone());
        }
        if let Some(values) = &self.values {
            args.push("-f".to_string());
            args.push(values.display().to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

// ---------------------------------------------------------------------------
// ObjectQuery / ObjectHealth
// ---------------------------------------------------------------------------

/// Selects cluster objects whose own status conditions are trusted as a
/// readiness signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    /// Resource name as understood by `kubectl get`.
    pub resource: &'static str,
    /// Only objects whose name ends with this suffix are counted.
    pub name_suffix: &'static str,
    /// Condition type that must report `"True"`.
    pub condition: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ObjectHealth {
    pub healthy: usize,
    pub total: usize,
}

impl ObjectHealth {
    pub fn all_healthy(&self) -> bool {
        self.total > 0 && self.healthy == self.total
    }
}

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

pub trait Cluster {
    /// Pods in `namespace`, optionally narrowed by a label selector. A
    /// namespace that does not exist yields an empty list.
    fn list_pods(&self, namespace: &str, selector: Option<&str>) -> Result<Vec<PodInfo>>;

    /// Last `tail` log lines of every container in the pod. With `previous`,
    /// prefer the output of the last terminated container instance.
    fn pod_logs(&self, namespace: &str, pod: &str, tail: u32, previous: bool) -> Result<String>;

    fn namespace_exists(&self, namespace: &str) -> Result<bool>;

    fn object_health(&self, query: &ObjectQuery) -> Result<ObjectHealth>;

    fn helm_repo_add(&self, name: &str, url: &str) -> Result<()>;

    fn helm_repo_update(&self) -> Result<()>;

    fn helm_upgrade_install(&self, install: &HelmInstall) -> Result<()>;

    fn helm_uninstall(&self, release: &str, namespace: &str) -> Result<()>;

    fn apply_file(&self, path: &Path) -> Result<()>;

    /// Delete the objects in a payload file; absent objects are not an error.
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Delete a namespace; an absent namespace is not an error.
    fn delete_namespace(&self, namespace: &str) -> Result<()>;
}
