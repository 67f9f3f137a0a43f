//! In-memory stand-ins for the cluster and the clock.

use crate::cluster::{Cluster, HelmInstall, ObjectHealth, ObjectQuery, PodInfo};
use crate::config::Config;
use crate::error::{Result, TierError};
use crate::poll::Clock;
use crate::InstallContext;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// A clock that only moves when something sleeps on it.
pub struct ManualClock {
    base: Instant,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn sleep(&self, d: Duration) {
        self.offset.set(self.offset.get() + d);
    }
}

// ---------------------------------------------------------------------------
// FakeCluster
// ---------------------------------------------------------------------------

/// Scripted cluster. Each `list_pods` call for a namespace pops the next
/// scripted listing; the last one repeats forever.
#[derive(Default)]
pub struct FakeCluster {
    pods: RefCell<HashMap<String, VecDeque<Vec<PodInfo>>>>,
    default_pods: Vec<PodInfo>,
    /// Namespace -> number of listings that succeed before every later one fails.
    list_errors: HashMap<String, usize>,
    list_counts: RefCell<HashMap<String, usize>>,
    namespaces: HashSet<String>,
    objects: RefCell<VecDeque<ObjectHealth>>,
    failing_installs: HashSet<String>,
    failing_removals: bool,
    failing_repo_add: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespaces without a script report these pods.
    pub fn with_default_pods(mut self, pods: Vec<PodInfo>) -> Self {
        self.default_pods = pods;
        self
    }

    pub fn with_pods(self, namespace: &str, script: Vec<Vec<PodInfo>>) -> Self {
        self.pods
            .borrow_mut()
            .insert(namespace.to_string(), script.into_iter().collect());
        self.with_namespace(namespace)
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespaces.insert(namespace.to_string());
        self
    }

    pub fn with_list_error(self, namespace: &str) -> Self {
        self.with_list_error_after(namespace, 0)
    }

    /// Listings of `namespace` succeed `ok_calls` times, then fail.
    pub fn with_list_error_after(mut self, namespace: &str, ok_calls: usize) -> Self {
        self.list_errors.insert(namespace.to_string(), ok_calls);
        self
    }

    pub fn with_objects(self, script: Vec<ObjectHealth>) -> Self {
        *self.objects.borrow_mut() = script.into_iter().collect();
        self
    }

    pub fn failing_install(mut self, release: &str) -> Self {
        self.failing_installs.insert(release.to_string());
        self
    }

    pub fn failing_removals(mut self) -> Self {
        self.failing_removals = true;
        self
    }

    pub fn failing_repo_add(mut self) -> Self {
        self.failing_repo_add = true;
        self
    }

    /// Mutating calls and log fetches in the order they were made.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Releases passed to `helm upgrade --install`, in order.
    pub fn installed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("install ").map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn removal(&self, call: String) -> Result<()> {
        self.record(call);
        if self.failing_removals {
            return Err(failure("not found"));
        }
        Ok(())
    }
}

fn failure(stderr: &str) -> TierError {
    TierError::CommandFailed {
        program: "fake".into(),
        args: String::new(),
        code: Some(1),
        stderr: stderr.into(),
    }
}

impl Cluster for FakeCluster {
    fn list_pods(&self, namespace: &str, _selector: Option<&str>) -> Result<Vec<PodInfo>> {
        if let Some(&ok_calls) = self.list_errors.get(namespace) {
            let mut counts = self.list_counts.borrow_mut();
            let seen = counts.entry(namespace.to_string()).or_insert(0);
            *seen += 1;
            if *seen > ok_calls {
                return Err(failure("connection refused"));
            }
        }
        let mut pods = self.pods.borrow_mut();
        match pods.get_mut(namespace) {
            Some(script) if script.len() > 1 => Ok(script.pop_front().unwrap_or_default()),
            Some(script) => Ok(script.front().cloned().unwrap_or_default()),
            None => Ok(self.default_pods.clone()),
        }
    }

    fn pod_logs(&self, _namespace: &str, pod: &str, tail: u32, previous: bool) -> Result<String> {
        let suffix = if previous { " previous" } else { "" };
        self.record(format!("logs {pod} {tail}{suffix}"));
        Ok(format!("{pod}: back-off restarting failed container"))
    }

    fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        Ok(self.namespaces.contains(namespace))
    }

    fn object_health(&self, _query: &ObjectQuery) -> Result<ObjectHealth> {
        let mut objects = self.objects.borrow_mut();
        if objects.len() > 1 {
            return Ok(objects.pop_front().unwrap_or_default());
        }
        Ok(objects.front().copied().unwrap_or_default())
    }

    fn helm_repo_add(&self, name: &str, _url: &str) -> Result<()> {
        self.record(format!("repo-add {name}"));
        if self.failing_repo_add {
            return Err(failure("repo unreachable"));
        }
        Ok(())
    }

    fn helm_repo_update(&self) -> Result<()> {
        self.record("repo-update".to_string());
        Ok(())
    }

    fn helm_upgrade_install(&self, install: &HelmInstall) -> Result<()> {
        self.record(format!("install {}", install.release));
        if self.failing_installs.contains(&install.release) {
            return Err(failure("timed out waiting for the condition"));
        }
        Ok(())
    }

    fn helm_uninstall(&self, release: &str, _namespace: &str) -> Result<()> {
        self.removal(format!("uninstall {release}"))
    }

    fn apply_file(&self, path: &Path) -> Result<()> {
        self.record(format!("apply {}", file_name(path)));
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.removal(format!("delete-file {}", file_name(path)))
    }

    fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.removal(format!("delete-namespace {namespace}"))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn running(name: &str) -> PodInfo {
    PodInfo {
        name: name.to_string(),
        status: "Running".to_string(),
        ready: 1,
        containers: 1,
        restarts: 0,
    }
}

pub fn pod(name: &str, status: &str) -> PodInfo {
    PodInfo::new(name, status)
}

pub fn context<'a>(
    root: &Path,
    config: &'a Config,
    cluster: &'a FakeCluster,
    clock: &'a ManualClock,
) -> InstallContext<'a> {
    InstallContext::new(root, config, cluster, clock)
}
