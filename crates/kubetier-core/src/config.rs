use crate::error::{Result, TierError};
use crate::paths;
use crate::tier::{self, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// FailurePolicy
// ---------------------------------------------------------------------------

/// What a tier does after a component fails to install or verify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep installing the remaining components and report at the end.
    #[default]
    BestEffort,
    /// Stop the tier (and the run) at the first unsuccessful component.
    FailFast,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::BestEffort => "best_effort",
            FailurePolicy::FailFast => "fail_fast",
        }
    }
}

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    #[serde(default = "default_kubectl")]
    pub kubectl: String,
    #[serde(default = "default_helm")]
    pub helm: String,
    /// Passed as `--context` / `--kube-context` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_helm() -> String {
    "helm".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            kubectl: default_kubectl(),
            helm: default_helm(),
            context: None,
        }
    }
}

// ---------------------------------------------------------------------------
// VerifyConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    #[serde(default = "default_existence_wait")]
    pub existence_wait_seconds: u64,
    #[serde(default = "default_existence_interval")]
    pub existence_interval_seconds: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    #[serde(default = "default_log_tail")]
    pub log_tail_lines: u32,
}

fn default_existence_wait() -> u64 {
    15
}

fn default_existence_interval() -> u64 {
    1
}

fn default_poll_interval() -> u64 {
    5
}

fn default_window() -> u64 {
    60
}

fn default_log_tail() -> u32 {
    20
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            existence_wait_seconds: default_existence_wait(),
            existence_interval_seconds: default_existence_interval(),
            poll_interval_seconds: default_poll_interval(),
            window_seconds: default_window(),
            log_tail_lines: default_log_tail(),
        }
    }
}

impl VerifyConfig {
    pub fn existence_wait(&self) -> Duration {
        Duration::from_secs(self.existence_wait_seconds)
    }

    pub fn existence_interval(&self) -> Duration {
        Duration::from_secs(self.existence_interval_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

// ---------------------------------------------------------------------------
// ObjectWaitConfig
// ---------------------------------------------------------------------------

/// Timing for readiness waits that trust a component's own status objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectWaitConfig {
    #[serde(default = "default_object_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_object_window")]
    pub window_seconds: u64,
}

fn default_object_interval() -> u64 {
    10
}

fn default_object_window() -> u64 {
    120
}

impl Default for ObjectWaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_object_interval(),
            window_seconds: default_object_window(),
        }
    }
}

impl ObjectWaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default = "default_values_dir")]
    pub values_dir: PathBuf,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub objects: ObjectWaitConfig,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_version() -> u32 {
    1
}

fn default_values_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_VALUES_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            tools: ToolsConfig::default(),
            values_dir: default_values_dir(),
            verify: VerifyConfig::default(),
            objects: ObjectWaitConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Load `kubetier.yaml` from `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        if cfg.version != 1 {
            return Err(TierError::InvalidConfig(format!(
                "unsupported config version {}",
                cfg.version
            )));
        }
        Ok(cfg)
    }

    pub fn payload_path(&self, root: &Path, payload: &str) -> PathBuf {
        paths::payload_path(root, &self.values_dir, payload)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let intervals = [
            (
                "verify.existence_interval_seconds",
                self.verify.existence_interval_seconds,
                "verify.existence_wait_seconds",
                self.verify.existence_wait_seconds,
            ),
            (
                "verify.poll_interval_seconds",
                self.verify.poll_interval_seconds,
                "verify.window_seconds",
                self.verify.window_seconds,
            ),
            (
                "objects.poll_interval_seconds",
                self.objects.poll_interval_seconds,
                "objects.window_seconds",
                self.objects.window_seconds,
            ),
        ];
        for (interval_key, interval, window_key, window) in intervals {
            if interval == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{interval_key} must be greater than 0"),
                });
            } else if interval > window {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "{interval_key}={interval} exceeds {window_key}={window}; only one check will run"
                    ),
                });
            }
        }

        if self.verify.log_tail_lines == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "verify.log_tail_lines is 0; failing pods will be reported without logs"
                    .to_string(),
            });
        }

        let tiers = tier::all();
        for (namespace, owners) in namespace_conflicts(&tiers) {
            let owners: Vec<String> = owners.iter().map(|n| format!("tier {n}")).collect();
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "namespace '{namespace}' is claimed by {}",
                    owners.join(" and ")
                ),
            });
        }

        for t in &tiers {
            for payload in t.payloads() {
                let path = self.payload_path(root, payload);
                if !path.exists() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "tier {}: payload '{}' not found; chart defaults will be used",
                            t.number(),
                            path.display()
                        ),
                    });
                }
            }
        }

        warnings
    }
}

/// Namespaces claimed by more than one tier, with the claiming tier numbers.
pub fn namespace_conflicts(tiers: &[Box<dyn Tier>]) -> Vec<(&'static str, Vec<u8>)> {
    let mut owners: HashMap<&'static str, Vec<u8>> = HashMap::new();
    for t in tiers {
        for ns in t.namespaces() {
            let entry = owners.entry(*ns).or_default();
            if !entry.contains(&t.number()) {
                entry.push(t.number());
            }
        }
    }
    let mut conflicts: Vec<(&'static str, Vec<u8>)> = owners
        .into_iter()
        .filter(|(_, tiers)| tiers.len() > 1)
        .collect();
    conflicts.sort_by_key(|(ns, _)| *ns);
    conflicts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
