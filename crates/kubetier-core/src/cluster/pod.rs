use crate::error::Result;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PodInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodInfo {
    pub name: String,
    /// Status as `kubectl get pods` would print it in the STATUS column.
    pub status: String,
    pub ready: u32,
    pub containers: u32,
    pub restarts: u32,
}

/// Readiness bucket of a single pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PodCondition {
    /// Running or ran to completion.
    Ready,
    /// Terminal error that will not clear up on its own within a poll window.
    Failing,
    /// Scheduling, pulling, initializing, or terminating.
    Pending,
}

const FAILING_REASONS: &[&str] = &[
    "CrashLoopBackOff",
    "ImagePullBackOff",
    "ErrImagePull",
    "InvalidImageName",
    "OOMKilled",
    "Failed",
    "Evicted",
    "ContainerStatusUnknown",
];

impl PodInfo {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            ready: 0,
            containers: 0,
            restarts: 0,
        }
    }

    pub fn condition(&self) -> PodCondition {
        classify_status(&self.status)
    }

    /// `name  status  ready/containers  restarts` for diagnostic listings.
    pub fn listing_line(&self) -> String {
        format!(
            "{:<50} {:<26} {}/{}  restarts={}",
            self.name, self.status, self.ready, self.containers, self.restarts
        )
    }
}

pub fn classify_status(status: &str) -> PodCondition {
    let reason = status.strip_prefix("Init:").unwrap_or(status);
    match reason {
        "Running" | "Completed" | "Succeeded" if !status.starts_with("Init:") => {
            PodCondition::Ready
        }
        r if FAILING_REASONS.contains(&r) || r.contains("Error") => PodCondition::Failing,
        _ => PodCondition::Pending,
    }
}

// ---------------------------------------------------------------------------
// kubectl JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<PodJson>,
}

#[derive(Debug, Deserialize)]
struct PodJson {
    metadata: Metadata,
    #[serde(default)]
    status: PodStatusJson,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    name: String,
    #[serde(default)]
    deletion_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodStatusJson {
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    init_container_statuses: Vec<ContainerStatusJson>,
    #[serde(default)]
    container_statuses: Vec<ContainerStatusJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerStatusJson {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    restart_count: u32,
    #[serde(default)]
    state: ContainerStateJson,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerStateJson {
    #[serde(default)]
    waiting: Option<StateReason>,
    #[serde(default)]
    terminated: Option<Terminated>,
    #[serde(default)]
    running: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StateReason {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Terminated {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    exit_code: i32,
}

/// Parse the output of `kubectl get pods -o json`.
pub fn parse_pod_list(json: &str) -> Result<Vec<PodInfo>> {
    let list: PodList = serde_json::from_str(json)?;
    Ok(list.items.into_iter().map(pod_info).collect())
}

fn pod_info(pod: PodJson) -> PodInfo {
    let status = display_status(&pod);
    let containers = &pod.status.container_statuses;
    PodInfo {
        ready: containers.iter().filter(|c| c.ready).count() as u32,
        containers: containers.len() as u32,
        restarts: containers.iter().map(|c| c.restart_count).sum(),
        name: pod.metadata.name,
        status,
    }
}

/// Derive the STATUS column the same way `kubectl get pods` does, closely
/// enough for classification: init container problems surface as `Init:*`,
/// container waiting/terminated reasons override the phase.
fn display_status(pod: &PodJson) -> String {
    if pod.metadata.deletion_timestamp.is_some() {
        return "Terminating".to_string();
    }

    let s = &pod.status;
    let mut status = s
        .reason
        .clone()
        .or_else(|| s.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    if status == "Succeeded" {
        status = "Completed".to_string();
    }

    let init_total = s.init_container_statuses.len();
    for (i, c) in s.init_container_statuses.iter().enumerate() {
        if let Some(t) = &c.state.terminated {
            if t.exit_code == 0 {
                continue;
            }
            let reason = t.reason.clone().unwrap_or_else(|| "Error".to_string());
            return format!("Init:{reason}");
        }
        if let Some(reason) = c.state.waiting.as_ref().and_then(|w| w.reason.as_deref()) {
            if reason != "PodInitializing" {
                return format!("Init:{reason}");
            }
        }
        return format!("Init:{i}/{init_total}");
    }

    let mut any_running = false;
    for c in s.container_statuses.iter().rev() {
        if let Some(reason) = c.state.waiting.as_ref().and_then(|w| w.reason.as_ref()) {
            status = reason.clone();
        } else if let Some(t) = &c.state.terminated {
            status = match &t.reason {
                Some(r) => r.clone(),
                None if t.exit_code == 0 => "Completed".to_string(),
                None => "Error".to_string(),
            };
        } else if c.state.running.is_some() && c.ready {
            any_running = true;
        }
    }
    if status == "Completed" && any_running {
        status = "Running".to_string();
    }
    status
}
