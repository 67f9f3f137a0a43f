//! `Cluster` backed by the `kubectl` and `helm` binaries.
//!
//! Every call is a blocking subprocess. Stdout is captured and parsed where
//! needed; stderr is captured and carried in `TierError::CommandFailed` so
//! the caller can print it alongside the failing component.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::pod::parse_pod_list;
use super::{Cluster, HelmInstall, ObjectHealth, ObjectQuery, PodInfo};
use crate::config::ToolsConfig;
use crate::error::{Result, TierError};

#[derive(Debug, Clone)]
pub struct KubectlCluster {
    kubectl: PathBuf,
    helm: PathBuf,
    context: Option<String>,
}

impl KubectlCluster {
    /// Locate both binaries. Bare names are looked up on PATH; anything
    /// containing a path separator is used as given.
    pub fn detect(tools: &ToolsConfig) -> Result<Self> {
        Ok(Self {
            kubectl: locate(&tools.kubectl)?,
            helm: locate(&tools.helm)?,
            context: tools.context.clone(),
        })
    }

    fn kubectl(&self) -> Command {
        let mut cmd = Command::new(&self.kubectl);
        if let Some(ctx) = &self.context {
            cmd.args(["--context", ctx.as_str()]);
        }
        cmd
    }

    fn helm(&self) -> Command {
        let mut cmd = Command::new(&self.helm);
        if let Some(ctx) = &self.context {
            cmd.args(["--kube-context", ctx.as_str()]);
        }
        cmd
    }
}

fn locate(tool: &str) -> Result<PathBuf> {
    if tool.contains(['/', '\\']) {
        let path = PathBuf::from(tool);
        if path.exists() {
            return Ok(path);
        }
        return Err(TierError::ToolNotFound(tool.to_string()));
    }
    which::which(tool).map_err(|_| TierError::ToolNotFound(tool.to_string()))
}

/// Run `cmd` with `args`, returning stdout on success.
fn run(mut cmd: Command, args: &[String]) -> Result<String> {
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let program = cmd.get_program().to_string_lossy().into_owned();
    tracing::debug!(%program, args = %args.join(" "), "exec");

    let output = cmd.output().map_err(|e| TierError::SpawnFailed {
        program: program.clone(),
        reason: e.to_string(),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(TierError::CommandFailed {
            program,
            args: args.join(" "),
            code: output.status.code(),
            stderr: stderr.chars().take(2000).collect(),
        });
    }
    Ok(stdout)
}

fn log_args(namespace: &str, pod: &str, tail: u32, previous: bool) -> Vec<String> {
    let mut args = strings(["logs", pod, "--namespace", namespace, "--all-containers"]);
    args.push(format!("--tail={tail}"));
    if previous {
        args.push("--previous".to_string());
    }
    args
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

impl Cluster for KubectlCluster {
    fn list_pods(&self, namespace: &str, selector: Option<&str>) -> Result<Vec<PodInfo>> {
        let mut args = strings(["get", "pods", "--namespace", namespace, "-o", "json"]);
        if let Some(sel) = selector {
            args.push("--selector".to_string());
            args.push(sel.to_string());
        }
        let out = run(self.kubectl(), &args)?;
        parse_pod_list(&out)
    }

    fn pod_logs(&self, namespace: &str, pod: &str, tail: u32, previous: bool) -> Result<String> {
        if previous {
            match run(self.kubectl(), &log_args(namespace, pod, tail, true)) {
                Ok(out) if !out.trim().is_empty() => return Ok(out),
                Ok(_) => {}
                Err(e) => tracing::debug!(pod, error = %e, "no previous logs, using current"),
            }
        }
        run(self.kubectl(), &log_args(namespace, pod, tail, false))
    }

    fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let args = strings(["get", "namespace", namespace, "--ignore-not-found", "-o", "name"]);
        let out = run(self.kubectl(), &args)?;
        Ok(!out.trim().is_empty())
    }

    fn object_health(&self, query: &ObjectQuery) -> Result<ObjectHealth> {
        let args = strings(["get", query.resource, "-o", "json"]);
        let out = run(self.kubectl(), &args)?;
        let value: serde_json::Value = serde_json::from_str(&out)?;
        Ok(count_object_health(&value, query))
    }

    fn helm_repo_add(&self, name: &str, url: &str) -> Result<()> {
        run(self.helm(), &strings(["repo", "add", name, url, "--force-update"]))?;
        Ok(())
    }

    fn helm_repo_update(&self) -> Result<()> {
        run(self.helm(), &strings(["repo", "update"]))?;
        Ok(())
    }

    fn helm_upgrade_install(&self, install: &HelmInstall) -> Result<()> {
        let out = run(self.helm(), &install.to_args())?;
        tracing::debug!(release = %install.release, output = %out.trim(), "helm upgrade --install");
        Ok(())
    }

    fn helm_uninstall(&self, release: &str, namespace: &str) -> Result<()> {
        run(
            self.helm(),
            &strings(["uninstall", release, "--namespace", namespace]),
        )?;
        Ok(())
    }

    fn apply_file(&self, path: &Path) -> Result<()> {
        let file = path.display().to_string();
        run(self.kubectl(), &strings(["apply", "-f", file.as_str()]))?;
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let file = path.display().to_string();
        run(
            self.kubectl(),
            &strings(["delete", "-f", file.as_str(), "--ignore-not-found"]),
        )?;
        Ok(())
    }

    fn delete_namespace(&self, namespace: &str) -> Result<()> {
        run(
            self.kubectl(),
            &strings(["delete", "namespace", namespace, "--ignore-not-found", "--wait=false"]),
        )?;
        Ok(())
    }
}

/// Count objects matching `query` and how many of them report the query's
/// condition as `"True"`.
fn count_object_health(list: &serde_json::Value, query: &ObjectQuery) -> ObjectHealth {
    let items = list
        .get("items")
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[]);

    let mut health = ObjectHealth::default();
    for item in items {
        let name = item
            .pointer("/metadata/name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if !name.ends_with(query.name_suffix) {
            continue;
        }
        health.total += 1;
        let healthy = item
            .pointer("/status/conditions")
            .and_then(|v| v.as_array())
            .is_some_and(|conds| {
                conds.iter().any(|c| {
                    c.get("type").and_then(|t| t.as_str()) == Some(query.condition)
                        && c.get("status").and_then(|s| s.as_str()) == Some("True")
                })
            });
        if healthy {
            health.healthy += 1;
        }
    }
    health
}
