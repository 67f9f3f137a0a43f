use crate::cluster::HelmInstall;
use crate::component::{self, Component};
use crate::context::InstallContext;
use crate::error::Result;
use crate::status;

/// Resolve the `helm upgrade --install` call for `component`. The payload
/// is passed only if the file exists.
pub fn resolve_install(
    ctx: &InstallContext,
    component: &Component,
    extra_args: &[&str],
) -> HelmInstall {
    let values = component.payload.and_then(|payload| {
        let path = ctx.payload_path(payload);
        if path.exists() {
            Some(path)
        } else {
            tracing::info!(
                component = component.name,
                path = %path.display(),
                "payload not found, using chart defaults"
            );
            None
        }
    });

    HelmInstall {
        release: component.release.to_string(),
        chart: component.chart.to_string(),
        namespace: component.namespace.to_string(),
        version: component.version.map(str::to_string),
        values,
        timeout: component.timeout,
        extra_args: component
            .args
            .iter()
            .chain(extra_args.iter())
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Create-or-update `component` in its namespace and block until Helm's own
/// readiness gate passes or the component timeout elapses.
///
/// A non-zero exit is returned to the caller, which decides whether it
/// ends the run.
pub fn helm_install(
    ctx: &InstallContext,
    component: &Component,
    extra_args: &[&str],
) -> Result<()> {
    let install = resolve_install(ctx, component, extra_args);
    status::info(format!(
        "helm upgrade --install {} {} -n {} (timeout {}s{})",
        install.release,
        install.chart,
        install.namespace,
        install.timeout.as_secs(),
        if install.values.is_some() {
            ", with values"
        } else {
            ""
        }
    ));
    ctx.cluster.helm_upgrade_install(&install)
}

/// Register every repository the components pull from, then refresh the
/// local index.
pub fn setup_repositories(ctx: &InstallContext, components: &[Component]) -> Result<()> {
    for repo in component::repositories(components) {
        tracing::debug!(name = repo.name, url = repo.url, "helm repo add");
        ctx.cluster.helm_repo_add(repo.name, repo.url)?;
    }
    ctx.cluster.helm_repo_update()
}
