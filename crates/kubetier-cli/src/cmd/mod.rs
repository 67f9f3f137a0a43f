pub mod cleanup;
pub mod config;
pub mod install;
pub mod summary;
pub mod tiers;
pub mod validate;

use anyhow::Context;
use kubetier_core::cluster::KubectlCluster;
use kubetier_core::config::Config;
use std::path::Path;

/// Load the config and locate `kubectl`/`helm`. Every cluster-facing
/// command starts here.
pub(crate) fn connect(root: &Path) -> anyhow::Result<(Config, KubectlCluster)> {
    let config = Config::load(root).context("failed to load config")?;
    let cluster = KubectlCluster::detect(&config.tools)
        .context("kubectl and helm must be installed (or set tools.* in kubetier.yaml)")?;
    Ok((config, cluster))
}
