use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelmRepo {
    pub name: &'static str,
    pub url: &'static str,
}

/// One independently installable unit. Defined as `const` per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Human-facing name used in status lines and the failure ledger.
    pub name: &'static str,
    pub release: &'static str,
    pub chart: &'static str,
    pub repo: HelmRepo,
    pub version: Option<&'static str>,
    pub namespace: &'static str,
    /// Values file relative to the configured values directory.
    pub payload: Option<&'static str>,
    pub timeout: Duration,
    /// Narrows health verification to matching pods.
    pub selector: Option<&'static str>,
    /// Fixed arguments appended to every install of this component.
    pub args: &'static [&'static str],
}

/// Distinct repositories used by `components`, in order of first use.
pub fn repositories(components: &[Component]) -> Vec<HelmRepo> {
    let mut repos: Vec<HelmRepo> = Vec::new();
    for c in components {
        if !repos.iter().any(|r| r.name == c.repo.name) {
            repos.push(c.repo);
        }
    }
    repos
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: HelmRepo = HelmRepo {
        name: "istio",
        url: "https://istio-release.storage.googleapis.com/charts",
    };
    const B: HelmRepo = HelmRepo {
        name: "jetstack",
        url: "https://charts.jetstack.io",
    };

    fn component(release: &'static str, repo: HelmRepo) -> Component {
        Component {
            name: release,
            release,
            chart: "x/y",
            repo,
            version: None,
            namespace: "ns",
            payload: None,
            timeout: Duration::from_secs(60),
            selector: None,
            args: &[],
        }
    }

    #[test]
    fn repositories_are_deduplicated_in_first_use_order() {
        let cs = [
            component("cert-manager", B),
            component("istio-base", A),
            component("istiod", A),
        ];
        let repos = repositories(&cs);
        assert_eq!(repos, vec![B, A]);
    }
}
