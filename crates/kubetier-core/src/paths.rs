use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "kubetier.yaml";
pub const DEFAULT_VALUES_DIR: &str = "values";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a payload path relative to the values directory. Absolute
/// `values_dir` settings are honored as-is.
pub fn payload_path(root: &Path, values_dir: &Path, payload: &str) -> PathBuf {
    root.join(values_dir).join(payload)
}
