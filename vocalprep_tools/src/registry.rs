//! Dataset path registry loaded from YAML.
//!
//! ```yaml
//! data_path: /data/processed
//! datasets:
//!   ProSinger: /data/ProSinger
//!   M4Singer: /data/M4Singer
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Environment variable overriding `data_path` from the file.
pub const DATA_PATH_ENV: &str = "VOCALPREP_DATA_PATH";

/// Maps dataset names to their root directories, plus the root for generated artefacts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PathRegistry {
    /// Where manifests and statistics are written, one subdirectory per dataset.
    pub data_path: PathBuf,
    #[serde(default)]
    pub datasets: BTreeMap<String, PathBuf>,
}

impl PathRegistry {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry file {}", path.display()))?;
        let mut registry = Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse registry file {}", path.display()))?;

        if let Ok(data_path) = std::env::var(DATA_PATH_ENV) {
            registry.data_path = PathBuf::from(data_path);
        }
        Ok(registry)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn dataset_root(&self, name: &str) -> Result<&Path> {
        self.datasets.get(name).map(PathBuf::as_path).ok_or_else(|| {
            let known: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
            anyhow!("Unknown dataset '{}' (registered: {})", name, known.join(", "))
        })
    }

    /// Output directory for artefacts derived from `name`.
    pub fn output_dir(&self, name: &str) -> PathBuf {
        self.data_path.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const YAML: &str = r#"
data_path: /data/processed
datasets:
  ProSinger: /data/ProSinger
  M4Singer: /data/M4Singer
"#;

    #[test]
    fn test_registry_from_yaml() {
        let registry = PathRegistry::from_yaml_str(YAML).unwrap();

        assert_eq!(registry.data_path, PathBuf::from("/data/processed"));
        assert_eq!(
            registry.dataset_root("ProSinger").unwrap(),
            Path::new("/data/ProSinger")
        );
        assert_eq!(
            registry.output_dir("M4Singer"),
            PathBuf::from("/data/processed/M4Singer")
        );
    }

    #[test]
    fn test_unknown_dataset_lists_known_names() {
        let registry = PathRegistry::from_yaml_str(YAML).unwrap();
        let err = registry.dataset_root("OpenCpop").unwrap_err().to_string();

        assert!(err.contains("OpenCpop"));
        assert!(err.contains("M4Singer, ProSinger"));
    }

    #[test]
    fn test_datasets_default_to_empty() {
        let registry = PathRegistry::from_yaml_str("data_path: out\n").unwrap();
        assert!(registry.datasets.is_empty());
    }

    #[test]
    fn test_registry_missing_data_path_is_rejected() {
        assert!(PathRegistry::from_yaml_str("datasets: {}\n").is_err());
    }

    #[test]
    fn test_registry_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("datasets.yaml");
        fs::write(&path, YAML).unwrap();

        let registry = PathRegistry::from_file(&path).unwrap();
        assert_eq!(registry.datasets.len(), 2);

        assert!(PathRegistry::from_file(&temp_dir.path().join("missing.yaml")).is_err());
    }
}
