//! Infrastructure implementation of the `DescriptorSource` port.
//!
//! Each `*.yaml` / `*.yml` file in the apps directory holds one descriptor.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::DescriptorSource;
use crate::domain::descriptor::PluginDescriptor;

/// Loads descriptors from a directory of YAML files.
#[derive(Debug, Clone)]
pub struct YamlDescriptorDir {
    dir: PathBuf,
}

impl YamlDescriptorDir {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl DescriptorSource for YamlDescriptorDir {
    fn load_descriptors(&self) -> Result<Vec<PluginDescriptor>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = std::fs::read_dir(&self.dir)
            .with_context(|| format!("cannot read {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e == "yaml" || e == "yml")
            })
            .collect::<Vec<_>>();
        paths.sort();

        paths
            .iter()
            .map(|path| {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                serde_yaml::from_str(&content)
                    .with_context(|| format!("cannot parse {}", path.display()))
            })
            .collect()
    }
}
