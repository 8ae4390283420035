//! Application service: the set of apps AppHub can manage.

use anyhow::Result;

use crate::application::ports::DescriptorSource;
use crate::domain::descriptor::{
    self, PluginDescriptor, validate_descriptor, validate_descriptor_warnings,
};
use crate::domain::error::DescriptorError;

/// Built-in descriptors plus those supplied by a `DescriptorSource`.
#[derive(Debug, Clone)]
pub struct Catalog {
    descriptors: Vec<PluginDescriptor>,
}

impl Catalog {
    /// Build a catalog from explicit descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if a descriptor is invalid or two share a key.
    pub fn from_descriptors(descriptors: Vec<PluginDescriptor>) -> Result<Self> {
        for (i, desc) in descriptors.iter().enumerate() {
            validate_descriptor(desc)?;
            for warning in validate_descriptor_warnings(desc) {
                tracing::debug!(app = %desc.key, "{warning}");
            }
            if descriptors[..i].iter().any(|d| d.key == desc.key) {
                return Err(DescriptorError::DuplicateKey(desc.key.clone()).into());
            }
        }
        Ok(Self { descriptors })
    }

    /// Built-in descriptors followed by everything `source` provides.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails, a descriptor is invalid, or an
    /// extra descriptor reuses a key.
    pub fn load(source: &impl DescriptorSource) -> Result<Self> {
        let mut descriptors = descriptor::builtin();
        descriptors.extend(source.load_descriptors()?);
        Self::from_descriptors(descriptors)
    }

    /// Look up a descriptor by key.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::NotFound` for an unknown key.
    pub fn get(&self, key: &str) -> Result<&PluginDescriptor> {
        descriptor::validate_key(key)?;
        self.descriptors
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| DescriptorError::NotFound(key.to_string()).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.descriptors.iter()
    }
}
