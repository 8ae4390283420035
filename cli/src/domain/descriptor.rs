//! Plugin descriptors: the data that parameterizes the generic lifecycle
//! controller for one containerized application.
//!
//! Pure types and validation only (no I/O).

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::DescriptorError;

/// Suffix of image archive files inside the image directory.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Recommended port range for application ports.
pub const RECOMMENDED_PORTS: std::ops::RangeInclusive<u16> = 20000..=30000;

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex")
});

/// Where the application's source artifact is checked out from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Git repository URL.
    pub repository: String,
    /// Name of the checkout directory created under the install location.
    pub directory: String,
    /// Prefix prepended to the version to form the tag, e.g. `v`.
    #[serde(default)]
    pub tag_prefix: String,
}

impl SourceSpec {
    /// Tag checked out for `version`.
    #[must_use]
    pub fn tag(&self, version: &str) -> String {
        format!("{}{version}", self.tag_prefix)
    }
}

/// Per-application metadata consumed by the controller and the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Stable identifier, also the persistence namespace.
    pub key: String,
    /// Human-readable display name.
    pub name: String,
    /// Icon URL or path.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    /// Host port the running application occupies.
    pub port: u16,
    /// Operator / management port.
    pub op_port: u16,
    /// Container images needed to run, in load order.
    pub required_images: Vec<String>,
    /// Installable versions; the first one is the default.
    pub versions: Vec<String>,
    pub source: SourceSpec,
    /// Environment variable that receives the external host address on start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_env: Option<String>,
}

impl PluginDescriptor {
    /// Version installed when the caller does not pick one.
    #[must_use]
    pub fn default_version(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    /// Whether `version` is one of the selectable versions.
    #[must_use]
    pub fn supports_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

/// Validates an app key: `[A-Za-z0-9_-]+`.
///
/// # Errors
///
/// Returns an error if the key is empty or contains other characters.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = KEY_RE.is_match(key);
    if !valid {
        return Err(DescriptorError::InvalidKey(key.to_string()).into());
    }
    Ok(())
}

/// Validates the structural invariants of a descriptor.
///
/// # Errors
///
/// Returns an error describing the first violated invariant.
pub fn validate_descriptor(desc: &PluginDescriptor) -> Result<()> {
    validate_key(&desc.key)?;
    let invalid = |reason: &str| -> anyhow::Error {
        DescriptorError::Invalid {
            key: desc.key.clone(),
            reason: reason.to_string(),
        }
        .into()
    };
    if desc.name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if desc.port == 0 || desc.op_port == 0 {
        return Err(invalid("ports must be non-zero"));
    }
    if desc.port == desc.op_port {
        return Err(invalid("port and op_port must differ"));
    }
    if desc.versions.is_empty() {
        return Err(invalid("at least one version is required"));
    }
    if desc.source.repository.trim().is_empty() {
        return Err(invalid("source.repository must not be empty"));
    }
    let dir = desc.source.directory.as_str();
    if dir.is_empty() || dir == "." || dir == ".." || dir.contains('/') {
        return Err(invalid("source.directory must be a single path component"));
    }
    for (i, image) in desc.required_images.iter().enumerate() {
        if image.trim().is_empty() {
            return Err(invalid("required_images must not contain empty entries"));
        }
        if desc.required_images[..i].contains(image) {
            return Err(invalid(&format!("duplicate required image '{image}'")));
        }
    }
    Ok(())
}

/// Non-fatal observations about a valid descriptor.
#[must_use]
pub fn validate_descriptor_warnings(desc: &PluginDescriptor) -> Vec<String> {
    let mut warnings = Vec::new();
    if !RECOMMENDED_PORTS.contains(&desc.port) {
        warnings.push(format!(
            "port {} is outside the recommended range {}-{}",
            desc.port,
            RECOMMENDED_PORTS.start(),
            RECOMMENDED_PORTS.end()
        ));
    }
    warnings
}

/// Archive filename for an image identifier: every `/` becomes `_`, then the
/// archive suffix is appended.
#[must_use]
pub fn archive_file_name(image: &str) -> String {
    format!("{}{ARCHIVE_SUFFIX}", image.replace('/', "_"))
}

/// The built-in CVAT annotation tool descriptor.
#[must_use]
pub fn cvat() -> PluginDescriptor {
    PluginDescriptor {
        key: "cvat".to_string(),
        name: "CVAT annotation tool".to_string(),
        icon: "https://featurize-public.oss-cn-beijing.aliyuncs.com/apps/cvat.png".to_string(),
        description: "Annotation tool for images and video.".to_string(),
        port: 8080,
        op_port: 30009,
        required_images: [
            "postgres",
            "redis",
            "apache/kvrocks",
            "cvat/server",
            "cvat/ui",
            "traefik",
            "openpolicyagent/opa",
            "clickhouse/clickhouse-server",
            "timberio/vector",
            "grafana/grafana-oss",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        versions: vec!["2.11.3".to_string()],
        source: SourceSpec {
            repository: "https://github.com/cvat-ai/cvat".to_string(),
            directory: "cvat".to_string(),
            tag_prefix: "v".to_string(),
        },
        host_env: Some("CVAT_HOST".to_string()),
    }
}

/// Descriptors compiled into the binary.
#[must_use]
pub fn builtin() -> Vec<PluginDescriptor> {
    vec![cvat()]
}
