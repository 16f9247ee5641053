use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned to a sandbox by the service.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SandboxId(pub String);

impl SandboxId {
    /// Creates a sandbox id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SandboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SandboxId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SandboxId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&SandboxId> for SandboxId {
    fn from(value: &SandboxId) -> Self {
        value.clone()
    }
}

/// Language runtime of a sandbox or a single execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Bash,
    /// A runtime this client version does not know about.
    #[serde(other)]
    Other,
}

/// Lifecycle state reported by the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxStatus {
    Creating,
    Running,
    Stopped,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Sandbox description returned by create/get/list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxInfo {
    pub id: SandboxId,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub status: SandboxStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Service-defined extra fields (image, region, labels...).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Parameters for creating a sandbox.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSandboxRequest {
    pub language: Language,
    /// Idle lifetime after which the service may reclaim the sandbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl CreateSandboxRequest {
    /// Creates a request for the given language with no extra settings.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            timeout_secs: None,
            env: BTreeMap::new(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Sets the sandbox idle timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Adds an environment variable visible to all executions.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Attaches a metadata entry stored alongside the sandbox.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Default for CreateSandboxRequest {
    fn default() -> Self {
        Self::new(Language::Python)
    }
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Package manager used for an install.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Pip,
    Npm,
}

/// Packages to install into a sandbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPackagesRequest {
    pub packages: Vec<String>,
    /// Defaults to the sandbox language's manager on the service side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<PackageManager>,
}

impl InstallPackagesRequest {
    /// Creates a request for the given package specs (`numpy`, `lodash@4`...).
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
            manager: None,
        }
    }

    /// Forces a specific package manager.
    pub fn manager(mut self, manager: PackageManager) -> Self {
        self.manager = Some(manager);
        self
    }
}

/// Outcome of a package install.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInstallResult {
    #[serde(default)]
    pub installed: Vec<String>,
    /// Raw installer output.
    #[serde(default)]
    pub output: String,
}
