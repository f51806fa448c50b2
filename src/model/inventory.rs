use serde::{Deserialize, Serialize};

/// Operating system identity resolved from an artifact's layers.
///
/// The zero value (both fields empty) means no OS was detected, which is
/// different from an OS that was detected but has no vulnerability coverage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OsIdentity {
    pub family: String,
    pub name: String,
}

impl OsIdentity {
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
        }
    }

    /// Returns false for the zero value.
    pub fn is_detected(&self) -> bool {
        !(self.family.is_empty() && self.name.is_empty())
    }
}

impl std::fmt::Display for OsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.name)
    }
}

/// An installed OS package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A library dependency declared by an [`Application`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub version: String,
}

impl Library {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A language ecosystem manifest found in the artifact, such as a lockfile.
///
/// `file_path` is relative to the artifact root and identifies the
/// application uniquely within one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "type")]
    pub app_type: String,
    pub file_path: String,
    #[serde(default)]
    pub libraries: Vec<Library>,
}

impl Application {
    pub fn new(app_type: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            app_type: app_type.into(),
            file_path: file_path.into(),
            libraries: Vec::new(),
        }
    }

    pub fn with_libraries(mut self, libraries: Vec<Library>) -> Self {
        self.libraries = libraries;
        self
    }
}

/// The merged software inventory of an artifact.
///
/// `packages` only carries meaning when `os` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInventory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsIdentity>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub applications: Vec<Application>,
}
