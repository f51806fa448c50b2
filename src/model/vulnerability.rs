use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "UNKNOWN",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A vulnerability matched against one installed package or library.
///
/// The scanner passes these through untouched; only detectors fill them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedVulnerability {
    pub vulnerability_id: String,
    pub pkg_name: String,
    pub installed_version: String,
    /// Empty when no fixed version is known.
    #[serde(default)]
    pub fixed_version: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

impl DetectedVulnerability {
    pub fn new(
        vulnerability_id: impl Into<String>,
        pkg_name: impl Into<String>,
        installed_version: impl Into<String>,
        fixed_version: impl Into<String>,
    ) -> Self {
        Self {
            vulnerability_id: vulnerability_id.into(),
            pkg_name: pkg_name.into(),
            installed_version: installed_version.into(),
            fixed_version: fixed_version.into(),
            severity: Severity::Unknown,
            title: None,
            reference_url: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
