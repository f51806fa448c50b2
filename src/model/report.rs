use serde::{Deserialize, Serialize};

use super::{DetectedVulnerability, OsIdentity};

/// What a [`TargetResult`] was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultClass {
    /// The OS package set as a whole.
    #[serde(rename = "os-pkgs")]
    OsPackages,
    /// The libraries of one application file.
    #[serde(rename = "lang-pkgs")]
    Libraries,
}

/// Vulnerabilities attributed to one target: the OS as a whole or a single
/// application file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: String,
    pub class: ResultClass,
    pub vulnerabilities: Vec<DetectedVulnerability>,
}

impl TargetResult {
    pub fn os_packages(
        target: impl Into<String>,
        vulnerabilities: Vec<DetectedVulnerability>,
    ) -> Self {
        Self {
            target: target.into(),
            class: ResultClass::OsPackages,
            vulnerabilities,
        }
    }

    pub fn libraries(
        file_path: impl Into<String>,
        vulnerabilities: Vec<DetectedVulnerability>,
    ) -> Self {
        Self {
            target: file_path.into(),
            class: ResultClass::Libraries,
            vulnerabilities,
        }
    }
}

/// Output of a single scan.
///
/// When present, the OS result comes first; application results follow in
/// the order the applier reported the applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub results: Vec<TargetResult>,
    pub os: Option<OsIdentity>,
    /// Whether the detected OS version is past its end of support life.
    pub eosl: bool,
}

impl ScanReport {
    pub fn vulnerability_count(&self) -> usize {
        self.results.iter().map(|r| r.vulnerabilities.len()).sum()
    }

    /// Drops vulnerabilities for which `keep` returns false.
    ///
    /// An application result left with no vulnerabilities is removed, the
    /// same as one that never had any. The OS result is always kept.
    pub fn retain_vulnerabilities<F>(&mut self, mut keep: F)
    where
        F: FnMut(&DetectedVulnerability) -> bool,
    {
        for result in &mut self.results {
            result.vulnerabilities.retain(|v| keep(v));
        }
        self.results.retain(|result| {
            result.class == ResultClass::OsPackages || !result.vulnerabilities.is_empty()
        });
    }
}
