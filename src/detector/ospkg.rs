use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::eol::is_end_of_life;
use super::osv::OsvClient;
use super::{OsDetection, OsPackageDetector};
use crate::model::Package;

/// OS package detector backed by the OSV distribution feeds.
///
/// Covers Alpine, Debian and Ubuntu. Every other family is reported as
/// [`OsDetection::Unsupported`].
pub struct OsvOsPackageDetector {
    client: OsvClient,
    now: Option<DateTime<Utc>>,
}

impl OsvOsPackageDetector {
    pub fn new(client: OsvClient) -> Self {
        Self { client, now: None }
    }

    /// Pins the date used for end of support life checks.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[async_trait]
impl OsPackageDetector for OsvOsPackageDetector {
    async fn detect(
        &self,
        os_family: &str,
        os_name: &str,
        packages: &[Package],
    ) -> Result<OsDetection> {
        let Some(ecosystem) = ecosystem_for_os(os_family, os_name) else {
            debug!(os_family, os_name, "no OSV feed for OS");
            return Ok(OsDetection::Unsupported);
        };

        let queries: Vec<(&str, &str)> = packages
            .iter()
            .map(|p| (p.name.as_str(), p.version.as_str()))
            .collect();
        let vulnerabilities = self.client.query(&ecosystem, &queries).await?;

        let now = self.now.unwrap_or_else(Utc::now);
        Ok(OsDetection::Detected {
            vulnerabilities,
            eosl: is_end_of_life(os_family, os_name, now),
        })
    }
}

/// Reduces an OS version to the release line its vulnerability feed and
/// support window are tracked under.
pub(crate) fn normalize_os_version(os_family: &str, os_name: &str) -> String {
    match os_family {
        "alpine" | "ubuntu" => os_name.split('.').take(2).collect::<Vec<_>>().join("."),
        "debian" => os_name.split('.').next().unwrap_or(os_name).to_string(),
        _ => os_name.to_string(),
    }
}

/// Returns the OSV ecosystem for an OS, or `None` if OSV has no feed for it.
pub fn ecosystem_for_os(os_family: &str, os_name: &str) -> Option<String> {
    if os_name.is_empty() {
        return None;
    }
    let version = normalize_os_version(os_family, os_name);
    match os_family {
        "alpine" => Some(format!("Alpine:v{version}")),
        "debian" => Some(format!("Debian:{version}")),
        "ubuntu" => {
            if is_ubuntu_lts(&version) {
                Some(format!("Ubuntu:{version}:LTS"))
            } else {
                Some(format!("Ubuntu:{version}"))
            }
        }
        _ => None,
    }
}

fn is_ubuntu_lts(version: &str) -> bool {
    match version.split_once('.') {
        Some((year, "04")) => year.parse::<u32>().map(|y| y % 2 == 0).unwrap_or(false),
        _ => false,
    }
}
