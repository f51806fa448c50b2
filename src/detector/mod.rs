//! Vulnerability detectors.
//!
//! The scanner talks to two detection capabilities:
//!
//! - [`OsPackageDetector`] matches OS packages, keyed by OS family and version
//! - [`LibraryDetector`] matches application libraries, keyed by file path
//!
//! The OSV-backed implementations ([`OsvOsPackageDetector`] and
//! [`OsvLibraryDetector`]) share one [`OsvClient`].

mod eol;
mod library;
mod osv;
mod ospkg;

pub use eol::{end_of_life_date, is_end_of_life};
pub use library::{ecosystem_for_file, OsvLibraryDetector};
pub use osv::{parse_cvss_score, OsvClient, DEFAULT_OSV_URL};
pub use ospkg::{ecosystem_for_os, OsvOsPackageDetector};

use crate::model::{DetectedVulnerability, Library, Package};
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of a successful OS package detection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsDetection {
    /// The OS is covered and its packages were matched.
    Detected {
        vulnerabilities: Vec<DetectedVulnerability>,
        /// The OS version is past its end of support life.
        eosl: bool,
    },
    /// The OS was recognized but no vulnerability data exists for it.
    Unsupported,
}

#[async_trait]
pub trait OsPackageDetector: Send + Sync {
    /// Matches `packages` installed on `os_family` `os_name`.
    ///
    /// # Errors
    ///
    /// Returns an error only when detection itself failed. An OS without
    /// coverage is reported as [`OsDetection::Unsupported`].
    async fn detect(
        &self,
        os_family: &str,
        os_name: &str,
        packages: &[Package],
    ) -> Result<OsDetection>;
}

#[async_trait]
pub trait LibraryDetector: Send + Sync {
    /// Matches the libraries declared by the application at `file_path`.
    async fn detect(
        &self,
        file_path: &str,
        libraries: &[Library],
    ) -> Result<Vec<DetectedVulnerability>>;
}

pub fn default_os_detector() -> OsvOsPackageDetector {
    OsvOsPackageDetector::new(OsvClient::new())
}

pub fn default_library_detector() -> OsvLibraryDetector {
    OsvLibraryDetector::new(OsvClient::new())
}
