//! Scan orchestration.
//!
//! [`LocalScanner`] resolves an artifact's layers through an [`Applier`],
//! then runs the resulting inventory through the OS package and library
//! detectors selected by [`ScanOptions`].
//!
//! ```text
//! layer IDs --> Applier --> ArtifactInventory
//!                                 |
//!              +------------------+------------------+
//!              | "os"                                | "library"
//!     OsPackageDetector                     LibraryDetector (per application)
//!              |                                     |
//!   "<target> (<family> <name>)"              "<file path>"
//!              +------------------+------------------+
//!                                 |
//!                            ScanReport
//! ```
//!
//! A scan is all or nothing: any fatal error discards every result produced
//! so far. An OS without detector coverage is not fatal; the scan goes on
//! without an OS result.

use futures::future::join_all;
use tracing::{debug, info};

use crate::applier::Applier;
use crate::detector::{LibraryDetector, OsDetection, OsPackageDetector};
use crate::error::ScanError;
use crate::model::{
    ArtifactInventory, OsIdentity, Package, ScanOptions, ScanReport, TargetResult,
};

/// Input for one scan in [`LocalScanner::scan_batch`].
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub target: String,
    /// Opaque to the scanner, e.g. a repository digest for a tagged image.
    pub secondary_target: String,
    pub layer_ids: Vec<String>,
    pub options: ScanOptions,
}

/// Scan orchestrator over an applier and the two detectors.
///
/// Holds no mutable state, so one instance can serve concurrent scans.
pub struct LocalScanner {
    applier: Box<dyn Applier>,
    os_detector: Box<dyn OsPackageDetector>,
    library_detector: Box<dyn LibraryDetector>,
}

impl LocalScanner {
    pub fn new(
        applier: Box<dyn Applier>,
        os_detector: Box<dyn OsPackageDetector>,
        library_detector: Box<dyn LibraryDetector>,
    ) -> Self {
        Self {
            applier,
            os_detector,
            library_detector,
        }
    }

    /// Scans the artifact made of `layer_ids`.
    ///
    /// # Errors
    ///
    /// Fails if the layers cannot be applied, if OS package detection fails
    /// for any reason other than an unsupported OS, or if library detection
    /// fails for any application. No partial report is returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use layerscan::applier::{LayerStore, StoreApplier};
    /// use layerscan::detector::{default_library_detector, default_os_detector};
    /// use layerscan::{LocalScanner, ScanOptions};
    ///
    /// # async fn run() -> anyhow::Result<()> {
    /// let scanner = LocalScanner::new(
    ///     Box::new(StoreApplier::new(LayerStore::default_location())),
    ///     Box::new(default_os_detector()),
    ///     Box::new(default_library_detector()),
    /// );
    ///
    /// let layers = vec!["sha256:5216338b40a7".to_string()];
    /// let report = scanner
    ///     .scan("alpine:latest", "", &layers, &ScanOptions::all())
    ///     .await?;
    /// println!("{} vulnerabilities", report.vulnerability_count());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scan(
        &self,
        target: &str,
        secondary_target: &str,
        layer_ids: &[String],
        options: &ScanOptions,
    ) -> Result<ScanReport, ScanError> {
        debug!(
            artifact = %target,
            secondary_target,
            layers = layer_ids.len(),
            vuln_type = ?options.vuln_type,
            "starting scan"
        );

        let inventory = self
            .applier
            .apply_layers(layer_ids)
            .await
            .map_err(|source| ScanError::LayerResolutionFailed { source })?;

        let ArtifactInventory {
            os,
            packages,
            applications,
        } = inventory;

        let mut results = Vec::new();
        let mut eosl = false;

        if options.scans_os() {
            if let Some(os) = os.as_ref().filter(|os| os.is_detected()) {
                let scanned = self.scan_os_packages(target, os, &packages).await?;
                if let Some((result, os_eosl)) = scanned {
                    results.push(result);
                    eosl = os_eosl;
                }
            }
        }

        if options.scans_library() {
            for app in &applications {
                let vulnerabilities = self
                    .library_detector
                    .detect(&app.file_path, &app.libraries)
                    .await
                    .map_err(|source| ScanError::LibraryDetectionFailed {
                        file_path: app.file_path.clone(),
                        source,
                    })?;

                debug!(
                    file_path = %app.file_path,
                    app_type = %app.app_type,
                    vulnerabilities = vulnerabilities.len(),
                    "scanned application libraries"
                );

                if vulnerabilities.is_empty() {
                    continue;
                }
                results.push(TargetResult::libraries(app.file_path.clone(), vulnerabilities));
            }
        }

        Ok(ScanReport { results, os, eosl })
    }

    /// Returns `None` when the detector does not cover the OS.
    async fn scan_os_packages(
        &self,
        target: &str,
        os: &OsIdentity,
        packages: &[Package],
    ) -> Result<Option<(TargetResult, bool)>, ScanError> {
        let detection = self
            .os_detector
            .detect(&os.family, &os.name, packages)
            .await
            .map_err(|source| ScanError::OsPackageDetectionFailed {
                family: os.family.clone(),
                name: os.name.clone(),
                source,
            })?;

        match detection {
            OsDetection::Detected {
                vulnerabilities,
                eosl,
            } => {
                debug!(
                    os = %os,
                    packages = packages.len(),
                    vulnerabilities = vulnerabilities.len(),
                    eosl,
                    "scanned OS packages"
                );
                let result =
                    TargetResult::os_packages(format!("{target} ({os})"), vulnerabilities);
                Ok(Some((result, eosl)))
            }
            OsDetection::Unsupported => {
                info!(os = %os, "OS is not supported, skipping OS package scan");
                Ok(None)
            }
        }
    }

    /// Runs independent scans concurrently.
    ///
    /// Each request is scanned exactly as [`scan`](Self::scan) would; the
    /// returned vector matches `requests` by position.
    pub async fn scan_batch(&self, requests: &[ScanRequest]) -> Vec<Result<ScanReport, ScanError>> {
        let scans = requests.iter().map(|req| {
            self.scan(
                &req.target,
                &req.secondary_target,
                &req.layer_ids,
                &req.options,
            )
        });
        join_all(scans).await
    }
}
