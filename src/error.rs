//! Errors returned by [`LocalScanner::scan`](crate::LocalScanner::scan).
//!
//! Each variant names the stage that failed. The collaborator's error is kept
//! as the [`source`](std::error::Error::source) so callers can still inspect
//! it; format through `anyhow` with `{:#}` to print the whole chain.

/// A fatal scan failure. A scan that fails returns no partial results.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The applier could not produce an inventory for the requested layers.
    #[error("failed to apply layers")]
    LayerResolutionFailed {
        #[source]
        source: anyhow::Error,
    },

    /// The OS package detector failed for a reason other than an unsupported OS.
    #[error("failed to scan OS packages ({family} {name})")]
    OsPackageDetectionFailed {
        family: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The library detector failed for one application file.
    #[error("failed to scan application libraries ({file_path})")]
    LibraryDetectionFailed {
        file_path: String,
        #[source]
        source: anyhow::Error,
    },
}
