use serde::{Deserialize, Serialize};

/// Selector value that enables OS package detection.
pub const VULN_TYPE_OS: &str = "os";
/// Selector value that enables application library detection.
pub const VULN_TYPE_LIBRARY: &str = "library";

/// Options controlling which detectors a scan runs.
///
/// Values other than [`VULN_TYPE_OS`] and [`VULN_TYPE_LIBRARY`] are accepted
/// and ignored. The default selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub vuln_type: Vec<String>,
}

impl ScanOptions {
    pub fn new<I, S>(vuln_type: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vuln_type: vuln_type.into_iter().map(Into::into).collect(),
        }
    }

    /// Selects both OS and library detection.
    pub fn all() -> Self {
        Self::new([VULN_TYPE_OS, VULN_TYPE_LIBRARY])
    }

    pub fn scans_os(&self) -> bool {
        self.contains(VULN_TYPE_OS)
    }

    pub fn scans_library(&self) -> bool {
        self.contains(VULN_TYPE_LIBRARY)
    }

    fn contains(&self, value: &str) -> bool {
        self.vuln_type.iter().any(|v| v == value)
    }
}

impl std::str::FromStr for ScanOptions {
    type Err = std::convert::Infallible;

    /// Parses a comma separated selector such as `"os,library"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(
            s.split(',').map(str::trim).filter(|v| !v.is_empty()),
        ))
    }
}
