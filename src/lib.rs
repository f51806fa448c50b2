pub mod applier;
pub mod cache;
pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod scanner;

pub use cache::Cache;
pub use config::Config;
pub use error::ScanError;
pub use model::{
    Application, ArtifactInventory, DetectedVulnerability, Library, OsIdentity, Package,
    ResultClass, ScanOptions, ScanReport, Severity, TargetResult,
};
pub use scanner::{LocalScanner, ScanRequest};
