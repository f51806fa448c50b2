//! Core data types for artifact inventories, vulnerabilities, and scan reports.
//!
//! This module contains the fundamental types used throughout layerscan:
//!
//! - [`ArtifactInventory`] - The merged contents of an artifact's layers
//! - [`OsIdentity`] - Operating system family and version
//! - [`Package`] / [`Application`] / [`Library`] - Installed software
//! - [`DetectedVulnerability`] - A vulnerability matched by a detector
//! - [`TargetResult`] / [`ScanReport`] - Scan output
//! - [`ScanOptions`] - Which detectors a scan runs
//!
//! # Example
//!
//! ```
//! use layerscan::{ArtifactInventory, OsIdentity, Package};
//!
//! let inventory = ArtifactInventory {
//!     os: Some(OsIdentity::new("alpine", "3.11")),
//!     packages: vec![Package::new("musl", "1.2.3")],
//!     applications: Vec::new(),
//! };
//!
//! println!("Inventory has {} OS packages", inventory.packages.len());
//! ```

mod inventory;
mod options;
mod report;
mod vulnerability;

pub use inventory::*;
pub use options::*;
pub use report::*;
pub use vulnerability::*;
