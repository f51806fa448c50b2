//! Test doubles for the scanner's collaborators.
//!
//! Each double is loaded with the calls it expects and what to return for
//! each. A call that was not expected panics; `assert_expectations` checks
//! that every expected call happened.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use layerscan::applier::Applier;
use layerscan::detector::{LibraryDetector, OsDetection, OsPackageDetector};
use layerscan::{ArtifactInventory, DetectedVulnerability, Library, Package};

/// What a double returns for one expected call. Errors are kept as strings
/// so expectations stay `Clone`.
#[derive(Debug, Clone)]
pub enum Returns<T> {
    Ok(T),
    Err(String),
}

impl<T: Clone> Returns<T> {
    fn to_result(&self) -> Result<T> {
        match self {
            Returns::Ok(value) => Ok(value.clone()),
            Returns::Err(msg) => Err(anyhow!(msg.clone())),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockApplier {
    expected: Arc<Mutex<Option<(Vec<String>, Returns<ArtifactInventory>)>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockApplier {
    pub fn expect(layer_ids: &[&str], returns: Returns<ArtifactInventory>) -> Self {
        let applier = Self::default();
        *applier.expected.lock().unwrap() = Some((
            layer_ids.iter().map(|s| s.to_string()).collect(),
            returns,
        ));
        applier
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn assert_expectations(&self) {
        assert_eq!(self.calls(), 1, "apply_layers should be called once");
    }
}

#[async_trait]
impl Applier for MockApplier {
    async fn apply_layers(&self, layer_ids: &[String]) -> Result<ArtifactInventory> {
        *self.calls.lock().unwrap() += 1;
        let expected = self.expected.lock().unwrap().clone();
        let (want_ids, returns) = expected.expect("unexpected call to apply_layers");
        assert_eq!(layer_ids, want_ids.as_slice(), "apply_layers called with wrong layers");
        returns.to_result()
    }
}

#[derive(Debug, Clone)]
pub struct OsDetectExpectation {
    pub os_family: String,
    pub os_name: String,
    pub packages: Vec<Package>,
    pub returns: Returns<OsDetection>,
}

impl OsDetectExpectation {
    pub fn new(
        os_family: &str,
        os_name: &str,
        packages: Vec<Package>,
        returns: Returns<OsDetection>,
    ) -> Self {
        Self {
            os_family: os_family.to_string(),
            os_name: os_name.to_string(),
            packages,
            returns,
        }
    }
}

#[derive(Clone, Default)]
pub struct MockOsDetector {
    expectations: Arc<Mutex<Vec<OsDetectExpectation>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockOsDetector {
    pub fn new(expectations: Vec<OsDetectExpectation>) -> Self {
        Self {
            expectations: Arc::new(Mutex::new(expectations)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn assert_expectations(&self) {
        assert_eq!(
            self.calls(),
            self.expectations.lock().unwrap().len(),
            "OS detector call count"
        );
    }
}

#[async_trait]
impl OsPackageDetector for MockOsDetector {
    async fn detect(
        &self,
        os_family: &str,
        os_name: &str,
        packages: &[Package],
    ) -> Result<OsDetection> {
        *self.calls.lock().unwrap() += 1;
        let expectation = self
            .expectations
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.os_family == os_family && e.os_name == os_name && e.packages == packages)
            .cloned();
        match expectation {
            Some(e) => e.returns.to_result(),
            None => panic!("unexpected OS detect call: {os_family} {os_name} {packages:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LibraryDetectExpectation {
    pub file_path: String,
    pub libraries: Vec<Library>,
    pub returns: Returns<Vec<DetectedVulnerability>>,
}

impl LibraryDetectExpectation {
    pub fn new(
        file_path: &str,
        libraries: Vec<Library>,
        returns: Returns<Vec<DetectedVulnerability>>,
    ) -> Self {
        Self {
            file_path: file_path.to_string(),
            libraries,
            returns,
        }
    }
}

#[derive(Clone, Default)]
pub struct MockLibraryDetector {
    expectations: Arc<Mutex<Vec<LibraryDetectExpectation>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockLibraryDetector {
    pub fn new(expectations: Vec<LibraryDetectExpectation>) -> Self {
        Self {
            expectations: Arc::new(Mutex::new(expectations)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// File paths the detector was called with, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn assert_expectations(&self) {
        assert_eq!(
            self.calls().len(),
            self.expectations.lock().unwrap().len(),
            "library detector call count"
        );
    }
}

#[async_trait]
impl LibraryDetector for MockLibraryDetector {
    async fn detect(
        &self,
        file_path: &str,
        libraries: &[Library],
    ) -> Result<Vec<DetectedVulnerability>> {
        self.calls.lock().unwrap().push(file_path.to_string());
        let expectation = self
            .expectations
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.file_path == file_path && e.libraries == libraries)
            .cloned();
        match expectation {
            Some(e) => e.returns.to_result(),
            None => panic!("unexpected library detect call: {file_path} {libraries:?}"),
        }
    }
}
