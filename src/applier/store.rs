use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Applier;
use crate::cache::{cache_root, safe_file_stem};
use crate::model::{Application, ArtifactInventory, OsIdentity, Package};

/// What an analyzer found in a single layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerBlob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsIdentity>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// Directory of layer blobs, one JSON file per layer ID.
///
/// Layers are content-addressed and never change once written, so entries do
/// not expire.
#[derive(Debug, Clone)]
pub struct LayerStore {
    dir: PathBuf,
}

impl LayerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the default cache location (`<cache_dir>/layerscan/layers`).
    pub fn default_location() -> Self {
        Self::new(cache_root().join("layers"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, layer_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_file_stem(layer_id)))
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.blob_path(layer_id).exists()
    }

    pub fn put(&self, layer_id: &str, blob: &LayerBlob) -> Result<()> {
        if layer_id.is_empty() {
            bail!("layer id must not be empty");
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create layer store {}", self.dir.display()))?;
        let path = self.blob_path(layer_id);
        let content = serde_json::to_string_pretty(blob)?;
        fs::write(&path, content)
            .with_context(|| format!("failed to write layer {layer_id}"))?;
        Ok(())
    }

    pub fn get(&self, layer_id: &str) -> Result<LayerBlob> {
        let path = self.blob_path(layer_id);
        if !path.exists() {
            bail!("layer {layer_id} not found in {}", self.dir.display());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read layer {layer_id}"))?;
        let blob = serde_json::from_str(&content)
            .with_context(|| format!("layer {layer_id} is corrupt"))?;
        Ok(blob)
    }
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::default_location()
    }
}

/// Applies layers by reading their blobs from a [`LayerStore`].
///
/// Layers are folded in the order given. The last layer that reports an OS
/// decides the OS. Packages are keyed by name and applications by file path;
/// a later layer replaces an earlier entry in place, new entries are appended.
pub struct StoreApplier {
    store: LayerStore,
}

impl StoreApplier {
    pub fn new(store: LayerStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Applier for StoreApplier {
    async fn apply_layers(&self, layer_ids: &[String]) -> Result<ArtifactInventory> {
        if layer_ids.is_empty() {
            bail!("no layers to apply");
        }

        let store = self.store.clone();
        let layer_ids = layer_ids.to_vec();
        let blobs = tokio::task::spawn_blocking(move || {
            layer_ids
                .iter()
                .map(|id| store.get(id))
                .collect::<Result<Vec<_>>>()
        })
        .await
        .context("layer loading task failed")??;

        debug!(layers = blobs.len(), "applying layers");
        Ok(merge_layers(blobs))
    }
}

fn merge_layers(blobs: Vec<LayerBlob>) -> ArtifactInventory {
    let mut inventory = ArtifactInventory::default();

    for blob in blobs {
        if blob.os.is_some() {
            inventory.os = blob.os;
        }

        for package in blob.packages {
            match inventory.packages.iter_mut().find(|p| p.name == package.name) {
                Some(existing) => *existing = package,
                None => inventory.packages.push(package),
            }
        }

        for app in blob.applications {
            match inventory
                .applications
                .iter_mut()
                .find(|a| a.file_path == app.file_path)
            {
                Some(existing) => *existing = app,
                None => inventory.applications.push(app),
            }
        }
    }

    inventory
}
