//! Layer appliers.
//!
//! An [`Applier`] turns an ordered list of content-addressed layer IDs into
//! the merged [`ArtifactInventory`] of the artifact they make up. The scanner
//! only depends on the trait; [`StoreApplier`] is the implementation backed
//! by a local [`LayerStore`].

mod store;

pub use store::{LayerBlob, LayerStore, StoreApplier};

use crate::model::ArtifactInventory;
use anyhow::Result;
use async_trait::async_trait;

/// Resolves layers into an artifact inventory.
///
/// Implementations must be safe to call from several scans at once.
#[async_trait]
pub trait Applier: Send + Sync {
    /// Merges the given layers, in order, into one inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if any layer is missing or its data is unreadable.
    async fn apply_layers(&self, layer_ids: &[String]) -> Result<ArtifactInventory>;
}
