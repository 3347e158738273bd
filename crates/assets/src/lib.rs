//! Asset loading: a progress-tracking loading manager and threaded fetches.
//!
//! Every fetch registers with one [`LoadingManager`]. Completion fires once,
//! after all outstanding fetches have ended, whether they succeeded or not.
//!
//! # Layout
//! Models are decoded with `gltf`, textures with `image`. Assets are
//! identified by a content hash of their source bytes.

mod loader;
mod loading;
mod model;
mod texture;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

pub use loader::{AssetLoader, LoadEvent};
pub use loading::{LoadingManager, Notice, Progress};
pub use model::{DRACO_EXTENSION, MeshData, ModelAsset, ModelNode};
pub use texture::TextureAsset;

/// Content-addressed asset ID computed from the asset's source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        AssetId(u64::from_le_bytes(head))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("model has no scene: {}", .0.display())]
    EmptyModel(PathBuf),
    #[error(
        "{} uses Draco-compressed geometry; no decoder available at {}",
        .path.display(),
        .decoder.display()
    )]
    CompressedGeometry { path: PathBuf, decoder: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_addressed_ids() {
        assert_eq!(AssetId::of_bytes(b"spider"), AssetId::of_bytes(b"spider"));
        assert_ne!(AssetId::of_bytes(b"spider"), AssetId::of_bytes(b"spiders"));
    }

    #[test]
    fn id_display_is_fixed_width_hex() {
        assert_eq!(AssetId(0xab).to_string(), "00000000000000ab");
    }
}
