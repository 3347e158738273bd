use std::path::{Path, PathBuf};

use crate::{AssetError, AssetId};

/// A decoded RGBA8 image.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub id: AssetId,
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureAsset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            id: AssetId::of_bytes(&bytes),
            source: path.to_path_buf(),
            width,
            height,
            rgba: image.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let tex = TextureAsset::open(&path).unwrap();
        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(tex.rgba.len(), 2 * 3 * 4);
        assert_eq!(&tex.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn undecodable_bytes_are_image_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(TextureAsset::open(&path), Err(AssetError::Image(_))));
    }
}
