use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{GrayImage, ImageFormat};
use serde::Serialize;
use tempfile::NamedTempFile;
use uuid::Uuid;

use super::ExportError;

/// Handle to a persisted label image.
#[derive(Debug, Clone, Serialize)]
pub struct AssetHandle {
    pub id: Uuid,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
    pub created_at: DateTime<Utc>,
}

/// Flat directory of `{id}.png` files.
///
/// Writes go through a temp file in the same directory and are renamed into
/// place, so readers never see a partial PNG.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.png"))
    }

    pub fn save_png(&self, image: &GrayImage) -> Result<AssetHandle, ExportError> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

        let id = Uuid::new_v4();
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(self.path_for(id)).map_err(|e| e.error)?;

        Ok(AssetHandle {
            id,
            width: image.width(),
            height: image.height(),
            byte_len: bytes.len(),
            created_at: Utc::now(),
        })
    }

    pub async fn load(&self, id: Uuid) -> Result<Vec<u8>, ExportError> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExportError::AssetNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[tokio::test]
    async fn test_save_then_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path().join("assets")).unwrap();
        let img = GrayImage::from_pixel(40, 20, Luma([0]));

        let handle = store.save_png(&img).unwrap();
        assert_eq!((handle.width, handle.height), (40, 20));

        let bytes = store.load(handle.id).await.unwrap();
        assert_eq!(bytes.len(), handle.byte_len);
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path()).unwrap();
        let err = store.load(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ExportError::AssetNotFound(_)));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path()).unwrap();
        store
            .save_png(&GrayImage::from_pixel(4, 4, Luma([255])))
            .unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".png"));
    }
}
