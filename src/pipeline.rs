//! Upload processing pipeline.
//!
//! Orchestrates one upload end to end: persist the re-encoded original,
//! run the background-removal adapter, persist the processed result, and
//! hand back the public URL. Metadata is the caller's concern; the pipeline
//! touches only the two artifact files.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::{Error, Result};
use crate::removal::BackgroundRemover;

/// Pipeline persisting artifacts under the uploads and processed directories.
pub struct ImagePipeline {
    uploads_dir: PathBuf,
    processed_dir: PathBuf,
    remover: BackgroundRemover,
}

impl ImagePipeline {
    pub fn new(uploads_dir: PathBuf, processed_dir: PathBuf, remover: BackgroundRemover) -> Self {
        Self {
            uploads_dir,
            processed_dir,
            remover,
        }
    }

    /// Create both artifact directories if they do not exist.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.uploads_dir)?;
        std::fs::create_dir_all(&self.processed_dir)?;
        Ok(())
    }

    /// Process uploaded image bytes.
    ///
    /// Writes `{id}_original.jpg` (normalized re-encode) and
    /// `{id}_processed.png` (adapter output), returning the relative public
    /// URL of the processed artifact. Any failure aborts the pipeline; no
    /// metadata record is created here.
    pub async fn process(&self, data: &[u8], id: &str) -> Result<String> {
        let img = image::load_from_memory(data)
            .map_err(|e| Error::processing(format!("Failed to decode uploaded image: {}", e)))?;

        // Normalized original, always JPEG regardless of the upload format.
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg)
            .map_err(|e| Error::processing(format!("Failed to encode original as JPEG: {}", e)))?;
        let original_path = self.original_path(id);
        std::fs::write(&original_path, buf.into_inner()).map_err(|e| {
            Error::processing(format!(
                "Failed to write original {:?}: {}",
                original_path, e
            ))
        })?;

        let processed = self.remover.remove(data).await?;

        let processed_path = self.processed_path(id);
        std::fs::write(&processed_path, processed).map_err(|e| {
            Error::processing(format!(
                "Failed to write processed {:?}: {}",
                processed_path, e
            ))
        })?;

        Ok(format!("/processed/{}_processed.png", id))
    }

    /// Best-effort removal of both artifacts for an id. Missing files are
    /// not errors.
    pub fn delete_artifacts(&self, id: &str) {
        for path in [self.original_path(id), self.processed_path(id)] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!("Failed to delete artifact {:?}: {}", path, e);
                }
            }
        }
    }

    fn original_path(&self, id: &str) -> PathBuf {
        self.uploads_dir.join(format!("{}_original.jpg", id))
    }

    fn processed_path(&self, id: &str) -> PathBuf {
        self.processed_dir.join(format!("{}_processed.png", id))
    }
}

/// Build a pipeline rooted at the given directories, creating them as needed.
pub fn build_pipeline(
    uploads_dir: &Path,
    processed_dir: &Path,
    remover: BackgroundRemover,
) -> Result<ImagePipeline> {
    let pipeline = ImagePipeline::new(
        uploads_dir.to_path_buf(),
        processed_dir.to_path_buf(),
        remover,
    );
    pipeline.ensure_directories()?;
    Ok(pipeline)
}
