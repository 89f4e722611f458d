use image::DynamicImage;
use sketch_canvas::BinaryMask;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const MASK_FILE: &str = "mask.png";
pub const TEXT_FILE: &str = "new_text.json";
pub const DRAWING_FILE: &str = "drawing.png";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Directory receiving the files written on every generation
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn save_mask(&self, mask: &BinaryMask) -> Result<PathBuf, ArtifactError> {
        let path = self.path(MASK_FILE);
        mask.save(&path)?;
        debug!("Wrote mask to {}", path.display());
        Ok(path)
    }

    /// Structured room description sent to the predictor, as JSON text
    pub fn save_text(&self, text: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.path(TEXT_FILE);
        std::fs::write(&path, text)?;
        debug!("Wrote structured text to {}", path.display());
        Ok(path)
    }

    pub fn save_drawing(&self, image: &DynamicImage) -> Result<PathBuf, ArtifactError> {
        let path = self.path(DRAWING_FILE);
        image.save_with_format(&path, image::ImageFormat::Png)?;
        Ok(path)
    }
}
