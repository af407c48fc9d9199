use super::OutputSink;
use anyhow::{Context, Result};
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the zero-padded frame number
const FRAME_PLACEHOLDER: &str = "{n}";

/// Saves each frame as an image file, format picked from the extension
///
/// Without `{n}` in the path every frame overwrites the same file.
pub struct ImageFileOutput {
    template: String,
    frames: u64,
}

impl ImageFileOutput {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        image::ImageFormat::from_path(path)
            .with_context(|| format!("Unsupported output format for {}", path.display()))?;

        tracing::info!("Writing frames to {}", path.display());
        Ok(Self {
            template: path.to_string_lossy().into_owned(),
            frames: 0,
        })
    }

    pub fn path_for(&self, frame: u64) -> PathBuf {
        PathBuf::from(
            self.template
                .replace(FRAME_PLACEHOLDER, &format!("{:05}", frame)),
        )
    }

    /// Save a one-channel mask under the next frame number
    pub fn write_mask(&mut self, mask: &GrayImage) -> Result<()> {
        let path = self.path_for(self.frames);
        mask.save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.frames += 1;
        Ok(())
    }
}

impl OutputSink for ImageFileOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.path_for(self.frames);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.frames += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }
}
