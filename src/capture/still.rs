use super::{CaptureError, CaptureSource};
use anyhow::Result;
use image::{ImageFormat, RgbImage};
use std::path::{Path, PathBuf};

fn load_rgb(path: &Path) -> Result<RgbImage, CaptureError> {
    let image = image::open(path).map_err(|source| CaptureError::InputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(CaptureError::ZeroSized(width, height));
    }
    Ok(rgb)
}

/// One image played back as a sequence of identical frames
pub struct StillImageSource {
    image: RgbImage,
    /// Frames left to deliver, `None` for no limit
    remaining: Option<u64>,
}

impl StillImageSource {
    /// `frames == 0` repeats the image until the pipeline stops
    pub fn open<P: AsRef<Path>>(path: P, frames: u64) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        tracing::info!("Loading still image {}", path.display());

        let image = load_rgb(path)?;
        let (width, height) = image.dimensions();
        tracing::info!("Still image loaded: {}x{}", width, height);

        Ok(Self {
            image,
            remaining: (frames > 0).then_some(frames),
        })
    }
}

impl CaptureSource for StillImageSource {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        match &mut self.remaining {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.image.clone()))
            }
            None => Ok(Some(self.image.clone())),
        }
    }

    fn resolution(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Directory of image files read in file-name order
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        let io_err = |source| CaptureError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();

        let first = paths
            .first()
            .ok_or_else(|| CaptureError::EmptySequence(dir.to_path_buf()))?;
        // The first frame fixes the session size
        let (width, height) = load_rgb(first)?.dimensions();

        tracing::info!(
            "Image sequence {}: {} frames at {}x{}",
            dir.display(),
            paths.len(),
            width,
            height
        );

        Ok(Self {
            paths,
            next: 0,
            width,
            height,
        })
    }
}

impl CaptureSource for ImageSequenceSource {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let frame = load_rgb(path)?;
        if frame.dimensions() != (self.width, self.height) {
            return Err(CaptureError::DimensionMismatch {
                expected: (self.width, self.height),
                found: frame.dimensions(),
            }
            .into());
        }
        tracing::debug!("Loaded {}", path.display());
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_missing_image_is_input_unavailable() {
        let err = StillImageSource::open("/nonexistent/frame.png", 1)
            .err()
            .unwrap();
        assert!(matches!(err, CaptureError::InputUnavailable { .. }));
    }

    #[test]
    fn test_still_image_repeats_requested_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let path = dir.join("frame.png");
        RgbImage::from_pixel(4, 3, Rgb([1, 2, 3])).save(&path).unwrap();

        let mut source = StillImageSource::open(&path, 2).unwrap();
        assert_eq!(source.resolution(), (4, 3));
        assert!(source.capture_frame().unwrap().is_some());
        let frame = source.capture_frame().unwrap().unwrap();
        assert_eq!(frame.get_pixel(3, 2).0, [1, 2, 3]);
        assert!(source.capture_frame().unwrap().is_none());

        let mut endless = StillImageSource::open(&path, 0).unwrap();
        for _ in 0..5 {
            assert!(endless.capture_frame().unwrap().is_some());
        }
    }

    #[test]
    fn test_sequence_reads_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        RgbImage::from_pixel(2, 2, Rgb([20, 0, 0]))
            .save(dir.join("frame_002.png"))
            .unwrap();
        RgbImage::from_pixel(2, 2, Rgb([10, 0, 0]))
            .save(dir.join("frame_001.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::open(dir).unwrap();
        assert_eq!(source.capture_frame().unwrap().unwrap().get_pixel(0, 0)[0], 10);
        assert_eq!(source.capture_frame().unwrap().unwrap().get_pixel(0, 0)[0], 20);
        assert!(source.capture_frame().unwrap().is_none());
    }

    #[test]
    fn test_sequence_rejects_size_change() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        RgbImage::new(2, 2).save(dir.join("a.png")).unwrap();
        RgbImage::new(3, 2).save(dir.join("b.png")).unwrap();

        let mut source = ImageSequenceSource::open(dir).unwrap();
        assert!(source.capture_frame().unwrap().is_some());
        let err = source.capture_frame().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CaptureError>(),
            Some(CaptureError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        assert!(matches!(
            ImageSequenceSource::open(dir),
            Err(CaptureError::EmptySequence(_))
        ));
    }
}
