use super::{CaptureError, CaptureSource};
use crate::color::ChannelOrder;
use anyhow::{Context, Result};
use image::RgbImage;
use std::io::{ErrorKind, Read};

/// Interleaved 8-bit frames of a fixed size read back to back from a stream
///
/// Matches what video tools emit with `-f rawvideo -pix_fmt rgb24|bgr24`.
pub struct RawStreamSource<R: Read> {
    reader: R,
    width: u32,
    height: u32,
    order: ChannelOrder,
    buffer: Vec<u8>,
}

impl<R: Read> RawStreamSource<R> {
    pub fn new(reader: R, width: u32, height: u32, order: ChannelOrder) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::ZeroSized(width, height));
        }
        tracing::info!("Raw {:?} stream at {}x{}", order, width, height);

        Ok(Self {
            reader,
            width,
            height,
            order,
            buffer: vec![0; width as usize * height as usize * 3],
        })
    }

    /// Fill the frame buffer; returns the number of bytes read before EOF
    fn fill(&mut self) -> Result<usize> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("Failed to read raw frame"),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> CaptureSource for RawStreamSource<R> {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        let filled = self.fill()?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < self.buffer.len() {
            return Err(CaptureError::Truncated {
                expected: self.buffer.len(),
                got: filled,
            }
            .into());
        }

        let mut data = self.buffer.clone();
        if self.order != ChannelOrder::Rgb {
            for px in data.chunks_exact_mut(3) {
                let rgb = self.order.to_rgb([px[0], px[1], px[2]]);
                px.copy_from_slice(&rgb);
            }
        }

        let frame = RgbImage::from_raw(self.width, self.height, data)
            .context("Raw frame buffer does not match its dimensions")?;
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
