use super::OutputSink;
use crate::color::ChannelOrder;
use anyhow::{ensure, Context, Result};
use image::RgbImage;
use std::io::Write;

/// Writes frames as interleaved 8-bit pixels to any byte sink
///
/// Every frame must share the size of the first one.
pub struct RawStreamOutput<W: Write> {
    writer: W,
    order: ChannelOrder,
    resolution: Option<(u32, u32)>,
    frames: u64,
}

impl<W: Write> RawStreamOutput<W> {
    pub fn new(writer: W, order: ChannelOrder) -> Self {
        tracing::info!("Writing raw {:?} frames", order);
        Self {
            writer,
            order,
            resolution: None,
            frames: 0,
        }
    }

    /// Convert an RGB frame to the configured channel order
    fn encode(&self, frame: &RgbImage) -> Vec<u8> {
        match self.order {
            ChannelOrder::Rgb => frame.as_raw().clone(),
            ChannelOrder::Bgr => {
                let mut bytes = Vec::with_capacity(frame.as_raw().len());
                for px in frame.pixels() {
                    bytes.extend_from_slice(&self.order.from_rgb(px.0));
                }
                bytes
            }
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for RawStreamOutput<W> {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let dims = frame.dimensions();
        let expected = *self.resolution.get_or_insert(dims);
        ensure!(
            dims == expected,
            "frame is {}x{} but the stream is {}x{}",
            dims.0,
            dims.1,
            expected.0,
            expected.1
        );

        let bytes = self.encode(frame);
        self.writer
            .write_all(&bytes)
            .context("Failed to write raw frame")?;
        self.writer.flush().context("Failed to flush raw output")?;

        self.frames += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }
}
