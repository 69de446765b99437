use ffmpeg_next::{
    format::Pixel,
    frame::Video,
    software::scaling::{Context, Flags},
};

use crate::error::{Error, Result};

/// Representation frames travel in between decoder and encoder: packed,
/// one byte per pixel.
pub const INTERMEDIATE_FORMAT: Pixel = Pixel::RGB8;

/// Pixel-format converter fixed to one size and one format pair for its
/// lifetime. Sizes are equal on both sides; nothing is rescaled.
pub struct Scaler {
    context: Context,
    output_format: Pixel,
    width: u32,
    height: u32,
}

impl Scaler {
    pub fn new(input_format: Pixel, output_format: Pixel, width: u32, height: u32) -> Result<Self> {
        let context = Context::get(
            input_format,
            width,
            height,
            output_format,
            width,
            height,
            Flags::BICUBIC,
        )
        .map_err(Error::Convert)?;

        log::debug!(
            "scaler created: {:?} -> {:?} at {}x{}",
            input_format,
            output_format,
            width,
            height
        );

        Ok(Self {
            context,
            output_format,
            width,
            height,
        })
    }

    /// Fresh picture in the output format, sized for this scaler.
    pub fn output_frame(&self) -> Video {
        Video::new(self.output_format, self.width, self.height)
    }

    /// Convert `frame` into `dst`. An empty `dst` is allocated; a non-empty
    /// one must already match the output format and size.
    pub fn run(&mut self, frame: &Video, dst: &mut Video) -> Result<()> {
        self.context.run(frame, dst).map_err(Error::Convert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_yuv420p(width: u32, height: u32, y: u8, u: u8, v: u8) -> Video {
        let mut frame = Video::new(Pixel::YUV420P, width, height);
        frame.data_mut(0).fill(y);
        frame.data_mut(1).fill(u);
        frame.data_mut(2).fill(v);
        frame
    }

    #[test]
    fn converts_into_intermediate_format() -> anyhow::Result<()> {
        let mut scaler = Scaler::new(Pixel::YUV420P, INTERMEDIATE_FORMAT, 32, 16)?;
        let source = solid_yuv420p(32, 16, 16, 128, 128);
        let mut converted = Video::empty();
        scaler.run(&source, &mut converted)?;

        assert_eq!(converted.format(), INTERMEDIATE_FORMAT);
        assert_eq!((converted.width(), converted.height()), (32, 16));
        Ok(())
    }

    #[test]
    fn rejects_input_of_another_size() -> anyhow::Result<()> {
        let mut scaler = Scaler::new(Pixel::YUV420P, INTERMEDIATE_FORMAT, 32, 16)?;
        let source = solid_yuv420p(64, 16, 16, 128, 128);
        let mut converted = scaler.output_frame();

        let err = scaler.run(&source, &mut converted).unwrap_err();
        assert!(matches!(err, Error::Convert(_)));
        Ok(())
    }
}
