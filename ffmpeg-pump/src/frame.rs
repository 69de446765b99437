use std::fmt;

use bytes::BytesMut;
use ffmpeg_next::{format::Pixel, frame::Video};

use crate::error::{Error, Result};

/// A decoded picture in the intermediate representation, owned by whoever
/// holds it. The decode pump hands it out, the encode pump consumes it.
pub struct Frame {
    picture: Video,
    data: BytesMut,
    width: u32,
    height: u32,
}

impl Frame {
    /// Copy the visible pixels of `picture` out of its (possibly padded)
    /// plane into a `width * height` buffer owned by the frame.
    pub(crate) fn from_picture(picture: Video) -> Result<Self> {
        let format = picture.format();
        if bytes_per_pixel(format) != Some(1) {
            return Err(Error::FrameBuffer(format!(
                "{:?} is not a one byte per pixel format",
                format
            )));
        }

        let (width, height) = (picture.width(), picture.height());
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return Err(Error::FrameBuffer(format!("empty picture {}x{}", width, height)));
        }

        let stride = picture.stride(0);
        let plane = picture.data(0);
        if stride < w || plane.len() < stride * (h - 1) + w {
            return Err(Error::FrameBuffer(format!(
                "plane of {} bytes with stride {} cannot hold {}x{}",
                plane.len(),
                stride,
                width,
                height
            )));
        }

        let mut data = BytesMut::with_capacity(w * h);
        for row in plane.chunks(stride).take(h) {
            data.extend_from_slice(&row[..w]);
        }

        #[cfg(test)]
        tracking::created();

        Ok(Self {
            picture,
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> Pixel {
        self.picture.format()
    }

    /// Row-major pixels without padding, one byte each.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Write the owned buffer back into the picture handle and return it, so
    /// edits made through `data_mut` reach the converter.
    pub(crate) fn sync_picture(&mut self) -> &Video {
        let w = self.width as usize;
        let stride = self.picture.stride(0);
        for (row, pixels) in self
            .picture
            .data_mut(0)
            .chunks_mut(stride)
            .zip(self.data.chunks(w))
        {
            row[..w].copy_from_slice(pixels);
        }
        &self.picture
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format())
            .field("pts", &self.picture.pts())
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        #[cfg(test)]
        tracking::dropped();
    }
}

fn bytes_per_pixel(format: Pixel) -> Option<usize> {
    match format {
        Pixel::RGB8 | Pixel::BGR8 | Pixel::GRAY8 => Some(1),
        Pixel::RGB24 | Pixel::BGR24 => Some(3),
        Pixel::RGBA | Pixel::BGRA | Pixel::ARGB | Pixel::ABGR => Some(4),
        _ => None,
    }
}
