use ffmpeg_next::{Rational, codec::Id, format::Pixel};

use crate::{
    error::{Error, Result},
    packet::RawPacket,
    stream::AvStream,
};

/// Decoder settings the encoder mirrors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderParameters {
    pub codec_id: Id,
    pub width: u32,
    pub height: u32,
    pub pixel_format: Pixel,
    pub bit_rate: i64,
    pub time_base: Rational,
    pub gop_size: u32,
    /// Max consecutive non-reference frames.
    pub max_b_frames: usize,
}

/// Stateful video decoder. Output is not synchronized 1:1 with input: a
/// packet may produce no picture yet, and buffered pictures only come out
/// after `send_eof`.
pub trait VideoDecoder {
    fn parameters(&self) -> &DecoderParameters;

    fn send_packet(&mut self, packet: &RawPacket) -> Result<()>;

    /// Flush signal: no more packets follow.
    fn send_eof(&mut self) -> Result<()>;

    /// `Ok(None)` when the decoder needs more input or is fully drained.
    fn receive_frame(&mut self) -> Result<Option<ffmpeg_next::frame::Video>>;
}

pub struct AvDecoder {
    inner: ffmpeg_next::codec::decoder::Video,
    parameters: DecoderParameters,
}

impl AvDecoder {
    /// Open the decoder matching the stream's codec id.
    pub fn new(stream: &AvStream) -> Result<Self> {
        let codec_id = stream.codec_id();
        let codec =
            ffmpeg_next::decoder::find(codec_id).ok_or(Error::UnsupportedCodec(codec_id))?;
        let open_error = |source| Error::CodecOpen {
            codec: codec_id,
            source,
        };

        let decoder_ctx = ffmpeg_next::codec::Context::from_parameters(stream.parameters().clone())
            .map_err(open_error)?;

        let video_decoder = decoder_ctx
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.video())
            .map_err(open_error)?;

        if video_decoder.format() == Pixel::None
            || video_decoder.width() == 0
            || video_decoder.height() == 0
        {
            return Err(open_error(ffmpeg_next::Error::InvalidData));
        }

        let (bit_rate, decoder_time_base, gop_size, max_b_frames) = unsafe {
            let ptr = video_decoder.as_ptr();
            (
                (*ptr).bit_rate,
                Rational::from((*ptr).time_base),
                (*ptr).gop_size.max(0) as u32,
                (*ptr).max_b_frames.max(0) as usize,
            )
        };

        let parameters = DecoderParameters {
            codec_id,
            width: video_decoder.width(),
            height: video_decoder.height(),
            pixel_format: video_decoder.format(),
            bit_rate,
            time_base: encoder_time_base(stream.rate(), decoder_time_base),
            gop_size,
            max_b_frames,
        };

        log::info!(
            "decoder opened: {} {}x{} {:?}, time_base: {}",
            codec.name(),
            parameters.width,
            parameters.height,
            parameters.pixel_format,
            parameters.time_base
        );

        Ok(Self {
            inner: video_decoder,
            parameters,
        })
    }
}

impl VideoDecoder for AvDecoder {
    fn parameters(&self) -> &DecoderParameters {
        &self.parameters
    }

    fn send_packet(&mut self, packet: &RawPacket) -> Result<()> {
        self.inner.send_packet(packet.packet()).map_err(Error::Decode)
    }

    fn send_eof(&mut self) -> Result<()> {
        self.inner.send_eof().map_err(Error::Decode)
    }

    fn receive_frame(&mut self) -> Result<Option<ffmpeg_next::frame::Video>> {
        let mut frame = ffmpeg_next::frame::Video::empty();
        match self.inner.receive_frame(&mut frame) {
            Ok(()) => Ok(Some(frame)),
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(None)
            }
            Err(err) => Err(Error::Decode(err)),
        }
    }
}

/// Time base handed to the encoder: one tick per frame at the stream rate,
/// else the decoder's own, else 1/25.
pub fn encoder_time_base(stream_rate: Rational, decoder_time_base: Rational) -> Rational {
    if is_valid(stream_rate) {
        stream_rate.invert()
    } else if is_valid(decoder_time_base) {
        decoder_time_base
    } else {
        Rational(1, 25)
    }
}

fn is_valid(rational: Rational) -> bool {
    rational.numerator() > 0 && rational.denominator() > 0
}
