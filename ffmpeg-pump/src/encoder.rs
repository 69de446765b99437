use ffmpeg_next::{Dictionary, Rational, codec::Id, format::Pixel, frame::Video};

use crate::{
    decoder::DecoderParameters,
    error::{Error, Result},
    packet::RawPacket,
};

/// Pixel format every encoder is opened with.
pub const ENCODER_PIXEL_FORMAT: Pixel = Pixel::YUV420P;

#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub codec_id: Id,
    pub width: u32,
    pub height: u32,
    pub pixel_format: Pixel,
    /// Zero leaves the codec default.
    pub bit_rate: i64,
    pub time_base: Rational,
    pub gop_size: u32,
    pub max_b_frames: usize,
    pub preset: Option<String>,
}

impl EncoderSettings {
    /// Same codec and stream shape as the decoder. The quality preset only
    /// applies to H.264, the one family here that understands it.
    pub fn mirror(decoder: &DecoderParameters, h264_preset: &str) -> Self {
        Self {
            codec_id: decoder.codec_id,
            width: decoder.width,
            height: decoder.height,
            pixel_format: ENCODER_PIXEL_FORMAT,
            bit_rate: decoder.bit_rate.max(0),
            time_base: decoder.time_base,
            gop_size: decoder.gop_size,
            max_b_frames: decoder.max_b_frames,
            preset: (decoder.codec_id == Id::H264).then(|| h264_preset.to_string()),
        }
    }
}

/// Stateful video encoder. It may hold frames back (look-ahead, b-frames)
/// and only release them after `send_eof`.
pub trait VideoEncoder {
    fn send_frame(&mut self, frame: &Video) -> Result<()>;

    /// End of input: buffered frames are released through `receive_packet`.
    fn send_eof(&mut self) -> Result<()>;

    /// `Ok(None)` when the encoder needs more input or is fully drained.
    fn receive_packet(&mut self) -> Result<Option<RawPacket>>;
}

pub struct AvEncoder {
    inner: ffmpeg_next::codec::encoder::video::Encoder,
    time_base: Rational,
}

impl AvEncoder {
    pub fn new(settings: &EncoderSettings) -> Result<Self> {
        let codec_id = settings.codec_id;
        let codec =
            ffmpeg_next::encoder::find(codec_id).ok_or(Error::EncoderNotFound(codec_id))?;
        let open_error = |source| Error::EncoderOpen {
            codec: codec_id,
            source,
        };

        let mut encoder = ffmpeg_next::codec::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(open_error)?;
        encoder.set_width(settings.width);
        encoder.set_height(settings.height);
        encoder.set_format(settings.pixel_format);
        if settings.bit_rate > 0 {
            encoder.set_bit_rate(settings.bit_rate as usize);
        }
        encoder.set_time_base(settings.time_base);
        encoder.set_frame_rate(Some(settings.time_base.invert()));
        encoder.set_gop(settings.gop_size);
        encoder.set_max_b_frames(settings.max_b_frames);

        let mut opts = Dictionary::new();
        if let Some(preset) = &settings.preset {
            opts.set("preset", preset);
        }
        let encoder = encoder.open_with(opts).map_err(open_error)?;

        log::info!(
            "encoder opened: {} {}x{} {:?}, time_base: {}, gop: {}, max_b_frames: {}, preset: {}",
            codec.name(),
            settings.width,
            settings.height,
            settings.pixel_format,
            settings.time_base,
            settings.gop_size,
            settings.max_b_frames,
            settings.preset.as_deref().unwrap_or("-")
        );

        Ok(Self {
            inner: encoder,
            time_base: settings.time_base,
        })
    }
}

impl VideoEncoder for AvEncoder {
    fn send_frame(&mut self, frame: &Video) -> Result<()> {
        self.inner.send_frame(frame).map_err(Error::Encode)
    }

    fn send_eof(&mut self) -> Result<()> {
        self.inner.send_eof().map_err(Error::Encode)
    }

    fn receive_packet(&mut self) -> Result<Option<RawPacket>> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match self.inner.receive_packet(&mut packet) {
            Ok(()) => Ok(Some(RawPacket::from((packet, self.time_base)))),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(None)
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(err) => Err(Error::Encode(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder_parameters(codec_id: Id) -> DecoderParameters {
        DecoderParameters {
            codec_id,
            width: 640,
            height: 360,
            pixel_format: Pixel::YUV420P,
            bit_rate: 400_000,
            time_base: Rational(1, 25),
            gop_size: 12,
            max_b_frames: 2,
        }
    }

    #[test]
    fn mirrors_decoder_parameters() {
        let settings = EncoderSettings::mirror(&decoder_parameters(Id::MPEG4), "slow");
        assert_eq!(settings.codec_id, Id::MPEG4);
        assert_eq!((settings.width, settings.height), (640, 360));
        assert_eq!(settings.pixel_format, ENCODER_PIXEL_FORMAT);
        assert_eq!(settings.bit_rate, 400_000);
        assert_eq!(settings.time_base, Rational(1, 25));
        assert_eq!(settings.gop_size, 12);
        assert_eq!(settings.max_b_frames, 2);
        assert_eq!(settings.preset, None);
    }

    #[test]
    fn preset_only_for_h264() {
        let settings = EncoderSettings::mirror(&decoder_parameters(Id::H264), "slow");
        assert_eq!(settings.preset.as_deref(), Some("slow"));
    }

    #[test]
    fn negative_bit_rate_means_codec_default() {
        let mut parameters = decoder_parameters(Id::MPEG4);
        parameters.bit_rate = -1;
        assert_eq!(EncoderSettings::mirror(&parameters, "slow").bit_rate, 0);
    }

    #[test]
    fn missing_encoder_is_reported() {
        let mut settings = EncoderSettings::mirror(&decoder_parameters(Id::MPEG4), "slow");
        settings.codec_id = Id::None;
        let err = AvEncoder::new(&settings).err().unwrap();
        assert!(matches!(err, Error::EncoderNotFound(Id::None)));
    }
}
