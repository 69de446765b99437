use ffmpeg_next::{Rational, codec::Parameters, format::stream, media};

/// Snapshot of one container stream's metadata.
#[derive(Clone)]
pub struct AvStream {
    index: usize,
    parameters: Parameters,
    time_base: Rational,
    rate: Rational,
}

impl AvStream {
    /// Describe a stream that does not come from an opened container, e.g. a
    /// scripted source.
    pub fn new(
        index: usize,
        medium: media::Type,
        codec_id: ffmpeg_next::codec::Id,
        time_base: Rational,
        rate: Rational,
    ) -> Self {
        let mut parameters = Parameters::new();
        unsafe {
            let ptr = parameters.as_mut_ptr();
            (*ptr).codec_type = medium.into();
            (*ptr).codec_id = codec_id.into();
        }
        Self {
            index,
            parameters,
            time_base,
            rate,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn rate(&self) -> Rational {
        self.rate
    }

    pub fn medium(&self) -> media::Type {
        self.parameters.medium()
    }

    pub fn codec_id(&self) -> ffmpeg_next::codec::Id {
        self.parameters.id()
    }

    pub fn is_video(&self) -> bool {
        self.medium() == media::Type::Video
    }

    pub fn width(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr();
            (*ptr).width.max(0) as u32
        }
    }

    pub fn height(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr();
            (*ptr).height.max(0) as u32
        }
    }
}

impl From<stream::Stream<'_>> for AvStream {
    fn from(stream: stream::Stream<'_>) -> Self {
        Self {
            index: stream.index(),
            parameters: stream.parameters(),
            time_base: stream.time_base(),
            rate: stream.avg_frame_rate(),
        }
    }
}

/// First video stream, in container order.
pub fn find_video_stream(streams: &[AvStream]) -> Option<&AvStream> {
    streams.iter().find(|stream| stream.is_video())
}
