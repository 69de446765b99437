use std::path::Path;

use crate::{
    error::{Error, Result},
    packet::RawPacket,
    stream::AvStream,
};

/// Container reader consumed by the decode pump.
pub trait Demuxer {
    /// All streams of the container, in container order.
    fn streams(&self) -> &[AvStream];

    /// Next packet of any stream, or `None` once the source is exhausted.
    fn read_packet(&mut self) -> Option<RawPacket>;
}

/// FFmpeg demuxer over a file, format auto-detected.
pub struct AvInput {
    inner: ffmpeg_next::format::context::Input,
    streams: Vec<AvStream>,
}

impl AvInput {
    pub fn new(path: &Path) -> Result<Self> {
        // also probes stream headers; a source without them fails here
        let input = ffmpeg_next::format::input(&path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!(
            "input opened: {} ({})",
            path.display(),
            input.format().description()
        );

        let streams: Vec<AvStream> = input.streams().map(AvStream::from).collect();
        for stream in &streams {
            log::info!(
                "stream #{}: {:?} {:?} {}x{}, time_base: {}, rate: {}",
                stream.index(),
                stream.medium(),
                stream.codec_id(),
                stream.width(),
                stream.height(),
                stream.time_base(),
                stream.rate()
            );
        }

        Ok(Self {
            inner: input,
            streams,
        })
    }
}

impl Demuxer for AvInput {
    fn streams(&self) -> &[AvStream] {
        &self.streams
    }

    fn read_packet(&mut self) -> Option<RawPacket> {
        self.inner
            .packets()
            .next()
            .map(|(stream, packet)| (packet, stream.time_base()).into())
    }
}
