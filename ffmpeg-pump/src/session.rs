//! One transcode: container input, one video stream, decoder, encoder and
//! raw bitstream output.
//!
//! ```text
//! Demuxer ──► VideoDecoder ──► Scaler ──► Frame ──► Scaler ──► VideoEncoder ──► BitstreamWriter
//!             (next_frame)     (to RGB8)  (caller)  (to YUV420P) (submit_frame / finish)
//! ```
//!
//! Frames are pulled: the caller polls `next_frame` until it reports
//! `EndOfStream`, hands every `FrameReady` frame to `submit_frame`, then
//! calls `finish` to drain the encoder and close the output.

use std::path::Path;

use ffmpeg_next::frame::Video;

use crate::{
    decoder::{AvDecoder, DecoderParameters, VideoDecoder},
    encoder::{AvEncoder, ENCODER_PIXEL_FORMAT, EncoderSettings, VideoEncoder},
    error::{Error, Result},
    frame::Frame,
    input::{AvInput, Demuxer},
    output::BitstreamWriter,
    scaler::{INTERMEDIATE_FORMAT, Scaler},
    stream::{AvStream, find_video_stream},
};

/// Outcome of one `next_frame` poll.
#[derive(Debug)]
pub enum DecodeStatus {
    FrameReady(Frame),
    /// The decoder took input without producing a picture, or the packet
    /// belonged to another stream. Poll again.
    NoFrameYet,
    /// Source exhausted and decoder drained. Every later poll returns this.
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputState {
    Reading,
    /// Flush sent; buffered pictures are still coming out.
    Draining,
    Finished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub frames_decoded: u64,
    pub frames_encoded: u64,
    pub packets_written: u64,
    pub bytes_written: u64,
}

struct Encoding<E> {
    encoder: E,
    scaler: Scaler,
    target: Video,
    writer: BitstreamWriter,
}

impl<E: VideoEncoder> Encoding<E> {
    fn write_pending_packets(&mut self) -> Result<u64> {
        let mut written = 0;
        while let Some(packet) = self.encoder.receive_packet()? {
            self.writer.write_packet(&packet)?;
            written += 1;
        }
        Ok(written)
    }
}

pub struct Session<I = AvInput, D = AvDecoder, E = AvEncoder> {
    input: I,
    stream_index: usize,
    decoder: D,
    scaler: Scaler,
    encoding: Option<Encoding<E>>,
    input_state: InputState,
    frames_decoded: u64,
    frame_count: i64,
}

impl Session {
    /// Open a container file, select its first video stream and open the
    /// matching decoder.
    pub fn open(path: &Path) -> Result<Self> {
        let input = AvInput::new(path)?;
        Self::with_input(input, AvDecoder::new)
    }
}

impl<I: Demuxer, D: VideoDecoder> Session<I, D, AvEncoder> {
    /// Open an encoder for the decoder's codec, mirroring its parameters, and
    /// create the output file.
    pub fn prepare_encoding(&mut self, output: &Path, h264_preset: &str) -> Result<()> {
        if self.encoding.is_some() {
            return Err(Error::EncodingAlreadyPrepared);
        }
        let settings = EncoderSettings::mirror(self.decoder.parameters(), h264_preset);
        let encoder = AvEncoder::new(&settings)?;
        let writer = BitstreamWriter::create(output)?;
        self.attach_encoder(encoder, writer)
    }
}

impl<I: Demuxer, D: VideoDecoder, E: VideoEncoder> Session<I, D, E> {
    /// Build a session over an already opened container. `open_decoder`
    /// receives the selected video stream. Nothing acquired so far outlives
    /// a failure.
    pub fn with_input<F>(input: I, open_decoder: F) -> Result<Self>
    where
        F: FnOnce(&AvStream) -> Result<D>,
    {
        let stream = find_video_stream(input.streams()).ok_or(Error::NoVideoStream)?;
        let stream_index = stream.index();
        log::info!(
            "video stream selected: index {}, codec {:?}",
            stream_index,
            stream.codec_id()
        );

        let decoder = open_decoder(stream)?;
        let parameters = decoder.parameters();
        let scaler = Scaler::new(
            parameters.pixel_format,
            INTERMEDIATE_FORMAT,
            parameters.width,
            parameters.height,
        )?;

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            encoding: None,
            input_state: InputState::Reading,
            frames_decoded: 0,
            frame_count: 0,
        })
    }

    /// Attach an opened encoder and its output. The encode-side converter and
    /// the reusable target picture are sized from the decoder.
    pub fn attach_encoder(&mut self, encoder: E, writer: BitstreamWriter) -> Result<()> {
        if self.encoding.is_some() {
            return Err(Error::EncodingAlreadyPrepared);
        }
        let parameters = self.decoder.parameters();
        let scaler = Scaler::new(
            INTERMEDIATE_FORMAT,
            ENCODER_PIXEL_FORMAT,
            parameters.width,
            parameters.height,
        )?;
        let target = scaler.output_frame();
        self.encoding = Some(Encoding {
            encoder,
            scaler,
            target,
            writer,
        });
        Ok(())
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn decoder_parameters(&self) -> &DecoderParameters {
        self.decoder.parameters()
    }

    /// Frames submitted to the encoder so far; also the next pts.
    pub fn frame_count(&self) -> i64 {
        self.frame_count
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    pub fn end_of_input_reached(&self) -> bool {
        self.input_state != InputState::Reading
    }

    pub fn is_encoding_prepared(&self) -> bool {
        self.encoding.is_some()
    }

    /// Pull the next decoded frame.
    ///
    /// A `Decode` error concerns a single packet only; the session stays
    /// usable and the caller may poll again.
    pub fn next_frame(&mut self) -> Result<DecodeStatus> {
        match self.input_state {
            InputState::Finished => return Ok(DecodeStatus::EndOfStream),
            InputState::Draining => {
                return match self.decoder.receive_frame()? {
                    Some(picture) => self.frame_ready(picture),
                    None => {
                        self.decoder_drained();
                        Ok(DecodeStatus::EndOfStream)
                    }
                };
            }
            InputState::Reading => {}
        }

        // a packet may have produced more than one picture
        if let Some(picture) = self.decoder.receive_frame()? {
            return self.frame_ready(picture);
        }

        match self.input.read_packet() {
            Some(packet) if packet.index() == self.stream_index => {
                self.decoder.send_packet(&packet)?;
                match self.decoder.receive_frame()? {
                    Some(picture) => self.frame_ready(picture),
                    None => Ok(DecodeStatus::NoFrameYet),
                }
            }
            Some(packet) => {
                log::trace!("skipping packet of stream {}", packet.index());
                Ok(DecodeStatus::NoFrameYet)
            }
            None => {
                log::debug!("end of input, flushing decoder");
                // set before sending so the flush can never be issued twice
                self.input_state = InputState::Draining;
                self.decoder.send_eof()?;
                match self.decoder.receive_frame()? {
                    Some(picture) => self.frame_ready(picture),
                    None => {
                        self.decoder_drained();
                        Ok(DecodeStatus::NoFrameYet)
                    }
                }
            }
        }
    }

    fn frame_ready(&mut self, picture: Video) -> Result<DecodeStatus> {
        let parameters = self.decoder.parameters();
        if picture.width() != parameters.width || picture.height() != parameters.height {
            return Err(Error::FrameBuffer(format!(
                "decoded picture is {}x{}, stream is {}x{}",
                picture.width(),
                picture.height(),
                parameters.width,
                parameters.height
            )));
        }

        let mut converted = self.scaler.output_frame();
        self.scaler.run(&picture, &mut converted)?;
        converted.set_pts(picture.pts());
        let frame = Frame::from_picture(converted)?;

        self.frames_decoded += 1;
        log::trace!(
            "frame decoded: #{}, pts: {:?}",
            self.frames_decoded,
            picture.pts()
        );
        Ok(DecodeStatus::FrameReady(frame))
    }

    fn decoder_drained(&mut self) {
        self.input_state = InputState::Finished;
        log::debug!("decoder drained after {} frames", self.frames_decoded);
    }

    /// Convert `frame` for the encoder, stamp it with the next pts and encode
    /// it, writing whatever packets the encoder releases. The frame is
    /// consumed on every path.
    pub fn submit_frame(&mut self, mut frame: Frame) -> Result<()> {
        let encoding = self.encoding.as_mut().ok_or(Error::EncodingNotPrepared)?;
        if frame.width() != encoding.target.width() || frame.height() != encoding.target.height()
        {
            return Err(Error::FrameBuffer(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                encoding.target.width(),
                encoding.target.height()
            )));
        }

        // the encoder may still reference the previous picture's buffers
        let ret = unsafe { ffmpeg_next::ffi::av_frame_make_writable(encoding.target.as_mut_ptr()) };
        if ret < 0 {
            return Err(Error::Encode(ffmpeg_next::Error::from(ret)));
        }
        encoding
            .scaler
            .run(frame.sync_picture(), &mut encoding.target)?;

        let pts = self.frame_count;
        encoding.target.set_pts(Some(pts));
        self.frame_count += 1;

        encoding.encoder.send_frame(&encoding.target)?;
        let written = encoding.write_pending_packets()?;
        log::trace!("frame encoded: pts {}, {} packets out", pts, written);
        Ok(())
    }

    /// Drain the encoder, append the end-of-sequence marker, close the output
    /// and release the session.
    pub fn finish(mut self) -> Result<TranscodeSummary> {
        let mut encoding = self.encoding.take().ok_or(Error::EncodingNotPrepared)?;

        log::debug!("flushing encoder after {} frames", self.frame_count);
        encoding.encoder.send_eof()?;
        // ends once the encoder has released everything it buffered
        let flushed = encoding.write_pending_packets()?;
        log::debug!("encoder flushed {} delayed packets", flushed);

        let packets_written = encoding.writer.packets_written();
        let bytes_written = encoding.writer.finish()?;

        let summary = TranscodeSummary {
            frames_decoded: self.frames_decoded,
            frames_encoded: self.frame_count as u64,
            packets_written,
            bytes_written,
        };
        self.close();
        Ok(summary)
    }

    /// Release decoder, encoder and input. Dropping the session does the same.
    pub fn close(self) {
        log::info!(
            "session closed: {} frames decoded, {} frames encoded",
            self.frames_decoded,
            self.frame_count
        );
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
