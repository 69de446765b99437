use std::path::Path;

use crate::{
    decoder::VideoDecoder,
    encoder::VideoEncoder,
    error::Result,
    input::Demuxer,
    session::{DecodeStatus, Session, TranscodeSummary},
};

/// What the driver does when a single packet fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeErrorPolicy {
    #[default]
    Abort,
    /// Log and keep pulling.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOptions {
    pub decode_errors: DecodeErrorPolicy,
    /// Quality preset, used only when the stream is H.264.
    pub h264_preset: String,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            decode_errors: DecodeErrorPolicy::default(),
            h264_preset: "slow".to_string(),
        }
    }
}

/// Re-encode the first video stream of `input` into a raw bitstream at
/// `output`, same codec family.
pub fn transcode(input: &Path, output: &Path, options: &TranscodeOptions) -> Result<TranscodeSummary> {
    let mut session = Session::open(input)?;
    session.prepare_encoding(output, &options.h264_preset)?;
    drive(session, options.decode_errors)
}

/// Pull every frame out of a prepared session into its encoder, then finish
/// it. The session is released on every path.
pub fn drive<I, D, E>(
    mut session: Session<I, D, E>,
    decode_errors: DecodeErrorPolicy,
) -> Result<TranscodeSummary>
where
    I: Demuxer,
    D: VideoDecoder,
    E: VideoEncoder,
{
    let mut skipped = 0u64;
    loop {
        match session.next_frame() {
            Ok(DecodeStatus::FrameReady(frame)) => session.submit_frame(frame)?,
            Ok(DecodeStatus::NoFrameYet) => {}
            Ok(DecodeStatus::EndOfStream) => break,
            Err(err) if !err.is_fatal() && decode_errors == DecodeErrorPolicy::Skip => {
                skipped += 1;
                log::warn!("{} (stage: {}), skipping packet", err, err.stage());
            }
            Err(err) => return Err(err),
        }
    }

    if skipped > 0 {
        log::warn!("{} packets failed to decode and were skipped", skipped);
    }
    let summary = session.finish()?;
    log::info!(
        "transcode done: {} frames, {} packets, {} bytes",
        summary.frames_encoded,
        summary.packets_written,
        summary.bytes_written
    );
    Ok(summary)
}
