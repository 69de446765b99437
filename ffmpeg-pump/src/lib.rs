/// Registers FFmpeg components. Call once at startup, before opening any
/// input. FFmpeg's own logging is kept to errors unless `verbose`.
pub fn init(verbose: bool) -> Result<()> {
    ffmpeg_next::init().map_err(Error::Init)?;
    let level = if verbose {
        ffmpeg_next::util::log::Level::Info
    } else {
        ffmpeg_next::util::log::Level::Error
    };
    ffmpeg_next::util::log::set_level(level);
    Ok(())
}

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod input;
pub mod output;
pub mod packet;
pub mod pipeline;
pub mod scaler;
pub mod session;
pub mod stream;

pub use error::{Error, Result, Stage};
pub use frame::Frame;
pub use pipeline::{DecodeErrorPolicy, TranscodeOptions, transcode};
pub use session::{DecodeStatus, Session, TranscodeSummary};
