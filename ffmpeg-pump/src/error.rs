use std::{fmt, io, path::PathBuf, result};

use ffmpeg_next::codec::Id;

/// Result type of all ffmpeg-pump calls.
pub type Result<T, E = Error> = result::Result<T, E>;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Open,
    FindCodec,
    OpenCodec,
    Decode,
    Convert,
    Encode,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Open => "open",
            Stage::FindCodec => "find-codec",
            Stage::OpenCodec => "open-codec",
            Stage::Decode => "decode",
            Stage::Convert => "convert",
            Stage::Encode => "encode",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("ffmpeg initialization failed: {0}")]
    Init(#[source] ffmpeg_next::Error),

    #[error("could not open input {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },

    #[error("input has no video stream")]
    NoVideoStream,

    #[error("no decoder available for codec {0:?}")]
    UnsupportedCodec(Id),

    #[error("could not open decoder for codec {codec:?}: {source}")]
    CodecOpen {
        codec: Id,
        #[source]
        source: ffmpeg_next::Error,
    },

    #[error("error decoding video packet: {0}")]
    Decode(#[source] ffmpeg_next::Error),

    #[error("no encoder available for codec {0:?}")]
    EncoderNotFound(Id),

    #[error("could not open encoder for codec {codec:?}: {source}")]
    EncoderOpen {
        codec: Id,
        #[source]
        source: ffmpeg_next::Error,
    },

    #[error("could not create output {path}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error encoding frame: {0}")]
    Encode(#[source] ffmpeg_next::Error),

    #[error("error writing output: {0}")]
    Write(#[source] io::Error),

    #[error("pixel format conversion failed: {0}")]
    Convert(#[source] ffmpeg_next::Error),

    #[error("invalid frame buffer: {0}")]
    FrameBuffer(String),

    #[error("encoding has not been prepared for this session")]
    EncodingNotPrepared,

    #[error("encoding has already been prepared for this session")]
    EncodingAlreadyPrepared,
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::Init(_) | Error::Open { .. } | Error::NoVideoStream => Stage::Open,
            Error::UnsupportedCodec(_) | Error::EncoderNotFound(_) => Stage::FindCodec,
            Error::CodecOpen { .. } | Error::EncoderOpen { .. } => Stage::OpenCodec,
            Error::Decode(_) => Stage::Decode,
            Error::Convert(_) | Error::FrameBuffer(_) => Stage::Convert,
            Error::Encode(_) | Error::EncodingNotPrepared | Error::EncodingAlreadyPrepared => {
                Stage::Encode
            }
            Error::OutputCreate { .. } | Error::Write(_) => Stage::Output,
        }
    }

    /// A failed decode of a single packet leaves the session usable; every
    /// other error aborts the transcode.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_recoverable() {
        let err = Error::Decode(ffmpeg_next::Error::InvalidData);
        assert!(!err.is_fatal());
        assert_eq!(err.stage(), Stage::Decode);
    }

    #[test]
    fn setup_errors_are_fatal() {
        assert!(Error::NoVideoStream.is_fatal());
        assert!(Error::EncoderNotFound(Id::H264).is_fatal());
        assert_eq!(Error::EncoderNotFound(Id::H264).stage(), Stage::FindCodec);
        assert_eq!(
            Error::Encode(ffmpeg_next::Error::InvalidData).stage(),
            Stage::Encode
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::FindCodec.to_string(), "find-codec");
        assert_eq!(Stage::OpenCodec.to_string(), "open-codec");
    }
}
