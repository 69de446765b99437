use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ffmpeg_pump::{DecodeErrorPolicy, TranscodeOptions};
use serde::{Deserialize, Serialize};

/// Transcode the first video stream of a container into a raw elementary
/// bitstream of the same codec.
///
/// Options may also come from a JSON file given with `--config`:
///
/// {
///     "on_decode_error": "skip",
///     "h264_preset": "medium",
///     "verbose": true
/// }
///
/// Values given on the command line win over the file.
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Input container file
    #[serde(skip)]
    pub input: PathBuf,

    /// Output bitstream file
    #[serde(skip)]
    pub output: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// What to do when a packet fails to decode
    #[arg(long, value_enum, default_value_t = OnDecodeError::Abort)]
    pub on_decode_error: OnDecodeError,

    /// Encoder preset, applied only to H.264 streams
    #[arg(long, default_value_t = default_h264_preset())]
    pub h264_preset: String,

    /// Debug logging for the pipeline and FFmpeg's own messages
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OnDecodeError {
    /// Log the failed packet and keep going
    Skip,
    /// Stop the transcode
    #[default]
    Abort,
}

fn default_h264_preset() -> String {
    "slow".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            config: None,
            on_decode_error: OnDecodeError::default(),
            h264_preset: default_h264_preset(),
            verbose: false,
        }
    }
}

impl Config {
    /// Parse the command line, merge the config file if one is named, and
    /// validate the result.
    pub fn load() -> Result<Self> {
        let mut config = Config::parse();

        if let Some(config_path) = config.config.clone() {
            let file_config = Self::from_file(&config_path)?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Command-line values left at their default are taken from the file.
    fn merge_with_file(mut self, file_config: Config) -> Self {
        if self.on_decode_error == OnDecodeError::default() {
            self.on_decode_error = file_config.on_decode_error;
        }
        if self.h264_preset == default_h264_preset() {
            self.h264_preset = file_config.h264_preset;
        }
        if !self.verbose {
            self.verbose = file_config.verbose;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input == self.output {
            return Err(anyhow::anyhow!(
                "input and output are the same file: {}",
                self.input.display()
            ));
        }
        if self.h264_preset.trim().is_empty() {
            return Err(anyhow::anyhow!("H.264 preset cannot be empty"));
        }
        Ok(())
    }

    pub fn to_options(&self) -> TranscodeOptions {
        TranscodeOptions {
            decode_errors: match self.on_decode_error {
                OnDecodeError::Skip => DecodeErrorPolicy::Skip,
                OnDecodeError::Abort => DecodeErrorPolicy::Abort,
            },
            h264_preset: self.h264_preset.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("lite-transcode").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["in.mp4", "out.m1v"]);
        assert_eq!(config.input, PathBuf::from("in.mp4"));
        assert_eq!(config.output, PathBuf::from("out.m1v"));
        assert_eq!(config.on_decode_error, OnDecodeError::Abort);
        assert_eq!(config.h264_preset, "slow");
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_command_line_options() {
        let config = parse(&[
            "in.mp4",
            "out.h264",
            "--on-decode-error",
            "skip",
            "--h264-preset",
            "veryfast",
            "-v",
        ]);
        assert_eq!(config.on_decode_error, OnDecodeError::Skip);
        assert_eq!(config.h264_preset, "veryfast");
        assert!(config.verbose);

        let options = config.to_options();
        assert_eq!(options.decode_errors, DecodeErrorPolicy::Skip);
        assert_eq!(options.h264_preset, "veryfast");
    }

    #[test]
    fn test_file_fills_defaults_only() -> Result<()> {
        let file: Config =
            serde_json::from_str(r#"{"on_decode_error": "skip", "h264_preset": "medium"}"#)?;
        assert!(!file.verbose);

        let merged = parse(&["in.mp4", "out.h264"]).merge_with_file(file.clone());
        assert_eq!(merged.on_decode_error, OnDecodeError::Skip);
        assert_eq!(merged.h264_preset, "medium");
        assert_eq!(merged.input, PathBuf::from("in.mp4"));

        let merged = parse(&["in.mp4", "out.h264", "--h264-preset", "fast"]).merge_with_file(file);
        assert_eq!(merged.h264_preset, "fast");
        Ok(())
    }

    #[test]
    fn test_rejects_same_input_and_output() {
        let config = parse(&["clip.m1v", "clip.m1v"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_preset() {
        let config = parse(&["in.mp4", "out.h264", "--h264-preset", " "]);
        assert!(config.validate().is_err());
    }
}
