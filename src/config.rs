use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::camera::StreamConfig;

/// Optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = "rgbd_capture.toml";

#[derive(Parser, Debug, Default)]
#[command(
    name = "rgbd-capture",
    version,
    about = "Manual RGB-D dataset capture tool"
)]
pub struct CliArgs {
    /// Capture width in pixels [default: 640]
    #[arg(long)]
    pub width: Option<u32>,

    /// Capture height in pixels [default: 480]
    #[arg(long)]
    pub height: Option<u32>,

    /// Capture frame rate; should be a divisor of 30 [default: 30]
    #[arg(long)]
    pub fps: Option<u32>,

    /// Number of frames per batch recording; accepted for compatibility,
    /// batch recording itself is not implemented [default: 20]
    #[arg(long)]
    pub total_frames: Option<u32>,

    /// Directory snapshots are written to [default: current directory]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Effective configuration after merging CLI flags over the config file.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub total_frames: u32,
    pub output_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    stream: StreamSection,
    #[serde(default)]
    capture: CaptureSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StreamSection {
    width: u32,
    height: u32,
    fps: u32,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CaptureSection {
    total_frames: u32,
    output_dir: PathBuf,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            total_frames: 20,
            output_dir: PathBuf::from("."),
        }
    }
}

impl CaptureConfig {
    /// Merge CLI flags over `rgbd_capture.toml` (if present) over defaults.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let config_path = PathBuf::from(CONFIG_FILE);
        if config_path.exists() {
            Self::load_from(&config_path, args)
        } else {
            log::info!("config file not found, using defaults");
            Ok(Self::merge(FileConfig::default(), args))
        }
    }

    /// Like [`CaptureConfig::load`] but from an explicit file path.
    pub fn load_from<P: AsRef<Path>>(path: P, args: &CliArgs) -> Result<Self> {
        let file = Self::read_file(path.as_ref())?;
        Ok(Self::merge(file, args))
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let file: FileConfig =
            toml::from_str(&contents).context("Failed to parse configuration file")?;
        log::info!("Configuration loaded from {}", path.display());
        Ok(file)
    }

    fn merge(file: FileConfig, args: &CliArgs) -> Self {
        Self {
            width: args.width.unwrap_or(file.stream.width),
            height: args.height.unwrap_or(file.stream.height),
            fps: args.fps.unwrap_or(file.stream.fps),
            total_frames: args.total_frames.unwrap_or(file.capture.total_frames),
            output_dir: args
                .output_dir
                .clone()
                .unwrap_or(file.capture.output_dir),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow::anyhow!(
                "Invalid capture dimensions: {}x{}",
                self.width,
                self.height
            ));
        }
        if self.fps == 0 {
            return Err(anyhow::anyhow!("Frame rate must be non-zero"));
        }
        if 30 % self.fps != 0 {
            log::warn!("fps {} is not a divisor of 30", self.fps);
        }
        if self.total_frames == 0 {
            return Err(anyhow::anyhow!("total_frames must be non-zero"));
        }
        Ok(())
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::merge(FileConfig::default(), &CliArgs::default());
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.fps, 30);
        assert_eq!(config.total_frames, 20);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("rgbd_capture.toml");
        std::fs::write(
            &config_path,
            "[stream]\nwidth = 1280\nheight = 720\nfps = 15\n",
        )
        .unwrap();

        let args = CliArgs {
            width: Some(848),
            ..Default::default()
        };
        let config = CaptureConfig::load_from(&config_path, &args).unwrap();

        assert_eq!(config.width, 848); // CLI wins
        assert_eq!(config.height, 720); // file value
        assert_eq!(config.fps, 15);
        assert_eq!(config.total_frames, 20); // default
    }

    #[test]
    fn test_partial_file_fills_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("rgbd_capture.toml");
        std::fs::write(&config_path, "[capture]\noutput_dir = \"dataset\"\n").unwrap();

        let config = CaptureConfig::load_from(&config_path, &CliArgs::default()).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.output_dir, PathBuf::from("dataset"));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = CaptureConfig::merge(FileConfig::default(), &CliArgs::default());

        config.width = 0;
        assert!(config.validate().is_err());

        config.width = 640;
        config.fps = 0;
        assert!(config.validate().is_err());

        config.fps = 30;
        config.total_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args =
            CliArgs::try_parse_from(["rgbd-capture", "--width", "320", "--fps", "15"]).unwrap();
        assert_eq!(args.width, Some(320));
        assert_eq!(args.height, None);
        assert_eq!(args.fps, Some(15));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("rgbd_capture.toml");
        std::fs::write(&config_path, "not valid toml [").unwrap();

        assert!(CaptureConfig::load_from(&config_path, &CliArgs::default()).is_err());
    }
}
