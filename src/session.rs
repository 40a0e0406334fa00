use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::{ImageBuffer, Luma, RgbImage};

use crate::camera::{DepthCamera, RawColorFrame, RawDepthFrame};
use crate::config::CaptureConfig;

/// Full-resolution depth frame, raw 16-bit device samples.
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Fixed catalog of selectable object names, shared by the three channel
/// pickers. Index 0 is the "None" sentinel.
pub const LABEL_CATALOG: [&str; 11] = [
    "None", "Ball", "Boat", "Cup", "Fork", "Glove", "Hat", "Shoe", "Spoon", "Tayo", "Teddy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn title(self) -> &'static str {
        match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// One depth image and one color image captured at the same instant.
pub struct FramePair {
    pub color: RgbImage,
    pub depth: DepthImage,
}

/// Which way the connect toggle currently points. The UI dispatches on
/// this instead of rebinding a button handler every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Connect,
    Disconnect,
}

impl ToggleAction {
    pub fn label(self) -> &'static str {
        match self {
            ToggleAction::Connect => "Connect",
            ToggleAction::Disconnect => "Disconnect",
        }
    }
}

/// Paths of one persisted capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCapture {
    pub color_path: PathBuf,
    pub depth_path: PathBuf,
}

/// Capture session controller: owns the camera lifecycle, the most recent
/// decoded frame pair, and the three label selections.
pub struct CaptureSession {
    camera: Box<dyn DepthCamera>,
    config: CaptureConfig,
    connected: bool,
    latest: Option<FramePair>,
    selected: [usize; 3],
}

impl CaptureSession {
    pub fn new(camera: Box<dyn DepthCamera>, config: CaptureConfig) -> Self {
        Self {
            camera,
            config,
            connected: false,
            latest: None,
            selected: [0; 3], // all channels start on the "None" sentinel
        }
    }

    /// Start the depth and color streams. On failure the session stays
    /// disconnected; callers treat the error as fatal.
    pub fn connect(&mut self) -> Result<()> {
        self.camera
            .start(&self.config.stream_config())
            .context("Failed to start camera streams")?;
        self.connected = true;
        log::info!("Connected");
        Ok(())
    }

    /// Stop the active stream. Only called while connected; the UI toggle
    /// guarantees that by construction.
    pub fn disconnect(&mut self) -> Result<()> {
        self.camera.stop().context("Failed to stop camera")?;
        self.connected = false;
        log::info!("Disconnected");
        Ok(())
    }

    pub fn status_text(&self) -> &'static str {
        if self.connected {
            "Connected"
        } else {
            "Not Connected"
        }
    }

    pub fn toggle_action(&self) -> ToggleAction {
        if self.connected {
            ToggleAction::Disconnect
        } else {
            ToggleAction::Connect
        }
    }

    /// Pull the next frame pair from the device and replace the latest
    /// state. Blocks until a poll delivers both streams non-empty; a poll
    /// with either stream absent is retried immediately.
    ///
    /// Returns `true` when a new pair was stored, `false` when
    /// disconnected (no frame work happens then).
    pub fn refresh_tick(&mut self) -> Result<bool> {
        if !self.connected {
            return Ok(false);
        }
        loop {
            let raw = self
                .camera
                .wait_for_frames()
                .context("Frame wait failed")?;
            let (Some(color), Some(depth)) = (raw.color, raw.depth) else {
                continue;
            };
            if color.data.is_empty() || depth.data.is_empty() {
                continue;
            }
            // Decode fully before replacing, so latest is swapped whole
            let pair = FramePair {
                color: decode_color(color)?,
                depth: decode_depth(depth)?,
            };
            self.latest = Some(pair);
            return Ok(true);
        }
    }

    /// Update one channel's selection. Out-of-range indices are ignored;
    /// the selection only affects future capture filenames.
    pub fn set_label(&mut self, channel: Channel, index: usize) {
        if index >= LABEL_CATALOG.len() {
            log::warn!(
                "label index {} out of range for {} channel",
                index,
                channel.title()
            );
            return;
        }
        self.selected[channel.index()] = index;
    }

    pub fn selected_index(&self, channel: Channel) -> usize {
        self.selected[channel.index()]
    }

    pub fn selected_labels(&self) -> [&'static str; 3] {
        [
            LABEL_CATALOG[self.selected[0]],
            LABEL_CATALOG[self.selected[1]],
            LABEL_CATALOG[self.selected[2]],
        ]
    }

    pub fn latest(&self) -> Option<&FramePair> {
        self.latest.as_ref()
    }

    /// Persist the latest full-resolution frame pair as two PNG files in
    /// the configured output directory. A no-op returning `None` when no
    /// frame has arrived yet. Existing files with the same name are
    /// silently overwritten.
    pub fn capture_save(&self) -> Result<Option<SavedCapture>> {
        self.save_latest(&self.config.output_dir, Local::now())
    }

    /// [`capture_save`](Self::capture_save) with explicit directory and
    /// wall-clock time.
    pub fn save_latest(&self, dir: &Path, at: DateTime<Local>) -> Result<Option<SavedCapture>> {
        let Some(pair) = &self.latest else {
            log::warn!("capture requested before any frame arrived");
            return Ok(None);
        };

        let basename = capture_basename(&at, self.selected_labels());
        let color_path = dir.join(format!("{basename}color.png"));
        let depth_path = dir.join(format!("{basename}depth.png"));

        pair.color
            .save(&color_path)
            .with_context(|| format!("Failed to save {}", color_path.display()))?;
        pair.depth
            .save(&depth_path)
            .with_context(|| format!("Failed to save {}", depth_path.display()))?;

        log::info!(
            "Saved capture {} / {}",
            color_path.display(),
            depth_path.display()
        );
        Ok(Some(SavedCapture {
            color_path,
            depth_path,
        }))
    }
}

/// Filename prefix for one capture: timestamp then the Red, Green and Blue
/// labels, all joined by underscores.
pub fn capture_basename(at: &DateTime<Local>, labels: [&str; 3]) -> String {
    format!(
        "{}_{}_{}_{}_",
        at.format("%Y%m%d_%H%M%S"),
        labels[0],
        labels[1],
        labels[2]
    )
}

/// The device delivers BGR; flip the channel order to RGB exactly once.
fn decode_color(frame: RawColorFrame) -> Result<RgbImage> {
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.data.len() != expected {
        anyhow::bail!(
            "color frame has {} bytes, expected {}",
            frame.data.len(),
            expected
        );
    }
    let mut rgb = Vec::with_capacity(expected);
    for px in frame.data.chunks_exact(3) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    RgbImage::from_raw(frame.width, frame.height, rgb)
        .context("color buffer does not match frame dimensions")
}

/// Depth samples are kept raw; no transform is applied.
fn decode_depth(frame: RawDepthFrame) -> Result<DepthImage> {
    DepthImage::from_raw(frame.width, frame.height, frame.data)
        .context("depth buffer does not match frame dimensions")
}
