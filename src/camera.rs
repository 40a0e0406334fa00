use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Stream parameters requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Raw color frame as delivered by the device: tightly packed BGR bytes.
#[derive(Debug, Clone)]
pub struct RawColorFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Raw depth frame: one 16-bit sample per pixel, in device units.
#[derive(Debug, Clone)]
pub struct RawDepthFrame {
    pub data: Vec<u16>,
    pub width: u32,
    pub height: u32,
}

/// Result of one poll of the device. Either stream may be absent in a
/// given poll; callers poll again until both are present.
#[derive(Debug, Clone, Default)]
pub struct RawFramePair {
    pub color: Option<RawColorFrame>,
    pub depth: Option<RawDepthFrame>,
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no depth camera detected")]
    NoDevice,
    #[error("unsupported stream mode {width}x{height}@{fps}")]
    UnsupportedMode { width: u32, height: u32, fps: u32 },
    #[error("camera stream is not running")]
    NotStarted,
    #[error("device error: {0}")]
    Device(String),
}

/// The camera device boundary: a depth+color source with start/stop
/// lifecycle and a blocking wait for the next frame pair.
pub trait DepthCamera {
    /// Enable the depth (16-bit) and color (8-bit BGR) streams and start
    /// the device.
    fn start(&mut self, config: &StreamConfig) -> Result<(), CameraError>;

    /// Stop the active stream.
    fn stop(&mut self) -> Result<(), CameraError>;

    /// Block until the device produces its next frame pair. Bounded by the
    /// device frame interval on a healthy device; no timeout is applied.
    fn wait_for_frames(&mut self) -> Result<RawFramePair, CameraError>;
}

/// Open the best available camera backend.
///
/// Builds with the `realsense` feature talk to librealsense2; without it
/// the synthetic test-pattern camera stands in, so the tool stays usable
/// for UI development on machines without the hardware.
pub fn open_camera() -> Box<dyn DepthCamera> {
    #[cfg(feature = "realsense")]
    {
        Box::new(crate::realsense::RealSenseCamera::new())
    }
    #[cfg(not(feature = "realsense"))]
    {
        log::warn!("built without RealSense support - using synthetic test-pattern camera");
        Box::new(SyntheticCamera::new())
    }
}

/// Software camera producing a moving gradient pattern.
///
/// Paces itself to the configured frame rate so `wait_for_frames` blocks
/// for roughly one frame interval, like a real device.
pub struct SyntheticCamera {
    config: Option<StreamConfig>,
    frame_counter: u64,
    last_frame: Option<Instant>,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self {
            config: None,
            frame_counter: 0,
            last_frame: None,
        }
    }

    fn render_pair(config: &StreamConfig, tick: u64) -> RawFramePair {
        let (w, h) = (config.width, config.height);
        let t = tick as u32;

        let mut color = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let b = (x.wrapping_add(t) % w.max(1) * 255 / w.max(1)) as u8;
                let g = (y * 255 / h.max(1)) as u8;
                let r = ((x + y).wrapping_add(t.wrapping_mul(2)) % 256) as u8;
                color.extend_from_slice(&[b, g, r]);
            }
        }

        let mut depth = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                // Sweep through a plausible millimetre range
                depth.push((300 + (x + y + t * 4) % 4000) as u16);
            }
        }

        RawFramePair {
            color: Some(RawColorFrame {
                data: color,
                width: w,
                height: h,
            }),
            depth: Some(RawDepthFrame {
                data: depth,
                width: w,
                height: h,
            }),
        }
    }
}

impl DepthCamera for SyntheticCamera {
    fn start(&mut self, config: &StreamConfig) -> Result<(), CameraError> {
        if config.width == 0 || config.height == 0 || config.fps == 0 {
            return Err(CameraError::UnsupportedMode {
                width: config.width,
                height: config.height,
                fps: config.fps,
            });
        }
        self.config = Some(*config);
        self.frame_counter = 0;
        self.last_frame = None;
        log::info!(
            "synthetic camera started at {}x{}@{}",
            config.width,
            config.height,
            config.fps
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        if self.config.take().is_none() {
            return Err(CameraError::NotStarted);
        }
        self.last_frame = None;
        log::info!("synthetic camera stopped");
        Ok(())
    }

    fn wait_for_frames(&mut self) -> Result<RawFramePair, CameraError> {
        let config = self.config.ok_or(CameraError::NotStarted)?;

        // Emulate the device frame cadence
        let interval = Duration::from_secs(1) / config.fps.max(1);
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
        self.frame_counter += 1;

        Ok(Self::render_pair(&config, self.frame_counter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> StreamConfig {
        StreamConfig {
            width: 16,
            height: 12,
            fps: 1000,
        }
    }

    #[test]
    fn test_wait_before_start_fails() {
        let mut camera = SyntheticCamera::new();
        assert!(matches!(
            camera.wait_for_frames(),
            Err(CameraError::NotStarted)
        ));
    }

    #[test]
    fn test_stop_without_start_fails() {
        let mut camera = SyntheticCamera::new();
        assert!(matches!(camera.stop(), Err(CameraError::NotStarted)));
    }

    #[test]
    fn test_rejects_zero_sized_mode() {
        let mut camera = SyntheticCamera::new();
        let config = StreamConfig {
            width: 0,
            height: 480,
            fps: 30,
        };
        assert!(matches!(
            camera.start(&config),
            Err(CameraError::UnsupportedMode { .. })
        ));
    }

    #[test]
    fn test_frames_match_requested_mode() {
        let mut camera = SyntheticCamera::new();
        let config = fast_config();
        camera.start(&config).unwrap();

        let pair = camera.wait_for_frames().unwrap();
        let color = pair.color.unwrap();
        let depth = pair.depth.unwrap();

        assert_eq!(color.width, config.width);
        assert_eq!(color.height, config.height);
        assert_eq!(
            color.data.len(),
            (config.width * config.height * 3) as usize
        );
        assert_eq!(depth.data.len(), (config.width * config.height) as usize);
    }

    #[test]
    fn test_consecutive_frames_differ() {
        let mut camera = SyntheticCamera::new();
        camera.start(&fast_config()).unwrap();

        let first = camera.wait_for_frames().unwrap().color.unwrap();
        let second = camera.wait_for_frames().unwrap().color.unwrap();
        assert_ne!(first.data, second.data);
    }

    #[test]
    fn test_error_messages_name_the_cause() {
        assert_eq!(CameraError::NoDevice.to_string(), "no depth camera detected");
        assert_eq!(
            CameraError::UnsupportedMode {
                width: 640,
                height: 480,
                fps: 25
            }
            .to_string(),
            "unsupported stream mode 640x480@25"
        );
        assert_eq!(
            CameraError::NotStarted.to_string(),
            "camera stream is not running"
        );
    }

    #[test]
    fn test_restart_after_stop() {
        let mut camera = SyntheticCamera::new();
        camera.start(&fast_config()).unwrap();
        camera.stop().unwrap();
        camera.start(&fast_config()).unwrap();
        assert!(camera.wait_for_frames().is_ok());
    }
}
