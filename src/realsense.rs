//! Intel RealSense backend for the camera boundary.
//!
//! Only compiled with the `realsense` cargo feature, since it links against
//! librealsense2. Streams are configured to match what the session expects:
//! Z16 depth and BGR8 color at the same resolution and frame rate.

use realsense_rust::{
    config::Config,
    context::Context,
    frame::{ColorFrame, DepthFrame, PixelKind},
    kind::{Rs2Format, Rs2StreamKind},
    pipeline::{ActivePipeline, InactivePipeline},
};

use crate::camera::{
    CameraError, DepthCamera, RawColorFrame, RawDepthFrame, RawFramePair, StreamConfig,
};

pub struct RealSenseCamera {
    pipeline: Option<ActivePipeline>,
}

impl RealSenseCamera {
    pub fn new() -> Self {
        Self { pipeline: None }
    }
}

impl DepthCamera for RealSenseCamera {
    fn start(&mut self, config: &StreamConfig) -> Result<(), CameraError> {
        let context = Context::new().map_err(|e| CameraError::Device(e.to_string()))?;
        if context.query_devices(Default::default()).is_empty() {
            return Err(CameraError::NoDevice);
        }

        let pipeline = InactivePipeline::try_from(&context)
            .map_err(|e| CameraError::Device(e.to_string()))?;

        let mut stream_config = Config::new();
        stream_config
            .enable_stream(
                Rs2StreamKind::Depth,
                None,
                config.width as usize,
                config.height as usize,
                Rs2Format::Z16,
                config.fps as usize,
            )
            .and_then(|c| {
                c.enable_stream(
                    Rs2StreamKind::Color,
                    None,
                    config.width as usize,
                    config.height as usize,
                    Rs2Format::Bgr8,
                    config.fps as usize,
                )
            })
            .map_err(|_| CameraError::UnsupportedMode {
                width: config.width,
                height: config.height,
                fps: config.fps,
            })?;

        let active = pipeline
            .start(Some(stream_config))
            .map_err(|e| CameraError::Device(e.to_string()))?;
        self.pipeline = Some(active);
        log::info!(
            "RealSense pipeline started at {}x{}@{}",
            config.width,
            config.height,
            config.fps
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        let active = self.pipeline.take().ok_or(CameraError::NotStarted)?;
        active.stop();
        log::info!("RealSense pipeline stopped");
        Ok(())
    }

    fn wait_for_frames(&mut self) -> Result<RawFramePair, CameraError> {
        let active = self.pipeline.as_mut().ok_or(CameraError::NotStarted)?;
        let frames = active
            .wait(None)
            .map_err(|e| CameraError::Device(e.to_string()))?;

        let color = frames
            .frames_of_type::<ColorFrame>()
            .into_iter()
            .next()
            .map(|frame| {
                let mut data = Vec::with_capacity(frame.width() * frame.height() * 3);
                for pixel in frame.iter() {
                    if let PixelKind::Bgr8 { b, g, r } = pixel {
                        data.extend_from_slice(&[*b, *g, *r]);
                    }
                }
                RawColorFrame {
                    data,
                    width: frame.width() as u32,
                    height: frame.height() as u32,
                }
            });

        let depth = frames
            .frames_of_type::<DepthFrame>()
            .into_iter()
            .next()
            .map(|frame| {
                let mut data = Vec::with_capacity(frame.width() * frame.height());
                for pixel in frame.iter() {
                    if let PixelKind::Z16 { depth } = pixel {
                        data.push(*depth);
                    }
                }
                RawDepthFrame {
                    data,
                    width: frame.width() as u32,
                    height: frame.height() as u32,
                }
            });

        Ok(RawFramePair { color, depth })
    }
}
