use anyhow::Result;
use clap::Parser;
use eframe::egui;
use log::info;

mod camera;
mod config;
mod preview;
#[cfg(feature = "realsense")]
mod realsense;
mod session;
mod texture;
mod ui;

use crate::config::{CaptureConfig, CliArgs};
use crate::session::CaptureSession;
use crate::ui::CaptureApp;

fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let config = CaptureConfig::load(&args)?;
    config.validate()?;
    info!(
        "Starting RGB-D capture: {}x{}@{} -> {}",
        config.width,
        config.height,
        config.fps,
        config.output_dir.display()
    );

    let camera = camera::open_camera();
    let mut session = CaptureSession::new(camera, config);

    // Fail fast: an unusable camera at startup terminates the application
    session.connect()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1040.0, 420.0])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        "RGB-D Dataset Capture",
        options,
        Box::new(move |_cc| Box::new(CaptureApp::new(session))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))?;

    info!("Application shut down gracefully");
    Ok(())
}
