use std::time::{Duration, Instant};

use eframe::egui;

use crate::preview::{self, PREVIEW_HEIGHT, PREVIEW_WIDTH};
use crate::session::{CaptureSession, Channel, ToggleAction, LABEL_CATALOG};

/// Refresh cadence: 1/30 second, independent of the configured capture FPS.
const TICK_PERIOD: Duration = Duration::from_millis(33);
const STATUS_MESSAGE_SECS: u64 = 3;
const UI_PADDING: f32 = 10.0;

pub struct CaptureApp {
    pub session: CaptureSession,

    // Preview surfaces currently on screen
    pub color_texture: Option<egui::TextureHandle>,
    pub depth_texture: Option<egui::TextureHandle>,

    last_tick: Option<Instant>,

    // Transient operator feedback
    status_message: Option<String>,
    status_message_time: Option<Instant>,
}

impl CaptureApp {
    pub fn new(session: CaptureSession) -> Self {
        Self {
            session,
            color_texture: None,
            depth_texture: None,
            last_tick: None,
            status_message: None,
            status_message_time: None,
        }
    }

    fn show_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_message_time = Some(Instant::now());
    }
}

impl eframe::App for CaptureApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Spacebar triggers the same action as the capture button
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.do_capture();
        }

        self.tick(ctx);
        self.render_ui(ctx);

        // Reschedule unconditionally until the application exits
        ctx.request_repaint_after(TICK_PERIOD);
    }
}

// ============================================================================
// REFRESH TICK AND OPERATOR ACTIONS
// ============================================================================

impl CaptureApp {
    fn tick(&mut self, ctx: &egui::Context) {
        let due = match self.last_tick {
            None => true,
            Some(last) => last.elapsed() >= TICK_PERIOD,
        };
        if !due {
            return;
        }

        match self.session.refresh_tick() {
            Ok(true) => {
                let previews = self.session.latest().map(|pair| {
                    (
                        preview::color_preview(&pair.color),
                        preview::depth_preview(&pair.depth),
                    )
                });
                if let Some((color, depth)) = previews {
                    self.update_color_texture(ctx, &color);
                    self.update_depth_texture(ctx, &depth);
                }
            }
            // Disconnected: no frame work, previews keep their last contents
            Ok(false) => {}
            Err(e) => {
                log::error!("frame refresh failed: {e:#}");
                self.show_status(format!("Frame refresh failed: {e}"));
            }
        }
        self.last_tick = Some(Instant::now());
    }

    fn do_capture(&mut self) {
        match self.session.capture_save() {
            Ok(Some(saved)) => {
                self.show_status(format!("✓ Saved {}", saved.color_path.display()));
            }
            Ok(None) => {
                self.show_status("No frame captured yet".to_string());
            }
            Err(e) => {
                log::error!("capture failed: {e:#}");
                self.show_status(format!("Save failed: {e}"));
            }
        }
    }

    fn toggle_connection(&mut self, ctx: &egui::Context) {
        match self.session.toggle_action() {
            ToggleAction::Disconnect => {
                if let Err(e) = self.session.disconnect() {
                    log::error!("disconnect failed: {e:#}");
                    self.show_status(format!("Disconnect failed: {e}"));
                }
            }
            ToggleAction::Connect => {
                if let Err(e) = self.session.connect() {
                    // Fail fast: an unusable camera terminates the app
                    log::error!("connect failed: {e:#}");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

impl CaptureApp {
    fn render_ui(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    // Toggle button and status label reflect current state
                    ui.horizontal(|ui| {
                        let action = self.session.toggle_action();
                        if ui.button(action.label()).clicked() {
                            self.toggle_connection(ctx);
                        }
                        ui.label(self.session.status_text());
                    });
                    ui.add_space(UI_PADDING);

                    ui.horizontal(|ui| {
                        preview_pane(ui, &self.color_texture);
                        preview_pane(ui, &self.depth_texture);
                    });
                    ui.add_space(UI_PADDING);

                    let capture_size =
                        egui::vec2(PREVIEW_WIDTH as f32 * 2.0 + UI_PADDING, 32.0);
                    if ui
                        .add_sized(capture_size, egui::Button::new("Capture"))
                        .clicked()
                    {
                        self.do_capture();
                    }
                });

                ui.add_space(UI_PADDING);
                for channel in Channel::ALL {
                    self.render_label_column(ui, channel);
                }
            });

            self.render_status_message(ctx);
        });
    }

    fn render_label_column(&mut self, ui: &mut egui::Ui, channel: Channel) {
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(channel.title()).strong());
            egui::ScrollArea::vertical()
                .id_source(channel.title())
                .max_height(PREVIEW_HEIGHT as f32 + 60.0)
                .show(ui, |ui| {
                    let current = self.session.selected_index(channel);
                    for (i, label) in LABEL_CATALOG.iter().enumerate() {
                        if ui.radio(current == i, *label).clicked() {
                            self.session.set_label(channel, i);
                        }
                    }
                });
        });
    }

    fn render_status_message(&mut self, ctx: &egui::Context) {
        // Auto-hide after a few seconds
        if let Some(shown_at) = self.status_message_time {
            if shown_at.elapsed().as_secs() > STATUS_MESSAGE_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        if let Some(ref message) = self.status_message {
            let is_success = message.starts_with('✓');

            egui::Area::new("status_message")
                .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, UI_PADDING * 2.0))
                .order(egui::Order::Tooltip)
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(if is_success {
                            egui::Color32::from_rgb(40, 120, 40)
                        } else {
                            egui::Color32::from_rgb(180, 40, 40)
                        })
                        .rounding(6.0)
                        .inner_margin(egui::Margin::symmetric(14.0, 10.0))
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
                        });
                });
        }
    }
}

fn preview_pane(ui: &mut egui::Ui, texture: &Option<egui::TextureHandle>) {
    let size = egui::vec2(PREVIEW_WIDTH as f32, PREVIEW_HEIGHT as f32);
    match texture {
        Some(texture) => {
            ui.add(egui::Image::new(texture).fit_to_exact_size(size));
        }
        None => {
            // Black placeholder until the first frame arrives
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            ui.painter().rect_filled(rect, 0.0, egui::Color32::BLACK);
        }
    }
}
