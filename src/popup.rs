use crate::config::APP_NAME;
use crate::handoff::{LatestSlot, Snapshot};
use crate::startup;
use eframe::egui::{self, Color32, RichText};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::error;

const PANEL: Color32 = Color32::from_rgb(0x11, 0x11, 0x11);

/// Borderless, always-on-top window showing the latest feedback. Blocks the
/// calling thread until the window is closed.
pub fn run_popup(
    slot: Arc<LatestSlot<Snapshot>>,
    stop: Arc<AtomicBool>,
    refresh: Duration,
) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_decorations(false)
            .with_always_on_top()
            .with_resizable(false)
            .with_inner_size([300.0, 150.0])
            .with_position([120.0, 120.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |_cc| Ok(Box::new(Popup::new(slot, stop, refresh)))),
    )
}

struct Popup {
    slot: Arc<LatestSlot<Snapshot>>,
    stop: Arc<AtomicBool>,
    refresh: Duration,
    seen: u64,
    current: Snapshot,
    status: Option<String>,
}

impl Popup {
    fn new(slot: Arc<LatestSlot<Snapshot>>, stop: Arc<AtomicBool>, refresh: Duration) -> Self {
        Self {
            slot,
            stop,
            refresh,
            seen: 0,
            current: Snapshot::starting(),
            status: None,
        }
    }

    fn toggle_startup(&mut self, enabled: bool) {
        self.status = Some(match startup::set_enabled(enabled) {
            Ok(_) if enabled => "Added to startup".to_string(),
            Ok(_) => "Removed from startup".to_string(),
            Err(e) => {
                error!("startup update failed: {e}");
                format!("Startup update failed: {e}")
            }
        });
    }
}

impl eframe::App for Popup {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(snapshot) = self.slot.newer_than(&mut self.seen) {
            self.current = snapshot;
        }
        if self.stop.load(Ordering::Relaxed) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let panel = egui::Frame::none().fill(PANEL).inner_margin(10.0);
        egui::CentralPanel::default().frame(panel).show(ctx, |ui| {
            ui.style_mut().interaction.selectable_labels = false;
            // Registered first so the buttons below win the hit test.
            let background =
                ui.interact(ui.max_rect(), egui::Id::new("popup-drag"), egui::Sense::drag());
            if background.drag_started() {
                ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
            }

            for line in &self.current.feedback.lines {
                ui.label(RichText::new(line.to_string()).size(15.0).color(Color32::WHITE));
            }
            if let Some(status) = &self.status {
                ui.label(RichText::new(status).small().color(Color32::LIGHT_GRAY));
            }
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("❌ Exit").clicked() {
                    self.stop.store(true, Ordering::Relaxed);
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if ui.button("🟢 Add startup").clicked() {
                    self.toggle_startup(true);
                }
                if ui.button("⚪ Remove startup").clicked() {
                    self.toggle_startup(false);
                }
            });
        });

        ctx.request_repaint_after(self.refresh);
    }
}
