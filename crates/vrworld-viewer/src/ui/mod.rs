//! Settings panel and HUD overlay.
//!
//! Drawing happens before the frame tick. Widgets that merely tune values
//! (decoration sliders) write straight into the session; anything that
//! rebuilds state is returned as a `UiAction` and applied by `apply_actions`.

pub mod panel;

use crate::input::headset::HeadsetState;
use crate::session::SessionContext;
use std::f32::consts::PI;

const LEARN_MORE_URL: &str = "https://webvr.info";

/// Tessellated UI ready for the renderer.
pub struct UiPaint {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// Replot along new X/Y/Z columns.
    SelectAxes([usize; 3]),
    EnterVr,
    ExitVr,
}

/// Draws the settings window and HUD, returning requested actions.
pub fn draw(ctx: &egui::Context, session: &mut SessionContext, fps: f32) -> Vec<UiAction> {
    let mut actions = Vec::new();
    draw_settings(ctx, session, &mut actions);
    draw_hud(ctx, session, fps, &mut actions);
    actions
}

fn draw_settings(ctx: &egui::Context, session: &mut SessionContext, actions: &mut Vec<UiAction>) {
    egui::Window::new("Settings")
        .default_pos([12.0, 120.0])
        .resizable(false)
        .show(ctx, |ui| {
            if let Some(deco) = session.decoration_mut() {
                ui.add(egui::Slider::new(&mut deco.position.x, -1.0..=1.0).text("Position X"));
                ui.add(egui::Slider::new(&mut deco.position.y, -1.0..=2.0).text("Position Y"));
                ui.add(egui::Slider::new(&mut deco.rotation_y, -PI..=PI).text("Rotation"));
            }

            ui.separator();

            if let Some(current) = session.plot.as_ref().map(|p| p.columns) {
                let labels = session.column_labels();
                let mut chosen = current;
                for (slot, axis) in chosen.iter_mut().zip(["X", "Y", "Z"]) {
                    let selected = labels.get(*slot).map(String::as_str).unwrap_or("?");
                    egui::ComboBox::from_label(axis)
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            for (i, label) in labels.iter().enumerate() {
                                ui.selectable_value(slot, i, label.as_str());
                            }
                        });
                }
                if chosen != current {
                    actions.push(UiAction::SelectAxes(chosen));
                }
            } else {
                ui.label("No dataset plotted.");
            }

            if session.panel.target_count() > 0 {
                ui.separator();
                ui.label("Controllers");
                for (id, down) in session.panel.targets() {
                    ui.label(format!("#{}{}", id, if down { " (pressed)" } else { "" }));
                }
            }
        });
}

fn draw_hud(ctx: &egui::Context, session: &SessionContext, fps: f32, actions: &mut Vec<UiAction>) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
        .show(ctx, |ui| {
            ui.label(format!("{:.0} fps", fps));
            ui.label(format!(
                "{} points | {} selected",
                session.point_count(),
                session.selection.state().len()
            ));

            match &session.vr.headset {
                HeadsetState::Probing => {
                    ui.label("Looking for a VR headset...");
                }
                HeadsetState::Absent => {
                    ui.horizontal(|ui| {
                        ui.label("VR not available.");
                        ui.hyperlink_to("Learn more", LEARN_MORE_URL);
                    });
                }
                HeadsetState::Present(display) => {
                    if session.vr.presenting {
                        if ui.button("Exit VR").clicked() {
                            actions.push(UiAction::ExitVr);
                        }
                    } else if ui.button(format!("Enter VR ({})", display.name)).clicked() {
                        actions.push(UiAction::EnterVr);
                    }
                }
            }

            for err in [&session.vr.last_error, &session.input_error]
                .into_iter()
                .flatten()
            {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                    ui.hyperlink_to("Learn more", LEARN_MORE_URL);
                });
            }
        });
}

/// Applies UI requests to the session. Failures are logged; the session is
/// left as it was.
pub fn apply_actions(session: &mut SessionContext, actions: &[UiAction]) {
    for action in actions {
        match *action {
            UiAction::SelectAxes(columns) => {
                if let Err(e) = session.draw_dataset(columns) {
                    log::error!("Cannot replot on columns {:?}: {}", columns, e);
                }
            }
            UiAction::EnterVr => {
                if let Err(e) = session.enter_vr() {
                    log::warn!("Cannot enter VR: {}", e);
                }
            }
            UiAction::ExitVr => session.exit_vr(),
        }
    }
}
