use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::scene::{BodyPreset, ResetSceneEvent, SceneSettings, DEFAULT_BODY_COLOR};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin).add_systems(Update, ui_system);
    }
}

pub fn preset_name(preset: BodyPreset) -> &'static str {
    match preset {
        BodyPreset::Gray => "Gray",
        BodyPreset::White => "White",
        BodyPreset::Custom => "Custom",
    }
}

/// Color a preset pins the hull to. `Custom` pins nothing; it only reveals
/// the free-form field.
pub fn preset_color(preset: BodyPreset) -> Option<&'static str> {
    match preset {
        BodyPreset::Gray => Some(DEFAULT_BODY_COLOR),
        BodyPreset::White => Some("#ffffff"),
        BodyPreset::Custom => None,
    }
}

pub fn rotation_label(rotating: bool) -> &'static str {
    if rotating {
        "Stop Rotation"
    } else {
        "Start Rotation"
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    mut settings: ResMut<SceneSettings>,
    mut ev_reset: EventWriter<ResetSceneEvent>,
    diagnostics: Res<DiagnosticsStore>,
) {
    // Always visible, even with the panel collapsed.
    egui::Window::new("menu-toggle")
        .title_bar(false)
        .resizable(false)
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .show(contexts.ctx_mut(), |ui| {
            if ui.button("Menu").clicked() {
                settings.menu_visible = !settings.menu_visible;
            }
        });

    if settings.menu_visible {
        egui::Window::new("Rocket Controls").show(contexts.ctx_mut(), |ui| {
            egui::ComboBox::from_label("Body Color")
                .selected_text(preset_name(settings.preset))
                .show_ui(ui, |ui| {
                    for preset in [BodyPreset::Gray, BodyPreset::White, BodyPreset::Custom] {
                        if ui
                            .selectable_value(&mut settings.preset, preset, preset_name(preset))
                            .changed()
                        {
                            if let Some(color) = preset_color(preset) {
                                settings.requested_color = color.to_owned();
                            }
                        }
                    }
                });

            if settings.preset == BodyPreset::Custom {
                ui.label("Custom color (hex)");
                if ui.text_edit_singleline(&mut settings.custom_color).changed() {
                    settings.requested_color = settings.custom_color.clone();
                }
            }

            ui.separator();

            if ui.button(rotation_label(settings.rotating)).clicked() {
                settings.rotating = !settings.rotating;
            }
            ui.add(egui::Slider::new(&mut settings.glow_opacity, 0.0..=1.0).text("Glow Intensity"));

            ui.separator();

            ui.checkbox(&mut settings.show_diagnostics, "Diagnostics");
            if ui.button("Reset Scene").clicked() {
                ev_reset.send(ResetSceneEvent);
            }
        });
    }

    if settings.show_diagnostics {
        egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
            if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
                if let Some(value) = fps.smoothed() {
                    ui.label(format!("FPS: {:.1}", value));
                }
            }
            if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT)
            {
                if let Some(value) = entity_count.value() {
                    ui.label(format!("Entities: {}", value));
                }
            }
        });
    }
}
