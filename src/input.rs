use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContext;

use crate::scene::{ResetSceneEvent, SceneSettings};

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (rotation_toggle, menu_toggle, diagnostics_toggle, reset_trigger)
                .run_if(keyboard_free),
        );
    }
}

/// True while no egui widget holds keyboard focus. Characters typed into the
/// custom color field must never double as shortcuts.
fn keyboard_free(egui: Query<&EguiContext, With<PrimaryWindow>>) -> bool {
    egui.iter().all(|ctx| !ctx.get().wants_keyboard_input())
}

fn rotation_toggle(mut settings: ResMut<SceneSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Space) {
        settings.rotating = !settings.rotating;
    }
}

fn menu_toggle(mut settings: ResMut<SceneSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyM) {
        settings.menu_visible = !settings.menu_visible;
    }
}

fn diagnostics_toggle(mut settings: ResMut<SceneSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        settings.show_diagnostics = !settings.show_diagnostics;
    }
}

fn reset_trigger(mut ev_reset: EventWriter<ResetSceneEvent>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        ev_reset.send(ResetSceneEvent);
    }
}

#[cfg(test)]
mod tests {
    use bevy_egui::egui;

    use super::*;
    use crate::scene::{BodyPreset, ScenePlugin, DEFAULT_BODY_COLOR};

    fn input_app() -> App {
        let mut app = App::new();
        app.init_resource::<SceneSettings>()
            .init_resource::<ButtonInput<KeyCode>>()
            .add_event::<ResetSceneEvent>()
            .add_plugins(InputPlugin);
        app
    }

    // Gives a headless egui context keyboard focus, as a focused text field would.
    fn start_text_entry(app: &mut App) -> egui::Id {
        let field = egui::Id::new("color-field");
        app.world_mut()
            .spawn((EguiContext::default(), PrimaryWindow));
        let mut contexts = app.world_mut().query::<&EguiContext>();
        contexts
            .single(app.world())
            .get()
            .memory_mut(|memory| memory.request_focus(field));
        field
    }

    fn end_text_entry(app: &mut App, field: egui::Id) {
        let mut contexts = app.world_mut().query::<&EguiContext>();
        contexts
            .single(app.world())
            .get()
            .memory_mut(|memory| memory.surrender_focus(field));
    }

    // Press, run a frame, then wipe the key so the next tap registers fresh.
    fn tap(app: &mut App, key: KeyCode) {
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(key);
        app.update();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .reset(key);
    }

    #[test]
    fn space_toggles_rotation() {
        let mut app = input_app();
        assert!(app.world().resource::<SceneSettings>().rotating);

        tap(&mut app, KeyCode::Space);
        assert!(!app.world().resource::<SceneSettings>().rotating);

        tap(&mut app, KeyCode::Space);
        assert!(app.world().resource::<SceneSettings>().rotating);
    }

    #[test]
    fn m_toggles_menu_panel() {
        let mut app = input_app();
        tap(&mut app, KeyCode::KeyM);
        assert!(!app.world().resource::<SceneSettings>().menu_visible);
        tap(&mut app, KeyCode::KeyM);
        assert!(app.world().resource::<SceneSettings>().menu_visible);
    }

    #[test]
    fn f3_toggles_diagnostics() {
        let mut app = input_app();
        tap(&mut app, KeyCode::F3);
        assert!(app.world().resource::<SceneSettings>().show_diagnostics);
    }

    #[test]
    fn r_fires_reset_event() {
        let mut app = input_app();
        tap(&mut app, KeyCode::KeyR);
        assert_eq!(app.world().resource::<Events<ResetSceneEvent>>().len(), 1);
    }

    #[test]
    fn held_key_fires_once() {
        let mut app = input_app();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Space);
        app.update();
        assert!(!app.world().resource::<SceneSettings>().rotating);

        // Still held on the next frame; only the edge should toggle.
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .clear_just_pressed(KeyCode::Space);
        app.update();
        assert!(!app.world().resource::<SceneSettings>().rotating);
    }

    #[test]
    fn text_entry_pauses_shortcuts() {
        let mut app = input_app();
        let field = start_text_entry(&mut app);

        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.press(KeyCode::Space);
            keys.press(KeyCode::KeyM);
            keys.press(KeyCode::F3);
            keys.press(KeyCode::KeyR);
        }
        app.update();

        let settings = app.world().resource::<SceneSettings>();
        assert!(settings.rotating, "typed space must stay in the field");
        assert!(settings.menu_visible, "typed m must stay in the field");
        assert!(!settings.show_diagnostics);
        assert_eq!(app.world().resource::<Events<ResetSceneEvent>>().len(), 0);

        // Focus released; the still-held edges now register as shortcuts.
        end_text_entry(&mut app, field);
        app.update();

        let settings = app.world().resource::<SceneSettings>();
        assert!(!settings.rotating);
        assert!(!settings.menu_visible);
        assert!(settings.show_diagnostics);
        assert_eq!(app.world().resource::<Events<ResetSceneEvent>>().len(), 1);
    }

    #[test]
    fn typed_reset_key_leaves_color_edit_alone() {
        let mut app = App::new();
        app.insert_resource(Assets::<Mesh>::default())
            .insert_resource(Assets::<StandardMaterial>::default())
            .insert_resource(Assets::<Image>::default())
            .init_resource::<ButtonInput<KeyCode>>()
            .add_plugins((ScenePlugin, InputPlugin));
        app.update();

        let field = start_text_entry(&mut app);
        {
            let mut settings = app.world_mut().resource_mut::<SceneSettings>();
            settings.preset = BodyPreset::Custom;
            settings.custom_color = "#ab12".into();
        }

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyR);
        app.update();

        let settings = app.world().resource::<SceneSettings>();
        assert_eq!(
            settings.preset,
            BodyPreset::Custom,
            "edit in progress, the preset must hold"
        );
        assert_eq!(settings.custom_color, "#ab12");

        // The same held key resets once the field lets the keyboard go.
        end_text_entry(&mut app, field);
        app.update();
        app.update();

        let settings = app.world().resource::<SceneSettings>();
        assert_eq!(settings.preset, BodyPreset::Gray);
        assert_eq!(settings.custom_color, DEFAULT_BODY_COLOR);
    }
}
