mod input;
mod scene;
mod texture;
mod ui;

use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use input::InputPlugin;
use scene::ScenePlugin;
use ui::UiPlugin;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::WHITE))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "launchpad-rs — rocket showcase".into(),
                resolution: (1280., 800.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((ScenePlugin, UiPlugin, InputPlugin))
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera3dBundle {
            projection: PerspectiveProjection {
                fov: 75.0_f32.to_radians(),
                near: 0.1,
                far: 1000.0,
                ..default()
            }
            .into(),
            transform: Transform::from_xyz(0.0, 0.0, 10.0),
            ..default()
        },
        MainCamera,
    ));
}

#[derive(Component)]
pub struct MainCamera;
