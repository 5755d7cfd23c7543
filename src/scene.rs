//! Scene graph, animation, and reset handling for the rocket vignette.
//!
//! Everything visible hangs off a single [`SceneRoot`] entity so a reset can
//! tear the whole scene down with one recursive despawn and rebuild it from
//! the current settings.

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::texture::{parse_body_color, striped_texture};

pub const ROTATION_STEP: f32 = 0.01;
pub const FLICKER_STEP: f32 = 0.05;
pub const BOB_STEP: f32 = 0.01;
pub const SCROLL_STEP: f32 = 0.05;
pub const STARFIELD_DEPTH: f32 = -100.0;
pub const STAR_COUNT: usize = 1000;
pub const FLAME_REST_Y: f32 = -3.5;

pub const DEFAULT_BODY_COLOR: &str = "#808080";

const AMBIENT_BRIGHTNESS: f32 = 400.0;
const DIRECTIONAL_LUX: f32 = 8_000.0;
const ENGINE_LIGHT_LUMENS: f32 = 600_000.0;

pub struct ScenePlugin;
impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneSettings>()
            .init_resource::<ScenePulse>()
            .init_resource::<AppliedBodyColor>()
            .insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: AMBIENT_BRIGHTNESS,
            })
            .add_event::<ResetSceneEvent>()
            .add_systems(Startup, spawn_scene)
            .add_systems(
                Update,
                (
                    rotate_body,
                    flicker_flame,
                    scroll_starfield,
                    bob_rocket,
                    apply_body_color,
                    apply_glow_opacity,
                    handle_reset,
                )
                    .chain(),
            );
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BodyPreset {
    #[default]
    Gray,
    White,
    Custom,
}

#[derive(Resource, Clone)]
pub struct SceneSettings {
    pub rotating: bool,
    pub preset: BodyPreset,
    /// Free-form text the user edits while `preset` is `Custom`.
    pub custom_color: String,
    /// Color the body skin should show. Presets and the custom field both
    /// write here; the scene repaints when it drifts from what is applied.
    pub requested_color: String,
    pub glow_opacity: f32,
    pub menu_visible: bool,
    pub show_diagnostics: bool,
}
impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            rotating: true,
            preset: BodyPreset::default(),
            custom_color: DEFAULT_BODY_COLOR.to_owned(),
            requested_color: DEFAULT_BODY_COLOR.to_owned(),
            glow_opacity: 1.0,
            menu_visible: true,
            show_diagnostics: false,
        }
    }
}

/// Phase accumulators for the per-frame sine animations. Advanced by a fixed
/// step each frame rather than by wall-clock time, so stepping the app N
/// times always lands on the same pose.
#[derive(Resource, Clone, Copy, Default)]
pub struct ScenePulse {
    pub flicker_time: f32,
    pub bob_time: f32,
}

/// Last color actually baked into the body texture.
#[derive(Resource, Default)]
pub struct AppliedBodyColor(pub String);

#[derive(Event, Default)]
pub struct ResetSceneEvent;

#[derive(Component)]
pub struct SceneRoot;

#[derive(Component)]
pub struct RocketBody;

#[derive(Component)]
pub struct Flame;

#[derive(Component)]
pub struct GlowRing;

#[derive(Component)]
pub struct PadShadow;

#[derive(Component)]
pub struct Starfield;

#[derive(Component)]
pub struct EngineLight;

pub fn flame_scale(flicker_time: f32) -> f32 {
    1.0 + flicker_time.sin() * 0.1
}

pub fn engine_flicker(flicker_time: f32) -> f32 {
    1.0 + (flicker_time * 2.0).sin() * 0.3
}

pub fn bob_offset(bob_time: f32) -> f32 {
    bob_time.sin() * 0.1
}

pub fn shadow_fade(bob_time: f32) -> f32 {
    0.2 + bob_time.cos() * 0.1
}

/// One scroll step toward the camera, snapping back to the far plane the
/// moment the field would pass it.
pub fn advance_scroll(z: f32) -> f32 {
    let z = z + SCROLL_STEP;
    if z > 0.0 {
        STARFIELD_DEPTH
    } else {
        z
    }
}

fn starfield_mesh(rng: &mut impl Rng) -> Mesh {
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(STAR_COUNT);
    for _ in 0..STAR_COUNT {
        positions.push([
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
            rng.gen_range(STARFIELD_DEPTH..0.0),
        ]);
    }
    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
}

fn spawn_scene_inner(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    images: &mut Assets<Image>,
    settings: &SceneSettings,
    applied: &mut AppliedBodyColor,
) {
    let body_color = parse_body_color(&settings.requested_color);
    let body_texture = images.add(striped_texture(body_color));
    applied.0 = settings.requested_color.clone();

    let mut rng = rand::thread_rng();

    commands
        .spawn((SpatialBundle::default(), SceneRoot))
        .with_children(|parent| {
            // Rotation and bobbing move only the hull; everything else is a
            // sibling so the pad stays put under a spinning rocket.
            parent.spawn((
                PbrBundle {
                    mesh: meshes.add(Cylinder::new(1.0, 5.0).mesh().resolution(64)),
                    material: materials.add(StandardMaterial {
                        base_color_texture: Some(body_texture),
                        metallic: 0.8,
                        perceptual_roughness: 0.5,
                        ..default()
                    }),
                    ..default()
                },
                RocketBody,
            ));

            parent.spawn(PbrBundle {
                mesh: meshes.add(Cylinder::new(1.2, 0.5).mesh().resolution(32)),
                material: materials.add(StandardMaterial {
                    base_color: Color::srgb_u8(34, 34, 34),
                    ..default()
                }),
                transform: Transform::from_xyz(0.0, -2.75, 0.0),
                ..default()
            });

            // Painted-on contact shadow, faded in sync with the bob.
            parent.spawn((
                PbrBundle {
                    mesh: meshes.add(Circle::new(1.5).mesh().resolution(32)),
                    material: materials.add(StandardMaterial {
                        base_color: Color::BLACK.with_alpha(0.3),
                        unlit: true,
                        alpha_mode: AlphaMode::Blend,
                        ..default()
                    }),
                    transform: Transform::from_xyz(0.0, -3.0, 0.0)
                        .with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
                    ..default()
                },
                PadShadow,
                NotShadowCaster,
            ));

            // Cone flipped apex-down so the plume points at the pad.
            parent.spawn((
                PbrBundle {
                    mesh: meshes.add(
                        Cone {
                            radius: 0.5,
                            height: 1.5,
                        }
                        .mesh()
                        .resolution(32),
                    ),
                    material: materials.add(StandardMaterial {
                        base_color: Color::srgb_u8(255, 102, 0).with_alpha(0.7),
                        unlit: true,
                        alpha_mode: AlphaMode::Blend,
                        ..default()
                    }),
                    transform: Transform::from_xyz(0.0, FLAME_REST_Y, 0.0)
                        .with_rotation(Quat::from_rotation_x(PI)),
                    ..default()
                },
                Flame,
                NotShadowCaster,
            ));

            parent.spawn((
                PbrBundle {
                    mesh: meshes.add(Annulus::new(1.2, 1.4).mesh().resolution(32)),
                    material: materials.add(StandardMaterial {
                        base_color: Color::srgb_u8(255, 0, 0).with_alpha(settings.glow_opacity),
                        unlit: true,
                        alpha_mode: AlphaMode::Blend,
                        double_sided: true,
                        cull_mode: None,
                        ..default()
                    }),
                    transform: Transform::from_xyz(0.0, -2.5, 0.0)
                        .with_rotation(Quat::from_rotation_x(FRAC_PI_2)),
                    ..default()
                },
                GlowRing,
                NotShadowCaster,
            ));

            // Starts at z = 0 so the very first scroll step wraps it to the
            // far plane, same as never initializing it at all.
            parent.spawn((
                PbrBundle {
                    mesh: meshes.add(starfield_mesh(&mut rng)),
                    material: materials.add(StandardMaterial {
                        base_color: Color::WHITE,
                        unlit: true,
                        ..default()
                    }),
                    ..default()
                },
                Starfield,
                NotShadowCaster,
            ));

            parent.spawn(DirectionalLightBundle {
                directional_light: DirectionalLight {
                    illuminance: DIRECTIONAL_LUX,
                    shadows_enabled: true,
                    ..default()
                },
                transform: Transform::from_xyz(5.0, 10.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
                ..default()
            });

            parent.spawn((
                PointLightBundle {
                    point_light: PointLight {
                        color: Color::srgb_u8(255, 51, 0),
                        intensity: ENGINE_LIGHT_LUMENS,
                        range: 10.0,
                        ..default()
                    },
                    transform: Transform::from_xyz(0.0, FLAME_REST_Y, 0.0),
                    ..default()
                },
                EngineLight,
            ));
        });

    info!("scene spawned: body color {}", settings.requested_color);
}

fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    settings: Res<SceneSettings>,
    mut applied: ResMut<AppliedBodyColor>,
) {
    spawn_scene_inner(
        &mut commands,
        meshes.as_mut(),
        materials.as_mut(),
        images.as_mut(),
        &settings,
        applied.as_mut(),
    );
}

fn rotate_body(settings: Res<SceneSettings>, mut body_q: Query<&mut Transform, With<RocketBody>>) {
    if !settings.rotating {
        return;
    }
    if let Ok(mut transform) = body_q.get_single_mut() {
        transform.rotate_y(ROTATION_STEP);
    }
}

fn flicker_flame(
    mut pulse: ResMut<ScenePulse>,
    mut flame_q: Query<&mut Transform, With<Flame>>,
    mut light_q: Query<&mut PointLight, With<EngineLight>>,
) {
    pulse.flicker_time += FLICKER_STEP;

    if let Ok(mut transform) = flame_q.get_single_mut() {
        transform.scale = Vec3::splat(flame_scale(pulse.flicker_time));
    }
    if let Ok(mut light) = light_q.get_single_mut() {
        light.intensity = ENGINE_LIGHT_LUMENS * engine_flicker(pulse.flicker_time);
    }
}

fn scroll_starfield(mut star_q: Query<&mut Transform, With<Starfield>>) {
    if let Ok(mut transform) = star_q.get_single_mut() {
        transform.translation.z = advance_scroll(transform.translation.z);
    }
}

fn bob_rocket(
    mut pulse: ResMut<ScenePulse>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut body_q: Query<&mut Transform, With<RocketBody>>,
    mut flame_q: Query<&mut Transform, (With<Flame>, Without<RocketBody>)>,
    shadow_q: Query<&Handle<StandardMaterial>, With<PadShadow>>,
) {
    pulse.bob_time += BOB_STEP;
    let offset = bob_offset(pulse.bob_time);

    if let Ok(mut transform) = body_q.get_single_mut() {
        transform.translation.y = offset;
    }
    // The flame is not parented to the hull; it tracks the bob explicitly so
    // the flicker scale stays centered on its own origin.
    if let Ok(mut transform) = flame_q.get_single_mut() {
        transform.translation.y = FLAME_REST_Y + offset;
    }
    if let Ok(handle) = shadow_q.get_single() {
        if let Some(material) = materials.get_mut(handle) {
            material.base_color.set_alpha(shadow_fade(pulse.bob_time));
        }
    }
}

fn apply_body_color(
    settings: Res<SceneSettings>,
    mut applied: ResMut<AppliedBodyColor>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    body_q: Query<&Handle<StandardMaterial>, With<RocketBody>>,
) {
    if settings.requested_color == applied.0 {
        return;
    }
    let Ok(handle) = body_q.get_single() else {
        return;
    };
    let Some(material) = materials.get_mut(handle) else {
        return;
    };

    // Full rebake on every change; dropping the old handle frees the old
    // texture once the renderer lets go of it.
    let color = parse_body_color(&settings.requested_color);
    material.base_color_texture = Some(images.add(striped_texture(color)));
    applied.0 = settings.requested_color.clone();
}

fn apply_glow_opacity(
    settings: Res<SceneSettings>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    glow_q: Query<&Handle<StandardMaterial>, With<GlowRing>>,
) {
    if !settings.is_changed() {
        return;
    }
    let Ok(handle) = glow_q.get_single() else {
        return;
    };
    if let Some(material) = materials.get_mut(handle) {
        // Deliberately unclamped: values above 1.0 pass through untouched.
        material.base_color.set_alpha(settings.glow_opacity);
    }
}

fn handle_reset(
    mut commands: Commands,
    mut ev_reset: EventReader<ResetSceneEvent>,
    root_q: Query<Entity, With<SceneRoot>>,
    mut settings: ResMut<SceneSettings>,
    mut pulse: ResMut<ScenePulse>,
    mut applied: ResMut<AppliedBodyColor>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    if ev_reset.is_empty() {
        return;
    }
    ev_reset.clear();

    for entity in &root_q {
        commands.entity(entity).despawn_recursive();
    }

    // Panel visibility is a UI preference, not scene state; it survives.
    let menu_visible = settings.menu_visible;
    let show_diagnostics = settings.show_diagnostics;
    *settings = SceneSettings::default();
    settings.menu_visible = menu_visible;
    settings.show_diagnostics = show_diagnostics;
    *pulse = ScenePulse::default();

    spawn_scene_inner(
        &mut commands,
        meshes.as_mut(),
        materials.as_mut(),
        images.as_mut(),
        &*settings,
        applied.as_mut(),
    );
}
