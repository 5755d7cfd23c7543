//! Procedural striped skin for the rocket body, rasterized on the CPU and
//! handed to the renderer as a plain RGBA8 image.

use bevy::color::Srgba;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

pub const TEXTURE_SIZE: usize = 512;
pub const STRIPE_START: usize = 40;
pub const STRIPE_PERIOD: usize = 100;
pub const STRIPE_HEIGHT: usize = 15;

const STRIPE_COLOR: Srgba = Srgba::new(1.0, 0.0, 0.0, 1.0);
// An untouched raster paints black, so rejected input degrades to that.
const FALLBACK_COLOR: Srgba = Srgba::new(0.0, 0.0, 0.0, 1.0);

/// Parse a user-supplied color string. Anything `Srgba::hex` rejects is
/// absorbed silently and paints as opaque black.
pub fn parse_body_color(value: &str) -> Srgba {
    Srgba::hex(value.trim()).unwrap_or(FALLBACK_COLOR)
}

/// True when `row` falls inside one of the red bands.
pub fn stripe_covers_row(row: usize) -> bool {
    row >= STRIPE_START && (row - STRIPE_START) % STRIPE_PERIOD < STRIPE_HEIGHT
}

/// Full raster for the body skin: base fill plus horizontal red stripes of
/// fixed height on a fixed period. Deterministic: equal color, equal bytes.
pub fn striped_pixel_data(color: Srgba) -> Vec<u8> {
    let base = srgba_bytes(color);
    let stripe = srgba_bytes(STRIPE_COLOR);
    let mut data = Vec::with_capacity(TEXTURE_SIZE * TEXTURE_SIZE * 4);
    for row in 0..TEXTURE_SIZE {
        let texel = if stripe_covers_row(row) { stripe } else { base };
        for _ in 0..TEXTURE_SIZE {
            data.extend_from_slice(&texel);
        }
    }
    data
}

pub fn striped_texture(color: Srgba) -> Image {
    Image::new(
        Extent3d {
            width: TEXTURE_SIZE as u32,
            height: TEXTURE_SIZE as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        striped_pixel_data(color),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

fn srgba_bytes(color: Srgba) -> [u8; 4] {
    [
        (color.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}
