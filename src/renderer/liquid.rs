//! Liquid meshes
//!
//! One-way sync from region data: the simulation never reads anything back.

use glam::Vec2;

use super::shapes::{band, circle, quad};
use super::vertex::{Vertex, colors};
use crate::map::TileMap;
use crate::settings::Settings;
use crate::sim::liquid::{LiquidKind, LiquidRegion, Span, surface_offset};
use crate::tuning::LiquidTuning;

/// Rim depth below the resting surface, as a fraction of tile size
const RIM_DEPTH: f32 = 0.25;
/// Foam bubble spacing along a waterfall base (px)
const FOAM_SPACING: f32 = 8.0;

fn body_color(kind: LiquidKind) -> [f32; 3] {
    match kind {
        LiquidKind::Water | LiquidKind::Waterfall => colors::WATER,
        LiquidKind::Lava | LiquidKind::LavaWaterfall => colors::LAVA,
        LiquidKind::Quicksand => colors::QUICKSAND,
        LiquidKind::RadioactiveWater | LiquidKind::RadioactiveWaterfall => colors::RADIOACTIVE,
    }
}

fn rim_color(kind: LiquidKind) -> [f32; 3] {
    match kind {
        LiquidKind::Lava | LiquidKind::LavaWaterfall => colors::LAVA_RIM,
        LiquidKind::RadioactiveWater | LiquidKind::RadioactiveWaterfall => colors::RADIOACTIVE_RIM,
        _ => colors::WATER_RIM,
    }
}

fn with_alpha(rgb: [f32; 3], alpha: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], alpha.clamp(0.0, 1.0)]
}

/// All liquid geometry for the current frame: bodies, then rims, then foam
pub fn liquid_vertices(
    regions: &[LiquidRegion],
    map: &TileMap,
    settings: &Settings,
    tuning: &LiquidTuning,
) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for region in regions {
        vertices.extend(region_body(region, map));
    }
    for region in regions {
        for span in &region.top_spans {
            vertices.extend(surface_rim(region, span, map.tile_size, settings, tuning));
        }
    }
    if settings.quality.waterfall_foam() {
        for region in regions.iter().filter(|r| r.kind.is_waterfall()) {
            for span in &region.bottom_spans {
                vertices.extend(waterfall_foam(region, span, map.tile_size));
            }
        }
    }
    vertices
}

/// One quad per member tile
pub fn region_body(region: &LiquidRegion, map: &TileMap) -> Vec<Vertex> {
    let color = with_alpha(body_color(region.kind), region.current_alpha);
    region
        .tiles
        .iter()
        .flat_map(|&index| quad(&map.cell_rect(index), color))
        .collect()
}

/// Wave-displaced band along a top span
pub fn surface_rim(
    region: &LiquidRegion,
    span: &Span,
    tile_size: f32,
    settings: &Settings,
    tuning: &LiquidTuning,
) -> Vec<Vertex> {
    if span.width <= 0.0 || tile_size <= 0.0 {
        return Vec::new();
    }
    let tiles = (span.width / tile_size).ceil().max(1.0) as usize;
    let segments = tiles * settings.quality.surface_samples_per_tile();
    let scale = settings.surface_motion_scale();
    let depth = span.y + tile_size * RIM_DEPTH;

    let mut upper = Vec::with_capacity(segments + 1);
    let mut lower = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let x = span.x + span.width * (i as f32 / segments as f32);
        let offset = surface_offset(region, span, x, tile_size, tuning) * scale;
        upper.push(Vec2::new(x, span.y + offset));
        lower.push(Vec2::new(x, depth));
    }

    let top = with_alpha(rim_color(region.kind), region.current_alpha + 0.2);
    let bottom = with_alpha(body_color(region.kind), region.current_alpha);
    band(&upper, &lower, top, bottom)
}

/// Pulsing bubbles where a waterfall lands
pub fn waterfall_foam(region: &LiquidRegion, span: &Span, tile_size: f32) -> Vec<Vertex> {
    let count = (span.width / FOAM_SPACING).floor() as usize;
    let base = tile_size * 0.08;
    let t = region.elapsed_ms / 1000.0;
    (0..count)
        .flat_map(|i| {
            let x = span.x + FOAM_SPACING * (i as f32 + 0.5);
            let radius = base * (1.2 + 0.4 * (t * 6.0 + i as f32 * 1.7).sin());
            circle(Vec2::new(x, span.y), radius, colors::FOAM, 6)
        })
        .collect()
}
