//! Per-tick liquid animation: opacity, texture drift and surface ripples

use glam::Vec2;

use super::{LiquidKind, LiquidRegion, Span, Wave};
use crate::consts::{MAX_WAVE_STRENGTH, MAX_WAVES_PER_REGION, MIN_WAVE_STRENGTH};
use crate::smoothing;
use crate::tuning::LiquidTuning;

/// Texture period the drift offset wraps at (px)
const DRIFT_PERIOD: f32 = 256.0;

/// Opacity a region fades toward
pub fn target_alpha(kind: LiquidKind, player_submerged: bool) -> f32 {
    let (normal, submerged) = match kind {
        LiquidKind::Water => (0.78, 0.5),
        LiquidKind::RadioactiveWater => (0.82, 0.55),
        LiquidKind::Lava => (0.95, 0.85),
        LiquidKind::Quicksand => (1.0, 0.92),
        LiquidKind::Waterfall => (0.7, 0.5),
        LiquidKind::RadioactiveWaterfall => (0.75, 0.55),
        LiquidKind::LavaWaterfall => (0.92, 0.85),
    };
    if player_submerged { submerged } else { normal }
}

/// Texture scroll velocity (px/s)
pub fn drift_velocity(kind: LiquidKind, tuning: &LiquidTuning) -> Vec2 {
    match kind {
        LiquidKind::Waterfall | LiquidKind::RadioactiveWaterfall => {
            Vec2::new(0.0, tuning.waterfall_drift)
        }
        LiquidKind::LavaWaterfall => Vec2::new(0.0, tuning.lava_waterfall_drift),
        _ => Vec2::ZERO,
    }
}

/// Advance every region by `dt_ms`
pub fn update<F>(regions: &mut [LiquidRegion], dt_ms: f32, is_player_in_region: F, tuning: &LiquidTuning)
where
    F: Fn(&LiquidRegion) -> bool,
{
    let dt = dt_ms.max(0.0);
    for region in regions.iter_mut() {
        let target = target_alpha(region.kind, is_player_in_region(region));
        region.current_alpha += (target - region.current_alpha) * smoothing(tuning.alpha_rate, dt);

        region.elapsed_ms += dt;
        let drift = region.drift + drift_velocity(region.kind, tuning) * (dt / 1000.0);
        region.drift = Vec2::new(drift.x.rem_euclid(DRIFT_PERIOD), drift.y.rem_euclid(DRIFT_PERIOD));

        if !region.waves.is_empty() {
            let tau = tuning.tau_ms(region.kind);
            region.waves.retain_mut(|wave| wave.advance(dt, tau));
        }
    }
}

/// Start a ripple on the `kind` region whose surface spans `world_x`
///
/// Returns false when no such surface exists.
pub fn add_wave(
    regions: &mut [LiquidRegion],
    kind: LiquidKind,
    world_x: f32,
    strength: f32,
    tile_size: f32,
    tuning: &LiquidTuning,
) -> bool {
    let Some(region) = regions
        .iter_mut()
        .find(|r| r.kind == kind && r.top_span_at(world_x).is_some())
    else {
        return false;
    };

    let strength = if strength.is_finite() {
        strength.clamp(MIN_WAVE_STRENGTH, MAX_WAVE_STRENGTH)
    } else {
        MIN_WAVE_STRENGTH
    };
    let (amplitude_base, speed_base) = if kind.is_lava_like() {
        (tuning.lava_amplitude, tuning.lava_wave_speed)
    } else {
        (tuning.water_amplitude, tuning.water_wave_speed)
    };
    let amplitude = (amplitude_base * tile_size * strength).max(0.0);
    let start_radius = tuning.start_radius * tile_size;

    if region.waves.len() >= MAX_WAVES_PER_REGION {
        region.waves.remove(0);
    }
    region.waves.push(Wave {
        center_x: world_x,
        age_ms: 0.0,
        amplitude,
        amplitude_now: amplitude,
        speed: speed_base * (0.6 + 0.4 * strength),
        radius: start_radius,
        start_radius,
        // Long enough for the amplitude to fall under 1%
        life_ms: tuning.tau_ms(kind) * (5.0 + 0.5 * strength),
    });
    true
}

/// Vertical displacement of a surface span at `x` (negative is up)
pub fn surface_offset(
    region: &LiquidRegion,
    span: &Span,
    x: f32,
    tile_size: f32,
    tuning: &LiquidTuning,
) -> f32 {
    let limit = tuning.max_displacement * tile_size;
    let t = region.elapsed_ms;
    let mut offset = (x * 0.045 + t * 0.0025).sin() * tuning.undulation * tile_size
        + (x * 0.11 - t * 0.004).sin() * tuning.undulation * tile_size * 0.5;

    let reach = span.half_width() * 0.6;
    for wave in &region.waves {
        let dx = x - wave.center_x;
        if dx.abs() > wave.radius + reach {
            continue;
        }
        let sigma = (wave.radius * 0.6).max(8.0);
        offset -= wave.amplitude_now * (-(dx * dx) / (2.0 * sigma * sigma)).exp();
    }
    offset.clamp(-limit, limit)
}
