//! Data-driven simulation constants
//!
//! Every group defaults to the shipped values, so a tuning file only needs the
//! fields it overrides.

use serde::{Deserialize, Serialize};

use crate::sim::liquid::LiquidKind;

/// Projectile and floating-box constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Largest displacement per sub-step (px)
    pub max_step_px: f32,
    /// Sub-step cap per tick
    pub max_substeps: u32,
    /// Life removed per ricochet (ms)
    pub bounce_life_penalty_ms: f32,
    /// Distance past the world edge before removal (px)
    pub world_margin: f32,
    /// Nudge applied when escaping a corner (px)
    pub corner_nudge: f32,
    /// Gap left between a ricocheting projectile and the struck face (px)
    pub contact_epsilon: f32,
    /// Floating box: time spent bobbing before sinking (ms)
    pub float_duration_ms: f32,
    /// Floating box: bob angular speed (rad/ms)
    pub float_drift_speed: f32,
    /// Floating box: bob amplitude (px)
    pub float_drift_amplitude: f32,
    /// Floating box: horizontal velocity retained per second while floating
    pub float_friction: f32,
    /// Floating box: sink speed (px/s)
    pub sink_speed: f32,
    /// Splash strength when a box lands in water
    pub box_splash_strength: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            max_step_px: 4.0,
            max_substeps: 20,
            bounce_life_penalty_ms: 80.0,
            world_margin: 64.0,
            corner_nudge: 0.5,
            contact_epsilon: 0.01,
            float_duration_ms: 4000.0,
            float_drift_speed: 0.003,
            float_drift_amplitude: 3.0,
            float_friction: 0.2,
            sink_speed: 40.0,
            box_splash_strength: 1.2,
        }
    }
}

/// Liquid surface animation constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidTuning {
    /// Alpha smoothing rate (per ms)
    pub alpha_rate: f32,
    /// Amplitude decay time constant for water-like liquids (ms)
    pub tau_water_ms: f32,
    /// Amplitude decay time constant for lava-like liquids (ms)
    pub tau_lava_ms: f32,
    /// Wave amplitude at strength 1, as a fraction of tile size
    pub water_amplitude: f32,
    pub lava_amplitude: f32,
    /// Ripple expansion speed at strength 1 (px/s)
    pub water_wave_speed: f32,
    pub lava_wave_speed: f32,
    /// Starting ripple radius as a fraction of tile size
    pub start_radius: f32,
    /// Largest surface displacement as a fraction of tile size
    pub max_displacement: f32,
    /// Idle undulation amplitude as a fraction of tile size
    pub undulation: f32,
    /// Vertical texture drift of waterfalls (px/s)
    pub waterfall_drift: f32,
    pub lava_waterfall_drift: f32,
    /// Give lava regions top spans so they can ripple
    pub lava_surface_waves: bool,
}

impl Default for LiquidTuning {
    fn default() -> Self {
        Self {
            alpha_rate: 0.005,
            tau_water_ms: 1400.0,
            tau_lava_ms: 900.0,
            water_amplitude: 0.18,
            lava_amplitude: 0.10,
            water_wave_speed: 90.0,
            lava_wave_speed: 45.0,
            start_radius: 0.5,
            max_displacement: 0.22,
            undulation: 0.03,
            waterfall_drift: 180.0,
            lava_waterfall_drift: 70.0,
            lava_surface_waves: false,
        }
    }
}

impl LiquidTuning {
    /// Amplitude decay time constant for a liquid kind
    pub fn tau_ms(&self, kind: LiquidKind) -> f32 {
        if kind.is_lava_like() {
            self.tau_lava_ms
        } else {
            self.tau_water_ms
        }
    }
}

/// Hazard contact constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Touch margin used when a hazard does not set its own (px)
    pub default_margin: f32,
    /// Hit flash duration cap (ms)
    pub hit_flash_ms: f32,
    /// Knockback impulse for one-shot hazards (px/s)
    pub knockback: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            default_margin: 4.0,
            hit_flash_ms: 300.0,
            knockback: 260.0,
        }
    }
}

/// Interactable timing constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTuning {
    /// Delay between opening a door and switching maps (ms)
    pub door_delay_ms: f64,
    /// Minimum time between push-wall shifts (ms)
    pub push_debounce_ms: f64,
    /// Minimum time between same-map teleports (ms)
    pub teleport_cooldown_ms: f64,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            door_delay_ms: 600.0,
            push_debounce_ms: 400.0,
            teleport_cooldown_ms: 800.0,
        }
    }
}

/// Weather emitter constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherTuning {
    /// Rain drops spawned per second across the viewport
    pub rain_rate: f32,
    /// Rain fall speed (px/s)
    pub rain_speed: f32,
    /// Snow flakes spawned per second
    pub snow_rate: f32,
    /// Snow fall speed (px/s)
    pub snow_speed: f32,
    /// Wave strength of a rain drop hitting water
    pub rain_splash_strength: f32,
}

impl Default for WeatherTuning {
    fn default() -> Self {
        Self {
            rain_rate: 120.0,
            rain_speed: 520.0,
            snow_rate: 40.0,
            snow_speed: 60.0,
            rain_splash_strength: 0.2,
        }
    }
}

/// All tuning groups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub projectile: ProjectileTuning,
    pub liquid: LiquidTuning,
    pub hazard: HazardTuning,
    pub interaction: InteractionTuning,
    pub weather: WeatherTuning,
}

impl Tuning {
    /// Parse a tuning document, falling back to defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
