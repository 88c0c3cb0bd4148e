//! Tidepool - tile platformer simulation core
//!
//! Core modules:
//! - `map`: Tile layers, item registry and map loading
//! - `sim`: Simulation (projectiles, hazards, interactables, liquids, weather)
//! - `renderer`: Vertex meshes synced from liquid simulation state
//! - `settings`: Player-facing quality preferences
//! - `tuning`: Data-driven simulation constants
//! - `demo`: Built-in demo level

pub mod demo;
pub mod map;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use map::{ItemHandle, MapError, Registry, TileMap};
pub use settings::{QualityPreset, Settings};
pub use sim::{SimEvent, SimulationContext, TickInput, tick};
pub use tuning::Tuning;

/// Engine configuration constants
pub mod consts {
    /// Default tile edge length in pixels
    pub const DEFAULT_TILE_SIZE: f32 = 32.0;
    /// Longest frame the simulation accepts (ms); larger deltas are clamped
    pub const MAX_FRAME_MS: f32 = 250.0;

    /// Entity id reserved for the player
    pub const PLAYER_ID: u32 = 0;
    /// Default player hitbox
    pub const PLAYER_WIDTH: f32 = 20.0;
    pub const PLAYER_HEIGHT: f32 = 28.0;

    /// Maximum waves stored per liquid region
    pub const MAX_WAVES_PER_REGION: usize = 24;
    /// Wave strength clamp
    pub const MIN_WAVE_STRENGTH: f32 = 0.15;
    pub const MAX_WAVE_STRENGTH: f32 = 3.0;
}

/// Grid cell containing a pixel coordinate (may be negative)
#[inline]
pub fn cell_of(px: f32, tile_size: f32) -> i64 {
    if tile_size <= 0.0 {
        return 0;
    }
    (px / tile_size).floor() as i64
}

/// Frame-rate independent smoothing factor: `1 - exp(-rate * dt)`
#[inline]
pub fn smoothing(rate: f32, dt: f32) -> f32 {
    (1.0 - (-rate * dt.max(0.0)).exp()).clamp(0.0, 1.0)
}
