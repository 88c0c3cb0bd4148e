//! Outward events
//!
//! The simulation never mutates state owned by the host store. It reports
//! what should happen and the host applies it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::liquid::LiquidKind;
use crate::map::Layer;

/// Who takes damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageTarget {
    Player,
    Entity(u32),
    /// Object layer cell
    Object(usize),
}

/// What dealt the damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    Projectile(u32),
    /// Hazard object cell
    Hazard(usize),
}

/// Sounds the host may play (best effort)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    DoorOpen,
    PushWall,
    Teleport,
    Splash,
    Ricochet,
}

/// Events produced by one tick, in emission order
pub type Events = Vec<SimEvent>;

/// A mutation intent or effect request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    Damage {
        target: DamageTarget,
        amount: f32,
        source: DamageSource,
    },
    /// Impulse to add to the player's velocity (px/s)
    Knockback { velocity: Vec2 },
    TileEdit {
        layer: Layer,
        index: usize,
        item: Option<String>,
    },
    MapSwitch {
        target_map: String,
        trigger_id: Option<String>,
    },
    SpawnBreakEffect { x: f32, y: f32, item_id: String },
    SpawnSplash {
        kind: LiquidKind,
        x: f32,
        y: f32,
        strength: f32,
    },
    ProjectileImpact { projectile_id: u32, x: f32, y: f32 },
    /// A floating box touched an entity
    BoxContact { projectile_id: u32, entity_id: u32 },
    RescueBoxCollected { projectile_id: u32 },
    WeatherChanged { weather: String },
    ShowMessage { text: String },
    PlaySound { sound: Sound },
    Teleport { x: f32, y: f32 },
    LevelComplete,
}
