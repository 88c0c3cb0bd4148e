//! Item registry
//!
//! Definitions are loaded once, stored in an arena and addressed by
//! [`ItemHandle`]. String ids are only used at load time and in outward events.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::MapError;
use crate::sim::collision::Side;
use crate::sim::liquid::LiquidKind;

/// Index of an item definition in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemHandle(pub u32);

/// What an item is, as far as the simulation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    #[default]
    Terrain,
    Liquid,
    Decoration,
    Destructible,
    Hazard,
    Projectile,
    Door,
    Teleporter,
    WeatherTrigger,
    MessageTrigger,
    PushWall,
    LevelEnd,
    PlayerStart,
}

/// Static behaviour flags
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFlags {
    /// Blocks movement and projectiles
    pub solid: bool,
    pub liquid: bool,
    pub water: bool,
    pub lava: bool,
    pub waterfall: bool,
    pub quicksand: bool,
    pub radioactive: bool,
    /// Object that can be damaged and broken
    pub destructible: bool,
    /// Secret marker that makes the terrain below it passable
    pub fake_wall: bool,
}

impl ItemFlags {
    /// Liquid subtype by flag precedence
    pub fn liquid_kind(&self) -> Option<LiquidKind> {
        if self.waterfall && self.lava {
            Some(LiquidKind::LavaWaterfall)
        } else if self.waterfall && self.radioactive {
            Some(LiquidKind::RadioactiveWaterfall)
        } else if self.waterfall {
            Some(LiquidKind::Waterfall)
        } else if self.radioactive && (self.water || self.liquid) {
            Some(LiquidKind::RadioactiveWater)
        } else if self.quicksand {
            Some(LiquidKind::Quicksand)
        } else if self.lava {
            Some(LiquidKind::Lava)
        } else if self.water || self.liquid {
            Some(LiquidKind::Water)
        } else {
            None
        }
    }
}

/// Physics of an item fired as a projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileParams {
    pub damage: f32,
    /// Launch speed (px/s)
    pub speed: f32,
    pub lifespan_ms: f32,
    /// Fraction of axis speed kept after a ricochet
    pub bounce_damping: f32,
    pub ricochets: bool,
    /// Perpendicular jitter scale applied on ricochet
    pub ricochet_random: f32,
    pub max_bounces: u32,
    /// Hitbox size relative to `width`/`height`
    pub hitbox_scale: f32,
    pub collides_with_tiles: bool,
    pub width: f32,
    pub height: f32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Buoyant box that floats on water instead of hitting things
    pub floating_box: bool,
    pub sea_rescue: bool,
    pub simple_physics: bool,
}

impl Default for ProjectileParams {
    fn default() -> Self {
        Self {
            damage: 1.0,
            speed: 400.0,
            lifespan_ms: 2000.0,
            bounce_damping: 0.7,
            ricochets: false,
            ricochet_random: 0.0,
            max_bounces: 3,
            hitbox_scale: 1.0,
            collides_with_tiles: true,
            width: 8.0,
            height: 8.0,
            gravity: 0.0,
            floating_box: false,
            sea_rescue: false,
            simple_physics: false,
        }
    }
}

/// Damage behaviour of a hazard object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardParams {
    /// Flat damage per hit (0 = use `damage_per_second`)
    pub damage: f32,
    pub damage_per_second: f32,
    /// Damage once per contact instead of continuously
    pub damage_once: bool,
    /// Sides of the hazard that hurt
    pub damage_directions: Vec<Side>,
    /// Touch margin override (px)
    pub touch_margin: Option<f32>,
}

impl Default for HazardParams {
    fn default() -> Self {
        Self {
            damage: 0.0,
            damage_per_second: 10.0,
            damage_once: false,
            damage_directions: Side::ALL.to_vec(),
            touch_margin: None,
        }
    }
}

impl HazardParams {
    pub fn hurts_from(&self, side: Side) -> bool {
        self.damage_directions.contains(&side)
    }

    /// Damage of the first hit on contact
    pub fn immediate_damage(&self) -> f32 {
        if self.damage > 0.0 {
            self.damage
        } else {
            self.damage_per_second
        }
    }
}

/// Trigger data shared by every instance of an item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionParams {
    /// Map loaded by doors and cross-map teleporters
    pub target_map: Option<String>,
    /// Item shown once a door opens
    pub open_variant: Option<String>,
    pub weather: Option<String>,
    pub message: Option<String>,
    /// Whether the player must press interact
    pub requires_input: bool,
}

/// A single registry entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDef {
    pub id: String,
    pub class: ItemClass,
    pub flags: ItemFlags,
    /// Starting health of destructible objects
    pub health: Option<f32>,
    pub projectile: Option<ProjectileParams>,
    pub hazard: Option<HazardParams>,
    pub interaction: InteractionParams,
}

impl ItemDef {
    pub fn new(id: impl Into<String>, class: ItemClass) -> Self {
        Self {
            id: id.into(),
            class,
            ..Default::default()
        }
    }

    pub fn liquid_kind(&self) -> Option<LiquidKind> {
        self.flags.liquid_kind()
    }
}

/// Immutable arena of item definitions
#[derive(Debug, Clone, Default)]
pub struct Registry {
    items: Vec<ItemDef>,
    by_id: HashMap<String, ItemHandle>,
}

impl Registry {
    pub fn new(items: Vec<ItemDef>) -> Result<Self, MapError> {
        let mut by_id = HashMap::with_capacity(items.len());
        for (i, def) in items.iter().enumerate() {
            if by_id.insert(def.id.clone(), ItemHandle(i as u32)).is_some() {
                return Err(MapError::DuplicateItem(def.id.clone()));
            }
        }
        Ok(Self { items, by_id })
    }

    #[inline]
    pub fn get(&self, handle: ItemHandle) -> Option<&ItemDef> {
        self.items.get(handle.0 as usize)
    }

    pub fn find_by_id(&self, id: &str) -> Option<ItemHandle> {
        self.by_id.get(id).copied()
    }

    pub fn def_by_id(&self, id: &str) -> Option<&ItemDef> {
        self.find_by_id(id).and_then(|h| self.get(h))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
