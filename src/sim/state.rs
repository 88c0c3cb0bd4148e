//! Simulation context
//!
//! Everything one tick reads or writes lives here, passed explicitly into
//! [`super::tick`]. Nothing is global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{Aabb, Side};
use super::events::SimEvent;
use super::hazard::HazardState;
use super::interact::{InteractionState, resolve_spawn_point};
use super::liquid::{self, LiquidRegion};
use super::projectile::{self, Projectile};
use super::spatial::World;
use super::timers::TimerQueue;
use super::weather::WeatherSystem;
use crate::consts::*;
use crate::map::{ItemHandle, MapError, Registry, TileMap, parse_map};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Player body as far as the simulation cares
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub aabb: Aabb,
    /// Left or Right
    pub facing: Side,
    /// Item fired by `TickInput::fire`
    pub weapon: Option<ItemHandle>,
}

impl PlayerState {
    pub fn at(center: Vec2) -> Self {
        Self {
            aabb: Aabb::from_center(center, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT)),
            facing: Side::Right,
            weapon: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.aabb.center()
    }

    /// Move keeping the hitbox size
    pub fn move_to(&mut self, center: Vec2) {
        let size = Vec2::new(self.aabb.width(), self.aabb.height());
        self.aabb = Aabb::from_center(center, size);
    }
}

/// A non-player entity projectiles can hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityBody {
    pub id: u32,
    pub aabb: Aabb,
}

pub struct SimulationContext {
    pub seed: u64,
    pub registry: Registry,
    pub map: TileMap,
    /// Rebuilt whenever the map or tile size changes
    pub regions: Vec<LiquidRegion>,
    pub projectiles: Vec<Projectile>,
    /// Host-synced entity hitboxes
    pub entities: Vec<EntityBody>,
    pub player: PlayerState,
    pub hazard: HazardState,
    pub interaction: InteractionState,
    pub weather: WeatherSystem,
    pub timers: TimerQueue,
    pub viewport: Aabb,
    pub tuning: Tuning,
    pub settings: Settings,
    /// Simulation clock (ms)
    pub time_ms: f64,
    pub(crate) rng: Pcg32,
    /// Events queued during the current tick
    pub(crate) events: Vec<SimEvent>,
    next_id: u32,
}

impl SimulationContext {
    pub fn new(registry: Registry, map: TileMap, tuning: Tuning, settings: Settings, seed: u64) -> Self {
        let weather = WeatherSystem::new(settings.max_weather_particles());
        let mut ctx = Self {
            seed,
            registry,
            map: TileMap::new("", 0, 0, DEFAULT_TILE_SIZE),
            regions: Vec::new(),
            projectiles: Vec::new(),
            entities: Vec::new(),
            player: PlayerState::at(Vec2::ZERO),
            hazard: HazardState::default(),
            interaction: InteractionState::default(),
            weather,
            timers: TimerQueue::new(),
            viewport: Aabb::new(Vec2::ZERO, Vec2::ZERO),
            tuning,
            settings,
            time_ms: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: PLAYER_ID + 1,
        };
        ctx.replace_map(map, None);
        ctx
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Parse and switch to a new map
    ///
    /// On error the current map and all derived state stay untouched.
    pub fn load_map(&mut self, json: &str, trigger_id: Option<&str>) -> Result<(), MapError> {
        let map = parse_map(json, &self.registry)?;
        self.replace_map(map, trigger_id);
        Ok(())
    }

    /// Install a validated map and reset per-map state
    pub fn replace_map(&mut self, map: TileMap, trigger_id: Option<&str>) {
        log::debug!("Switching to map '{}'", map.name);
        self.map = map;
        self.projectiles.clear();
        self.hazard = HazardState::default();
        self.interaction.message = None;
        self.interaction.level_complete = false;
        self.timers.clear();
        self.viewport = Aabb::new(Vec2::ZERO, self.map.pixel_size());
        self.rebuild_liquids();

        let spawn = resolve_spawn_point(&self.map, &self.registry, trigger_id);
        self.player.move_to(spawn);
    }

    /// Change the tile size and rebuild everything derived from it
    pub fn resize_tiles(&mut self, tile_size: f32) -> Result<(), MapError> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(MapError::InvalidTileSize(tile_size));
        }
        let scale = tile_size / self.map.tile_size;
        self.map.tile_size = tile_size;
        self.player.move_to(self.player.center() * scale);
        self.projectiles.clear();
        self.weather.particles.clear();
        self.viewport = Aabb::new(Vec2::ZERO, self.map.pixel_size());
        self.rebuild_liquids();
        Ok(())
    }

    /// Flood-fill liquid regions for the current map
    pub fn rebuild_liquids(&mut self) {
        self.regions = liquid::build_regions(&self.map, &self.registry, &self.tuning.liquid);
    }

    /// Fire an item; returns the projectile id
    pub fn spawn_projectile(&mut self, item: ItemHandle, origin: Vec2, direction: Vec2, owner_id: u32) -> Option<u32> {
        let projectile = {
            let def = self.registry.get(item)?;
            projectile::spawn(0, origin, direction, owner_id, item, def)
        };
        let id = self.next_entity_id();
        self.projectiles.push(Projectile { id, ..projectile });
        Some(id)
    }

    pub fn set_viewport(&mut self, viewport: Aabb) {
        self.viewport = viewport;
    }

    /// Read-only world view for queries
    pub fn world(&self) -> World<'_> {
        World {
            map: &self.map,
            registry: &self.registry,
            regions: &self.regions,
            viewport: self.viewport,
        }
    }

    /// Cell under the player's center
    pub fn player_cell(&self) -> Option<usize> {
        let c = self.player.center();
        self.map.cell_at_pixel(c.x, c.y)
    }
}
