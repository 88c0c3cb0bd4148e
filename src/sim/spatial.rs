//! Tile and object lookups
//!
//! All queries are O(1), side-effect free and bounds checked. Cells outside
//! the grid are empty, never solid.

use glam::Vec2;

use super::collision::Aabb;
use super::liquid::{self, LiquidKind, LiquidRegion};
use crate::map::{ItemDef, Layer, Registry, TileMap};

/// Current health of an object instance (meta override, then definition)
pub fn object_health(map: &TileMap, def: &ItemDef, index: usize) -> f32 {
    map.meta(index)
        .and_then(|m| m.health)
        .or(def.health)
        .unwrap_or(1.0)
}

/// Whether an object cell still blocks movement
fn object_blocks(map: &TileMap, def: &ItemDef, index: usize) -> bool {
    if def.flags.destructible {
        object_health(map, def, index) > 0.0
    } else {
        def.flags.solid
    }
}

/// Whether a cell is collidable ground
pub fn is_solid_cell(map: &TileMap, registry: &Registry, index: usize) -> bool {
    let fake_wall = map
        .item(Layer::Secrets, index)
        .and_then(|h| registry.get(h))
        .map(|def| def.flags.fake_wall)
        .unwrap_or(false);

    let terrain_solid = !fake_wall
        && map
            .item(Layer::Terrain, index)
            .and_then(|h| registry.get(h))
            .is_some_and(|def| def.flags.solid);
    if terrain_solid {
        return true;
    }

    let object_solid = map
        .item(Layer::Objects, index)
        .and_then(|h| registry.get(h))
        .is_some_and(|def| object_blocks(map, def, index));
    if object_solid {
        return true;
    }

    map.item(Layer::Secrets, index)
        .and_then(|h| registry.get(h))
        .is_some_and(|def| def.flags.solid && !def.flags.fake_wall)
}

/// Solidity by grid coordinates
#[inline]
pub fn is_solid_at(map: &TileMap, registry: &Registry, col: i64, row: i64) -> bool {
    map.index(col, row)
        .is_some_and(|index| is_solid_cell(map, registry, index))
}

/// Solidity by pixel coordinates
#[inline]
pub fn is_solid_at_pixel(map: &TileMap, registry: &Registry, x: f32, y: f32) -> bool {
    map.cell_at_pixel(x, y)
        .is_some_and(|index| is_solid_cell(map, registry, index))
}

/// Index of a destructible object with health left at a pixel
pub fn get_destructible_at(map: &TileMap, registry: &Registry, x: f32, y: f32) -> Option<usize> {
    let index = map.cell_at_pixel(x, y)?;
    let def = registry.get(map.item(Layer::Objects, index)?)?;
    (def.flags.destructible && object_health(map, def, index) > 0.0).then_some(index)
}

/// Liquid subtype of the terrain at a pixel
pub fn liquid_kind_at(map: &TileMap, registry: &Registry, x: f32, y: f32) -> Option<LiquidKind> {
    let index = map.cell_at_pixel(x, y)?;
    registry.get(map.item(Layer::Terrain, index)?)?.liquid_kind()
}

/// An object that stops projectiles
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHit {
    pub index: usize,
    pub item_id: String,
    pub destructible: bool,
}

/// Blocking object at a pixel, if any
pub fn object_at_pixel(map: &TileMap, registry: &Registry, x: f32, y: f32) -> Option<ObjectHit> {
    let index = map.cell_at_pixel(x, y)?;
    let def = registry.get(map.item(Layer::Objects, index)?)?;
    object_blocks(map, def, index).then(|| ObjectHit {
        index,
        item_id: def.id.clone(),
        destructible: def.flags.destructible,
    })
}

/// Queries the simulation needs from its host
pub trait WorldQuery {
    fn is_solid_at(&self, x: f32, y: f32) -> bool;
    fn liquid_surface_y(&self, kind: LiquidKind, x: f32) -> Option<f32>;
    fn liquid_kind_at(&self, x: f32, y: f32) -> Option<LiquidKind>;
    fn viewport(&self) -> Aabb;
    fn find_item_by_id(&self, id: &str) -> Option<&ItemDef>;
    fn object_at(&self, x: f32, y: f32) -> Option<ObjectHit>;
    /// World extent in pixels
    fn world_size(&self) -> Vec2;
    fn tile_size(&self) -> f32;
}

/// [`WorldQuery`] backed by a loaded map and its liquid regions
pub struct World<'a> {
    pub map: &'a TileMap,
    pub registry: &'a Registry,
    pub regions: &'a [LiquidRegion],
    pub viewport: Aabb,
}

impl WorldQuery for World<'_> {
    fn is_solid_at(&self, x: f32, y: f32) -> bool {
        is_solid_at_pixel(self.map, self.registry, x, y)
    }

    fn liquid_surface_y(&self, kind: LiquidKind, x: f32) -> Option<f32> {
        liquid::get_surface_y(self.regions, kind, x)
    }

    fn liquid_kind_at(&self, x: f32, y: f32) -> Option<LiquidKind> {
        liquid_kind_at(self.map, self.registry, x, y)
    }

    fn viewport(&self) -> Aabb {
        self.viewport
    }

    fn find_item_by_id(&self, id: &str) -> Option<&ItemDef> {
        self.registry.def_by_id(id)
    }

    fn object_at(&self, x: f32, y: f32) -> Option<ObjectHit> {
        object_at_pixel(self.map, self.registry, x, y)
    }

    fn world_size(&self) -> Vec2 {
        self.map.pixel_size()
    }

    fn tile_size(&self) -> f32 {
        self.map.tile_size
    }
}
