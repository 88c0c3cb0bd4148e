//! Tile layers
//!
//! Three parallel flat layers indexed `y * width + x`. Every lookup is bounds
//! checked; out-of-grid coordinates simply have no cell.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::registry::ItemHandle;
use crate::cell_of;
use crate::sim::collision::{Aabb, Side};

/// Which layer a cell lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Terrain,
    Objects,
    Secrets,
}

/// Per-instance overrides for an object cell
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    pub health: Option<f32>,
    /// Links doors, teleporters and spawn points
    pub trigger_id: Option<String>,
    pub target_map: Option<String>,
    pub weather: Option<String>,
    pub message: Option<String>,
    /// Custom hitbox size, anchored at the cell's top-left (px)
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Direction a push wall moves
    pub push_direction: Option<Side>,
}

/// A loaded map
#[derive(Debug, Clone)]
pub struct TileMap {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    pub terrain: Vec<Option<ItemHandle>>,
    pub objects: Vec<Option<ItemHandle>>,
    pub secrets: Vec<Option<ItemHandle>>,
    pub object_meta: HashMap<usize, ObjectMeta>,
}

impl TileMap {
    /// Create an empty map
    pub fn new(name: impl Into<String>, width: usize, height: usize, tile_size: f32) -> Self {
        let cells = width * height;
        Self {
            name: name.into(),
            width,
            height,
            tile_size,
            terrain: vec![None; cells],
            objects: vec![None; cells],
            secrets: vec![None; cells],
            object_meta: HashMap::new(),
        }
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the layers agree with the dimensions
    pub fn is_well_formed(&self) -> bool {
        let cells = self.len();
        cells > 0
            && self.tile_size > 0.0
            && self.tile_size.is_finite()
            && self.terrain.len() == cells
            && self.objects.len() == cells
            && self.secrets.len() == cells
    }

    /// Cell index for grid coordinates
    #[inline]
    pub fn index(&self, col: i64, row: i64) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.width as i64 || row >= self.height as i64 {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    /// Cell index containing a pixel
    #[inline]
    pub fn cell_at_pixel(&self, x: f32, y: f32) -> Option<usize> {
        self.index(cell_of(x, self.tile_size), cell_of(y, self.tile_size))
    }

    /// Grid coordinates of a cell index
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        if self.width == 0 {
            return (0, 0);
        }
        (index % self.width, index / self.width)
    }

    /// Pixel rectangle of a cell
    pub fn cell_rect(&self, index: usize) -> Aabb {
        let (col, row) = self.coords(index);
        let min = Vec2::new(col as f32, row as f32) * self.tile_size;
        Aabb::new(min, min + Vec2::splat(self.tile_size))
    }

    /// Hitbox of an object cell, honouring custom dimensions
    pub fn object_rect(&self, index: usize) -> Aabb {
        let cell = self.cell_rect(index);
        match self.object_meta.get(&index) {
            Some(meta) if meta.width.is_some() || meta.height.is_some() => {
                let w = meta.width.unwrap_or(self.tile_size).max(0.0);
                let h = meta.height.unwrap_or(self.tile_size).max(0.0);
                Aabb::new(cell.min, cell.min + Vec2::new(w, h))
            }
            _ => cell,
        }
    }

    /// Size of the world in pixels
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.tile_size
    }

    pub fn layer(&self, layer: Layer) -> &[Option<ItemHandle>] {
        match layer {
            Layer::Terrain => &self.terrain,
            Layer::Objects => &self.objects,
            Layer::Secrets => &self.secrets,
        }
    }

    /// Item on a layer at a cell (None for empty or out-of-range)
    #[inline]
    pub fn item(&self, layer: Layer, index: usize) -> Option<ItemHandle> {
        self.layer(layer).get(index).copied().flatten()
    }

    pub fn meta(&self, index: usize) -> Option<&ObjectMeta> {
        self.object_meta.get(&index)
    }

    /// Place an item (silently ignores out-of-range cells)
    pub fn set(&mut self, layer: Layer, col: i64, row: i64, item: Option<ItemHandle>) {
        let Some(index) = self.index(col, row) else {
            return;
        };
        let cells = match layer {
            Layer::Terrain => &mut self.terrain,
            Layer::Objects => &mut self.objects,
            Layer::Secrets => &mut self.secrets,
        };
        if let Some(cell) = cells.get_mut(index) {
            *cell = item;
        }
    }
}
