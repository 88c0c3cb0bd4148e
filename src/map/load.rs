//! Map and registry documents
//!
//! Loading is all-or-nothing: a document either produces a complete
//! [`TileMap`] or a single [`MapError`].

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use super::grid::{Layer, ObjectMeta, TileMap};
use super::registry::{ItemDef, ItemHandle, Registry};
use crate::consts::DEFAULT_TILE_SIZE;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: usize, height: usize },
    #[error("tile size {0} must be a positive number")]
    InvalidTileSize(f32),
    #[error("{layer:?} layer has {actual} cells, expected {expected}")]
    LayerLength {
        layer: Layer,
        expected: usize,
        actual: usize,
    },
    #[error("item id `{0}` is defined more than once")]
    DuplicateItem(String),
}

/// Raw map document as exported by the editor
#[derive(Debug, Deserialize)]
pub struct MapDocument {
    #[serde(default)]
    pub name: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub tile_size: Option<f32>,
    pub terrain: Vec<Option<String>>,
    /// Empty means no objects
    #[serde(default)]
    pub objects: Vec<Option<String>>,
    #[serde(default)]
    pub secrets: Vec<Option<String>>,
    #[serde(default)]
    pub object_meta: HashMap<usize, ObjectMeta>,
}

/// Parse a registry document (a JSON array of item definitions)
pub fn parse_registry(json: &str) -> Result<Registry, MapError> {
    let items: Vec<ItemDef> = serde_json::from_str(json)?;
    Registry::new(items)
}

/// Parse a map document against a registry
pub fn parse_map(json: &str, registry: &Registry) -> Result<TileMap, MapError> {
    let doc: MapDocument = serde_json::from_str(json)?;
    build_map(doc, registry)
}

/// Validate a document and resolve its ids to handles
pub fn build_map(doc: MapDocument, registry: &Registry) -> Result<TileMap, MapError> {
    let cells = doc.width.checked_mul(doc.height).unwrap_or(0);
    if cells == 0 {
        return Err(MapError::InvalidDimensions {
            width: doc.width,
            height: doc.height,
        });
    }
    let tile_size = doc.tile_size.unwrap_or(DEFAULT_TILE_SIZE);
    if !(tile_size.is_finite() && tile_size > 0.0) {
        return Err(MapError::InvalidTileSize(tile_size));
    }

    let mut unknown = 0usize;
    let terrain = resolve_layer(Layer::Terrain, doc.terrain, cells, registry, &mut unknown)?;
    let objects = resolve_layer(Layer::Objects, doc.objects, cells, registry, &mut unknown)?;
    let secrets = resolve_layer(Layer::Secrets, doc.secrets, cells, registry, &mut unknown)?;
    if unknown > 0 {
        log::warn!("Map '{}': {} cells reference unknown items (treated as empty)", doc.name, unknown);
    }

    let object_meta = doc
        .object_meta
        .into_iter()
        .filter(|(index, _)| *index < cells)
        .collect();

    log::info!(
        "Loaded map '{}' ({}x{}, tile {})",
        doc.name,
        doc.width,
        doc.height,
        tile_size
    );

    Ok(TileMap {
        name: doc.name,
        width: doc.width,
        height: doc.height,
        tile_size,
        terrain,
        objects,
        secrets,
        object_meta,
    })
}

fn resolve_layer(
    layer: Layer,
    ids: Vec<Option<String>>,
    cells: usize,
    registry: &Registry,
    unknown: &mut usize,
) -> Result<Vec<Option<ItemHandle>>, MapError> {
    if ids.is_empty() && layer != Layer::Terrain {
        return Ok(vec![None; cells]);
    }
    if ids.len() != cells {
        return Err(MapError::LayerLength {
            layer,
            expected: cells,
            actual: ids.len(),
        });
    }
    Ok(ids
        .into_iter()
        .map(|id| {
            let id = id?;
            if id.is_empty() {
                return None;
            }
            let handle = registry.find_by_id(&id);
            if handle.is_none() {
                log::debug!("Unknown item '{}' on {:?} layer", id, layer);
                *unknown += 1;
            }
            handle
        })
        .collect())
}
