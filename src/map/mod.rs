//! Map data read by the simulation
//!
//! The map is owned by the host; the simulation reads it and requests edits
//! through events.

pub mod grid;
pub mod load;
pub mod registry;

pub use grid::{Layer, ObjectMeta, TileMap};
pub use load::{MapDocument, MapError, parse_map, parse_registry};
pub use registry::{
    HazardParams, InteractionParams, ItemClass, ItemDef, ItemFlags, ItemHandle, ProjectileParams,
    Registry,
};
