//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes in through `tick` only
//! - Seeded RNG only
//! - Stable iteration order (by cell index, then spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod events;
pub mod hazard;
pub mod interact;
pub mod liquid;
pub mod projectile;
pub mod spatial;
pub mod state;
pub mod tick;
pub mod timers;
pub mod weather;

pub use collision::{Aabb, Side};
pub use events::{DamageSource, DamageTarget, Events, SimEvent, Sound};
pub use liquid::{LiquidKind, LiquidRegion, get_surface_y};
pub use projectile::Projectile;
pub use spatial::{World, WorldQuery};
pub use state::{EntityBody, PlayerState, SimulationContext};
pub use tick::{TickInput, tick};
pub use timers::{DeferredAction, TimerQueue};
pub use weather::WeatherKind;
