//! Hazard contact damage
//!
//! Picks the single most relevant hazard object the player touches each tick
//! and applies immediate, periodic or one-shot damage with knockback.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Side};
use super::events::{DamageSource, DamageTarget, SimEvent};
use crate::cell_of;
use crate::map::{HazardParams, Layer, Registry, TileMap};
use crate::tuning::HazardTuning;

/// Period of continuous damage (ms)
const DAMAGE_PERIOD_MS: f32 = 1000.0;

/// Touch margin bounds (px)
const MIN_MARGIN: f32 = 1.0;
const MAX_MARGIN: f32 = 8.0;

/// Hazard bookkeeping carried between ticks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HazardState {
    pub accumulated_ms: f32,
    pub last_hazard_index: Option<usize>,
    /// One-shot hazards already fired during the current contact
    pub triggered_once: HashSet<usize>,
    /// Remaining red flash on the player (ms)
    pub hit_flash_ms: f32,
}

impl HazardState {
    /// Forget the current contact
    pub fn leave(&mut self) {
        self.accumulated_ms = 0.0;
        self.last_hazard_index = None;
        self.triggered_once.clear();
    }

    /// Extend the flash, never past `cap` and never shorter than it is
    pub fn flash(&mut self, pending_ms: f32, cap_ms: f32) {
        self.hit_flash_ms = self.hit_flash_ms.max(pending_ms).min(cap_ms);
    }

    pub fn decay_flash(&mut self, dt_ms: f32) {
        self.hit_flash_ms = (self.hit_flash_ms - dt_ms.max(0.0)).max(0.0);
    }
}

/// A hazard the player is touching from a side it hurts from
#[derive(Debug, Clone)]
struct Contact<'a> {
    index: usize,
    /// Touching sides in priority order
    sides: Vec<Side>,
    params: &'a HazardParams,
}

impl Contact<'_> {
    fn weight(&self) -> u32 {
        self.sides.iter().map(|s| s.weight()).sum()
    }

    fn primary_side(&self) -> Side {
        self.sides.first().copied().unwrap_or(Side::Top)
    }
}

/// Apply hazard damage for this tick; returns the damage dealt
pub fn resolve(
    player: &Aabb,
    map: &TileMap,
    registry: &Registry,
    dt_ms: f32,
    state: &mut HazardState,
    tuning: &HazardTuning,
    events: &mut Vec<SimEvent>,
) -> f32 {
    let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

    let Some(contact) = strongest_contact(player, map, registry, tuning) else {
        state.leave();
        return 0.0;
    };

    let params = contact.params;
    let index = contact.index;
    let side = contact.primary_side();
    let mut dealt = 0.0;

    if params.damage_once {
        if state.triggered_once.insert(index) {
            dealt += hit(index, side, params.immediate_damage(), true, state, tuning, events);
        }
        state.last_hazard_index = Some(index);
        state.accumulated_ms = 0.0;
    } else if state.last_hazard_index != Some(index) {
        // Fresh contact: immediate hit, restart the periodic clock
        state.last_hazard_index = Some(index);
        state.accumulated_ms = 0.0;
        dealt += hit(index, side, params.immediate_damage(), false, state, tuning, events);
    } else {
        state.accumulated_ms += dt_ms;
        while state.accumulated_ms >= DAMAGE_PERIOD_MS {
            state.accumulated_ms -= DAMAGE_PERIOD_MS;
            dealt += hit(index, side, params.damage_per_second, false, state, tuning, events);
        }
    }
    dealt
}

fn hit(
    index: usize,
    side: Side,
    amount: f32,
    knockback: bool,
    state: &mut HazardState,
    tuning: &HazardTuning,
    events: &mut Vec<SimEvent>,
) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }
    log::debug!("Hazard at cell {} hits player for {} from {:?}", index, amount, side);
    events.push(SimEvent::Damage {
        target: DamageTarget::Player,
        amount,
        source: DamageSource::Hazard(index),
    });
    if knockback {
        events.push(SimEvent::Knockback {
            velocity: side.outward() * tuning.knockback,
        });
    }
    state.flash(tuning.hit_flash_ms, tuning.hit_flash_ms);
    amount
}

/// Touching hazard with the heaviest side set; ties go to the lowest index
fn strongest_contact<'a>(
    player: &Aabb,
    map: &TileMap,
    registry: &'a Registry,
    tuning: &HazardTuning,
) -> Option<Contact<'a>> {
    let ts = map.tile_size;
    if ts <= 0.0 {
        return None;
    }

    let mut best: Option<Contact<'a>> = None;
    for row in cell_of(player.min.y, ts)..=cell_of(player.max.y, ts) {
        for col in cell_of(player.min.x, ts)..=cell_of(player.max.x, ts) {
            let Some(index) = map.index(col, row) else {
                continue;
            };
            let Some(params) = map
                .item(Layer::Objects, index)
                .and_then(|h| registry.get(h))
                .and_then(|def| def.hazard.as_ref())
            else {
                continue;
            };

            let rect = map.object_rect(index);
            if !player.touches(&rect) {
                continue;
            }
            let margin = params
                .touch_margin
                .unwrap_or(tuning.default_margin)
                .clamp(MIN_MARGIN, MAX_MARGIN);
            let mut sides = player.touching_sides(&rect, margin);
            if sides.is_empty() {
                // Deep overlap: the face the player is closest to leaving by
                sides.push(player.shallowest_side(&rect));
            }
            sides.retain(|&side| params.hurts_from(side));
            if sides.is_empty() {
                continue;
            }

            let contact = Contact {
                index,
                sides,
                params,
            };
            let better = match &best {
                None => true,
                Some(current) => {
                    contact.weight() > current.weight()
                        || (contact.weight() == current.weight() && contact.index < current.index)
                }
            };
            if better {
                best = Some(contact);
            }
        }
    }
    best
}
