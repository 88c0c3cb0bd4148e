//! Interactable triggers
//!
//! A priority-ordered list of handlers looks at the cell under the player and
//! the cell ahead of it. The first handler that claims the interaction stops
//! the rest.

use glam::Vec2;

use super::collision::{Aabb, Side};
use super::events::{SimEvent, Sound};
use super::spatial::is_solid_cell;
use super::timers::{DeferredAction, TimerQueue};
use crate::map::{ItemClass, ItemDef, Layer, ObjectMeta, Registry, TileMap};
use crate::tuning::InteractionTuning;

/// Trigger bookkeeping carried between ticks
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    /// Last weather value pushed
    pub weather: Option<String>,
    /// Message currently shown
    pub message: Option<String>,
    pub last_push_ms: Option<f64>,
    pub last_teleport_ms: Option<f64>,
    pub level_complete: bool,
}

/// Read-only view of the player's surroundings
pub struct InteractionArgs<'a> {
    pub map: &'a TileMap,
    pub registry: &'a Registry,
    pub player: Aabb,
    pub facing: Side,
    /// Interact pressed this tick
    pub interact: bool,
    pub now_ms: f64,
    pub tuning: &'a InteractionTuning,
}

/// Where handler side effects go
pub struct Interactions<'a> {
    pub events: &'a mut Vec<SimEvent>,
    pub timers: &'a mut TimerQueue,
}

type Handler = fn(&InteractionArgs<'_>, &mut InteractionState, &mut Interactions<'_>) -> bool;

/// Handlers in priority order
const HANDLERS: [Handler; 6] = [weather_trigger, message_trigger, push_wall, door, teleporter, level_end];

/// Run the handlers until one claims; returns whether any did
pub fn resolve(args: &InteractionArgs<'_>, state: &mut InteractionState, out: &mut Interactions<'_>) -> bool {
    HANDLERS.iter().any(|handler| handler(args, state, out))
}

/// An object cell with its definition and instance data
struct Cell<'a> {
    index: usize,
    def: &'a ItemDef,
    meta: Option<&'a ObjectMeta>,
}

impl<'a> InteractionArgs<'a> {
    fn center_cell(&self) -> Option<usize> {
        let c = self.player.center();
        self.map.cell_at_pixel(c.x, c.y)
    }

    fn object(&self, layer: Layer, index: usize) -> Option<Cell<'a>> {
        let def = self.registry.get(self.map.item(layer, index)?)?;
        Some(Cell {
            index,
            def,
            meta: self.map.meta(index),
        })
    }

    /// Object under the player's center
    fn under(&self, class: ItemClass) -> Option<Cell<'a>> {
        self.object(Layer::Objects, self.center_cell()?)
            .filter(|cell| cell.def.class == class)
    }

    /// Cell one step from the player's center in the facing direction
    fn ahead(&self) -> Option<usize> {
        let (col, row) = self.map.coords(self.center_cell()?);
        let (dx, dy) = self.facing.step();
        self.map.index(col as i64 + dx, row as i64 + dy)
    }
}

fn weather_trigger(args: &InteractionArgs<'_>, state: &mut InteractionState, out: &mut Interactions<'_>) -> bool {
    let Some(cell) = args.under(ItemClass::WeatherTrigger) else {
        return false;
    };
    let value = cell
        .meta
        .and_then(|m| m.weather.clone())
        .or_else(|| cell.def.interaction.weather.clone());
    if let Some(weather) = value.filter(|w| state.weather.as_deref() != Some(w.as_str())) {
        state.weather = Some(weather.clone());
        out.events.push(SimEvent::WeatherChanged { weather });
    }
    true
}

fn message_trigger(args: &InteractionArgs<'_>, state: &mut InteractionState, out: &mut Interactions<'_>) -> bool {
    let Some(cell) = args.under(ItemClass::MessageTrigger) else {
        // Leaving the trigger re-arms it
        state.message = None;
        return false;
    };
    let text = cell
        .meta
        .and_then(|m| m.message.clone())
        .or_else(|| cell.def.interaction.message.clone());
    if let Some(text) = text.filter(|t| state.message.as_deref() != Some(t.as_str())) {
        state.message = Some(text.clone());
        out.events.push(SimEvent::ShowMessage { text });
    }
    true
}

fn push_wall(args: &InteractionArgs<'_>, state: &mut InteractionState, out: &mut Interactions<'_>) -> bool {
    if !args.interact {
        return false;
    }
    let Some(cell) = args
        .ahead()
        .and_then(|index| args.object(Layer::Secrets, index))
        .filter(|cell| cell.def.class == ItemClass::PushWall)
    else {
        return false;
    };

    if state
        .last_push_ms
        .is_some_and(|last| args.now_ms - last < args.tuning.push_debounce_ms)
    {
        return true;
    }

    let direction = cell.meta.and_then(|m| m.push_direction).unwrap_or(args.facing);
    let (col, row) = args.map.coords(cell.index);
    let (dx, dy) = direction.step();
    let Some(dest) = args.map.index(col as i64 + dx, row as i64 + dy) else {
        return true;
    };
    if is_solid_cell(args.map, args.registry, dest) || args.map.item(Layer::Secrets, dest).is_some() {
        log::debug!("Push wall at cell {} is blocked", cell.index);
        return true;
    }

    state.last_push_ms = Some(args.now_ms);
    out.events.push(SimEvent::TileEdit {
        layer: Layer::Secrets,
        index: cell.index,
        item: None,
    });
    out.events.push(SimEvent::TileEdit {
        layer: Layer::Secrets,
        index: dest,
        item: Some(cell.def.id.clone()),
    });
    out.events.push(SimEvent::PlaySound { sound: Sound::PushWall });
    true
}

fn door(args: &InteractionArgs<'_>, _state: &mut InteractionState, out: &mut Interactions<'_>) -> bool {
    if !args.interact {
        return false;
    }
    let Some(cell) = args.under(ItemClass::Door) else {
        return false;
    };
    let Some(target_map) = cell
        .meta
        .and_then(|m| m.target_map.clone())
        .or_else(|| cell.def.interaction.target_map.clone())
    else {
        return false;
    };
    let trigger_id = cell.meta.and_then(|m| m.trigger_id.clone());

    out.events.push(SimEvent::PlaySound { sound: Sound::DoorOpen });
    if let Some(open) = &cell.def.interaction.open_variant {
        out.events.push(SimEvent::TileEdit {
            layer: Layer::Objects,
            index: cell.index,
            item: Some(open.clone()),
        });
    }
    log::info!("Door at cell {} opens to '{}'", cell.index, target_map);
    out.timers.schedule(
        args.now_ms + args.tuning.door_delay_ms,
        DeferredAction::MapSwitch { target_map, trigger_id },
    );
    true
}

fn teleporter(args: &InteractionArgs<'_>, state: &mut InteractionState, out: &mut Interactions<'_>) -> bool {
    let Some(cell) = args.under(ItemClass::Teleporter) else {
        return false;
    };
    if cell.def.interaction.requires_input && !args.interact {
        return false;
    }
    if state
        .last_teleport_ms
        .is_some_and(|last| args.now_ms - last < args.tuning.teleport_cooldown_ms)
    {
        return true;
    }

    let trigger_id = cell.meta.and_then(|m| m.trigger_id.clone());
    let target_map = cell
        .meta
        .and_then(|m| m.target_map.clone())
        .or_else(|| cell.def.interaction.target_map.clone())
        .filter(|name| *name != args.map.name);

    if let Some(target_map) = target_map {
        state.last_teleport_ms = Some(args.now_ms);
        out.timers.schedule(
            args.now_ms,
            DeferredAction::MapSwitch { target_map, trigger_id },
        );
        return true;
    }

    let Some(trigger) = trigger_id else {
        return false;
    };
    let Some(partner) = partner_teleporter(args.map, args.registry, &trigger, cell.index) else {
        log::warn!("Teleporter '{}' at cell {} has no partner", trigger, cell.index);
        return false;
    };

    let dest = args.map.cell_rect(partner).center();
    state.last_teleport_ms = Some(args.now_ms);
    out.events.push(SimEvent::Teleport { x: dest.x, y: dest.y });
    out.events.push(SimEvent::PlaySound { sound: Sound::Teleport });
    true
}

fn level_end(args: &InteractionArgs<'_>, state: &mut InteractionState, out: &mut Interactions<'_>) -> bool {
    if args.under(ItemClass::LevelEnd).is_none() {
        return false;
    }
    if !state.level_complete {
        state.level_complete = true;
        log::info!("Level '{}' complete", args.map.name);
        out.events.push(SimEvent::LevelComplete);
    }
    true
}

/// Lowest-index teleporter other than `from` sharing a trigger id
fn partner_teleporter(map: &TileMap, registry: &Registry, trigger: &str, from: usize) -> Option<usize> {
    map.object_meta
        .iter()
        .filter(|(index, meta)| **index != from && meta.trigger_id.as_deref() == Some(trigger))
        .map(|(index, _)| *index)
        .filter(|&index| {
            map.item(Layer::Objects, index)
                .and_then(|h| registry.get(h))
                .is_some_and(|def| def.class == ItemClass::Teleporter)
        })
        .min()
}

/// Where the player appears after a map switch
///
/// Prefers the object carrying `trigger_id`, then a player start, then the
/// first cell.
pub fn resolve_spawn_point(map: &TileMap, registry: &Registry, trigger_id: Option<&str>) -> Vec2 {
    let class_of = |index: usize| {
        map.item(Layer::Objects, index)
            .and_then(|h| registry.get(h))
            .map(|def| def.class)
    };

    let by_trigger = trigger_id.and_then(|trigger| {
        map.object_meta
            .iter()
            .filter(|(_, meta)| meta.trigger_id.as_deref() == Some(trigger))
            .map(|(index, _)| *index)
            .filter(|&index| {
                matches!(
                    class_of(index),
                    Some(ItemClass::Door | ItemClass::Teleporter | ItemClass::PlayerStart)
                )
            })
            .min()
    });

    let index = by_trigger
        .or_else(|| (0..map.len()).find(|&index| class_of(index) == Some(ItemClass::PlayerStart)))
        .unwrap_or(0);
    map.cell_rect(index).center()
}
