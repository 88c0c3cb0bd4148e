//! Per-frame simulation tick
//!
//! Runs every subsystem in a fixed order against the context and hands back
//! the events it produced.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{Events, SimEvent};
use super::hazard;
use super::interact::{self, InteractionArgs, Interactions};
use super::liquid::{self, LiquidKind};
use super::projectile::{self, StepEnv};
use super::spatial::World;
use super::state::SimulationContext;
use super::timers::DeferredAction;
use super::weather::WeatherKind;
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInput {
    /// Fire the equipped weapon
    pub fire: bool,
    /// Interact pressed (doors, push walls)
    pub interact: bool,
    /// Aim direction; the player's facing when absent
    pub aim: Option<Vec2>,
}

/// Advance the simulation by `dt_ms`
///
/// Order: deferred actions, input, projectiles, hazards, interactables,
/// liquid and weather animation.
pub fn tick(ctx: &mut SimulationContext, input: &TickInput, dt_ms: f32) -> Events {
    let dt_ms = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, MAX_FRAME_MS)
    } else {
        0.0
    };
    ctx.time_ms += dt_ms as f64;
    ctx.hazard.decay_flash(dt_ms);

    run_timers(ctx);
    handle_input(ctx, input);
    step_projectiles(ctx, dt_ms);
    hazard::resolve(
        &ctx.player.aabb,
        &ctx.map,
        &ctx.registry,
        dt_ms,
        &mut ctx.hazard,
        &ctx.tuning.hazard,
        &mut ctx.events,
    );
    resolve_interactables(ctx, input);
    animate(ctx, dt_ms);

    if !ctx.settings.effective_hit_flash() {
        ctx.hazard.hit_flash_ms = 0.0;
    }
    std::mem::take(&mut ctx.events)
}

fn run_timers(ctx: &mut SimulationContext) {
    for action in ctx.timers.poll(ctx.time_ms) {
        match action {
            DeferredAction::MapSwitch {
                target_map,
                trigger_id,
            } => {
                log::info!("Map switch to '{}' (trigger {:?})", target_map, trigger_id);
                ctx.events.push(SimEvent::MapSwitch {
                    target_map,
                    trigger_id,
                });
            }
        }
    }
}

fn handle_input(ctx: &mut SimulationContext, input: &TickInput) {
    if !input.fire {
        return;
    }
    let Some(weapon) = ctx.player.weapon else {
        return;
    };
    let direction = input
        .aim
        .and_then(|aim| aim.try_normalize())
        .unwrap_or(ctx.player.facing.outward());
    let origin = ctx.player.center();
    if ctx
        .spawn_projectile(weapon, origin, direction, PLAYER_ID)
        .is_none()
    {
        log::warn!("Weapon {:?} has no definition", weapon);
    }
}

fn step_projectiles(ctx: &mut SimulationContext, dt_ms: f32) {
    let first = ctx.events.len();
    {
        let world = World {
            map: &ctx.map,
            registry: &ctx.registry,
            regions: &ctx.regions,
            viewport: ctx.viewport,
        };
        let env = StepEnv {
            world: &world,
            entities: &ctx.entities,
            player: Some(ctx.player.aabb),
            tuning: &ctx.tuning.projectile,
        };
        projectile::step(&mut ctx.projectiles, dt_ms, &env, &mut ctx.rng, &mut ctx.events);
    }

    // Boxes landing in liquid ripple its surface
    let splashes: Vec<(LiquidKind, f32, f32)> = ctx.events[first..]
        .iter()
        .filter_map(|event| match event {
            SimEvent::SpawnSplash { kind, x, strength, .. } => Some((*kind, *x, *strength)),
            _ => None,
        })
        .collect();
    for (kind, x, strength) in splashes {
        liquid::add_wave(
            &mut ctx.regions,
            kind,
            x,
            strength,
            ctx.map.tile_size,
            &ctx.tuning.liquid,
        );
    }
}

fn resolve_interactables(ctx: &mut SimulationContext, input: &TickInput) {
    let first = ctx.events.len();
    let args = InteractionArgs {
        map: &ctx.map,
        registry: &ctx.registry,
        player: ctx.player.aabb,
        facing: ctx.player.facing,
        interact: input.interact,
        now_ms: ctx.time_ms,
        tuning: &ctx.tuning.interaction,
    };
    let mut out = Interactions {
        events: &mut ctx.events,
        timers: &mut ctx.timers,
    };
    interact::resolve(&args, &mut ctx.interaction, &mut out);

    let weather = ctx.events[first..].iter().rev().find_map(|event| match event {
        SimEvent::WeatherChanged { weather } => Some(WeatherKind::parse(weather)),
        _ => None,
    });
    if let Some(kind) = weather {
        ctx.weather.set_kind(kind);
    }
}

fn animate(ctx: &mut SimulationContext, dt_ms: f32) {
    let player_cell = ctx.player_cell();
    liquid::update(
        &mut ctx.regions,
        dt_ms,
        |region| player_cell.is_some_and(|index| region.contains_tile(index)),
        &ctx.tuning.liquid,
    );

    ctx.weather.max_particles = ctx.settings.max_weather_particles();
    let splashes = {
        let world = World {
            map: &ctx.map,
            registry: &ctx.registry,
            regions: &ctx.regions,
            viewport: ctx.viewport,
        };
        ctx.weather
            .update(dt_ms, &world, &mut ctx.rng, &ctx.tuning.weather)
    };

    for splash in splashes {
        let Some(y) = liquid::get_surface_y(&ctx.regions, splash.kind, splash.x) else {
            continue;
        };
        liquid::add_wave(
            &mut ctx.regions,
            splash.kind,
            splash.x,
            splash.strength,
            ctx.map.tile_size,
            &ctx.tuning.liquid,
        );
        ctx.events.push(SimEvent::SpawnSplash {
            kind: splash.kind,
            x: splash.x,
            y,
            strength: splash.strength,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{ItemClass, ItemDef, Layer, ProjectileParams, Registry, TileMap};
    use crate::settings::Settings;
    use crate::tuning::Tuning;

    fn registry() -> Registry {
        let mut water = ItemDef::new("water", ItemClass::Liquid);
        water.flags.water = true;
        let mut bolt = ItemDef::new("bolt", ItemClass::Projectile);
        bolt.projectile = Some(ProjectileParams {
            speed: 300.0,
            ..Default::default()
        });
        let mut door = ItemDef::new("door", ItemClass::Door);
        door.interaction.target_map = Some("next".into());
        let mut storm = ItemDef::new("storm", ItemClass::WeatherTrigger);
        storm.interaction.weather = Some("rain".into());
        Registry::new(vec![water, bolt, door, storm]).unwrap()
    }

    fn context(map: TileMap) -> SimulationContext {
        SimulationContext::new(registry(), map, Tuning::default(), Settings::default(), 7)
    }

    #[test]
    fn test_fire_spawns_player_projectile() {
        let mut ctx = context(TileMap::new("field", 20, 10, 32.0));
        ctx.player.weapon = ctx.registry.find_by_id("bolt");
        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut ctx, &input, 16.0);
        assert_eq!(ctx.projectiles.len(), 1);
        assert_eq!(ctx.projectiles[0].owner_id, PLAYER_ID);
        assert!(ctx.projectiles[0].vel.x > 0.0);
    }

    #[test]
    fn test_door_switch_fires_after_delay() {
        let mut map = TileMap::new("house", 6, 6, 32.0);
        map.set(Layer::Objects, 0, 0, Some(crate::map::ItemHandle(2)));
        let mut ctx = context(map);
        ctx.player.move_to(Vec2::new(16.0, 16.0));

        let press = TickInput {
            interact: true,
            ..Default::default()
        };
        let events = tick(&mut ctx, &press, 16.0);
        assert!(!events.iter().any(|e| matches!(e, SimEvent::MapSwitch { .. })));

        let mut switched = Vec::new();
        for _ in 0..40 {
            switched.extend(tick(&mut ctx, &TickInput::default(), 16.0));
        }
        let switches: Vec<_> = switched
            .iter()
            .filter(|e| matches!(e, SimEvent::MapSwitch { target_map, .. } if target_map == "next"))
            .collect();
        assert_eq!(switches.len(), 1);
    }

    #[test]
    fn test_weather_trigger_switches_system() {
        let mut map = TileMap::new("sky", 6, 6, 32.0);
        map.set(Layer::Objects, 2, 2, Some(crate::map::ItemHandle(3)));
        let mut ctx = context(map);
        ctx.player.move_to(Vec2::new(80.0, 80.0));
        let events = tick(&mut ctx, &TickInput::default(), 16.0);
        assert!(events.contains(&SimEvent::WeatherChanged {
            weather: "rain".into()
        }));
        assert_eq!(ctx.weather.kind, WeatherKind::Rain);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut ctx = context(TileMap::new("field", 4, 4, 32.0));
        tick(&mut ctx, &TickInput::default(), 10_000.0);
        assert_eq!(ctx.time_ms, MAX_FRAME_MS as f64);
        tick(&mut ctx, &TickInput::default(), f32::NAN);
        assert_eq!(ctx.time_ms, MAX_FRAME_MS as f64);
    }
}
