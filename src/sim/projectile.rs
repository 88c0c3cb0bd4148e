//! Projectile simulation
//!
//! Projectiles move in sub-steps, resolving X then Y against entities,
//! blocking objects and solid tiles. Ricochets reflect, damp and jitter
//! the velocity and end the tick flush against the struck face. Floating
//! boxes fall, splash into water, bob for a while and then sink.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Axis, snap_to_face};
use super::events::{DamageSource, DamageTarget, SimEvent, Sound};
use super::spatial::WorldQuery;
use super::state::EntityBody;
use crate::consts::PLAYER_ID;
use crate::map::{ItemDef, ItemHandle};
use crate::tuning::ProjectileTuning;

/// Horizontal speed a grounded box keeps per second
const GROUND_FRICTION: f32 = 0.05;

/// Maximum tilt of a bobbing box (radians)
const MAX_BOB_TILT: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxPhase {
    Falling,
    Floating,
    Sinking,
}

/// Extra state carried by buoyant boxes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingBox {
    pub phase: BoxPhase,
    pub float_time_ms: f32,
    /// Surface the box bobs around
    pub base_y: f32,
    pub rotation: f32,
    pub is_sea_rescue_box: bool,
    /// Single sub-step, no entity reactions
    pub use_simple_physics: bool,
    /// Entities already reported as touched
    pub touched: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub owner_id: u32,
    pub item: ItemHandle,
    /// Center (px)
    pub pos: Vec2,
    /// Velocity (px/s)
    pub vel: Vec2,
    pub size: Vec2,
    pub hitbox_scale: f32,
    pub remaining_life_ms: f32,
    pub damage: f32,
    pub collides_with_tiles: bool,
    pub ricochets: bool,
    pub ricochet_random: f32,
    pub bounce_damping: f32,
    pub bounce_count: u32,
    pub max_bounces: u32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    pub floating_box: Option<FloatingBox>,
}

impl Projectile {
    /// Collision box, scaled around the center
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size * self.hitbox_scale.max(0.0))
    }

    pub fn is_box(&self) -> bool {
        self.floating_box.is_some()
    }
}

/// Create a projectile from its item definition
///
/// Items without projectile parameters fly with the defaults.
pub fn spawn(
    id: u32,
    origin: Vec2,
    direction: Vec2,
    owner_id: u32,
    item: ItemHandle,
    def: &ItemDef,
) -> Projectile {
    let params = def.projectile.clone().unwrap_or_default();
    let direction = direction.try_normalize().unwrap_or(Vec2::X);

    let floating_box = params.floating_box.then(|| FloatingBox {
        phase: BoxPhase::Falling,
        float_time_ms: 0.0,
        base_y: origin.y,
        rotation: 0.0,
        is_sea_rescue_box: params.sea_rescue,
        use_simple_physics: params.simple_physics,
        touched: Vec::new(),
    });

    Projectile {
        id,
        owner_id,
        item,
        pos: origin,
        vel: direction * params.speed,
        size: Vec2::new(params.width, params.height),
        hitbox_scale: params.hitbox_scale,
        remaining_life_ms: params.lifespan_ms,
        damage: params.damage,
        collides_with_tiles: params.collides_with_tiles,
        ricochets: params.ricochets,
        ricochet_random: params.ricochet_random.max(0.0),
        bounce_damping: params.bounce_damping,
        bounce_count: 0,
        max_bounces: params.max_bounces,
        gravity: params.gravity,
        floating_box,
    }
}

/// Everything a projectile can collide with this tick
pub struct StepEnv<'a, W: WorldQuery> {
    pub world: &'a W,
    pub entities: &'a [EntityBody],
    pub player: Option<Aabb>,
    pub tuning: &'a ProjectileTuning,
}

enum Flow {
    Continue,
    /// Struck a solid face; reflect this axis
    Bounce,
    Remove,
}

/// Advance every projectile by `dt_ms`, dropping the ones that expired
pub fn step<W: WorldQuery, R: Rng>(
    projectiles: &mut Vec<Projectile>,
    dt_ms: f32,
    env: &StepEnv<'_, W>,
    rng: &mut R,
    events: &mut Vec<SimEvent>,
) {
    let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
    projectiles.retain_mut(|p| advance(p, dt_ms, env, rng, events));
}

fn advance<W: WorldQuery, R: Rng>(
    p: &mut Projectile,
    dt_ms: f32,
    env: &StepEnv<'_, W>,
    rng: &mut R,
    events: &mut Vec<SimEvent>,
) -> bool {
    p.remaining_life_ms -= dt_ms;

    let afloat = p
        .floating_box
        .as_ref()
        .is_some_and(|b| b.phase != BoxPhase::Falling);
    let alive = if afloat {
        drift_afloat(p, dt_ms, env, events)
    } else {
        fly(p, dt_ms / 1000.0, env, rng, events)
    };
    if !alive {
        return false;
    }

    if p.bounce_count > p.max_bounces {
        log::trace!("Projectile {} used up its bounces", p.id);
        return false;
    }
    p.remaining_life_ms > 0.0 && in_world(p, env)
}

/// Sub-step count for this tick's travel
fn substeps(p: &Projectile, dt: f32, tuning: &ProjectileTuning) -> u32 {
    if p.floating_box.as_ref().is_some_and(|b| b.use_simple_physics) {
        return 1;
    }
    let travel = (p.vel * dt).abs().max_element();
    let steps = (travel / tuning.max_step_px.max(0.01)).ceil();
    if !steps.is_finite() {
        return 1;
    }
    (steps as u32).clamp(1, tuning.max_substeps.max(1))
}

fn fly<W: WorldQuery, R: Rng>(
    p: &mut Projectile,
    dt: f32,
    env: &StepEnv<'_, W>,
    rng: &mut R,
    events: &mut Vec<SimEvent>,
) -> bool {
    let steps = substeps(p, dt, env.tuning);
    let sdt = dt / steps as f32;

    for _ in 0..steps {
        p.vel.y += p.gravity * sdt;
        let start = p.pos;

        // Each axis is tested against the other's pre-move coordinate
        let mut reflect = [false; 2];
        for (i, axis) in [Axis::X, Axis::Y].into_iter().enumerate() {
            match move_axis(p, axis, start, sdt, env, events) {
                Flow::Continue => {}
                Flow::Bounce => reflect[i] = true,
                Flow::Remove => return false,
            }
        }

        let mut wedged = false;
        if reflect == [false; 2] && is_wedged(p, env) {
            if strike_object(p, &p.hitbox(), env, events) {
                return false;
            }
            if !p.ricochets {
                impact(p, events);
                return false;
            }
            reflect = [true, true];
            wedged = true;
        }

        if reflect != [false; 2] {
            ricochet(p, reflect, rng, env.tuning);
            if wedged {
                // Back out of the corner along the new heading
                p.pos = start + Vec2::new(sign(p.vel.x), sign(p.vel.y)) * env.tuning.corner_nudge;
            }
            events.push(SimEvent::PlaySound {
                sound: Sound::Ricochet,
            });
            return true;
        }

        if enter_liquid(p, env, events) {
            return true;
        }
    }
    true
}

fn move_axis<W: WorldQuery>(
    p: &mut Projectile,
    axis: Axis,
    start: Vec2,
    sdt: f32,
    env: &StepEnv<'_, W>,
    events: &mut Vec<SimEvent>,
) -> Flow {
    let along = axis.of(p.vel);
    let delta = along * sdt;
    if delta == 0.0 {
        return Flow::Continue;
    }
    let moved = axis.of(start) + delta;
    axis.set(&mut p.pos, moved);

    let mut center = start;
    axis.set(&mut center, moved);
    let hitbox = Aabb::from_center(center, p.size * p.hitbox_scale.max(0.0));

    if let Some(flow) = hit_bodies(p, &hitbox, env, events) {
        return flow;
    }

    if !p.is_box() && strike_object(p, &hitbox, env, events) {
        return Flow::Remove;
    }

    if !p.collides_with_tiles || !touches_solid(env.world, &hitbox) {
        return Flow::Continue;
    }

    // Sit flush against the face that was crossed
    let positive = along > 0.0;
    let leading = if positive {
        axis.of(hitbox.max)
    } else {
        axis.of(hitbox.min)
    };
    let half = axis.of(hitbox.max - hitbox.min) * 0.5;
    let flush = snap_to_face(
        leading,
        positive,
        half,
        env.world.tile_size(),
        env.tuning.contact_epsilon,
    );
    axis.set(&mut p.pos, flush);

    if p.is_box() {
        axis.set(&mut p.vel, 0.0);
        if axis == Axis::Y && positive {
            p.vel.x *= GROUND_FRICTION.powf(sdt);
        }
        return Flow::Continue;
    }

    if p.ricochets {
        return Flow::Bounce;
    }

    impact(p, events);
    Flow::Remove
}

/// Reflect the struck axes with damping; a single-axis hit also jitters the
/// perpendicular axis. Counts as one bounce either way.
fn ricochet<R: Rng>(p: &mut Projectile, reflect: [bool; 2], rng: &mut R, tuning: &ProjectileTuning) {
    for (axis, hit) in [Axis::X, Axis::Y].into_iter().zip(reflect) {
        if !hit {
            continue;
        }
        let along = axis.of(p.vel);
        axis.set(&mut p.vel, -along * p.bounce_damping);

        if p.ricochet_random > 0.0 && reflect != [true, true] {
            let perp = axis.perpendicular();
            let jitter = rng.random_range(-1.0f32..=1.0) * p.ricochet_random * along.abs();
            let value = perp.of(p.vel) + jitter;
            perp.set(&mut p.vel, value);
        }
    }

    p.bounce_count += 1;
    p.remaining_life_ms -= tuning.bounce_life_penalty_ms;
}

/// Blocking objects end the projectile; destructibles also take damage.
/// Returns true on a hit.
fn strike_object<W: WorldQuery>(
    p: &Projectile,
    hitbox: &Aabb,
    env: &StepEnv<'_, W>,
    events: &mut Vec<SimEvent>,
) -> bool {
    let struck = sample_points(hitbox, env.world.tile_size())
        .into_iter()
        .find_map(|pt| env.world.object_at(pt.x, pt.y));
    let Some(hit) = struck else {
        return false;
    };

    log::debug!("Projectile {} struck '{}' at cell {}", p.id, hit.item_id, hit.index);
    if hit.destructible {
        let center = hitbox.center();
        events.push(SimEvent::Damage {
            target: DamageTarget::Object(hit.index),
            amount: p.damage,
            source: DamageSource::Projectile(p.id),
        });
        events.push(SimEvent::SpawnBreakEffect {
            x: center.x,
            y: center.y,
            item_id: hit.item_id,
        });
    }
    impact(p, events);
    true
}

/// Player and entity contacts
fn hit_bodies<W: WorldQuery>(
    p: &mut Projectile,
    hitbox: &Aabb,
    env: &StepEnv<'_, W>,
    events: &mut Vec<SimEvent>,
) -> Option<Flow> {
    let id = p.id;
    let owner = p.owner_id;

    if let Some(state) = p.floating_box.as_mut() {
        if state.use_simple_physics {
            return None;
        }
        for body in env.entities {
            if body.id != owner && body.aabb.overlaps(hitbox) && !state.touched.contains(&body.id) {
                state.touched.push(body.id);
                events.push(SimEvent::BoxContact {
                    projectile_id: id,
                    entity_id: body.id,
                });
            }
        }
        return None;
    }

    let target = if owner == PLAYER_ID {
        // Player shots hit entities
        env.entities
            .iter()
            .find(|body| body.aabb.overlaps(hitbox))
            .map(|body| DamageTarget::Entity(body.id))
    } else {
        // Entity shots hit the player only
        env.player
            .filter(|player| player.overlaps(hitbox))
            .map(|_| DamageTarget::Player)
    }?;

    events.push(SimEvent::Damage {
        target,
        amount: p.damage,
        source: DamageSource::Projectile(id),
    });
    impact(p, events);
    Some(Flow::Remove)
}

/// Clear on each axis alone but solid at the combined position, as when
/// clipping the corner of a block diagonally
fn is_wedged<W: WorldQuery>(p: &Projectile, env: &StepEnv<'_, W>) -> bool {
    p.collides_with_tiles && !p.is_box() && touches_solid(env.world, &p.hitbox())
}

/// A falling box dropping into liquid; returns true when it entered
fn enter_liquid<W: WorldQuery>(
    p: &mut Projectile,
    env: &StepEnv<'_, W>,
    events: &mut Vec<SimEvent>,
) -> bool {
    if p.vel.y <= 0.0 {
        return false;
    }
    let foot = Vec2::new(p.pos.x, p.hitbox().max.y);
    let Some(state) = p.floating_box.as_mut() else {
        return false;
    };
    if state.phase != BoxPhase::Falling {
        return false;
    }
    let Some(kind) = env.world.liquid_kind_at(foot.x, foot.y) else {
        return false;
    };

    let surface = env.world.liquid_surface_y(kind, foot.x).unwrap_or(p.pos.y);
    state.float_time_ms = 0.0;
    state.base_y = surface;
    if kind.is_water_like() {
        state.phase = BoxPhase::Floating;
        p.pos.y = surface;
        p.vel.y = 0.0;
    } else {
        // Lava, quicksand and falls swallow the box
        state.phase = BoxPhase::Sinking;
        p.vel = Vec2::new(0.0, env.tuning.sink_speed);
    }

    log::debug!("Box {} entered {} at y={:.1}", p.id, kind.as_str(), surface);
    if kind.is_water_like() {
        events.push(SimEvent::PlaySound { sound: Sound::Splash });
    }
    events.push(SimEvent::SpawnSplash {
        kind,
        x: p.pos.x,
        y: surface,
        strength: env.tuning.box_splash_strength,
    });
    true
}

/// Bobbing and sinking; returns false once the box is gone
fn drift_afloat<W: WorldQuery>(
    p: &mut Projectile,
    dt_ms: f32,
    env: &StepEnv<'_, W>,
    events: &mut Vec<SimEvent>,
) -> bool {
    let tuning = env.tuning;
    let dt = dt_ms / 1000.0;
    let hitbox = p.hitbox();

    let Some(state) = p.floating_box.as_mut() else {
        return true;
    };

    if state.is_sea_rescue_box && env.player.is_some_and(|player| player.overlaps(&hitbox)) {
        log::info!("Sea rescue box {} collected", p.id);
        events.push(SimEvent::RescueBoxCollected { projectile_id: p.id });
        return false;
    }

    match state.phase {
        BoxPhase::Floating => {
            state.float_time_ms += dt_ms;
            let phase = state.float_time_ms * tuning.float_drift_speed;
            p.pos.y = state.base_y + phase.sin() * tuning.float_drift_amplitude;
            state.rotation = (phase * 0.5).sin() * MAX_BOB_TILT;
            if state.float_time_ms >= tuning.float_duration_ms {
                state.phase = BoxPhase::Sinking;
                p.vel.y = tuning.sink_speed;
            }
        }
        BoxPhase::Sinking => {
            p.pos.y += tuning.sink_speed * dt;
        }
        BoxPhase::Falling => {}
    }

    // Coast on the surface, stopping at walls
    p.vel.x *= tuning.float_friction.clamp(0.0, 1.0).powf(dt);
    let probe = Aabb::from_center(
        Vec2::new(p.pos.x + p.vel.x * dt, p.pos.y),
        p.size * p.hitbox_scale.max(0.0),
    );
    if touches_solid(env.world, &probe) {
        p.vel.x = 0.0;
    } else {
        p.pos.x = probe.center().x;
    }

    let sunk = p
        .floating_box
        .as_ref()
        .is_some_and(|b| b.phase == BoxPhase::Sinking);
    !(sunk && touches_solid(env.world, &p.hitbox()))
}

fn impact(p: &Projectile, events: &mut Vec<SimEvent>) {
    events.push(SimEvent::ProjectileImpact {
        projectile_id: p.id,
        x: p.pos.x,
        y: p.pos.y,
    });
}

fn in_world<W: WorldQuery>(p: &Projectile, env: &StepEnv<'_, W>) -> bool {
    let size = env.world.world_size();
    let margin = env.tuning.world_margin;
    p.pos.x >= -margin && p.pos.x <= size.x + margin && p.pos.y >= -margin && p.pos.y <= size.y + margin
}

/// Points covering a box at most one tile apart, corners included
fn sample_points(hitbox: &Aabb, tile_size: f32) -> Vec<Vec2> {
    let spacing = tile_size.max(1.0);
    let cols = ((hitbox.width() / spacing).ceil() as usize).max(1);
    let rows = ((hitbox.height() / spacing).ceil() as usize).max(1);
    let mut points = Vec::with_capacity((cols + 1) * (rows + 1));
    for i in 0..=cols {
        let x = hitbox.min.x + hitbox.width() * i as f32 / cols as f32;
        for j in 0..=rows {
            let y = hitbox.min.y + hitbox.height() * j as f32 / rows as f32;
            points.push(Vec2::new(x, y));
        }
    }
    points
}

fn touches_solid<W: WorldQuery>(world: &W, hitbox: &Aabb) -> bool {
    sample_points(hitbox, world.tile_size())
        .into_iter()
        .any(|pt| world.is_solid_at(pt.x, pt.y))
}

#[inline]
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{ItemClass, Layer, ProjectileParams, Registry, TileMap};
    use crate::sim::liquid::{LiquidKind, LiquidRegion, build_regions};
    use crate::sim::spatial::World;
    use crate::tuning::LiquidTuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const STONE: ItemHandle = ItemHandle(0);
    const WATER: ItemHandle = ItemHandle(1);
    const CRATE: ItemHandle = ItemHandle(2);
    const STATUE: ItemHandle = ItemHandle(3);

    fn registry() -> Registry {
        let mut stone = ItemDef::new("stone", ItemClass::Terrain);
        stone.flags.solid = true;
        let mut water = ItemDef::new("water", ItemClass::Liquid);
        water.flags.water = true;
        let mut crate_box = ItemDef::new("crate", ItemClass::Destructible);
        crate_box.flags.destructible = true;
        crate_box.health = Some(3.0);
        let mut statue = ItemDef::new("statue", ItemClass::Decoration);
        statue.flags.solid = true;
        Registry::new(vec![stone, water, crate_box, statue]).unwrap()
    }

    fn walled_map(width: usize, height: usize, wall_cols: &[i64]) -> TileMap {
        let mut map = TileMap::new("test", width, height, 20.0);
        for &col in wall_cols {
            for row in 0..height as i64 {
                map.set(Layer::Terrain, col, row, Some(STONE));
            }
        }
        map
    }

    fn world<'a>(map: &'a TileMap, registry: &'a Registry, regions: &'a [LiquidRegion]) -> World<'a> {
        World {
            map,
            registry,
            regions,
            viewport: Aabb::new(Vec2::ZERO, map.pixel_size()),
        }
    }

    fn bullet(params: ProjectileParams) -> ItemDef {
        let mut def = ItemDef::new("bullet", ItemClass::Projectile);
        def.projectile = Some(params);
        def
    }

    fn ricochet_params() -> ProjectileParams {
        ProjectileParams {
            speed: 600.0,
            width: 4.0,
            height: 4.0,
            hitbox_scale: 0.25,
            ricochets: true,
            bounce_damping: 0.7,
            lifespan_ms: 2000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_ricochet_snaps_to_wall_face() {
        let registry = registry();
        let map = walled_map(10, 5, &[5]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();

        let def = bullet(ricochet_params());
        let mut projectiles = vec![spawn(1, Vec2::ZERO, Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 200.0, &env, &mut rng, &mut events);

        assert_eq!(projectiles.len(), 1);
        let p = &projectiles[0];
        assert!((p.pos.x - 99.49).abs() < 0.05, "x = {}", p.pos.x);
        assert!(p.vel.x < 0.0);
        assert!((p.vel.x + 420.0).abs() < 1.0e-3);
        assert_eq!(p.bounce_count, 1);
        assert!((p.remaining_life_ms - 1720.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_bounce_budget_removes_on_extra_collision() {
        let registry = registry();
        let map = walled_map(10, 3, &[0, 9]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(2);
        let mut events = Vec::new();

        let def = bullet(ProjectileParams {
            bounce_damping: 1.0,
            max_bounces: 3,
            lifespan_ms: 1.0e6,
            ..ricochet_params()
        });
        let mut projectiles = vec![spawn(1, Vec2::new(100.0, 30.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];

        let mut max_seen = 0;
        for _ in 0..200 {
            step(&mut projectiles, 100.0, &env, &mut rng, &mut events);
            match projectiles.first() {
                Some(p) => max_seen = max_seen.max(p.bounce_count),
                None => break,
            }
        }
        assert!(projectiles.is_empty());
        assert_eq!(max_seen, 3);
    }

    #[test]
    fn test_plain_projectile_stops_at_wall() {
        let registry = registry();
        let map = walled_map(10, 5, &[5]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = Vec::new();

        let def = bullet(ProjectileParams {
            ricochets: false,
            ..ricochet_params()
        });
        let mut projectiles = vec![spawn(4, Vec2::new(10.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 200.0, &env, &mut rng, &mut events);

        assert!(projectiles.is_empty());
        assert!(matches!(
            events.as_slice(),
            [SimEvent::ProjectileImpact { projectile_id: 4, .. }]
        ));
    }

    #[test]
    fn test_destructible_takes_damage() {
        let registry = registry();
        let mut map = walled_map(10, 5, &[]);
        map.set(Layer::Objects, 5, 2, Some(CRATE));
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(4);
        let mut events = Vec::new();

        let def = bullet(ProjectileParams {
            damage: 2.0,
            ..ricochet_params()
        });
        let mut projectiles = vec![spawn(5, Vec2::new(10.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 200.0, &env, &mut rng, &mut events);

        assert!(projectiles.is_empty());
        let index = map.index(5, 2).unwrap();
        assert!(events.contains(&SimEvent::Damage {
            target: DamageTarget::Object(index),
            amount: 2.0,
            source: DamageSource::Projectile(5),
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::SpawnBreakEffect { item_id, .. } if item_id == "crate"
        )));
    }

    #[test]
    fn test_static_object_stops_ricochet() {
        let registry = registry();
        let mut map = walled_map(10, 5, &[]);
        map.set(Layer::Objects, 5, 2, Some(STATUE));
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(14);
        let mut events = Vec::new();

        let def = bullet(ricochet_params());
        let mut projectiles = vec![spawn(5, Vec2::new(10.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 200.0, &env, &mut rng, &mut events);

        assert!(projectiles.is_empty());
        assert!(matches!(
            events.as_slice(),
            [SimEvent::ProjectileImpact { projectile_id: 5, .. }]
        ));
    }

    #[test]
    fn test_convex_corner_reflects_both_axes() {
        let registry = registry();
        let mut map = walled_map(10, 10, &[]);
        map.set(Layer::Terrain, 5, 5, Some(STONE));
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(15);
        let mut events = Vec::new();

        let def = bullet(ricochet_params());
        let mut p = spawn(1, Vec2::new(98.0, 98.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def);
        p.vel = Vec2::new(200.0, 200.0);
        let mut projectiles = vec![p];
        step(&mut projectiles, 10.0, &env, &mut rng, &mut events);

        assert_eq!(projectiles.len(), 1);
        let p = &projectiles[0];
        assert!((p.vel.x + 140.0).abs() < 1.0e-3, "vel = {}", p.vel);
        assert!((p.vel.y + 140.0).abs() < 1.0e-3, "vel = {}", p.vel);
        assert_eq!(p.bounce_count, 1);
        // Backed out of the block, not left inside it
        assert_eq!(p.pos, Vec2::new(97.5, 97.5));
        assert!(!touches_solid(&world, &p.hitbox()));
        assert!(events.contains(&SimEvent::PlaySound {
            sound: Sound::Ricochet
        }));
    }

    #[test]
    fn test_object_corner_is_terminal() {
        let registry = registry();
        let mut map = walled_map(10, 10, &[]);
        map.set(Layer::Objects, 5, 5, Some(STATUE));
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(19);
        let mut events = Vec::new();

        let def = bullet(ricochet_params());
        let mut p = spawn(2, Vec2::new(98.0, 98.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def);
        p.vel = Vec2::new(200.0, 200.0);
        let mut projectiles = vec![p];
        step(&mut projectiles, 10.0, &env, &mut rng, &mut events);

        assert!(projectiles.is_empty());
        assert!(matches!(
            events.as_slice(),
            [SimEvent::ProjectileImpact { projectile_id: 2, .. }]
        ));
    }

    #[test]
    fn test_concave_corner_reflects_both_axes() {
        let registry = registry();
        let mut map = walled_map(10, 10, &[4]);
        for col in 0..10 {
            map.set(Layer::Terrain, col, 4, Some(STONE));
        }
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(16);
        let mut events = Vec::new();

        let def = bullet(ProjectileParams {
            ricochet_random: 0.5,
            ..ricochet_params()
        });
        let mut p = spawn(1, Vec2::new(78.0, 78.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def);
        p.vel = Vec2::new(200.0, 200.0);
        let mut projectiles = vec![p];
        step(&mut projectiles, 10.0, &env, &mut rng, &mut events);

        assert_eq!(projectiles.len(), 1);
        let p = &projectiles[0];
        // No jitter when both faces are struck together
        assert!((p.vel - Vec2::new(-140.0, -140.0)).length() < 1.0e-3, "vel = {}", p.vel);
        assert_eq!(p.bounce_count, 1);
        assert!((p.pos.x - 79.49).abs() < 0.05, "pos = {}", p.pos);
        assert!((p.pos.y - 79.49).abs() < 0.05, "pos = {}", p.pos);
    }

    #[test]
    fn test_hits_entity_but_not_owner() {
        let registry = registry();
        let map = walled_map(10, 5, &[]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let entities = [EntityBody {
            id: 7,
            aabb: Aabb::new(Vec2::new(60.0, 40.0), Vec2::new(80.0, 60.0)),
        }];
        let player = Aabb::new(Vec2::new(0.0, 40.0), Vec2::new(20.0, 60.0));
        let env = StepEnv {
            world: &world,
            entities: &entities,
            player: Some(player),
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();

        let def = bullet(ricochet_params());
        let mut projectiles = vec![spawn(6, Vec2::new(10.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 100.0, &env, &mut rng, &mut events);

        assert!(projectiles.is_empty());
        assert_eq!(
            events[0],
            SimEvent::Damage {
                target: DamageTarget::Entity(7),
                amount: 1.0,
                source: DamageSource::Projectile(6),
            }
        );
    }

    #[test]
    fn test_entity_shot_hits_player_only() {
        let registry = registry();
        let map = walled_map(10, 5, &[]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let entities = [EntityBody {
            id: 3,
            aabb: Aabb::new(Vec2::new(30.0, 40.0), Vec2::new(40.0, 60.0)),
        }];
        let player = Aabb::new(Vec2::new(60.0, 40.0), Vec2::new(80.0, 60.0));
        let env = StepEnv {
            world: &world,
            entities: &entities,
            player: Some(player),
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(10);
        let mut events = Vec::new();

        let def = bullet(ricochet_params());
        let mut projectiles = vec![spawn(11, Vec2::new(10.0, 50.0), Vec2::X, 7, ItemHandle(9), &def)];
        step(&mut projectiles, 100.0, &env, &mut rng, &mut events);

        assert!(projectiles.is_empty());
        assert_eq!(
            events[0],
            SimEvent::Damage {
                target: DamageTarget::Player,
                amount: 1.0,
                source: DamageSource::Projectile(11),
            }
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SimEvent::Damage { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_removed_past_world_margin() {
        let registry = registry();
        let map = walled_map(10, 5, &[]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(11);
        let mut events = Vec::new();

        let def = bullet(ProjectileParams {
            ricochets: false,
            ..ricochet_params()
        });
        let mut projectiles = vec![spawn(12, Vec2::new(190.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];

        // 250px is past the edge but inside the margin
        step(&mut projectiles, 100.0, &env, &mut rng, &mut events);
        assert_eq!(projectiles.len(), 1);
        assert!((projectiles[0].pos.x - 250.0).abs() < 1.0e-3);

        step(&mut projectiles, 100.0, &env, &mut rng, &mut events);
        assert!(projectiles.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_lifespan_runs_out() {
        let registry = registry();
        let map = walled_map(10, 5, &[]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(12);
        let mut events = Vec::new();

        let def = bullet(ProjectileParams {
            lifespan_ms: 100.0,
            ..ricochet_params()
        });
        let mut projectiles = vec![spawn(13, Vec2::new(10.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 60.0, &env, &mut rng, &mut events);
        assert_eq!(projectiles.len(), 1);
        assert!((projectiles[0].remaining_life_ms - 40.0).abs() < 1.0e-3);
        step(&mut projectiles, 60.0, &env, &mut rng, &mut events);
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_bounce_penalty_can_expire_projectile() {
        let registry = registry();
        let map = walled_map(10, 5, &[5]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(13);
        let mut events = Vec::new();

        // 170 - 100 leaves 70ms, and the bounce costs 80
        let def = bullet(ProjectileParams {
            lifespan_ms: 170.0,
            ..ricochet_params()
        });
        let mut projectiles = vec![spawn(14, Vec2::new(95.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 100.0, &env, &mut rng, &mut events);

        assert!(projectiles.is_empty());
        assert!(events.contains(&SimEvent::PlaySound {
            sound: Sound::Ricochet
        }));
    }

    #[test]
    fn test_box_touches_entity_once_and_survives() {
        let registry = registry();
        let map = walled_map(10, 5, &[]);
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let entities = [EntityBody {
            id: 7,
            aabb: Aabb::new(Vec2::new(60.0, 40.0), Vec2::new(80.0, 60.0)),
        }];
        let env = StepEnv {
            world: &world,
            entities: &entities,
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(9);
        let mut events = Vec::new();

        let mut def = ItemDef::new("buoy", ItemClass::Projectile);
        def.projectile = Some(ProjectileParams {
            speed: 100.0,
            floating_box: true,
            ..Default::default()
        });
        let mut projectiles = vec![spawn(10, Vec2::new(50.0, 50.0), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
        step(&mut projectiles, 100.0, &env, &mut rng, &mut events);
        step(&mut projectiles, 100.0, &env, &mut rng, &mut events);

        assert_eq!(projectiles.len(), 1);
        assert_eq!(
            events,
            vec![SimEvent::BoxContact {
                projectile_id: 10,
                entity_id: 7,
            }]
        );
        assert_eq!(projectiles[0].floating_box.as_ref().unwrap().touched, vec![7]);
    }

    #[test]
    fn test_grounded_box_slows_with_time() {
        let registry = registry();
        let mut map = walled_map(10, 5, &[]);
        for col in 0..10 {
            map.set(Layer::Terrain, col, 4, Some(STONE));
        }
        let world = world(&map, &registry, &[]);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };

        let mut def = ItemDef::new("crate", ItemClass::Projectile);
        def.projectile = Some(ProjectileParams {
            speed: 100.0,
            gravity: 400.0,
            floating_box: true,
            lifespan_ms: 1.0e6,
            ..Default::default()
        });

        // Resting on the floor, then a second of sliding at two frame rates
        let mut speeds = Vec::new();
        for frame_ms in [10.0, 50.0] {
            let mut rng = Pcg32::seed_from_u64(17);
            let mut events = Vec::new();
            let mut projectiles = vec![spawn(15, Vec2::new(20.0, 75.99), Vec2::X, PLAYER_ID, ItemHandle(9), &def)];
            for _ in 0..(1000.0 / frame_ms) as usize {
                step(&mut projectiles, frame_ms, &env, &mut rng, &mut events);
            }
            speeds.push(projectiles[0].vel.x);
        }
        assert!(speeds[0] < 100.0 && speeds[0] > 0.0);
        assert!((speeds[0] - speeds[1]).abs() < 1.0, "speeds = {:?}", speeds);
    }

    #[test]
    fn test_box_falling_into_water_splashes() {
        let registry = registry();
        let mut map = walled_map(10, 6, &[]);
        for col in 0..10 {
            map.set(Layer::Terrain, col, 3, Some(WATER));
        }
        let regions = build_regions(&map, &registry, &LiquidTuning::default());
        let world = world(&map, &registry, &regions);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(18);
        let mut events = Vec::new();

        let mut def = ItemDef::new("buoy", ItemClass::Projectile);
        def.projectile = Some(ProjectileParams {
            speed: 50.0,
            gravity: 400.0,
            floating_box: true,
            lifespan_ms: 1.0e6,
            ..Default::default()
        });
        let mut projectiles = vec![spawn(16, Vec2::new(100.0, 10.0), Vec2::Y, PLAYER_ID, ItemHandle(9), &def)];
        for _ in 0..20 {
            step(&mut projectiles, 50.0, &env, &mut rng, &mut events);
        }
        let sounds = events
            .iter()
            .filter(|e| **e == SimEvent::PlaySound { sound: Sound::Splash })
            .count();
        assert_eq!(sounds, 1);
    }

    #[test]
    fn test_box_floats_then_sinks() {
        let registry = registry();
        let mut map = walled_map(10, 6, &[]);
        for row in 3..6 {
            for col in 0..10 {
                map.set(Layer::Terrain, col, row, Some(WATER));
            }
        }
        let regions = build_regions(&map, &registry, &LiquidTuning::default());
        let world = world(&map, &registry, &regions);
        let tuning = ProjectileTuning::default();
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: None,
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(6);
        let mut events = Vec::new();

        let mut def = ItemDef::new("buoy", ItemClass::Projectile);
        def.projectile = Some(ProjectileParams {
            speed: 50.0,
            gravity: 400.0,
            floating_box: true,
            lifespan_ms: 1.0e6,
            ..Default::default()
        });
        let mut projectiles = vec![spawn(8, Vec2::new(100.0, 10.0), Vec2::Y, PLAYER_ID, ItemHandle(9), &def)];

        for _ in 0..20 {
            step(&mut projectiles, 50.0, &env, &mut rng, &mut events);
        }
        let splash = events.iter().find_map(|e| match e {
            SimEvent::SpawnSplash { kind, y, .. } => Some((*kind, *y)),
            _ => None,
        });
        assert_eq!(splash, Some((LiquidKind::Water, 60.0)));
        let state = projectiles[0].floating_box.as_ref().unwrap();
        assert_eq!(state.phase, BoxPhase::Floating);
        assert!((projectiles[0].pos.y - 60.0).abs() <= tuning.float_drift_amplitude + 1.0e-3);

        for _ in 0..100 {
            step(&mut projectiles, 50.0, &env, &mut rng, &mut events);
        }
        match projectiles.first() {
            Some(p) => assert_eq!(p.floating_box.as_ref().unwrap().phase, BoxPhase::Sinking),
            None => {}
        }
        for _ in 0..200 {
            step(&mut projectiles, 50.0, &env, &mut rng, &mut events);
        }
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_sea_rescue_box_collected_by_player() {
        let registry = registry();
        let mut map = walled_map(10, 6, &[]);
        for col in 0..10 {
            map.set(Layer::Terrain, col, 3, Some(WATER));
        }
        let regions = build_regions(&map, &registry, &LiquidTuning::default());
        let world = world(&map, &registry, &regions);
        let tuning = ProjectileTuning::default();
        let player = Aabb::new(Vec2::new(90.0, 40.0), Vec2::new(110.0, 68.0));
        let env = StepEnv {
            world: &world,
            entities: &[],
            player: Some(player),
            tuning: &tuning,
        };
        let mut rng = Pcg32::seed_from_u64(7);
        let mut events = Vec::new();

        let mut def = ItemDef::new("rescue", ItemClass::Projectile);
        def.projectile = Some(ProjectileParams {
            speed: 0.0,
            gravity: 400.0,
            floating_box: true,
            sea_rescue: true,
            lifespan_ms: 1.0e6,
            ..Default::default()
        });
        let mut projectiles = vec![spawn(9, Vec2::new(100.0, 30.0), Vec2::Y, 3, ItemHandle(9), &def)];
        for _ in 0..20 {
            step(&mut projectiles, 50.0, &env, &mut rng, &mut events);
        }
        assert!(projectiles.is_empty());
        assert!(events.contains(&SimEvent::RescueBoxCollected { projectile_id: 9 }));
    }
}
