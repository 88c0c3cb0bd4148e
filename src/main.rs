//! Tidepool entry point
//!
//! Native: runs the demo level headless and logs what happens.
//! Web: exposes [`WebEngine`] to the host page.

#[cfg(target_arch = "wasm32")]
mod wasm_engine {
    use wasm_bindgen::prelude::*;

    use tidepool::renderer::{as_floats, liquid_vertices};
    use tidepool::sim::{Aabb, Side};
    use tidepool::{Registry, Settings, SimulationContext, TickInput, TileMap, Tuning, tick};

    fn js_error(err: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&err.to_string())
    }

    /// Engine handle owned by the page
    #[wasm_bindgen]
    pub struct WebEngine {
        ctx: SimulationContext,
    }

    #[wasm_bindgen]
    impl WebEngine {
        #[wasm_bindgen(constructor)]
        pub fn new(registry_json: &str, tuning_json: Option<String>, seed: u64) -> Result<WebEngine, JsValue> {
            let registry: Registry = tidepool::map::parse_registry(registry_json).map_err(js_error)?;
            let tuning = match tuning_json {
                Some(json) => Tuning::from_json(&json).map_err(js_error)?,
                None => Tuning::default(),
            };
            let map = TileMap::new("empty", 1, 1, tidepool::consts::DEFAULT_TILE_SIZE);
            log::info!("Engine created with seed: {}", seed);
            Ok(Self {
                ctx: SimulationContext::new(registry, map, tuning, Settings::load(), seed),
            })
        }

        /// Switch maps; the current map stays on error
        pub fn load(&mut self, map_json: &str, trigger_id: Option<String>) -> Result<(), JsValue> {
            self.ctx
                .load_map(map_json, trigger_id.as_deref())
                .map_err(js_error)
        }

        /// Advance one frame; returns the events as a JSON array
        pub fn tick(&mut self, input_json: &str, dt_ms: f32) -> String {
            let input: TickInput = serde_json::from_str(input_json).unwrap_or_else(|e| {
                log::warn!("Bad tick input ({}), using defaults", e);
                TickInput::default()
            });
            let events = tick(&mut self.ctx, &input, dt_ms);
            serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
        }

        pub fn resize_tiles(&mut self, tile_size: f32) -> Result<(), JsValue> {
            self.ctx.resize_tiles(tile_size).map_err(js_error)
        }

        /// Sync the player body from the host's physics
        pub fn set_player(&mut self, x: f32, y: f32, facing_right: bool) {
            self.ctx.player.move_to(glam::Vec2::new(x, y));
            self.ctx.player.facing = if facing_right { Side::Right } else { Side::Left };
        }

        pub fn set_weapon(&mut self, item_id: &str) {
            self.ctx.player.weapon = self.ctx.registry.find_by_id(item_id);
        }

        pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
            let min = glam::Vec2::new(x, y);
            self.ctx
                .set_viewport(Aabb::new(min, min + glam::Vec2::new(width, height)));
        }

        /// Interleaved `x, y, r, g, b, a` triangles for every liquid region
        pub fn liquid_mesh(&self) -> js_sys::Float32Array {
            let vertices = liquid_vertices(&self.ctx.regions, &self.ctx.map, &self.ctx.settings, &self.ctx.tuning.liquid);
            js_sys::Float32Array::from(as_floats(&vertices))
        }

        /// Current hit flash (ms), for tinting the player
        pub fn hit_flash_ms(&self) -> f32 {
            self.ctx.hazard.hit_flash_ms
        }

        pub fn set_settings(&mut self, settings_json: &str) -> Result<(), JsValue> {
            let settings: Settings = serde_json::from_str(settings_json).map_err(js_error)?;
            settings.save();
            self.ctx.settings = settings;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Tidepool (web) ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tidepool (native) starting...");

    if let Err(e) = run_demo() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

/// Play a few seconds of the demo level with scripted input
#[cfg(not(target_arch = "wasm32"))]
fn run_demo() -> Result<(), tidepool::MapError> {
    use glam::Vec2;
    use tidepool::consts::PLAYER_ID;
    use tidepool::renderer::liquid_vertices;
    use tidepool::{Settings, SimEvent, SimulationContext, TickInput, TileMap, Tuning, demo, tick};

    const FRAME_MS: f32 = 1000.0 / 60.0;

    let registry = demo::registry()?;
    let mut ctx = SimulationContext::new(
        registry,
        TileMap::new("empty", 1, 1, 32.0),
        Tuning::default(),
        Settings::default(),
        0x5eed,
    );
    ctx.load_map(&demo::map_json(), None)?;
    ctx.player.weapon = ctx.registry.find_by_id("pebble");
    let buoy = ctx.registry.find_by_id("buoy");

    let mut counts = std::collections::BTreeMap::<&'static str, usize>::new();
    for frame in 0..360u32 {
        let input = TickInput {
            fire: frame % 45 == 0,
            interact: false,
            aim: Some(Vec2::new(1.0, -0.25)),
        };
        match frame {
            90 => ctx.player.move_to(Vec2::new(8.5 * 32.0, 2.5 * 32.0)),
            120 => {
                if let Some(buoy) = buoy {
                    ctx.spawn_projectile(buoy, Vec2::new(11.5 * 32.0, 2.5 * 32.0), Vec2::Y, PLAYER_ID);
                }
            }
            _ => {}
        }

        for event in tick(&mut ctx, &input, FRAME_MS) {
            let name = match &event {
                SimEvent::SpawnSplash { .. } => "splash",
                SimEvent::ProjectileImpact { .. } => "impact",
                SimEvent::Damage { .. } => "damage",
                SimEvent::PlaySound { .. } => "sound",
                _ => "other",
            };
            if name == "other" || name == "damage" {
                log::info!("[{:>4}] {:?}", frame, event);
            }
            *counts.entry(name).or_default() += 1;
        }
    }

    let vertices = liquid_vertices(&ctx.regions, &ctx.map, &ctx.settings, &ctx.tuning.liquid);
    log::info!(
        "Done at {:.0}ms: {} regions, {} liquid vertices, weather {}",
        ctx.time_ms,
        ctx.regions.len(),
        vertices.len(),
        ctx.weather.kind.as_str()
    );
    for (name, count) in counts {
        log::info!("  {:<8} {}", name, count);
    }
    Ok(())
}
