//! Weather particles
//!
//! Rain and snow fall through the viewport. Raindrops that reach a water
//! surface disturb it; everything else just disappears on contact.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::liquid::LiquidKind;
use super::spatial::WorldQuery;
use crate::tuning::WeatherTuning;

/// Surfaces raindrops can ripple
const SPLASH_KINDS: [LiquidKind; 2] = [LiquidKind::Water, LiquidKind::RadioactiveWater];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    #[default]
    Clear,
    Rain,
    Snow,
    Fog,
}

impl WeatherKind {
    /// Parse a trigger value; unknown names clear the sky
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "rain" | "storm" => WeatherKind::Rain,
            "snow" => WeatherKind::Snow,
            "fog" | "mist" => WeatherKind::Fog,
            _ => WeatherKind::Clear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherKind::Clear => "clear",
            WeatherKind::Rain => "rain",
            WeatherKind::Snow => "snow",
            WeatherKind::Fog => "fog",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Snow sway phase
    pub phase: f32,
}

/// A raindrop landing on a liquid surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splash {
    pub kind: LiquidKind,
    pub x: f32,
    pub strength: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherSystem {
    pub kind: WeatherKind,
    pub particles: Vec<Particle>,
    pub max_particles: usize,
    spawn_debt: f32,
}

impl WeatherSystem {
    pub fn new(max_particles: usize) -> Self {
        Self {
            max_particles,
            ..Default::default()
        }
    }

    /// Switch weather, dropping particles of the old kind
    pub fn set_kind(&mut self, kind: WeatherKind) {
        if kind != self.kind {
            log::info!("Weather: {} -> {}", self.kind.as_str(), kind.as_str());
            self.kind = kind;
            self.particles.clear();
            self.spawn_debt = 0.0;
        }
    }

    /// Advance particles; returns the splashes raindrops made
    pub fn update<W: WorldQuery, R: Rng>(
        &mut self,
        dt_ms: f32,
        world: &W,
        rng: &mut R,
        tuning: &WeatherTuning,
    ) -> Vec<Splash> {
        let dt = dt_ms.max(0.0) / 1000.0;
        let (rate, speed) = match self.kind {
            WeatherKind::Rain => (tuning.rain_rate, tuning.rain_speed),
            WeatherKind::Snow => (tuning.snow_rate, tuning.snow_speed),
            WeatherKind::Clear | WeatherKind::Fog => {
                self.particles.clear();
                return Vec::new();
            }
        };

        self.spawn(dt, rate, speed, world, rng);

        let view = world.viewport();
        let snowing = self.kind == WeatherKind::Snow;
        let mut splashes = Vec::new();
        self.particles.retain_mut(|p| {
            let prev_y = p.pos.y;
            if snowing {
                p.phase += dt * 2.0;
                p.vel.x = p.phase.sin() * speed * 0.4;
            }
            p.pos += p.vel * dt;

            if !snowing {
                let landed = SPLASH_KINDS.iter().find_map(|&kind| {
                    world
                        .liquid_surface_y(kind, p.pos.x)
                        .filter(|&surface| prev_y < surface && p.pos.y >= surface)
                        .map(|_| kind)
                });
                if let Some(kind) = landed {
                    splashes.push(Splash {
                        kind,
                        x: p.pos.x,
                        strength: tuning.rain_splash_strength,
                    });
                    return false;
                }
            }

            !world.is_solid_at(p.pos.x, p.pos.y) && p.pos.y <= view.max.y
        });
        splashes
    }

    fn spawn<W: WorldQuery, R: Rng>(&mut self, dt: f32, rate: f32, speed: f32, world: &W, rng: &mut R) {
        let view = world.viewport();
        if view.width() <= 0.0 {
            return;
        }
        self.spawn_debt += rate.max(0.0) * dt;
        while self.spawn_debt >= 1.0 {
            self.spawn_debt -= 1.0;
            if self.particles.len() >= self.max_particles {
                continue;
            }
            let x = rng.random_range(view.min.x..view.max.x);
            self.particles.push(Particle {
                pos: Vec2::new(x, view.min.y),
                vel: Vec2::new(0.0, speed * rng.random_range(0.85f32..=1.15)),
                phase: rng.random_range(0.0f32..std::f32::consts::TAU),
            });
        }
    }
}
