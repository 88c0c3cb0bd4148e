//! Built-in demo level
//!
//! A small registry and an ASCII-drawn map used by the native binary and the
//! integration tests.

use serde_json::json;

use crate::map::{MapError, Registry, parse_registry};

pub const REGISTRY_JSON: &str = r#"[
    { "id": "stone", "class": "terrain", "flags": { "solid": true } },
    { "id": "water", "class": "liquid", "flags": { "water": true } },
    { "id": "waterfall", "class": "liquid", "flags": { "waterfall": true } },
    { "id": "spikes", "class": "hazard",
      "hazard": { "damage": 10, "damage_once": true, "damage_directions": ["top"] } },
    { "id": "crate", "class": "destructible", "flags": { "destructible": true, "solid": true }, "health": 3 },
    { "id": "rain_cloud", "class": "weather_trigger", "interaction": { "weather": "rain" } },
    { "id": "exit_door", "class": "door", "interaction": { "target_map": "demo" } },
    { "id": "start", "class": "player_start" },
    { "id": "pebble", "class": "projectile",
      "projectile": { "damage": 1, "speed": 480, "ricochets": true, "max_bounces": 2, "gravity": 600 } },
    { "id": "buoy", "class": "projectile",
      "projectile": { "floating_box": true, "gravity": 900, "speed": 120, "lifespan_ms": 8000,
                      "width": 16, "height": 16 } }
]"#;

/// `.` empty, `#` stone, `~` water, `|` waterfall,
/// objects: `S` start, `r` rain trigger, `^` spikes, `c` crate, `D` door
const ROWS: [&str; 8] = [
    "....................",
    "..........|.........",
    "..S.....r.|.........",
    "....^.c...|.......D.",
    "########~~~~~~~#####",
    "########~~~~~~~#####",
    "########~~~~~~~#####",
    "####################",
];

pub fn registry() -> Result<Registry, MapError> {
    parse_registry(REGISTRY_JSON)
}

/// The demo map as a map document
pub fn map_json() -> String {
    let mut terrain = Vec::new();
    let mut objects = Vec::new();
    for row in ROWS {
        for ch in row.chars() {
            let (t, o) = match ch {
                '#' => (Some("stone"), None),
                '~' => (Some("water"), None),
                '|' => (Some("waterfall"), None),
                'S' => (None, Some("start")),
                'r' => (None, Some("rain_cloud")),
                '^' => (None, Some("spikes")),
                'c' => (None, Some("crate")),
                'D' => (None, Some("exit_door")),
                _ => (None, None),
            };
            terrain.push(t);
            objects.push(o);
        }
    }
    json!({
        "name": "demo",
        "width": ROWS[0].len(),
        "height": ROWS.len(),
        "tile_size": 32,
        "terrain": terrain,
        "objects": objects,
    })
    .to_string()
}
