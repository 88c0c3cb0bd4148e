//! Liquid regions
//!
//! Regions are plain simulation data: the builder creates them once per map
//! load, the animator mutates them every tick, and the renderer only reads them.

pub mod animator;
pub mod builder;

pub use animator::{add_wave, surface_offset, target_alpha, update};
pub use builder::build_regions;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Liquid subtype of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidKind {
    Water,
    Lava,
    Quicksand,
    Waterfall,
    LavaWaterfall,
    RadioactiveWater,
    RadioactiveWaterfall,
}

impl LiquidKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidKind::Water => "water",
            LiquidKind::Lava => "lava",
            LiquidKind::Quicksand => "quicksand",
            LiquidKind::Waterfall => "waterfall",
            LiquidKind::LavaWaterfall => "lava_waterfall",
            LiquidKind::RadioactiveWater => "radioactive_water",
            LiquidKind::RadioactiveWaterfall => "radioactive_waterfall",
        }
    }

    /// Still water with a rippling surface
    pub fn is_water_like(&self) -> bool {
        matches!(self, LiquidKind::Water | LiquidKind::RadioactiveWater)
    }

    pub fn is_lava_like(&self) -> bool {
        matches!(self, LiquidKind::Lava | LiquidKind::LavaWaterfall)
    }

    pub fn is_waterfall(&self) -> bool {
        matches!(
            self,
            LiquidKind::Waterfall | LiquidKind::LavaWaterfall | LiquidKind::RadioactiveWaterfall
        )
    }

    /// Whether regions of this kind carry top-edge spans
    pub fn has_top_edge(&self, lava_waves: bool) -> bool {
        self.is_water_like() || (lava_waves && *self == LiquidKind::Lava)
    }

    /// Whether regions of this kind carry bottom-edge spans
    pub fn has_bottom_edge(&self) -> bool {
        self.is_waterfall()
    }
}

/// Horizontal run of boundary cells, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

impl Span {
    /// Half-open containment `[x, x + width)`
    #[inline]
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x && x < self.x + self.width
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width * 0.5
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }
}

/// A transient surface ripple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub center_x: f32,
    pub age_ms: f32,
    /// Amplitude at spawn (px)
    pub amplitude: f32,
    /// Decayed amplitude (px)
    pub amplitude_now: f32,
    /// Radius growth (px/s)
    pub speed: f32,
    pub radius: f32,
    pub start_radius: f32,
    pub life_ms: f32,
}

impl Wave {
    /// Age the wave; returns false once it has expired
    pub fn advance(&mut self, dt_ms: f32, tau_ms: f32) -> bool {
        self.age_ms += dt_ms.max(0.0);
        if self.age_ms >= self.life_ms {
            return false;
        }
        self.radius = self.start_radius + self.speed * (self.age_ms / 1000.0);
        self.amplitude_now = self.amplitude * (-self.age_ms / tau_ms.max(1.0)).exp();
        true
    }
}

/// A connected group of same-kind liquid tiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidRegion {
    pub id: u32,
    pub kind: LiquidKind,
    /// Member tile indices, sorted
    pub tiles: Vec<usize>,
    pub top_spans: Vec<Span>,
    pub bottom_spans: Vec<Span>,
    pub waves: Vec<Wave>,
    pub current_alpha: f32,
    /// Texture scroll offset (px)
    pub drift: Vec2,
    /// Animation clock (ms)
    pub elapsed_ms: f32,
}

impl LiquidRegion {
    pub fn new(
        id: u32,
        kind: LiquidKind,
        tiles: Vec<usize>,
        top_spans: Vec<Span>,
        bottom_spans: Vec<Span>,
    ) -> Self {
        Self {
            id,
            kind,
            tiles,
            top_spans,
            bottom_spans,
            waves: Vec::new(),
            current_alpha: target_alpha(kind, false),
            drift: Vec2::ZERO,
            elapsed_ms: 0.0,
        }
    }

    #[inline]
    pub fn contains_tile(&self, index: usize) -> bool {
        self.tiles.binary_search(&index).is_ok()
    }

    /// Top span containing `x`, if any
    pub fn top_span_at(&self, x: f32) -> Option<&Span> {
        self.top_spans.iter().find(|s| s.contains_x(x))
    }
}

/// Surface y of the first `kind` region whose top edge spans `x`
pub fn get_surface_y(regions: &[LiquidRegion], kind: LiquidKind, x: f32) -> Option<f32> {
    regions
        .iter()
        .filter(|r| r.kind == kind)
        .find_map(|r| r.top_span_at(x))
        .map(|span| span.y)
}

/// Region owning a tile index
pub fn region_at(regions: &[LiquidRegion], index: usize) -> Option<&LiquidRegion> {
    regions.iter().find(|r| r.contains_tile(index))
}
