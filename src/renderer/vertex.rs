//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    /// Floats per vertex in an interleaved buffer
    pub const STRIDE: usize = 6;

    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Interleaved `x, y, r, g, b, a` floats for upload
pub fn as_floats(vertices: &[Vertex]) -> &[f32] {
    bytemuck::cast_slice(vertices)
}

/// Colors for liquid presentation (alpha comes from the region)
pub mod colors {
    pub const WATER: [f32; 3] = [0.20, 0.45, 0.85];
    pub const WATER_RIM: [f32; 3] = [0.55, 0.80, 1.00];
    pub const LAVA: [f32; 3] = [0.95, 0.35, 0.08];
    pub const LAVA_RIM: [f32; 3] = [1.00, 0.75, 0.25];
    pub const QUICKSAND: [f32; 3] = [0.70, 0.58, 0.35];
    pub const RADIOACTIVE: [f32; 3] = [0.35, 0.90, 0.30];
    pub const RADIOACTIVE_RIM: [f32; 3] = [0.70, 1.00, 0.55];
    pub const FOAM: [f32; 4] = [0.95, 0.97, 1.00, 0.85];
}
