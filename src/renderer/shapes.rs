//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;
use crate::sim::collision::Aabb;

/// Two triangles covering a rectangle
pub fn quad(rect: &Aabb, color: [f32; 4]) -> [Vertex; 6] {
    let (a, b) = (rect.min, rect.max);
    [
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, a.y, color),
        Vertex::new(a.x, b.y, color),
        Vertex::new(a.x, b.y, color),
        Vertex::new(b.x, a.y, color),
        Vertex::new(b.x, b.y, color),
    ]
}

/// Triangle strip between an upper and a lower polyline
///
/// Both lines must have the same number of points.
pub fn band(upper: &[Vec2], lower: &[Vec2], top_color: [f32; 4], bottom_color: [f32; 4]) -> Vec<Vertex> {
    let n = upper.len().min(lower.len());
    if n < 2 {
        return Vec::new();
    }
    let mut vertices = Vec::with_capacity((n - 1) * 6);
    for i in 0..n - 1 {
        let (u1, u2) = (upper[i], upper[i + 1]);
        let (l1, l2) = (lower[i], lower[i + 1]);

        vertices.push(Vertex::new(u1.x, u1.y, top_color));
        vertices.push(Vertex::new(u2.x, u2.y, top_color));
        vertices.push(Vertex::new(l1.x, l1.y, bottom_color));

        vertices.push(Vertex::new(l1.x, l1.y, bottom_color));
        vertices.push(Vertex::new(u2.x, u2.y, top_color));
        vertices.push(Vertex::new(l2.x, l2.y, bottom_color));
    }
    vertices
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}
