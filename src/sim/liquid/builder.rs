//! Liquid region flood fill
//!
//! Groups 4-connected same-kind liquid tiles into regions with an explicit
//! LIFO stack and a byte visited array, then extracts merged boundary spans.

use super::{LiquidKind, LiquidRegion, Span};
use crate::map::{Registry, TileMap};
use crate::sim::collision::Side;
use crate::tuning::LiquidTuning;

const NO_REGION: u32 = u32::MAX;

/// Build every liquid region of a map
///
/// Malformed maps produce no regions.
pub fn build_regions(map: &TileMap, registry: &Registry, tuning: &LiquidTuning) -> Vec<LiquidRegion> {
    if !map.is_well_formed() {
        log::warn!(
            "Skipping liquid build for malformed map '{}' ({}x{})",
            map.name,
            map.width,
            map.height
        );
        return Vec::new();
    }

    let cells = map.len();
    let kinds: Vec<Option<LiquidKind>> = map
        .terrain
        .iter()
        .map(|cell| cell.and_then(|h| registry.get(h)).and_then(|def| def.liquid_kind()))
        .collect();

    let mut visited = vec![0u8; cells];
    let mut labels = vec![NO_REGION; cells];
    let mut stack: Vec<usize> = Vec::new();
    let mut regions = Vec::new();

    for seed in 0..cells {
        if visited[seed] != 0 {
            continue;
        }
        let Some(kind) = kinds[seed] else {
            continue;
        };

        let id = regions.len() as u32;
        let mut tiles = Vec::new();
        visited[seed] = 1;
        stack.push(seed);

        while let Some(index) = stack.pop() {
            labels[index] = id;
            tiles.push(index);
            for neighbor in neighbors(map.width, map.height, index) {
                if visited[neighbor] == 0 && kinds[neighbor] == Some(kind) {
                    visited[neighbor] = 1;
                    stack.push(neighbor);
                }
            }
        }

        tiles.sort_unstable();
        let top_spans = if kind.has_top_edge(tuning.lava_surface_waves) {
            edge_spans(map, &labels, id, &tiles, Side::Top)
        } else {
            Vec::new()
        };
        let bottom_spans = if kind.has_bottom_edge() {
            edge_spans(map, &labels, id, &tiles, Side::Bottom)
        } else {
            Vec::new()
        };
        regions.push(LiquidRegion::new(id, kind, tiles, top_spans, bottom_spans));
    }

    log::info!("Map '{}': built {} liquid regions", map.name, regions.len());
    regions
}

/// 4-neighbours of a cell, never wrapping across row ends
fn neighbors(width: usize, height: usize, index: usize) -> impl Iterator<Item = usize> {
    let col = index % width;
    let row = index / width;
    [
        (col > 0).then(|| index - 1),
        (col + 1 < width).then(|| index + 1),
        (row > 0).then(|| index - width),
        (row + 1 < height).then(|| index + width),
    ]
    .into_iter()
    .flatten()
}

/// Merged spans of region cells whose neighbour across `edge` is outside the region
///
/// `tiles` must be sorted, which orders boundary cells by row then column.
fn edge_spans(map: &TileMap, labels: &[u32], id: u32, tiles: &[usize], edge: Side) -> Vec<Span> {
    let (_, dy) = edge.step();
    let ts = map.tile_size;
    let mut spans: Vec<Span> = Vec::new();
    let mut last: Option<(usize, usize)> = None;

    for &index in tiles {
        let (col, row) = map.coords(index);
        let outside = map
            .index(col as i64, row as i64 + dy)
            .is_none_or(|n| labels.get(n).copied() != Some(id));
        if !outside {
            continue;
        }

        let extends = matches!(last, Some((r, c)) if r == row && c + 1 == col);
        match spans.last_mut() {
            Some(span) if extends => span.width += ts,
            _ => {
                let y = if dy < 0 { row as f32 * ts } else { (row + 1) as f32 * ts };
                spans.push(Span {
                    x: col as f32 * ts,
                    y,
                    width: ts,
                });
            }
        }
        last = Some((row, col));
    }
    spans
}
