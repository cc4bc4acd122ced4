// src/layout/grid.rs
// Jittered undulating sheet with a travelling ripple and a slow rocking motion.
use std::f32::consts::TAU;

use glam::{Mat3, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Layout;
use crate::error::Result;
use crate::style::StyleConstants;
use crate::topology::{check_dimensions, BaseVertex, Edge, Topology};

/// Diagonals are added on cells where `(x + y) % DIAGONAL_MODULUS == 0`.
pub const DIAGONAL_MODULUS: usize = 3;

/// Half-extent of the sheet in scene units.
const PLANE_EXTENT: Vec2 = Vec2::new(1.35, 0.85);
const PLANE_JITTER: f32 = 0.03;
const DEPTH_JITTER: f32 = 0.04;
const RIPPLE_AMPLITUDE: f32 = 0.08;

/// Oscillating rotation angle: `bias + amplitude * sin(2πt / period)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rocking {
    bias: f32,
    amplitude: f32,
    period: f32,
}

impl Rocking {
    fn angle(&self, t: f32) -> f32 {
        self.bias + self.amplitude * (TAU * t / self.period).sin()
    }
}

const ROCK_X: Rocking = Rocking { bias: 0.62, amplitude: 0.12, period: 38.0 };
const ROCK_Y: Rocking = Rocking { bias: -0.28, amplitude: 0.14, period: 52.0 };

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub cols: usize,
    pub rows: usize,
    /// Seed for the construction-time jitter.
    pub seed: u64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cols: 34,
            rows: 20,
            seed: 0x6d65_7368,
        }
    }
}

impl GridLayout {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows, ..Self::default() }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }
}

/// Static sum-of-sinusoids relief over normalized coordinates.
pub fn surface_height(nx: f32, ny: f32) -> f32 {
    0.22 * (1.7 * nx + 0.6).sin() * (1.3 * ny).cos() + 0.10 * (2.9 * nx - 2.1 * ny).sin()
}

fn normalized(i: usize, count: usize) -> f32 {
    i as f32 / (count - 1) as f32 * 2.0 - 1.0
}

impl Layout for GridLayout {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn build_topology(&self) -> Result<Topology> {
        check_dimensions(self.name(), self.cols, self.rows)?;
        let (cols, rows) = (self.cols, self.rows);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut vertices = Vec::with_capacity(cols * rows);
        for y in 0..rows {
            for x in 0..cols {
                let param = Vec2::new(normalized(x, cols), normalized(y, rows));
                let plane = param * PLANE_EXTENT;
                let jitter = Vec3::new(
                    rng.gen_range(-PLANE_JITTER..=PLANE_JITTER),
                    rng.gen_range(-PLANE_JITTER..=PLANE_JITTER),
                    rng.gen_range(-DEPTH_JITTER..=DEPTH_JITTER),
                );
                vertices.push(BaseVertex {
                    position: plane.extend(surface_height(param.x, param.y)) + jitter,
                    param,
                });
            }
        }

        let mut edges = Vec::new();
        for y in 0..rows {
            for x in 0..cols {
                let here = self.index(x, y);
                let has_right = x + 1 < cols;
                let has_down = y + 1 < rows;
                if has_right {
                    edges.push(Edge::new(here, self.index(x + 1, y)));
                }
                if has_down {
                    edges.push(Edge::new(here, self.index(x, y + 1)));
                }
                if has_right && has_down && (x + y) % DIAGONAL_MODULUS == 0 {
                    edges.push(Edge::new(here, self.index(x + 1, y + 1)));
                }
            }
        }

        log::debug!("Built grid topology: {} vertices, {} edges", vertices.len(), edges.len());
        Ok(Topology::new(vertices, edges))
    }

    fn deform(&self, vertex: &BaseVertex, t: f32) -> Vec3 {
        let base = vertex.position;
        let ripple = RIPPLE_AMPLITUDE * (0.9 * t + 3.0 * base.x + 2.0 * base.y).sin();
        base + Vec3::Z * ripple
    }

    fn rotation(&self, t: f32) -> Mat3 {
        // X first, then Y
        Mat3::from_rotation_y(ROCK_Y.angle(t)) * Mat3::from_rotation_x(ROCK_X.angle(t))
    }

    fn style(&self) -> &StyleConstants {
        &StyleConstants::GRID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;

    #[test]
    fn four_by_three_edge_list() {
        let layout = GridLayout::new(4, 3);
        let topology = layout.build_topology().unwrap();
        assert_eq!(topology.vertex_count(), 12);

        let expected: Vec<Edge> = [
            // y = 0
            (0, 1), (0, 4), (0, 5),
            (1, 2), (1, 5),
            (2, 3), (2, 6),
            (3, 7),
            // y = 1
            (4, 5), (4, 8),
            (5, 6), (5, 9),
            (6, 7), (6, 10), (6, 11),
            (7, 11),
            // y = 2
            (8, 9),
            (9, 10),
            (10, 11),
        ]
        .into_iter()
        .map(Edge::from)
        .collect();
        assert_eq!(topology.edges(), expected.as_slice());

        let horizontal = topology.edges().iter().filter(|e| e.b == e.a + 1).count();
        let vertical = topology.edges().iter().filter(|e| e.b == e.a + 4).count();
        assert_eq!((horizontal, vertical), (9, 8));
    }

    #[test]
    fn degenerate_dimensions_are_rejected() {
        for (cols, rows) in [(1, 3), (4, 1), (0, 5)] {
            assert!(matches!(
                GridLayout::new(cols, rows).build_topology(),
                Err(MeshError::InvalidTopologyParameters { layout: "grid", .. })
            ));
        }
    }

    #[test]
    fn jitter_is_reproducible_per_seed() {
        let a = GridLayout::new(6, 5).with_seed(7).build_topology().unwrap();
        let b = GridLayout::new(6, 5).with_seed(7).build_topology().unwrap();
        let c = GridLayout::new(6, 5).with_seed(8).build_topology().unwrap();
        assert_eq!(a.vertices(), b.vertices());
        assert_ne!(a.vertices(), c.vertices());
    }

    #[test]
    fn jitter_is_bounded() {
        let layout = GridLayout::new(9, 7);
        let topology = layout.build_topology().unwrap();
        for vertex in topology.vertices() {
            let rest = (vertex.param * PLANE_EXTENT).extend(surface_height(vertex.param.x, vertex.param.y));
            let offset = (vertex.position - rest).abs();
            assert!(offset.x <= PLANE_JITTER + 1e-6);
            assert!(offset.y <= PLANE_JITTER + 1e-6);
            assert!(offset.z <= DEPTH_JITTER + 1e-6);
        }
    }

    #[test]
    fn corners_span_the_normalized_square() {
        let layout = GridLayout::new(5, 4);
        let topology = layout.build_topology().unwrap();
        assert_eq!(topology.vertices()[0].param, Vec2::new(-1.0, -1.0));
        assert_eq!(topology.vertices()[layout.index(4, 3)].param, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn ripple_only_moves_depth() {
        let layout = GridLayout::default();
        let topology = layout.build_topology().unwrap();
        for vertex in topology.vertices().iter().step_by(7) {
            let live = layout.deform(vertex, 12.5);
            assert_eq!(live.x, vertex.position.x);
            assert_eq!(live.y, vertex.position.y);
            assert!((live.z - vertex.position.z).abs() <= RIPPLE_AMPLITUDE + 1e-6);
            assert_eq!(live, layout.deform(vertex, 12.5));
        }
    }

    #[test]
    fn rocking_stays_near_bias() {
        let layout = GridLayout::default();
        for t in [0.0, 9.5, 19.0, 600.0, 1.0e5] {
            let angle_x = ROCK_X.angle(t);
            let angle_y = ROCK_Y.angle(t);
            assert!((angle_x - ROCK_X.bias).abs() <= ROCK_X.amplitude + 1e-6);
            assert!((angle_y - ROCK_Y.bias).abs() <= ROCK_Y.amplitude + 1e-6);
            assert!(layout.rotation(t).is_finite());
        }
        let expected = Mat3::from_rotation_y(-0.28) * Mat3::from_rotation_x(0.62);
        assert!(layout.rotation(0.0).abs_diff_eq(expected, 1e-6));
    }
}
