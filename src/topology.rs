// src/topology.rs
// Fixed vertex/edge set shared by every layout.
use glam::{Vec2, Vec3};

use crate::error::{MeshError, Result};

/// Smallest accepted value for any layout dimension.
pub const MIN_DIMENSION: usize = 2;

/// A vertex as built once at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseVertex {
    /// Rest position in scene units, jitter included.
    pub position: Vec3,
    /// Surface parameters the layout deforms from: `(U, V)` angles for the
    /// torus, `(nx, ny)` in `[-1, 1]` for the grid.
    pub param: Vec2,
}

/// Unordered pair of vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    pub const fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }
}

impl From<(usize, usize)> for Edge {
    fn from((a, b): (usize, usize)) -> Self {
        Self::new(a, b)
    }
}

#[derive(Debug, Clone)]
pub struct Topology {
    vertices: Vec<BaseVertex>,
    edges: Vec<Edge>,
}

impl Topology {
    /// Builds a topology, checking that every edge endpoint is a valid index.
    pub fn new(vertices: Vec<BaseVertex>, edges: Vec<Edge>) -> Self {
        debug_assert!(
            edges.iter().all(|e| e.a < vertices.len() && e.b < vertices.len()),
            "edge endpoint out of range"
        );
        Self { vertices, edges }
    }

    pub fn vertices(&self) -> &[BaseVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Rejects layouts with a dimension below [`MIN_DIMENSION`].
pub fn check_dimensions(layout: &'static str, first: usize, second: usize) -> Result<()> {
    if first < MIN_DIMENSION || second < MIN_DIMENSION {
        return Err(MeshError::InvalidTopologyParameters { layout, first, second });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_below_two_are_rejected() {
        assert!(check_dimensions("grid", 2, 2).is_ok());
        for (first, second) in [(1, 5), (5, 1), (0, 0)] {
            match check_dimensions("grid", first, second) {
                Err(MeshError::InvalidTopologyParameters { layout, .. }) => assert_eq!(layout, "grid"),
                other => panic!("expected InvalidTopologyParameters, got {other:?}"),
            }
        }
    }

    #[test]
    fn edge_from_tuple() {
        assert_eq!(Edge::from((3, 7)), Edge::new(3, 7));
    }
}
