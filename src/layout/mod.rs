// src/layout/mod.rs
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::style::StyleConstants;
use crate::topology::{BaseVertex, Topology};

pub mod grid;
pub mod torus;

pub use grid::GridLayout;
pub use torus::TorusLayout;

/// Everything that distinguishes one mesh variant from another.
///
/// The animator owns the frame pipeline; a layout only supplies the topology,
/// the per-vertex deformation, the global rotation and its styling constants.
pub trait Layout {
    fn name(&self) -> &'static str;

    /// Builds the fixed vertex/edge set. Called once per animator.
    fn build_topology(&self) -> Result<Topology>;

    /// Live position of `vertex` at `t` seconds. Must be a pure function.
    fn deform(&self, vertex: &BaseVertex, t: f32) -> Vec3;

    /// Global rotation applied after deformation.
    fn rotation(&self, t: f32) -> Mat3;

    fn style(&self) -> &StyleConstants;
}

/// The two supported layouts, selectable from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum MeshLayout {
    Torus(TorusLayout),
    Grid(GridLayout),
}

impl Default for MeshLayout {
    fn default() -> Self {
        MeshLayout::Torus(TorusLayout::default())
    }
}

impl Layout for MeshLayout {
    fn name(&self) -> &'static str {
        match self {
            MeshLayout::Torus(l) => l.name(),
            MeshLayout::Grid(l) => l.name(),
        }
    }

    fn build_topology(&self) -> Result<Topology> {
        match self {
            MeshLayout::Torus(l) => l.build_topology(),
            MeshLayout::Grid(l) => l.build_topology(),
        }
    }

    fn deform(&self, vertex: &BaseVertex, t: f32) -> Vec3 {
        match self {
            MeshLayout::Torus(l) => l.deform(vertex, t),
            MeshLayout::Grid(l) => l.deform(vertex, t),
        }
    }

    fn rotation(&self, t: f32) -> Mat3 {
        match self {
            MeshLayout::Torus(l) => l.rotation(t),
            MeshLayout::Grid(l) => l.rotation(t),
        }
    }

    fn style(&self) -> &StyleConstants {
        match self {
            MeshLayout::Torus(l) => l.style(),
            MeshLayout::Grid(l) => l.style(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_deserialize_from_tagged_json() {
        let torus: MeshLayout = serde_json::from_str(r#"{"layout":"torus","seg_u":32}"#).unwrap();
        match torus {
            MeshLayout::Torus(t) => {
                assert_eq!(t.seg_u, 32);
                assert_eq!(t.seg_v, TorusLayout::default().seg_v);
            }
            other => panic!("expected torus, got {other:?}"),
        }

        let grid: MeshLayout = serde_json::from_str(r#"{"layout":"grid","cols":4,"rows":3,"seed":9}"#).unwrap();
        assert_eq!(grid.name(), "grid");
        assert_eq!(grid.build_topology().unwrap().vertex_count(), 12);
    }

    #[test]
    fn dispatch_matches_concrete_layouts() {
        let torus = TorusLayout::default();
        let wrapped = MeshLayout::Torus(torus.clone());
        let topology = torus.build_topology().unwrap();
        let v = &topology.vertices()[5];
        assert_eq!(wrapped.deform(v, 4.2), torus.deform(v, 4.2));
        assert_eq!(wrapped.rotation(4.2), torus.rotation(4.2));
        assert_eq!(wrapped.style(), torus.style());
    }
}
