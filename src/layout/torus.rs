// src/layout/torus.rs
// Breathing, bending torus spinning at one revolution per minute.
use std::f32::consts::TAU;

use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::Layout;
use crate::error::Result;
use crate::style::StyleConstants;
use crate::topology::{check_dimensions, BaseVertex, Edge, Topology};

/// Spin about the vertical axis: 2π per 60 seconds.
pub const SPIN_RATE: f32 = TAU / 60.0;

/// Diagonals are added on cells where `(u + v) % DIAGONAL_MODULUS == 0`.
pub const DIAGONAL_MODULUS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorusLayout {
    /// Segments around the major ring.
    pub seg_u: usize,
    /// Segments around the tube.
    pub seg_v: usize,
    pub major_radius: f32,
    pub minor_radius: f32,
}

impl Default for TorusLayout {
    fn default() -> Self {
        Self {
            seg_u: 64,
            seg_v: 24,
            major_radius: 1.05,
            minor_radius: 0.42,
        }
    }
}

impl TorusLayout {
    pub fn new(seg_u: usize, seg_v: usize) -> Self {
        Self { seg_u, seg_v, ..Self::default() }
    }

    pub fn index(&self, u: usize, v: usize) -> usize {
        v * self.seg_u + u
    }

    fn surface_point(&self, u_angle: f32, v_angle: f32, tube_radius: f32) -> Vec3 {
        let ring = self.major_radius + tube_radius * v_angle.cos();
        Vec3::new(ring * u_angle.cos(), tube_radius * v_angle.sin(), ring * u_angle.sin())
    }
}

/// Minor-radius breathing factor.
fn pulse(t: f32) -> f32 {
    1.0 + 0.10 * (0.6 * t).sin()
}

fn bend_amount(t: f32) -> f32 {
    0.18 + 0.05 * (0.22 * t).sin()
}

impl Layout for TorusLayout {
    fn name(&self) -> &'static str {
        "torus"
    }

    fn build_topology(&self) -> Result<Topology> {
        check_dimensions(self.name(), self.seg_u, self.seg_v)?;
        let (seg_u, seg_v) = (self.seg_u, self.seg_v);

        let mut vertices = Vec::with_capacity(seg_u * seg_v);
        for v in 0..seg_v {
            for u in 0..seg_u {
                let param = Vec2::new(u as f32 / seg_u as f32 * TAU, v as f32 / seg_v as f32 * TAU);
                vertices.push(BaseVertex {
                    position: self.surface_point(param.x, param.y, self.minor_radius),
                    param,
                });
            }
        }

        let mut edges = Vec::with_capacity(seg_u * seg_v * 2 + seg_u * seg_v / DIAGONAL_MODULUS + 1);
        for v in 0..seg_v {
            for u in 0..seg_u {
                let u1 = (u + 1) % seg_u;
                let v1 = (v + 1) % seg_v;
                let here = self.index(u, v);
                edges.push(Edge::new(here, self.index(u1, v)));
                edges.push(Edge::new(here, self.index(u, v1)));
                if (u + v) % DIAGONAL_MODULUS == 0 {
                    edges.push(Edge::new(here, self.index(u1, v1)));
                }
            }
        }

        log::debug!("Built torus topology: {} vertices, {} edges", vertices.len(), edges.len());
        Ok(Topology::new(vertices, edges))
    }

    fn deform(&self, vertex: &BaseVertex, t: f32) -> Vec3 {
        let Vec2 { x: u_angle, y: v_angle } = vertex.param;

        // tube radius varies along U and with time
        let r = self.minor_radius * pulse(t) * (1.0 + 0.07 * (3.0 * u_angle + 0.9 * t).sin());
        let mut p = self.surface_point(u_angle, v_angle, r);

        let bend = bend_amount(t);
        p.y += bend * 0.35 * (u_angle + 0.25 * t).sin();
        p.z += bend * 0.25 * (2.0 * u_angle - 0.2 * t).cos();
        p
    }

    fn rotation(&self, t: f32) -> Mat3 {
        let spin = SPIN_RATE * t;
        let wobble_x = 0.18 + (0.12 * t).sin() * 0.08;
        let wobble_z = -0.12 + (0.10 * t).cos() * 0.06;
        // Y first, then X, then Z
        Mat3::from_rotation_z(wobble_z) * Mat3::from_rotation_x(wobble_x) * Mat3::from_rotation_y(spin)
    }

    fn style(&self) -> &StyleConstants {
        &StyleConstants::TORUS
    }
}
