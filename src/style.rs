// src/style.rs
// Depth fog: per-layout alpha tuning and the background radial gradient.
use bevy_color::{Alpha, Srgba};
use glam::Vec2;

use crate::camera::{ProjectedPoint, Viewport};

/// Added to the depth span so a coplanar frame never divides by zero.
pub const DEPTH_EPSILON: f32 = 1e-6;

/// Tuning for one layout. Closer geometry is drawn more opaque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleConstants {
    /// Stroke and fill colour; only its alpha varies with depth.
    pub ink: Srgba,
    /// Edge stroke width in logical pixels.
    pub line_width: f32,
    /// Alpha of the farthest edge.
    pub edge_alpha: f32,
    /// Extra alpha added as an edge approaches the nearest depth.
    pub edge_alpha_range: f32,
    /// Every `point_stride`-th vertex is drawn as a filled point.
    pub point_stride: usize,
    pub point_radius: f32, // px, farthest
    pub point_radius_range: f32,
    pub point_alpha: f32,
    pub point_alpha_range: f32,
    /// Camera distance `D` handed to the `PerspectiveCamera`.
    pub camera_distance: f32,
    /// Projection scale `k`, as a fraction of the smaller viewport side.
    pub scale_factor: f32,
    pub fog: FogStyle,
}

impl StyleConstants {
    pub const TORUS: Self = Self {
        ink: Srgba::WHITE,
        line_width: 1.0,
        edge_alpha: 0.08,
        edge_alpha_range: 0.26,
        point_stride: 37,
        point_radius: 1.0,
        point_radius_range: 1.4,
        point_alpha: 0.04,
        point_alpha_range: 0.11,
        camera_distance: 3.0,
        scale_factor: 0.38,
        fog: FogStyle::DEFAULT,
    };

    pub const GRID: Self = Self {
        ink: Srgba::WHITE,
        line_width: 1.0,
        edge_alpha: 0.10,
        edge_alpha_range: 0.22,
        point_stride: 19,
        point_radius: 0.9,
        point_radius_range: 1.2,
        point_alpha: 0.05,
        point_alpha_range: 0.10,
        camera_distance: 2.7,
        scale_factor: 0.42,
        fog: FogStyle::DEFAULT,
    };

    /// Stroke alpha for an edge at normalized depth `zn`.
    pub fn edge_alpha_at(&self, zn: f32) -> f32 {
        self.edge_alpha + (1.0 - zn) * self.edge_alpha_range
    }

    pub fn point_alpha_at(&self, zn: f32) -> f32 {
        self.point_alpha + (1.0 - zn) * self.point_alpha_range
    }

    pub fn point_radius_at(&self, zn: f32) -> f32 {
        self.point_radius + (1.0 - zn) * self.point_radius_range
    }

    pub fn edge_color(&self, zn: f32) -> Srgba {
        self.ink.with_alpha(self.edge_alpha_at(zn))
    }

    pub fn point_color(&self, zn: f32) -> Srgba {
        self.ink.with_alpha(self.point_alpha_at(zn))
    }
}

/// Depth extent of one frame's projected points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    pub min: f32,
    pub max: f32,
}

impl DepthRange {
    pub fn from_points(points: &[ProjectedPoint]) -> Self {
        points.iter().fold(
            Self { min: f32::INFINITY, max: f32::NEG_INFINITY },
            |range, p| Self {
                min: range.min.min(p.depth),
                max: range.max.max(p.depth),
            },
        )
    }

    /// Maps `z` to `[0, 1]`, 0 being the nearest point of the frame.
    pub fn normalize(&self, z: f32) -> f32 {
        let zn = (z - self.min) / (self.max - self.min + DEPTH_EPSILON);
        if zn.is_finite() { zn.clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// Fog gradient expressed relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogStyle {
    /// Inner circle centre as a fraction of the viewport size.
    pub inner_center: Vec2,
    pub outer_center: Vec2,
    /// Outer radius as a fraction of the larger viewport side.
    pub outer_radius: f32,
    pub inner_color: Srgba,
    pub outer_color: Srgba,
}

impl FogStyle {
    pub const DEFAULT: Self = Self {
        inner_center: Vec2::new(0.5, 0.35),
        outer_center: Vec2::new(0.5, 0.5),
        outer_radius: 0.75,
        inner_color: Srgba::new(1.0, 1.0, 1.0, 0.055),
        outer_color: Srgba::new(0.0, 0.0, 0.0, 0.40),
    };

    pub fn gradient(&self, viewport: &Viewport) -> RadialGradient {
        let size = Vec2::new(viewport.width, viewport.height);
        RadialGradient {
            start: size * self.inner_center,
            start_radius: 0.0,
            end: size * self.outer_center,
            end_radius: viewport.width.max(viewport.height) * self.outer_radius,
            stops: [(0.0, self.inner_color), (1.0, self.outer_color)],
        }
    }
}

/// Two-circle radial gradient in screen pixels with two colour stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient {
    pub start: Vec2,
    pub start_radius: f32,
    pub end: Vec2,
    pub end_radius: f32,
    pub stops: [(f32, Srgba); 2],
}

impl RadialGradient {
    /// Gradient parameter at `point`, clamped to `[0, 1]`.
    ///
    /// Follows the canvas rule: the largest `w` such that `point` lies on the
    /// circle interpolated between the start and end circles, with a
    /// non-negative radius.
    pub fn offset_at(&self, point: Vec2) -> f32 {
        let cd = self.end - self.start;
        let dr = self.end_radius - self.start_radius;
        let q = point - self.start;

        // |q - w*cd| = r0 + w*dr  =>  a*w^2 - 2*b*w + c = 0
        let a = cd.dot(cd) - dr * dr;
        let b = q.dot(cd) + self.start_radius * dr;
        let c = q.dot(q) - self.start_radius * self.start_radius;

        let w = if a.abs() < f32::EPSILON {
            if b.abs() < f32::EPSILON { 0.0 } else { c / (2.0 * b) }
        } else {
            let disc = b * b - a * c;
            if disc < 0.0 {
                return 0.0;
            }
            let sqrt = disc.sqrt();
            let (w0, w1) = ((b + sqrt) / a, (b - sqrt) / a);
            let (hi, lo) = if w0 > w1 { (w0, w1) } else { (w1, w0) };
            if self.start_radius + hi * dr >= 0.0 { hi } else { lo }
        };
        if w.is_finite() { w.clamp(0.0, 1.0) } else { 0.0 }
    }

    pub fn sample(&self, point: Vec2) -> Srgba {
        let w = self.offset_at(point);
        let [(o0, c0), (o1, c1)] = self.stops;
        let span = o1 - o0;
        let f = if span.abs() < f32::EPSILON { 1.0 } else { ((w - o0) / span).clamp(0.0, 1.0) };
        Srgba::new(
            c0.red + (c1.red - c0.red) * f,
            c0.green + (c1.green - c0.green) * f,
            c0.blue + (c1.blue - c0.blue) * f,
            c0.alpha + (c1.alpha - c0.alpha) * f,
        )
    }
}

/// Canvas colour string, e.g. `rgba(255,255,255,0.080)`.
pub fn css_rgba(color: Srgba) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({},{},{},{:.3})",
        channel(color.red),
        channel(color.green),
        channel(color.blue),
        color.alpha.clamp(0.0, 1.0)
    )
}
