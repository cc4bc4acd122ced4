// src/camera.rs
// Perspective projection from scene units to logical screen pixels.
use glam::{Vec2, Vec3};

/// Device pixel ratios outside this range are clamped.
pub const MIN_PIXEL_RATIO: f32 = 1.0;
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Smallest camera denominator `D + z` used by the perspective divide.
pub const MIN_DEPTH_DENOMINATOR: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,  // logical (CSS) pixels
    pub height: f32, // logical (CSS) pixels
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Floors the logical size to whole pixels and clamps the pixel ratio.
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let pixel_ratio = if pixel_ratio.is_finite() {
            pixel_ratio.clamp(MIN_PIXEL_RATIO, MAX_PIXEL_RATIO)
        } else {
            MIN_PIXEL_RATIO
        };
        Self {
            width: width.max(0.0).floor(),
            height: height.max(0.0).floor(),
            pixel_ratio,
        }
    }

    /// Builds a viewport from a physical surface size, as reported by a window.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = scale_factor as f32;
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self::new(width as f32 / scale, height as f32 / scale, scale)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Size of the backing store in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).floor() as u32,
            (self.height * self.pixel_ratio).floor() as u32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Per-frame projection output: screen position plus the pre-projection depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectedPoint {
    pub screen: Vec2,
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Camera distance `D` in scene units.
    pub distance: f32,
    /// Fraction `k` of the smaller viewport side that one scene unit spans.
    pub scale_factor: f32,
    /// Current logical viewport; its centre is the projection origin.
    viewport: Viewport,
    /// Cached `min(width, height) * scale_factor`, refreshed on resize.
    scale: f32,
}

impl PerspectiveCamera {
    pub fn new(distance: f32, scale_factor: f32, viewport: Viewport) -> Self {
        let mut camera = Self {
            distance,
            scale_factor,
            viewport,
            scale: 0.0,
        };
        camera.update_viewport(viewport);
        camera
    }

    /// Called whenever the host viewport changes.
    pub fn update_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.scale = viewport.width.min(viewport.height) * self.scale_factor;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Maps a scene point to screen pixels; the origin lands on the viewport centre.
    pub fn project(&self, p: Vec3) -> ProjectedPoint {
        let denominator = (self.distance + p.z).max(MIN_DEPTH_DENOMINATOR);
        let depth_factor = self.distance / denominator;
        let center = self.viewport.center();
        ProjectedPoint {
            screen: Vec2::new(
                p.x * depth_factor * self.scale + center.x,
                p.y * depth_factor * self.scale + center.y,
            ),
            depth: p.z,
        }
    }

    /// Projects a whole slice, reusing `out`.
    pub fn project_into(&self, points: &[Vec3], out: &mut Vec<ProjectedPoint>) {
        out.clear();
        out.extend(points.iter().map(|&p| self.project(p)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn origin_projects_to_viewport_center() {
        let camera = PerspectiveCamera::new(3.0, 0.38, Viewport::new(800.0, 600.0, 1.0));
        let p = camera.project(Vec3::ZERO);
        assert_eq!(p.screen, Vec2::new(400.0, 300.0));
        assert_eq!(p.depth, 0.0);
    }

    #[test]
    fn resize_moves_the_center() {
        let mut camera = PerspectiveCamera::new(2.7, 0.42, Viewport::new(800.0, 600.0, 1.0));
        camera.update_viewport(Viewport::new(1280.0, 720.0, 2.0));
        assert_eq!(camera.project(Vec3::ZERO).screen, Vec2::new(640.0, 360.0));
    }

    #[test]
    fn perspective_divide_scales_with_depth() {
        let camera = PerspectiveCamera::new(3.0, 0.5, Viewport::new(200.0, 100.0, 1.0));
        // S = min(200, 100) * 0.5 = 50
        let near = camera.project(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(near.screen.x, 150.0));
        let far = camera.project(Vec3::new(1.0, 0.0, 3.0));
        assert!(approx(far.screen.x, 100.0 + 25.0));
        assert_eq!(far.depth, 3.0);
    }

    #[test]
    fn behind_camera_stays_finite() {
        let camera = PerspectiveCamera::new(3.0, 0.38, Viewport::new(800.0, 600.0, 1.0));
        for z in [-3.0, -3.0 - 1e-7, -10.0] {
            let p = camera.project(Vec3::new(0.5, 0.5, z));
            assert!(p.screen.is_finite(), "z = {z} gave {:?}", p.screen);
        }
    }

    #[test]
    fn viewport_clamps_ratio_and_floors_size() {
        let v = Viewport::new(800.7, 600.2, 3.5);
        assert_eq!((v.width, v.height, v.pixel_ratio), (800.0, 600.0, 2.0));
        assert_eq!(v.backing_size(), (1600, 1200));
        assert_eq!(Viewport::new(10.0, 10.0, 0.5).pixel_ratio, 1.0);
        assert_eq!(Viewport::new(10.0, 10.0, f32::NAN).pixel_ratio, 1.0);
    }

    #[test]
    fn viewport_from_physical_divides_by_scale() {
        let v = Viewport::from_physical(1600, 1200, 2.0);
        assert_eq!((v.width, v.height, v.pixel_ratio), (800.0, 600.0, 2.0));
    }
}
