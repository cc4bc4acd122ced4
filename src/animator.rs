// src/animator.rs
// Per-frame pipeline: deform -> rotate -> project -> depth fog -> draw.
use glam::{Vec2, Vec3};

use crate::camera::{PerspectiveCamera, ProjectedPoint, Viewport};
use crate::error::Result;
use crate::layout::{Layout, MeshLayout};
use crate::style::DepthRange;
use crate::surface::DrawSurface;
use crate::topology::Topology;

pub struct MeshAnimator<L: Layout = MeshLayout> {
    layout: L,
    topology: Topology,
    camera: PerspectiveCamera,

    // Scratch buffers, fully overwritten every frame.
    live: Vec<Vec3>,
    projected: Vec<ProjectedPoint>,
    depth_range: DepthRange,
}

impl<L: Layout> MeshAnimator<L> {
    /// Builds the topology once. Fails only on degenerate layout dimensions.
    pub fn new(layout: L, viewport: Viewport) -> Result<Self> {
        let topology = layout.build_topology()?;
        let style = layout.style();
        let camera = PerspectiveCamera::new(style.camera_distance, style.scale_factor, viewport);
        let vertex_count = topology.vertex_count();

        log::info!(
            "Mesh animator ready: {} layout, {} vertices, {} edges",
            layout.name(),
            vertex_count,
            topology.edge_count()
        );

        Ok(Self {
            layout,
            topology,
            camera,
            live: Vec::with_capacity(vertex_count),
            projected: Vec::with_capacity(vertex_count),
            depth_range: DepthRange { min: 0.0, max: 0.0 },
        })
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn viewport(&self) -> Viewport {
        self.camera.viewport()
    }

    /// Invalidates the last projection; the next `draw` needs a fresh `update`.
    pub fn resize(&mut self, viewport: Viewport) {
        self.camera.update_viewport(viewport);
        self.projected.clear();
    }

    /// True once `update` has projected every vertex for the current viewport.
    pub fn has_frame(&self) -> bool {
        self.projected.len() == self.topology.vertex_count()
    }

    /// Projects an arbitrary scene point with the current camera.
    pub fn project(&self, p: Vec3) -> ProjectedPoint {
        self.camera.project(p)
    }

    /// Post-rotation positions from the last `update`.
    pub fn live_positions(&self) -> &[Vec3] {
        &self.live
    }

    pub fn projected(&self) -> &[ProjectedPoint] {
        &self.projected
    }

    pub fn depth_range(&self) -> DepthRange {
        self.depth_range
    }

    /// Recomputes every live and projected position for time `t` (seconds).
    pub fn update(&mut self, t: f32) {
        let rotation = self.layout.rotation(t);
        let layout = &self.layout;
        self.live.clear();
        self.live.extend(
            self.topology
                .vertices()
                .iter()
                .map(|vertex| rotation * layout.deform(vertex, t)),
        );

        self.camera.project_into(&self.live, &mut self.projected);
        self.depth_range = DepthRange::from_points(&self.projected);
    }

    /// Draws the last computed frame: clear, fog, edges, then sample points.
    /// Draws nothing before the first `update` or after a `resize`.
    pub fn draw(&self, surface: &mut impl DrawSurface) {
        if !self.has_frame() {
            log::debug!("No projected frame to draw; call update first");
            return;
        }
        let style = self.layout.style();
        let viewport = self.camera.viewport();
        let size = Vec2::new(viewport.width, viewport.height);

        surface.clear(size);
        surface.fill_radial_gradient(&style.fog.gradient(&viewport), size);

        for edge in self.topology.edges() {
            let (a, b) = (self.projected[edge.a], self.projected[edge.b]);
            let zn = self.depth_range.normalize((a.depth + b.depth) * 0.5);
            surface.stroke_line(a.screen, b.screen, style.line_width, style.edge_color(zn));
        }

        for p in self.projected.iter().step_by(style.point_stride.max(1)) {
            let zn = self.depth_range.normalize(p.depth);
            surface.fill_circle(p.screen, style.point_radius_at(zn), style.point_color(zn));
        }
    }

    pub fn render_frame(&mut self, t: f32, surface: &mut impl DrawSurface) {
        self.update(t);
        self.draw(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GridLayout, TorusLayout};
    use crate::surface::{CommandList, DrawCommand};

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0, 1.0)
    }

    #[test]
    fn degenerate_layout_fails_construction() {
        assert!(MeshAnimator::new(TorusLayout::new(1, 8), viewport()).is_err());
        assert!(MeshAnimator::new(GridLayout::new(3, 0), viewport()).is_err());
    }

    #[test]
    fn update_is_a_pure_function_of_time() {
        let mut animator = MeshAnimator::new(TorusLayout::new(16, 8), viewport()).unwrap();
        animator.update(3.25);
        let first = animator.live_positions().to_vec();
        animator.update(99.0);
        animator.update(3.25);
        assert_eq!(animator.live_positions(), first.as_slice());
    }

    #[test]
    fn frame_draws_in_fixed_order() {
        let layout = TorusLayout::new(12, 6);
        let mut animator = MeshAnimator::new(layout, viewport()).unwrap();
        let mut surface = CommandList::default();
        animator.render_frame(0.0, &mut surface);

        let commands = surface.commands();
        let edges = animator.topology().edge_count();
        let points = animator.topology().vertex_count().div_ceil(37);
        assert_eq!(commands.len(), 2 + edges + points);
        assert!(matches!(commands[0], DrawCommand::Clear { .. }));
        assert!(matches!(commands[1], DrawCommand::FillGradient { .. }));
        assert!(commands[2..2 + edges].iter().all(|c| matches!(c, DrawCommand::StrokeLine { .. })));
        assert!(commands[2 + edges..].iter().all(|c| matches!(c, DrawCommand::FillCircle { .. })));
    }

    #[test]
    fn stroke_alpha_stays_in_configured_band() {
        let layout = GridLayout::new(10, 8);
        let style = *layout.style();
        let mut animator = MeshAnimator::new(layout, viewport()).unwrap();
        let mut surface = CommandList::default();
        animator.render_frame(17.0, &mut surface);

        let range = animator.depth_range();
        assert!(range.max > range.min);
        for command in surface.commands() {
            if let DrawCommand::StrokeLine { color, .. } = command {
                assert!(color.alpha >= style.edge_alpha - 1e-6);
                assert!(color.alpha <= style.edge_alpha + style.edge_alpha_range + 1e-6);
                assert_eq!((color.red, color.green, color.blue), (1.0, 1.0, 1.0));
            }
        }
    }

    #[test]
    fn projections_follow_resize() {
        let mut animator = MeshAnimator::new(GridLayout::new(4, 3), viewport()).unwrap();
        animator.update(1.0);
        let before = animator.projected()[0].screen;
        animator.resize(Viewport::new(1600.0, 1200.0, 2.0));
        animator.update(1.0);
        let after = animator.projected()[0].screen;
        // doubling the viewport doubles every screen coordinate
        assert!((after - before * 2.0).length() < 1e-3);
        assert_eq!(animator.project(Vec3::ZERO).screen, Vec2::new(800.0, 600.0));
    }

    #[test]
    fn draw_before_update_records_nothing() {
        let animator = MeshAnimator::new(GridLayout::new(4, 3), viewport()).unwrap();
        let mut surface = CommandList::default();
        animator.draw(&mut surface);
        assert!(surface.is_empty());
        assert!(!animator.has_frame());
    }

    #[test]
    fn resize_discards_stale_projections() {
        let mut animator = MeshAnimator::new(GridLayout::new(4, 3), viewport()).unwrap();
        animator.update(2.0);
        assert!(animator.has_frame());

        animator.resize(Viewport::new(1024.0, 768.0, 1.0));
        let mut surface = CommandList::default();
        animator.draw(&mut surface);
        assert!(surface.is_empty());

        animator.update(2.0);
        animator.draw(&mut surface);
        assert_eq!(surface.frame_count(), 1);
    }
}
