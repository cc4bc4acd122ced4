// src/frame_loop.rs
// Drives a MeshAnimator from a host frame clock.
use crate::animator::MeshAnimator;
use crate::camera::Viewport;
use crate::layout::{Layout, MeshLayout};
use crate::surface::DrawSurface;

/// Opaque id of a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host clock that invokes `FrameLoop::tick` once per display refresh.
pub trait FrameScheduler {
    /// Asks the host for one more tick.
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running(FrameHandle),
    /// Reduced motion: a single static frame was drawn.
    Static,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was drawn and the next one requested.
    Drawn,
    /// The tick arrived while the loop was not running.
    Ignored,
}

pub struct FrameLoop<L: Layout = MeshLayout> {
    animator: MeshAnimator<L>,
    reduced_motion: bool,
    state: LoopState,
    pending_viewport: Option<Viewport>,
    needs_configure: bool,
    frames_drawn: u64,
    /// Host timestamp of the first tick; animation time counts from here.
    origin_ms: Option<f64>,
}

impl<L: Layout> FrameLoop<L> {
    /// `reduced_motion` is sampled once here and never re-read.
    pub fn new(animator: MeshAnimator<L>, reduced_motion: bool) -> Self {
        Self {
            animator,
            reduced_motion,
            state: LoopState::Idle,
            pending_viewport: None,
            needs_configure: true,
            frames_drawn: 0,
            origin_ms: None,
        }
    }

    pub fn animator(&self) -> &MeshAnimator<L> {
        &self.animator
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running(_))
    }

    /// Starts the loop. With reduced motion, draws one frame at `t = 0` and
    /// never requests another.
    pub fn start(&mut self, scheduler: &mut impl FrameScheduler, surface: &mut impl DrawSurface) {
        if self.state != LoopState::Idle {
            log::warn!("Frame loop already started ({:?}); ignoring start", self.state);
            return;
        }

        if self.reduced_motion {
            log::info!("Reduced motion preferred: drawing a single static frame");
            self.draw(0.0, surface);
            self.state = LoopState::Static;
            return;
        }

        log::info!("Starting {} mesh animation", self.animator.layout().name());
        self.state = LoopState::Running(scheduler.request_frame());
    }

    /// Cancels the pending frame, if any. The loop cannot be restarted.
    pub fn stop(&mut self, scheduler: &mut impl FrameScheduler) {
        if let LoopState::Running(handle) = self.state {
            scheduler.cancel_frame(handle);
            log::info!("Mesh animation stopped after {} frames", self.frames_drawn);
        }
        self.state = LoopState::Stopped;
    }

    /// Records a viewport change; applied before the next frame is projected.
    pub fn resize(&mut self, viewport: Viewport) {
        log::info!("Resize {}x{} @{}x", viewport.width, viewport.height, viewport.pixel_ratio);
        self.pending_viewport = Some(viewport);
    }

    /// One host clock tick. `timestamp_ms` is monotonic milliseconds from an
    /// arbitrary epoch; the first tick renders `t = 0`.
    pub fn tick(
        &mut self,
        timestamp_ms: f64,
        scheduler: &mut impl FrameScheduler,
        surface: &mut impl DrawSurface,
    ) -> FrameOutcome {
        if !self.is_running() {
            return FrameOutcome::Ignored;
        }
        let origin_ms = *self.origin_ms.get_or_insert(timestamp_ms);
        // subtract in f64: an epoch-scale timestamp has no sub-second f32 precision
        self.draw(((timestamp_ms - origin_ms) * 0.001) as f32, surface);
        self.state = LoopState::Running(scheduler.request_frame());
        FrameOutcome::Drawn
    }

    fn draw(&mut self, t: f32, surface: &mut impl DrawSurface) {
        if let Some(viewport) = self.pending_viewport.take() {
            self.animator.resize(viewport);
            self.needs_configure = true;
        }
        if self.needs_configure {
            surface.configure(&self.animator.viewport());
            self.needs_configure = false;
        }
        self.animator.render_frame(t, surface);
        self.frames_drawn += 1;
    }
}
