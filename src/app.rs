// src/app.rs
// Native host: a winit window whose redraw requests drive the frame loop.
use std::sync::Arc;

use anyhow::Context;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::animator::MeshAnimator;
use crate::app_state::State;
use crate::camera::Viewport;
use crate::config::AnimatorConfig;
use crate::frame_loop::{FrameHandle, FrameLoop, FrameOutcome, FrameScheduler};
use crate::surface::CommandList;

/// Each requested frame becomes one `RedrawRequested` event.
struct RedrawScheduler<'a> {
    window: &'a Window,
    next_id: &'a mut u64,
}

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) -> FrameHandle {
        *self.next_id += 1;
        self.window.request_redraw();
        FrameHandle(*self.next_id)
    }

    fn cancel_frame(&mut self, _handle: FrameHandle) {
        // winit cannot revoke a redraw; the stopped loop ignores the tick instead
    }
}

struct App {
    window: Option<Arc<Window>>,
    state: Option<State>,
    frame_loop: FrameLoop,
    frame: CommandList,
    clock_origin: Instant,
    next_frame_id: u64,
}

impl App {
    fn new(frame_loop: FrameLoop) -> Self {
        Self {
            window: None,
            state: None,
            frame_loop,
            frame: CommandList::default(),
            clock_origin: Instant::now(),
            next_frame_id: 0,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes().with_title("meshbg");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut state = match pollster::block_on(State::new(window.clone())) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Failed to initialise renderer: {e:?}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        state.resize(size.width, size.height);
        self.frame_loop
            .resize(Viewport::from_physical(size.width, size.height, window.scale_factor()));

        let mut scheduler = RedrawScheduler { window: &window, next_id: &mut self.next_frame_id };
        self.frame_loop.start(&mut scheduler, &mut self.frame);
        // a reduced-motion start has already drawn its only frame
        state.upload_frame(&self.frame);

        window.request_redraw();
        self.state = Some(state);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(state)) = (self.window.as_ref(), self.state.as_mut()) else {
            log::warn!("Window event received before State was initialized, ignoring.");
            return;
        };
        let mut scheduler = RedrawScheduler { window, next_id: &mut self.next_frame_id };

        match event {
            WindowEvent::CloseRequested => {
                self.frame_loop.stop(&mut scheduler);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
                self.frame_loop
                    .resize(Viewport::from_physical(size.width, size.height, window.scale_factor()));
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = window.inner_size();
                self.frame_loop
                    .resize(Viewport::from_physical(size.width, size.height, scale_factor));
            }
            WindowEvent::RedrawRequested => {
                let timestamp_ms = self.clock_origin.elapsed().as_secs_f64() * 1000.0;
                self.frame.clear_commands();
                if self.frame_loop.tick(timestamp_ms, &mut scheduler, &mut self.frame) == FrameOutcome::Drawn {
                    state.upload_frame(&self.frame);
                }
                state.update();
                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => state.resize(state.config.width, state.config.height),
                    Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                    Err(e) => log::error!("{:?}", e),
                }
            }
            _ => {}
        }
    }
}

fn load_config() -> anyhow::Result<AnimatorConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(AnimatorConfig::default());
    };
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {path}"))?;
    AnimatorConfig::from_json(&json).with_context(|| format!("invalid config file {path}"))
}

pub fn run() -> anyhow::Result<()> {
    crate::init_logger();

    let config = load_config()?;
    let animator = MeshAnimator::new(config.layout.clone(), Viewport::default())
        .context("failed to build mesh topology")?;
    let frame_loop = FrameLoop::new(animator, config.reduced_motion_or(false));

    let event_loop = EventLoop::new()?;
    let mut app = App::new(frame_loop);
    event_loop.run_app(&mut app)?;

    Ok(())
}
