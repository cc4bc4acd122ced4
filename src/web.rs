// src/web.rs
// Browser host: canvas 2D surface, requestAnimationFrame clock, resize events.
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use bevy_color::Srgba;
use glam::Vec2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animator::MeshAnimator;
use crate::camera::Viewport;
use crate::config::AnimatorConfig;
use crate::frame_loop::{FrameHandle, FrameLoop, FrameScheduler};
use crate::style::{css_rgba, RadialGradient};
use crate::surface::DrawSurface;

const DEFAULT_CANVAS_ID: &str = "bg";
const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

thread_local! {
    /// Canvas ids that currently have a running `MeshBackground`.
    static ACTIVE_CANVASES: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Claims `canvas_id`; false if another background already drives it.
fn claim_canvas(canvas_id: &str) -> bool {
    ACTIVE_CANVASES.with(|active| active.borrow_mut().insert(canvas_id.to_owned()))
}

fn release_canvas(canvas_id: &str) {
    ACTIVE_CANVASES.with(|active| {
        active.borrow_mut().remove(canvas_id);
    });
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// `None` when the canvas is missing or has no 2D context.
    fn find(document: &web_sys::Document, canvas_id: &str) -> Option<Self> {
        let canvas = document
            .get_element_by_id(canvas_id)?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }
}

impl DrawSurface for CanvasSurface {
    fn configure(&mut self, viewport: &Viewport) {
        let (width, height) = viewport.backing_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);

        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", viewport.width));
        let _ = style.set_property("height", &format!("{}px", viewport.height));

        let ratio = viewport.pixel_ratio as f64;
        if let Err(e) = self.ctx.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0) {
            log::warn!("Failed to set canvas transform: {:?}", e);
        }
    }

    fn clear(&mut self, size: Vec2) {
        self.ctx.clear_rect(0.0, 0.0, size.x as f64, size.y as f64);
    }

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient, size: Vec2) {
        let fill = match self.ctx.create_radial_gradient(
            gradient.start.x as f64,
            gradient.start.y as f64,
            gradient.start_radius as f64,
            gradient.end.x as f64,
            gradient.end.y as f64,
            gradient.end_radius as f64,
        ) {
            Ok(fill) => fill,
            Err(e) => {
                log::warn!("Failed to create fog gradient: {:?}", e);
                return;
            }
        };
        for (offset, color) in gradient.stops {
            let _ = fill.add_color_stop(offset, &css_rgba(color));
        }
        self.ctx.set_fill_style_canvas_gradient(&fill);
        self.ctx.fill_rect(0.0, 0.0, size.x as f64, size.y as f64);
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Srgba) {
        self.ctx.set_line_width(width as f64);
        self.ctx.set_stroke_style_str(&css_rgba(color));
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Srgba) {
        self.ctx.set_fill_style_str(&css_rgba(color));
        self.ctx.begin_path();
        self.ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, std::f64::consts::TAU)
            .ok();
        self.ctx.fill();
    }
}

struct RafScheduler {
    window: web_sys::Window,
    callback: FrameCallback,
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let id = match self.callback.borrow().as_ref() {
            Some(cb) => self
                .window
                .request_animation_frame(cb.as_ref().unchecked_ref())
                .unwrap_or_else(|e| {
                    log::warn!("requestAnimationFrame failed: {:?}", e);
                    0
                }),
            None => 0,
        };
        FrameHandle(id as u64)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0 as i32);
    }
}

fn window_viewport(window: &web_sys::Window) -> Viewport {
    let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
    Viewport::new(
        dimension(window.inner_width()),
        dimension(window.inner_height()),
        window.device_pixel_ratio() as f32,
    )
}

fn prefers_reduced_motion(window: &web_sys::Window) -> bool {
    window
        .match_media(REDUCED_MOTION_QUERY)
        .ok()
        .flatten()
        .map(|m| m.matches())
        .unwrap_or(false)
}

struct WebHost {
    frame_loop: FrameLoop,
    surface: CanvasSurface,
    scheduler: RafScheduler,
    resizes: flume::Receiver<Viewport>,
}

impl WebHost {
    fn on_frame(&mut self, timestamp_ms: f64) {
        // only the latest size matters
        if let Some(viewport) = self.resizes.try_iter().last() {
            self.frame_loop.resize(viewport);
        }
        self.frame_loop.tick(timestamp_ms, &mut self.scheduler, &mut self.surface);
    }
}

/// A running background animation. Dropping it stops the animation.
#[wasm_bindgen]
pub struct MeshBackground {
    canvas_id: String,
    window: web_sys::Window,
    host: Rc<RefCell<WebHost>>,
    frame_callback: FrameCallback,
    resize_listener: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl MeshBackground {
    /// Cancels the pending frame and detaches the resize listener.
    pub fn stop(&mut self) {
        {
            let mut host = self.host.borrow_mut();
            let WebHost { frame_loop, scheduler, .. } = &mut *host;
            frame_loop.stop(scheduler);
        }
        if let Some(listener) = self.resize_listener.take() {
            let _ = self
                .window
                .remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref());
        }
        // breaks the closure <-> host cycle
        self.frame_callback.borrow_mut().take();
        release_canvas(&self.canvas_id);
    }

    #[wasm_bindgen(getter, js_name = framesDrawn)]
    pub fn frames_drawn(&self) -> f64 {
        self.host.borrow().frame_loop.frames_drawn() as f64
    }
}

impl Drop for MeshBackground {
    fn drop(&mut self) {
        if self.resize_listener.is_some() {
            self.stop();
        }
    }
}

/// Starts the animation on the canvas with id `canvas_id`.
///
/// Returns `null` (and draws nothing) when the canvas is missing or already
/// animated, including `#bg` when the start hook has claimed it.
#[wasm_bindgen(js_name = startMeshBackground)]
pub fn start_mesh_background(
    canvas_id: &str,
    config_json: Option<String>,
) -> Result<Option<MeshBackground>, JsValue> {
    let config = match config_json {
        Some(json) => AnimatorConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => AnimatorConfig::default(),
    };

    let Some(window) = web_sys::window() else {
        log::warn!("No window available; mesh background not started.");
        return Ok(None);
    };
    let Some(surface) = window.document().and_then(|d| CanvasSurface::find(&d, canvas_id)) else {
        log::warn!("Canvas #{} not found; mesh background not started.", canvas_id);
        return Ok(None);
    };

    let animator = MeshAnimator::new(config.layout, window_viewport(&window))
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if !claim_canvas(canvas_id) {
        log::warn!("Canvas #{} already has a mesh background; not starting another.", canvas_id);
        return Ok(None);
    }
    let reduced_motion = config.reduced_motion_or(prefers_reduced_motion(&window));

    // holds at most the latest size, even when no frame ever drains it
    let (resize_tx, resize_rx) = flume::bounded(1);
    let stale_sizes = resize_rx.clone();
    let frame_callback: FrameCallback = Rc::new(RefCell::new(None));
    let host = Rc::new(RefCell::new(WebHost {
        frame_loop: FrameLoop::new(animator, reduced_motion),
        surface,
        scheduler: RafScheduler { window: window.clone(), callback: frame_callback.clone() },
        resizes: resize_rx,
    }));

    let frame_host = host.clone();
    *frame_callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp_ms: f64| {
        frame_host.borrow_mut().on_frame(timestamp_ms);
    }) as Box<dyn FnMut(f64)>));

    let resize_window = window.clone();
    let resize_listener = Closure::wrap(Box::new(move || {
        let _ = stale_sizes.drain();
        let _ = resize_tx.try_send(window_viewport(&resize_window));
    }) as Box<dyn FnMut()>);
    if let Err(e) = window.add_event_listener_with_callback("resize", resize_listener.as_ref().unchecked_ref()) {
        release_canvas(canvas_id);
        return Err(e);
    }

    {
        let mut host = host.borrow_mut();
        let WebHost { frame_loop, surface, scheduler, .. } = &mut *host;
        frame_loop.start(scheduler, surface);
    }

    Ok(Some(MeshBackground {
        canvas_id: canvas_id.to_owned(),
        window,
        host,
        frame_callback,
        resize_listener: Some(resize_listener),
    }))
}

#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    crate::init_logger();
    log::info!("WASM started: looking for #{}", DEFAULT_CANVAS_ID);
    if let Some(background) = start_mesh_background(DEFAULT_CANVAS_ID, None)? {
        // lives for the rest of the page
        std::mem::forget(background);
    }
    Ok(())
}
