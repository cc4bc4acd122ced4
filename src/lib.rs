//! Animated wireframe mesh background.
//!
//! A [`MeshAnimator`] owns a fixed topology built by a [`Layout`] (a warped
//! torus or a jittered grid). Each frame it deforms the base vertices, rotates
//! and projects them, and strokes the wireframe onto a [`DrawSurface`] with
//! depth-based opacity. A [`FrameLoop`] drives it from a host frame clock.

mod animator;
mod camera;
mod config;
mod error;
mod frame_loop;
mod layout;
mod style;
mod surface;
mod topology;

#[cfg(not(target_arch = "wasm32"))]
mod app;
#[cfg(not(target_arch = "wasm32"))]
mod app_state;
#[cfg(not(target_arch = "wasm32"))]
mod models;

#[cfg(target_arch = "wasm32")]
mod web;

pub use animator::MeshAnimator;
pub use camera::{PerspectiveCamera, ProjectedPoint, Viewport};
pub use config::AnimatorConfig;
pub use error::{MeshError, Result};
pub use frame_loop::{FrameHandle, FrameLoop, FrameOutcome, FrameScheduler, LoopState};
pub use layout::{GridLayout, Layout, MeshLayout, TorusLayout};
pub use style::{css_rgba, DepthRange, FogStyle, RadialGradient, StyleConstants};
pub use surface::{CommandList, DrawCommand, DrawSurface};
pub use topology::{BaseVertex, Edge, Topology};

#[cfg(not(target_arch = "wasm32"))]
pub use app::run;

#[cfg(target_arch = "wasm32")]
pub use web::{start_mesh_background, MeshBackground};

/// Installs the platform logger. Safe to call more than once.
pub fn init_logger() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            console_error_panic_hook::set_once();
            // Err only if a logger is already installed
            let _ = console_log::init_with_level(log::Level::Info);
        } else {
            let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .try_init();
        }
    }
}
