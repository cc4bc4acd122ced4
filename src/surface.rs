// src/surface.rs
use bevy_color::Srgba;
use glam::Vec2;

use crate::camera::Viewport;
use crate::style::RadialGradient;

/// The 2D drawing primitives a host must provide.
///
/// Coordinates are logical pixels; the surface is responsible for device
/// pixel scaling once `configure` has been called.
pub trait DrawSurface {
    /// Resizes the backing store and installs the pixel-ratio transform.
    fn configure(&mut self, viewport: &Viewport);

    fn clear(&mut self, size: Vec2);

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient, size: Vec2);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Srgba);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Srgba);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Configure(Viewport),
    Clear { size: Vec2 },
    FillGradient { gradient: RadialGradient, size: Vec2 },
    StrokeLine { from: Vec2, to: Vec2, width: f32, color: Srgba },
    FillCircle { center: Vec2, radius: f32, color: Srgba },
}

/// A surface that records commands instead of drawing them.
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of frames recorded, counted by their leading clear.
    pub fn frame_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count()
    }

    /// Most recent viewport handed to `configure`, if any.
    pub fn viewport(&self) -> Option<Viewport> {
        self.commands.iter().rev().find_map(|c| match c {
            DrawCommand::Configure(v) => Some(*v),
            _ => None,
        })
    }

    /// Replays the recorded commands onto another surface.
    pub fn replay(&self, target: &mut impl DrawSurface) {
        for command in &self.commands {
            match command {
                DrawCommand::Configure(viewport) => target.configure(viewport),
                DrawCommand::Clear { size } => target.clear(*size),
                DrawCommand::FillGradient { gradient, size } => target.fill_radial_gradient(gradient, *size),
                DrawCommand::StrokeLine { from, to, width, color } => target.stroke_line(*from, *to, *width, *color),
                DrawCommand::FillCircle { center, radius, color } => target.fill_circle(*center, *radius, *color),
            }
        }
    }
}

impl DrawSurface for CommandList {
    fn configure(&mut self, viewport: &Viewport) {
        self.commands.push(DrawCommand::Configure(*viewport));
    }

    fn clear(&mut self, size: Vec2) {
        self.commands.push(DrawCommand::Clear { size });
    }

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient, size: Vec2) {
        self.commands.push(DrawCommand::FillGradient { gradient: *gradient, size });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Srgba) {
        self.commands.push(DrawCommand::StrokeLine { from, to, width, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Srgba) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }
}
