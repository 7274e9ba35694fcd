//! Backend-agnostic draw output.
//!
//! [`Stage::draw`](crate::Stage::draw) walks the visible tree and records what
//! should be drawn. A rendering backend consumes the command list in order.

use glam::{Affine2, Vec2};

use crate::color::Color;
use crate::primitives::{Point, Rect};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Solid rectangle in the local space described by `transform`
    Fill {
        rect: Rect,
        transform: Affine2,
        color: Color,
    },
    /// Rectangle outline, used for debug lines
    Outline {
        rect: Rect,
        transform: Affine2,
        color: Color,
    },
    /// Restrict drawing to a stage-space rectangle until the matching `PopClip`
    PushClip(Rect),
    PopClip,
}

/// Commands recorded by one draw pass
#[derive(Clone, Debug)]
pub struct DrawOutput {
    pub commands: Vec<DrawCommand>,
    transform: Affine2,
    clip_depth: usize,
}

impl Default for DrawOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawOutput {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            transform: Affine2::IDENTITY,
            clip_depth: 0,
        }
    }

    /// Local-to-stage transform of the element currently being drawn
    pub fn transform(&self) -> Affine2 {
        self.transform
    }

    pub(crate) fn set_transform(&mut self, transform: Affine2) {
        self.transform = transform;
    }

    /// Map a point in the current local space to stage space
    pub fn to_stage(&self, point: Point) -> Point {
        self.transform.transform_point2(Vec2::from(point)).into()
    }

    pub fn fill(&mut self, rect: Rect, color: Color) {
        if color.a <= 0.0 {
            return;
        }
        self.commands.push(DrawCommand::Fill {
            rect,
            transform: self.transform,
            color,
        });
    }

    pub fn outline(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Outline {
            rect,
            transform: self.transform,
            color,
        });
    }

    /// Push a stage-space clip rectangle.
    ///
    /// Returns false and records nothing when the rectangle is empty, in which
    /// case the clipped content should be skipped and `pop_clip` not called.
    pub fn push_clip(&mut self, rect: Rect) -> bool {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return false;
        }
        self.clip_depth += 1;
        self.commands.push(DrawCommand::PushClip(rect));
        true
    }

    pub fn pop_clip(&mut self) {
        if self.clip_depth == 0 {
            log::warn!("pop_clip without a matching push_clip");
            return;
        }
        self.clip_depth -= 1;
        self.commands.push(DrawCommand::PopClip);
    }

    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    /// Filled rectangles in stage space, ignoring rotation
    pub fn fills(&self) -> impl Iterator<Item = (Rect, Color)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Fill {
                rect,
                transform,
                color,
            } => Some((transformed_bounds(rect, transform), *color)),
            _ => None,
        })
    }

    /// Outlines in stage space, ignoring rotation
    pub fn outlines(&self) -> impl Iterator<Item = (Rect, Color)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Outline {
                rect,
                transform,
                color,
            } => Some((transformed_bounds(rect, transform), *color)),
            _ => None,
        })
    }
}

/// Axis-aligned bounds of a transformed rectangle
fn transformed_bounds(rect: &Rect, transform: &Affine2) -> Rect {
    let corners = [
        Vec2::new(rect.min[0], rect.min[1]),
        Vec2::new(rect.max[0], rect.min[1]),
        Vec2::new(rect.min[0], rect.max[1]),
        Vec2::new(rect.max[0], rect.max[1]),
    ]
    .map(|corner| transform.transform_point2(corner));

    let min = corners.iter().fold(Vec2::splat(f32::INFINITY), |acc, c| acc.min(*c));
    let max = corners
        .iter()
        .fold(Vec2::splat(f32::NEG_INFINITY), |acc, c| acc.max(*c));
    Rect::new(min.into(), max.into())
}
