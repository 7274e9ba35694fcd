use crate::color::Color;
use crate::output::DrawOutput;
use crate::primitives::Rect;

/// Solid-color background with border insets and a minimum size.
///
/// The insets are used as padding by the widgets that own the drawable, the
/// minimum size feeds their preferred size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Drawable {
    pub color: Color,
    pub left_width: f32,
    pub right_width: f32,
    pub top_height: f32,
    pub bottom_height: f32,
    pub min_width: f32,
    pub min_height: f32,
}

impl Drawable {
    pub const fn new(color: Color) -> Self {
        Self {
            color,
            left_width: 0.0,
            right_width: 0.0,
            top_height: 0.0,
            bottom_height: 0.0,
            min_width: 0.0,
            min_height: 0.0,
        }
    }

    pub const fn with_insets(mut self, left: f32, right: f32, top: f32, bottom: f32) -> Self {
        self.left_width = left;
        self.right_width = right;
        self.top_height = top;
        self.bottom_height = bottom;
        self
    }

    pub const fn with_padding(self, pad: f32) -> Self {
        self.with_insets(pad, pad, pad, pad)
    }

    pub const fn with_min_size(mut self, min_width: f32, min_height: f32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    /// Record the drawable at the given local bounds
    pub fn draw(&self, out: &mut DrawOutput, x: f32, y: f32, width: f32, height: f32, alpha: f32) {
        out.fill(Rect::from_xywh(x, y, width, height), self.color.fade(alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let d = Drawable::new(Color::BLACK)
            .with_insets(1.0, 2.0, 3.0, 4.0)
            .with_min_size(10.0, 12.0);
        assert_eq!(d.left_width, 1.0);
        assert_eq!(d.bottom_height, 4.0);
        assert_eq!(d.min_height, 12.0);
    }

    #[test]
    fn test_draw_fades_color() {
        let mut out = DrawOutput::new();
        Drawable::new(Color::WHITE).draw(&mut out, 0.0, 0.0, 5.0, 5.0, 0.5);
        let (_, color) = out.fills().next().unwrap();
        assert_eq!(color.a, 0.5);
    }
}
