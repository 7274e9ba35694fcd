/// RGBA color in linear space with values in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub const fn transparent() -> Self {
        Self::rgba(0.0, 0.0, 0.0, 0.0)
    }

    /// Convert sRGB color (0-255) to linear space
    #[inline]
    pub const fn srgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        const fn srgb_to_linear(c: u8) -> f32 {
            let x = c as f32 / 255.0;
            if x <= 0.04045 {
                x / 12.92
            } else {
                // Approximate ((x + 0.055) / 1.055)^2.4
                let t = (x + 0.055) / 1.055;
                t * t * (0.5870 * t + 0.4130)
            }
        }

        Self::rgba(
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
            a as f32 / 255.0,
        )
    }

    /// with alpha builder method taking f32
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Multiply alpha, used when alpha propagates down the tree
    pub fn fade(mut self, factor: f32) -> Self {
        self.a *= factor;
        self
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Colors used for debug outlines
pub mod debug_colors {
    use super::Color;

    /// Table bounds
    pub const TABLE: Color = Color::rgb(0.0, 0.0, 1.0);
    /// Cell bounds including padding
    pub const CELL: Color = Color::rgb(1.0, 0.0, 0.0);
    /// Element bounds within a cell
    pub const ELEMENT: Color = Color::rgb(0.0, 1.0, 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_multiplies_alpha() {
        let c = Color::WHITE.with_alpha(0.5).fade(0.5);
        assert_eq!(c.a, 0.25);
        assert_eq!(c.r, 1.0);
    }

    #[test]
    fn test_srgba_endpoints() {
        assert_eq!(Color::srgba(0, 0, 0, 255), Color::BLACK);
        let white = Color::srgba(255, 255, 255, 255);
        assert!((white.r - 1.0).abs() < 1e-3);
    }
}
