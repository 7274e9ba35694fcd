use std::ops::BitOr;

/// Alignment bit flags.
///
/// A horizontal component that is neither `LEFT` nor `RIGHT` means centered,
/// likewise a vertical component that is neither `TOP` nor `BOTTOM`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Align(u8);

impl Align {
    pub const CENTER: Align = Align(1);
    pub const TOP: Align = Align(1 << 1);
    pub const BOTTOM: Align = Align(1 << 2);
    pub const LEFT: Align = Align(1 << 3);
    pub const RIGHT: Align = Align(1 << 4);

    pub const TOP_LEFT: Align = Align(Self::TOP.0 | Self::LEFT.0);
    pub const TOP_RIGHT: Align = Align(Self::TOP.0 | Self::RIGHT.0);
    pub const BOTTOM_LEFT: Align = Align(Self::BOTTOM.0 | Self::LEFT.0);
    pub const BOTTOM_RIGHT: Align = Align(Self::BOTTOM.0 | Self::RIGHT.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Align) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_left(self) -> bool {
        self.contains(Self::LEFT)
    }

    pub const fn is_right(self) -> bool {
        self.contains(Self::RIGHT)
    }

    pub const fn is_top(self) -> bool {
        self.contains(Self::TOP)
    }

    pub const fn is_bottom(self) -> bool {
        self.contains(Self::BOTTOM)
    }

    pub const fn is_center_horizontal(self) -> bool {
        !self.is_left() && !self.is_right()
    }

    pub const fn is_center_vertical(self) -> bool {
        !self.is_top() && !self.is_bottom()
    }

    /// Set one bit and clear its vertical or horizontal opposite
    pub(crate) const fn with_side(self, side: Align) -> Align {
        let opposite = match side.0 {
            x if x == Self::TOP.0 => Self::BOTTOM.0,
            x if x == Self::BOTTOM.0 => Self::TOP.0,
            x if x == Self::LEFT.0 => Self::RIGHT.0,
            x if x == Self::RIGHT.0 => Self::LEFT.0,
            _ => 0,
        };
        Align((self.0 | side.0) & !opposite)
    }

    /// Offset of an item of size `item` inside `space` along the horizontal axis
    pub fn offset_x(self, space: f32, item: f32) -> f32 {
        if self.is_right() {
            space - item
        } else if !self.is_left() {
            (space - item) / 2.0
        } else {
            0.0
        }
    }

    /// Offset of an item of size `item` inside `space` along the vertical axis (y-down)
    pub fn offset_y(self, space: f32, item: f32) -> f32 {
        if self.is_bottom() {
            space - item
        } else if !self.is_top() {
            (space - item) / 2.0
        } else {
            0.0
        }
    }
}

impl Default for Align {
    fn default() -> Self {
        Align::CENTER
    }
}

impl BitOr for Align {
    type Output = Align;

    fn bitor(self, rhs: Align) -> Align {
        Align(self.0 | rhs.0)
    }
}

impl std::fmt::Debug for Align {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.is_top() {
            parts.push("top");
        }
        if self.is_bottom() {
            parts.push("bottom");
        }
        if self.is_left() {
            parts.push("left");
        }
        if self.is_right() {
            parts.push("right");
        }
        if parts.is_empty() {
            parts.push("center");
        }
        write!(f, "Align({})", parts.join("|"))
    }
}
