/// Which debug rectangles a table emits when debugging is on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugLines {
    /// Table bounds (blue)
    pub table: bool,
    /// Cell bounds including padding (red)
    pub cell: bool,
    /// Element bounds within each cell (green)
    pub element: bool,
}

impl DebugLines {
    /// No debug lines
    pub const fn none() -> Self {
        Self {
            table: false,
            cell: false,
            element: false,
        }
    }

    /// Every debug line
    pub const fn all() -> Self {
        Self {
            table: true,
            cell: true,
            element: true,
        }
    }

    pub const fn with_table(mut self, enabled: bool) -> Self {
        self.table = enabled;
        self
    }

    pub const fn with_cell(mut self, enabled: bool) -> Self {
        self.cell = enabled;
        self
    }

    pub const fn with_element(mut self, enabled: bool) -> Self {
        self.element = enabled;
        self
    }

    pub const fn is_enabled(&self) -> bool {
        self.table || self.cell || self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        assert!(!DebugLines::none().is_enabled());
        let lines = DebugLines::none().with_cell(true);
        assert!(lines.cell && !lines.table && !lines.element);
        assert!(lines.is_enabled());
        assert_eq!(DebugLines::all(), DebugLines::none().with_table(true).with_cell(true).with_element(true));
    }
}
