//! Table cells: the per-child constraint record of a [`Table`](crate::Table).
//!
//! Every constraint is optional. A cell added to a table is first
//! overwritten with the table's cell defaults, then merged with the defaults
//! of its column and of its row; anything set on the cell afterwards wins.

use blueberry_ui_macros::Cascade;

use crate::align::Align;
use crate::error::{UiError, UiResult};
use crate::pool::Poolable;
use crate::stage::ElementId;
use crate::value::Value;

#[derive(Clone, Debug, Default, PartialEq, Cascade)]
pub struct Cell {
    pub(crate) min_width: Option<Value>,
    pub(crate) min_height: Option<Value>,
    pub(crate) pref_width: Option<Value>,
    pub(crate) pref_height: Option<Value>,
    pub(crate) max_width: Option<Value>,
    pub(crate) max_height: Option<Value>,
    pub(crate) space_top: Option<Value>,
    pub(crate) space_left: Option<Value>,
    pub(crate) space_bottom: Option<Value>,
    pub(crate) space_right: Option<Value>,
    pub(crate) pad_top: Option<Value>,
    pub(crate) pad_left: Option<Value>,
    pub(crate) pad_bottom: Option<Value>,
    pub(crate) pad_right: Option<Value>,
    pub(crate) fill_x: Option<f32>,
    pub(crate) fill_y: Option<f32>,
    pub(crate) align: Option<Align>,
    pub(crate) expand_x: Option<i32>,
    pub(crate) expand_y: Option<i32>,
    pub(crate) colspan: Option<usize>,
    pub(crate) uniform_x: Option<bool>,
    pub(crate) uniform_y: Option<bool>,
    pub(crate) ignore: Option<bool>,

    #[cascade(skip)]
    pub(crate) element: Option<ElementId>,
    #[cascade(skip)]
    pub(crate) column: usize,
    #[cascade(skip)]
    pub(crate) row: usize,
    #[cascade(skip)]
    pub(crate) end_row: bool,
    /// Index of the cell above this one in the table's cell list
    #[cascade(skip)]
    pub(crate) cell_above: Option<usize>,
    #[cascade(skip)]
    pub(crate) element_x: f32,
    #[cascade(skip)]
    pub(crate) element_y: f32,
    #[cascade(skip)]
    pub(crate) element_width: f32,
    #[cascade(skip)]
    pub(crate) element_height: f32,
    #[cascade(skip)]
    pub(crate) computed_pad_top: f32,
    #[cascade(skip)]
    pub(crate) computed_pad_left: f32,
    #[cascade(skip)]
    pub(crate) computed_pad_bottom: f32,
    #[cascade(skip)]
    pub(crate) computed_pad_right: f32,
}

impl Poolable for Cell {
    fn reset(&mut self) {
        self.element = None;
        self.column = 0;
        self.row = 0;
        self.end_row = false;
        self.cell_above = None;
        self.set_element_bounds(0.0, 0.0, 0.0, 0.0);
        self.computed_pad_top = 0.0;
        self.computed_pad_left = 0.0;
        self.computed_pad_bottom = 0.0;
        self.computed_pad_right = 0.0;
        self.clear_constraints();
    }
}

fn spacing(name: &'static str, value: Value) -> UiResult<Value> {
    match value {
        Value::Fixed(v) if v < 0.0 => Err(UiError::InvalidConfig {
            name,
            value: v,
            reason: "must be >= 0",
        }),
        value => Ok(value),
    }
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unset every constraint
    pub fn clear(&mut self) {
        self.clear_constraints();
    }

    // Size

    /// Set min, pref and max width and height to the same value
    pub fn size(&mut self, size: impl Into<Value>) -> &mut Self {
        let size = size.into();
        self.size_xy(size, size)
    }

    pub fn size_xy(&mut self, width: impl Into<Value>, height: impl Into<Value>) -> &mut Self {
        self.width(width).height(height)
    }

    /// Set min, pref and max width to the same value
    pub fn width(&mut self, width: impl Into<Value>) -> &mut Self {
        let width = Some(width.into());
        self.min_width = width;
        self.pref_width = width;
        self.max_width = width;
        self
    }

    /// Set min, pref and max height to the same value
    pub fn height(&mut self, height: impl Into<Value>) -> &mut Self {
        let height = Some(height.into());
        self.min_height = height;
        self.pref_height = height;
        self.max_height = height;
        self
    }

    pub fn min_size(&mut self, width: impl Into<Value>, height: impl Into<Value>) -> &mut Self {
        self.min_width = Some(width.into());
        self.min_height = Some(height.into());
        self
    }

    pub fn min_width(&mut self, width: impl Into<Value>) -> &mut Self {
        self.min_width = Some(width.into());
        self
    }

    pub fn min_height(&mut self, height: impl Into<Value>) -> &mut Self {
        self.min_height = Some(height.into());
        self
    }

    pub fn pref_size(&mut self, width: impl Into<Value>, height: impl Into<Value>) -> &mut Self {
        self.pref_width = Some(width.into());
        self.pref_height = Some(height.into());
        self
    }

    pub fn pref_width(&mut self, width: impl Into<Value>) -> &mut Self {
        self.pref_width = Some(width.into());
        self
    }

    pub fn pref_height(&mut self, height: impl Into<Value>) -> &mut Self {
        self.pref_height = Some(height.into());
        self
    }

    pub fn max_size(&mut self, width: impl Into<Value>, height: impl Into<Value>) -> &mut Self {
        self.max_width = Some(width.into());
        self.max_height = Some(height.into());
        self
    }

    pub fn max_width(&mut self, width: impl Into<Value>) -> &mut Self {
        self.max_width = Some(width.into());
        self
    }

    pub fn max_height(&mut self, height: impl Into<Value>) -> &mut Self {
        self.max_height = Some(height.into());
        self
    }

    // Space and pad. Negative fixed values are rejected.

    /// Space on every side. Space between cells is not additive: the larger one is used.
    pub fn space(&mut self, space: impl Into<Value>) -> UiResult<&mut Self> {
        let space = space.into();
        self.space_sides(space, space, space, space)
    }

    pub fn space_sides(
        &mut self,
        top: impl Into<Value>,
        left: impl Into<Value>,
        bottom: impl Into<Value>,
        right: impl Into<Value>,
    ) -> UiResult<&mut Self> {
        let top = spacing("space_top", top.into())?;
        let left = spacing("space_left", left.into())?;
        let bottom = spacing("space_bottom", bottom.into())?;
        let right = spacing("space_right", right.into())?;
        self.space_top = Some(top);
        self.space_left = Some(left);
        self.space_bottom = Some(bottom);
        self.space_right = Some(right);
        Ok(self)
    }

    pub fn space_top(&mut self, space: impl Into<Value>) -> UiResult<&mut Self> {
        self.space_top = Some(spacing("space_top", space.into())?);
        Ok(self)
    }

    pub fn space_left(&mut self, space: impl Into<Value>) -> UiResult<&mut Self> {
        self.space_left = Some(spacing("space_left", space.into())?);
        Ok(self)
    }

    pub fn space_bottom(&mut self, space: impl Into<Value>) -> UiResult<&mut Self> {
        self.space_bottom = Some(spacing("space_bottom", space.into())?);
        Ok(self)
    }

    pub fn space_right(&mut self, space: impl Into<Value>) -> UiResult<&mut Self> {
        self.space_right = Some(spacing("space_right", space.into())?);
        Ok(self)
    }

    pub fn pad(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        let pad = pad.into();
        self.pad_sides(pad, pad, pad, pad)
    }

    pub fn pad_sides(
        &mut self,
        top: impl Into<Value>,
        left: impl Into<Value>,
        bottom: impl Into<Value>,
        right: impl Into<Value>,
    ) -> UiResult<&mut Self> {
        let top = spacing("pad_top", top.into())?;
        let left = spacing("pad_left", left.into())?;
        let bottom = spacing("pad_bottom", bottom.into())?;
        let right = spacing("pad_right", right.into())?;
        self.pad_top = Some(top);
        self.pad_left = Some(left);
        self.pad_bottom = Some(bottom);
        self.pad_right = Some(right);
        Ok(self)
    }

    pub fn pad_top(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_top = Some(spacing("pad_top", pad.into())?);
        Ok(self)
    }

    pub fn pad_left(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_left = Some(spacing("pad_left", pad.into())?);
        Ok(self)
    }

    pub fn pad_bottom(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_bottom = Some(spacing("pad_bottom", pad.into())?);
        Ok(self)
    }

    pub fn pad_right(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_right = Some(spacing("pad_right", pad.into())?);
        Ok(self)
    }

    // Fill, expand and alignment

    /// Fill the whole cell on both axes
    pub fn fill(&mut self) -> &mut Self {
        self.fill_xy(1.0, 1.0)
    }

    pub fn fill_x(&mut self) -> &mut Self {
        self.fill_x = Some(1.0);
        self
    }

    pub fn fill_y(&mut self) -> &mut Self {
        self.fill_y = Some(1.0);
        self
    }

    /// Fill a fraction of the cell on each axis
    pub fn fill_xy(&mut self, x: f32, y: f32) -> &mut Self {
        self.fill_x = Some(x);
        self.fill_y = Some(y);
        self
    }

    pub fn expand(&mut self) -> &mut Self {
        self.expand_xy(1, 1)
    }

    pub fn expand_x(&mut self) -> &mut Self {
        self.expand_x = Some(1);
        self
    }

    pub fn expand_y(&mut self) -> &mut Self {
        self.expand_y = Some(1);
        self
    }

    /// Expand weights; columns and rows share the leftover space by weight
    pub fn expand_xy(&mut self, x: i32, y: i32) -> &mut Self {
        self.expand_x = Some(x);
        self.expand_y = Some(y);
        self
    }

    /// Expand and fill on both axes
    pub fn grow(&mut self) -> &mut Self {
        self.expand().fill()
    }

    pub fn align(&mut self, align: Align) -> &mut Self {
        self.align = Some(align);
        self
    }

    /// Center, clearing any other alignment
    pub fn center(&mut self) -> &mut Self {
        self.align = Some(Align::CENTER);
        self
    }

    pub fn top(&mut self) -> &mut Self {
        self.add_align(Align::TOP)
    }

    pub fn bottom(&mut self) -> &mut Self {
        self.add_align(Align::BOTTOM)
    }

    pub fn left(&mut self) -> &mut Self {
        self.add_align(Align::LEFT)
    }

    pub fn right(&mut self) -> &mut Self {
        self.add_align(Align::RIGHT)
    }

    fn add_align(&mut self, side: Align) -> &mut Self {
        self.align = Some(match self.align {
            None => side,
            Some(align) => align.with_side(side),
        });
        self
    }

    // Structure

    /// Columns this cell spans, at least 1
    pub fn colspan(&mut self, colspan: usize) -> UiResult<&mut Self> {
        if colspan == 0 {
            return Err(UiError::InvalidConfig {
                name: "colspan",
                value: 0.0,
                reason: "must be >= 1",
            });
        }
        self.colspan = Some(colspan);
        Ok(self)
    }

    pub fn uniform(&mut self) -> &mut Self {
        self.uniform_xy(true, true)
    }

    pub fn uniform_x(&mut self) -> &mut Self {
        self.uniform_x = Some(true);
        self
    }

    pub fn uniform_y(&mut self) -> &mut Self {
        self.uniform_y = Some(true);
        self
    }

    pub fn uniform_xy(&mut self, x: bool, y: bool) -> &mut Self {
        self.uniform_x = Some(x);
        self.uniform_y = Some(y);
        self
    }

    /// Leave this cell out of the column and row size computation
    pub fn ignore(&mut self) -> &mut Self {
        self.ignore = Some(true);
        self
    }

    pub fn set_ignore(&mut self, ignore: bool) -> &mut Self {
        self.ignore = Some(ignore);
        self
    }

    // Getters

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn has_element(&self) -> bool {
        self.element.is_some()
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn is_end_row(&self) -> bool {
        self.end_row
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore == Some(true)
    }

    pub fn min_width_value(&self) -> Option<Value> {
        self.min_width
    }

    pub fn min_height_value(&self) -> Option<Value> {
        self.min_height
    }

    pub fn pref_width_value(&self) -> Option<Value> {
        self.pref_width
    }

    pub fn pref_height_value(&self) -> Option<Value> {
        self.pref_height
    }

    pub fn max_width_value(&self) -> Option<Value> {
        self.max_width
    }

    pub fn max_height_value(&self) -> Option<Value> {
        self.max_height
    }

    pub fn space_values(&self) -> [Option<Value>; 4] {
        [
            self.space_top,
            self.space_left,
            self.space_bottom,
            self.space_right,
        ]
    }

    pub fn pad_values(&self) -> [Option<Value>; 4] {
        [self.pad_top, self.pad_left, self.pad_bottom, self.pad_right]
    }

    pub fn fill_x_value(&self) -> Option<f32> {
        self.fill_x
    }

    pub fn fill_y_value(&self) -> Option<f32> {
        self.fill_y
    }

    pub fn align_value(&self) -> Option<Align> {
        self.align
    }

    pub fn expand_x_value(&self) -> Option<i32> {
        self.expand_x
    }

    pub fn expand_y_value(&self) -> Option<i32> {
        self.expand_y
    }

    pub fn colspan_value(&self) -> Option<usize> {
        self.colspan
    }

    pub fn uniform_x_value(&self) -> Option<bool> {
        self.uniform_x
    }

    pub fn uniform_y_value(&self) -> Option<bool> {
        self.uniform_y
    }

    // Layout results

    pub fn element_x(&self) -> f32 {
        self.element_x
    }

    pub fn element_y(&self) -> f32 {
        self.element_y
    }

    pub fn element_width(&self) -> f32 {
        self.element_width
    }

    pub fn element_height(&self) -> f32 {
        self.element_height
    }

    pub(crate) fn set_element_bounds(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.element_x = x;
        self.element_y = y;
        self.element_width = width;
        self.element_height = height;
    }

    /// Padding plus spacing from the last layout, as (top, left, bottom, right)
    pub fn computed_pad(&self) -> (f32, f32, f32, f32) {
        (
            self.computed_pad_top,
            self.computed_pad_left,
            self.computed_pad_bottom,
            self.computed_pad_right,
        )
    }

    // Resolved constraints, with the baseline defaults standing in for unset fields

    pub(crate) fn colspan_or_one(&self) -> usize {
        self.colspan.unwrap_or(1).max(1)
    }

    pub(crate) fn expand_x_or_zero(&self) -> i32 {
        self.expand_x.unwrap_or(0)
    }

    pub(crate) fn expand_y_or_zero(&self) -> i32 {
        self.expand_y.unwrap_or(0)
    }

    pub(crate) fn fill_x_or_zero(&self) -> f32 {
        self.fill_x.unwrap_or(0.0)
    }

    pub(crate) fn fill_y_or_zero(&self) -> f32 {
        self.fill_y.unwrap_or(0.0)
    }

    pub(crate) fn align_or_center(&self) -> Align {
        self.align.unwrap_or(Align::CENTER)
    }
}

/// The baseline every table's cell defaults start from.
///
/// min, pref and max follow the element's own metrics; space and pad are
/// zero, fill 0, expand 0, colspan 1, alignment centered and uniform unset.
#[derive(Clone, Debug, PartialEq)]
pub struct CellDefaults {
    cell: Cell,
}

impl Default for CellDefaults {
    fn default() -> Self {
        let cell = Cell {
            min_width: Some(Value::MinWidth),
            min_height: Some(Value::MinHeight),
            pref_width: Some(Value::PrefWidth),
            pref_height: Some(Value::PrefHeight),
            max_width: Some(Value::MaxWidth),
            max_height: Some(Value::MaxHeight),
            space_top: Some(Value::ZERO),
            space_left: Some(Value::ZERO),
            space_bottom: Some(Value::ZERO),
            space_right: Some(Value::ZERO),
            pad_top: Some(Value::ZERO),
            pad_left: Some(Value::ZERO),
            pad_bottom: Some(Value::ZERO),
            pad_right: Some(Value::ZERO),
            fill_x: Some(0.0),
            fill_y: Some(0.0),
            align: Some(Align::CENTER),
            expand_x: Some(0),
            expand_y: Some(0),
            colspan: Some(1),
            uniform_x: None,
            uniform_y: None,
            ignore: Some(false),
            ..Cell::default()
        };
        Self { cell }
    }
}

impl CellDefaults {
    /// Adjust the baseline, e.g. to give every table some spacing
    pub fn with(mut self, configure: impl FnOnce(&mut Cell)) -> Self {
        configure(&mut self.cell);
        self
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_copies_set_fields() {
        let mut cell = Cell::new();
        cell.pad(2.0).unwrap();
        cell.fill_x();

        let mut column = Cell::new();
        column.expand_x().pad_top(9.0).unwrap();

        cell.merge(&column);
        assert_eq!(cell.expand_x_value(), Some(1));
        assert_eq!(cell.pad_values()[0], Some(Value::Fixed(9.0)));
        assert_eq!(cell.pad_values()[1], Some(Value::Fixed(2.0)));
        assert_eq!(cell.fill_x_value(), Some(1.0));
    }

    #[test]
    fn test_overwrite_copies_unset_fields() {
        let mut cell = Cell::new();
        cell.fill_x().colspan(3).unwrap();
        cell.column = 4;

        cell.overwrite(CellDefaults::default().cell());
        assert_eq!(cell.fill_x_value(), Some(0.0));
        assert_eq!(cell.colspan_value(), Some(1));
        assert_eq!(cell.uniform_x_value(), None);
        // State is not a constraint
        assert_eq!(cell.column(), 4);
    }

    #[test]
    fn test_negative_spacing_rejected() {
        let mut cell = Cell::new();
        assert!(matches!(
            cell.pad(-1.0),
            Err(UiError::InvalidConfig { name: "pad_top", .. })
        ));
        assert!(cell.space_right(-0.5).is_err());
        assert!(cell.space(Value::PrefWidth).is_ok());
        assert_eq!(cell.pad_values(), [None; 4]);
        assert!(cell.colspan(0).is_err());
    }

    #[test]
    fn test_align_sides() {
        let mut cell = Cell::new();
        cell.top();
        assert_eq!(cell.align_value(), Some(Align::TOP));
        cell.left();
        assert_eq!(cell.align_value(), Some(Align::TOP_LEFT));
        cell.bottom();
        assert_eq!(cell.align_value(), Some(Align::BOTTOM_LEFT));
        cell.center();
        assert_eq!(cell.align_value(), Some(Align::CENTER));
    }

    #[test]
    fn test_size_sets_all_three() {
        let mut cell = Cell::new();
        cell.size(10.0);
        assert_eq!(cell.min_width_value(), Some(Value::Fixed(10.0)));
        assert_eq!(cell.max_height_value(), Some(Value::Fixed(10.0)));
        cell.grow();
        assert_eq!(cell.expand_y_value(), Some(1));
        assert_eq!(cell.fill_y_value(), Some(1.0));
    }

    #[test]
    fn test_pool_reset() {
        let mut cell = Cell::new();
        cell.expand().end_row = true;
        cell.cell_above = Some(3);
        cell.set_element_bounds(1.0, 2.0, 3.0, 4.0);
        cell.reset();
        assert_eq!(cell, Cell::default());
    }
}
