//! Table: a group that sizes and positions its children on a grid of cells.
//!
//! Layout runs in two passes. The first computes the min and pref size of
//! every column and row from the cells' constraints; the second distributes
//! the available size between them and places each element within its cell.
//!
//! ```ignore
//! let mut stage = Stage::new(800.0, 600.0);
//! let table = stage.create_widget(Table::default());
//! Table::add_to(&mut stage, table, Some(name_label))?.right().pad_right(8.0)?;
//! Table::add_to(&mut stage, table, Some(name_field))?.expand_x().fill_x();
//! stage.widget_mut::<Table>(table).map(|t| t.row());
//! ```

use std::ops::Range;

use crate::align::Align;
use crate::cell::{Cell, CellDefaults};
use crate::color::{debug_colors, Color};
use crate::debug::DebugLines;
use crate::element::Touchable;
use crate::error::{UiError, UiResult};
use crate::output::DrawOutput;
use crate::pool::Pool;
use crate::primitives::Rect;
use crate::stage::{ElementId, Stage};
use crate::style::Drawable;
use crate::value::Value;
use crate::widget::{HitOverride, Widget};

/// Resolved size constraints of one cell
#[derive(Clone, Copy, Debug, Default)]
struct CellSize {
    min_width: f32,
    min_height: f32,
    pref_width: f32,
    pref_height: f32,
    max_width: f32,
    max_height: f32,
}

fn resolve(value: Option<Value>, stage: &mut Stage, context: Option<ElementId>) -> f32 {
    value.map_or(0.0, |v| v.get(stage, context))
}

/// Min, pref and max of the cell's element, with pref clamped between min and max
fn measure(stage: &mut Stage, cell: &Cell) -> CellSize {
    let element = cell.element;
    let mut size = CellSize {
        min_width: resolve(cell.min_width, stage, element),
        min_height: resolve(cell.min_height, stage, element),
        pref_width: resolve(cell.pref_width, stage, element),
        pref_height: resolve(cell.pref_height, stage, element),
        max_width: resolve(cell.max_width, stage, element),
        max_height: resolve(cell.max_height, stage, element),
    };
    if size.pref_width < size.min_width {
        size.pref_width = size.min_width;
    }
    if size.pref_height < size.min_height {
        size.pref_height = size.min_height;
    }
    if size.max_width > 0.0 && size.pref_width > size.max_width {
        size.pref_width = size.max_width;
    }
    if size.max_height > 0.0 && size.pref_height > size.max_height {
        size.pref_height = size.max_height;
    }
    size
}

fn reset_len(values: &mut Vec<f32>, len: usize) {
    values.clear();
    values.resize(len, 0.0);
}

/// Columns covered by a cell, kept within the column count
fn span(column: usize, colspan: usize, columns: usize) -> Range<usize> {
    column.min(columns)..(column + colspan).min(columns)
}

pub struct Table {
    id: Option<ElementId>,
    cells: Vec<Cell>,
    cell_pool: Pool<Cell>,
    global_defaults: CellDefaults,
    cell_defaults: Cell,
    column_defaults: Vec<Option<Cell>>,
    row_defaults: Option<Cell>,
    rows: usize,
    columns: usize,
    implicit_end_row: bool,

    size_invalid: bool,
    column_min_width: Vec<f32>,
    row_min_height: Vec<f32>,
    column_pref_width: Vec<f32>,
    row_pref_height: Vec<f32>,
    table_min_width: f32,
    table_min_height: f32,
    table_pref_width: f32,
    table_pref_height: f32,
    column_width: Vec<f32>,
    row_height: Vec<f32>,
    expand_width: Vec<f32>,
    expand_height: Vec<f32>,
    column_weighted_width: Vec<f32>,
    row_weighted_height: Vec<f32>,

    /// `None` uses the matching background inset
    pad_top: Option<Value>,
    pad_left: Option<Value>,
    pad_bottom: Option<Value>,
    pad_right: Option<Value>,
    align: Align,
    round: bool,
    clip: bool,
    debug_lines: DebugLines,
    debug_rects: Vec<(Rect, Color)>,
    background: Option<Drawable>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(CellDefaults::default())
    }
}

impl Table {
    /// Create a table whose cells start from `defaults`
    pub fn new(defaults: CellDefaults) -> Self {
        Self {
            id: None,
            cells: Vec::with_capacity(4),
            cell_pool: Pool::new(),
            cell_defaults: defaults.cell().clone(),
            global_defaults: defaults,
            column_defaults: Vec::with_capacity(2),
            row_defaults: None,
            rows: 0,
            columns: 0,
            implicit_end_row: false,
            size_invalid: true,
            column_min_width: Vec::new(),
            row_min_height: Vec::new(),
            column_pref_width: Vec::new(),
            row_pref_height: Vec::new(),
            table_min_width: 0.0,
            table_min_height: 0.0,
            table_pref_width: 0.0,
            table_pref_height: 0.0,
            column_width: Vec::new(),
            row_height: Vec::new(),
            expand_width: Vec::new(),
            expand_height: Vec::new(),
            column_weighted_width: Vec::new(),
            row_weighted_height: Vec::new(),
            pad_top: None,
            pad_left: None,
            pad_bottom: None,
            pad_right: None,
            align: Align::CENTER,
            round: true,
            clip: false,
            debug_lines: DebugLines::all(),
            debug_rects: Vec::new(),
            background: None,
        }
    }

    pub fn with_background(mut self, background: Drawable) -> Self {
        self.background = Some(background);
        self
    }

    fn self_id(&self) -> UiResult<ElementId> {
        self.id
            .ok_or(UiError::InvalidArgument("table is not attached to a stage"))
    }

    // Cells

    /// Add a cell holding `element`, or an empty spacer cell for `None`.
    ///
    /// The new cell starts from the table's cell defaults, merged with the
    /// defaults of its column and then of its row.
    pub fn add(&mut self, stage: &mut Stage, element: Option<ElementId>) -> UiResult<&mut Cell> {
        let id = self.self_id()?;
        if let Some(element) = element {
            if element == id {
                return Err(UiError::InvalidArgument("a table cannot be added to itself"));
            }
            // Re-adding a child moves it: its old cell becomes a spacer
            if stage.parent(element) == Some(id) {
                self.clear_cell_element(element);
            }
            stage.adopt(id, element, None)?;
        }

        let mut cell = self.cell_pool.obtain();
        cell.element = element;

        // The row was only ended to compute sizes; this cell continues it
        if self.implicit_end_row {
            self.implicit_end_row = false;
            self.rows = self.rows.saturating_sub(1);
            if let Some(last) = self.cells.last_mut() {
                last.end_row = false;
            }
        }

        if let Some(last) = self.cells.last() {
            if last.end_row {
                cell.column = 0;
                cell.row = last.row + 1;
            } else {
                cell.column = last.column + last.colspan_or_one();
                cell.row = last.row;
            }
            // Find the cell above, if any
            if cell.row > 0 {
                'search: for (index, other) in self.cells.iter().enumerate().rev() {
                    let mut column = other.column;
                    let end = column + other.colspan_or_one();
                    while column < end {
                        if column == cell.column {
                            cell.cell_above = Some(index);
                            break 'search;
                        }
                        column += 1;
                    }
                }
            }
        } else {
            cell.column = 0;
            cell.row = 0;
        }

        cell.overwrite(&self.cell_defaults);
        if let Some(Some(column_defaults)) = self.column_defaults.get(cell.column) {
            cell.merge(column_defaults);
        }
        if let Some(row_defaults) = &self.row_defaults {
            cell.merge(row_defaults);
        }

        self.cells.push(cell);
        self.size_invalid = true;
        let index = self.cells.len() - 1;
        Ok(&mut self.cells[index])
    }

    /// Add a cell to the table `table`, from outside of the table's own calls
    pub fn add_to(
        stage: &mut Stage,
        table: ElementId,
        element: Option<ElementId>,
    ) -> UiResult<&mut Cell> {
        stage.with_widget::<Table, _>(table, |t, stage| t.add(stage, element).map(|_| ()))??;
        stage
            .widget_mut::<Table>(table)
            .and_then(|t| t.cells.last_mut())
            .ok_or(UiError::WidgetMismatch {
                id: table,
                expected: std::any::type_name::<Table>(),
            })
    }

    /// End the current row. Returns the defaults for the cells of the next row.
    pub fn row(&mut self) -> &mut Cell {
        if let Some(last) = self.cells.last() {
            if !self.implicit_end_row && !last.end_row {
                self.end_row();
            }
            self.size_invalid = true;
        }
        self.implicit_end_row = false;

        if let Some(old) = self.row_defaults.take() {
            self.cell_pool.free(old);
        }
        let mut defaults = self.cell_pool.obtain();
        defaults.clear();
        self.row_defaults.insert(defaults)
    }

    fn end_row(&mut self) {
        let row_columns: usize = self
            .cells
            .iter()
            .rev()
            .take_while(|cell| !cell.end_row)
            .map(Cell::colspan_or_one)
            .sum();
        self.columns = self.columns.max(row_columns);
        self.rows += 1;
        if let Some(last) = self.cells.last_mut() {
            last.end_row = true;
        }
    }

    /// Defaults for every cell added to `column` from now on
    pub fn column_defaults(&mut self, column: usize) -> &mut Cell {
        if self.column_defaults.len() <= column {
            self.column_defaults.resize_with(column + 1, || None);
        }
        let pool = &mut self.cell_pool;
        self.column_defaults[column].get_or_insert_with(|| {
            let mut cell = pool.obtain();
            cell.clear();
            cell
        })
    }

    /// Defaults for every cell added from now on
    pub fn defaults(&mut self) -> &mut Cell {
        &mut self.cell_defaults
    }

    /// Remove all elements and cells
    pub fn clear(&mut self, stage: &mut Stage) -> UiResult<()> {
        let id = self.self_id()?;
        for cell in self.cells.drain(..).rev() {
            if let Some(element) = cell.element {
                if stage.parent(element) == Some(id) {
                    stage.remove_element(id, element)?;
                }
            }
            self.cell_pool.free(cell);
        }
        self.rows = 0;
        self.columns = 0;
        if let Some(row_defaults) = self.row_defaults.take() {
            self.cell_pool.free(row_defaults);
        }
        self.implicit_end_row = false;
        self.size_invalid = true;
        stage.clear_children(id)
    }

    /// Clear the table and also reset its pads, alignment, debug lines and every default
    pub fn reset(&mut self, stage: &mut Stage) -> UiResult<()> {
        self.clear(stage)?;
        self.pad_top = None;
        self.pad_left = None;
        self.pad_bottom = None;
        self.pad_right = None;
        self.align = Align::CENTER;
        self.round = true;
        self.debug_lines = DebugLines::none();
        self.cell_defaults = self.global_defaults.cell().clone();
        for cell in self.column_defaults.drain(..).flatten() {
            self.cell_pool.free(cell);
        }
        Ok(())
    }

    /// The cell holding `element`
    pub fn cell_for(&mut self, element: ElementId) -> Option<&mut Cell> {
        self.cells
            .iter_mut()
            .find(|cell| cell.element == Some(element))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn clear_cell_element(&mut self, element: ElementId) {
        if let Some(cell) = self.cell_for(element) {
            cell.element = None;
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    // Table padding

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
        let top = checked_pad("pad_top", top.into())?;
        let left = checked_pad("pad_left", left.into())?;
        let bottom = checked_pad("pad_bottom", bottom.into())?;
        let right = checked_pad("pad_right", right.into())?;
        self.pad_top = Some(top);
        self.pad_left = Some(left);
        self.pad_bottom = Some(bottom);
        self.pad_right = Some(right);
        self.size_invalid = true;
        Ok(self)
    }

    pub fn pad_top(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_top = Some(checked_pad("pad_top", pad.into())?);
        self.size_invalid = true;
        Ok(self)
    }

    pub fn pad_left(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_left = Some(checked_pad("pad_left", pad.into())?);
        self.size_invalid = true;
        Ok(self)
    }

    pub fn pad_bottom(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_bottom = Some(checked_pad("pad_bottom", pad.into())?);
        self.size_invalid = true;
        Ok(self)
    }

    pub fn pad_right(&mut self, pad: impl Into<Value>) -> UiResult<&mut Self> {
        self.pad_right = Some(checked_pad("pad_right", pad.into())?);
        self.size_invalid = true;
        Ok(self)
    }

    /// The padding values, `None` where the background inset applies
    pub fn pad_values(&self) -> [Option<Value>; 4] {
        [self.pad_top, self.pad_left, self.pad_bottom, self.pad_right]
    }

    /// Resolved (top, left, bottom, right) padding
    pub fn resolved_pad(&self, stage: &mut Stage) -> (f32, f32, f32, f32) {
        let context = self.id;
        let background = self.background.unwrap_or_default();
        let mut get = |value: Option<Value>, inset: f32| match value {
            Some(value) => value.get(stage, context),
            None => inset,
        };
        (
            get(self.pad_top, background.top_height),
            get(self.pad_left, background.left_width),
            get(self.pad_bottom, background.bottom_height),
            get(self.pad_right, background.right_width),
        )
    }

    // Alignment of the logical table within the table element

    pub fn align(&mut self, align: Align) -> &mut Self {
        self.align = align;
        self
    }

    /// Center, clearing any other alignment
    pub fn center(&mut self) -> &mut Self {
        self.align = Align::CENTER;
        self
    }

    pub fn top(&mut self) -> &mut Self {
        self.align = self.align.with_side(Align::TOP);
        self
    }

    pub fn left(&mut self) -> &mut Self {
        self.align = self.align.with_side(Align::LEFT);
        self
    }

    pub fn bottom(&mut self) -> &mut Self {
        self.align = self.align.with_side(Align::BOTTOM);
        self
    }

    pub fn right(&mut self) -> &mut Self {
        self.align = self.align.with_side(Align::RIGHT);
        self
    }

    pub fn alignment(&self) -> Align {
        self.align
    }

    // Flags

    /// Round element bounds to whole numbers after layout
    pub fn set_round(&mut self, round: bool) -> &mut Self {
        self.round = round;
        self
    }

    pub fn is_round(&self) -> bool {
        self.round
    }

    /// Clip the children to the padded table area, for drawing and hits
    pub fn set_clip(&mut self, clip: bool) -> &mut Self {
        self.clip = clip;
        self
    }

    pub fn is_clip(&self) -> bool {
        self.clip
    }

    /// Choose the debug rectangles and turn element debugging on or off to match
    pub fn set_debug_lines(&mut self, stage: &mut Stage, lines: DebugLines) -> UiResult<()> {
        self.debug_lines = lines;
        if let Some(element) = stage.element_mut(self.self_id()?) {
            element.set_debug(lines.is_enabled());
        }
        Ok(())
    }

    pub fn debug_lines(&self) -> DebugLines {
        self.debug_lines
    }

    /// Debug rectangles from the last layout, in local coordinates
    pub fn debug_rects(&self) -> &[(Rect, Color)] {
        &self.debug_rects
    }

    pub fn background(&self) -> Option<&Drawable> {
        self.background.as_ref()
    }

    /// Set the background. Unset pads follow its insets.
    pub fn set_background(&mut self, stage: &mut Stage, background: Option<Drawable>) -> UiResult<()> {
        if self.background == background {
            return Ok(());
        }
        self.background = background;
        self.size_invalid = true;
        stage.invalidate_hierarchy(self.self_id()?);
        Ok(())
    }

    // Metrics. Column and row values are those of the last layout.

    pub fn table_min_width(&mut self, stage: &mut Stage) -> f32 {
        self.ensure_size(stage);
        self.table_min_width
    }

    pub fn table_min_height(&mut self, stage: &mut Stage) -> f32 {
        self.ensure_size(stage);
        self.table_min_height
    }

    pub fn table_pref_width(&mut self, stage: &mut Stage) -> f32 {
        self.ensure_size(stage);
        self.table_pref_width
    }

    pub fn table_pref_height(&mut self, stage: &mut Stage) -> f32 {
        self.ensure_size(stage);
        self.table_pref_height
    }

    pub fn column_width(&self, column: usize) -> f32 {
        self.column_width.get(column).copied().unwrap_or(0.0)
    }

    pub fn row_height(&self, row: usize) -> f32 {
        self.row_height.get(row).copied().unwrap_or(0.0)
    }

    pub fn column_min_width(&self, column: usize) -> f32 {
        self.column_min_width.get(column).copied().unwrap_or(0.0)
    }

    pub fn column_pref_width(&self, column: usize) -> f32 {
        self.column_pref_width.get(column).copied().unwrap_or(0.0)
    }

    pub fn row_min_height(&self, row: usize) -> f32 {
        self.row_min_height.get(row).copied().unwrap_or(0.0)
    }

    pub fn row_pref_height(&self, row: usize) -> f32 {
        self.row_pref_height.get(row).copied().unwrap_or(0.0)
    }

    /// Whether the cached sizes are stale
    pub fn is_size_invalid(&self) -> bool {
        self.size_invalid
    }

    fn ensure_size(&mut self, stage: &mut Stage) {
        if self.size_invalid {
            self.compute_size(stage);
        }
    }

    fn compute_size(&mut self, stage: &mut Stage) {
        self.size_invalid = false;

        // End the row for sizing purposes only
        if self.cells.last().is_some_and(|cell| !cell.end_row) {
            self.end_row();
            self.implicit_end_row = true;
        } else {
            self.implicit_end_row = false;
        }

        let (columns, rows) = (self.columns, self.rows);
        reset_len(&mut self.column_width, columns);
        reset_len(&mut self.row_height, rows);
        reset_len(&mut self.column_min_width, columns);
        reset_len(&mut self.row_min_height, rows);
        reset_len(&mut self.column_pref_width, columns);
        reset_len(&mut self.row_pref_height, rows);
        reset_len(&mut self.expand_width, columns);
        reset_len(&mut self.expand_height, rows);

        let mut space_right_last = 0.0;
        for i in 0..self.cells.len() {
            let cell = &self.cells[i];
            let element = cell.element;
            let (column, row, colspan) = (cell.column, cell.row, cell.colspan_or_one());
            if row >= rows {
                continue;
            }

            // Rows that expand, and columns that expand from single-column cells
            let (expand_x, expand_y) = (cell.expand_x_or_zero(), cell.expand_y_or_zero());
            if expand_y != 0 && self.expand_height[row] == 0.0 {
                self.expand_height[row] = expand_y as f32;
            }
            if colspan == 1 && expand_x != 0 && column < columns && self.expand_width[column] == 0.0 {
                self.expand_width[column] = expand_x as f32;
            }

            // Spacing between cells is not additive, the larger is used; none at the edges
            let space_left = resolve(cell.space_left, stage, element);
            let mut pad_left = resolve(cell.pad_left, stage, element);
            if column != 0 {
                pad_left += (space_left - space_right_last).max(0.0);
            }
            let mut pad_top = resolve(cell.pad_top, stage, element);
            if let Some(above) = cell.cell_above.and_then(|index| self.cells.get(index)) {
                let space_top = resolve(cell.space_top, stage, element);
                let above_space_bottom = resolve(above.space_bottom, stage, element);
                pad_top += (space_top - above_space_bottom).max(0.0);
            }
            let space_right = resolve(cell.space_right, stage, element);
            let mut pad_right = resolve(cell.pad_right, stage, element);
            if column + colspan != columns {
                pad_right += space_right;
            }
            let mut pad_bottom = resolve(cell.pad_bottom, stage, element);
            if row + 1 != rows {
                pad_bottom += resolve(cell.space_bottom, stage, element);
            }
            space_right_last = space_right;

            let size = measure(stage, cell);
            let ignored = cell.is_ignored();

            let cell = &mut self.cells[i];
            cell.computed_pad_left = pad_left;
            cell.computed_pad_top = pad_top;
            cell.computed_pad_right = pad_right;
            cell.computed_pad_bottom = pad_bottom;
            if ignored {
                continue;
            }

            if colspan == 1 && column < columns {
                // Spanned columns get their share later
                let hpadding = pad_left + pad_right;
                self.column_pref_width[column] =
                    self.column_pref_width[column].max(size.pref_width + hpadding);
                self.column_min_width[column] =
                    self.column_min_width[column].max(size.min_width + hpadding);
            }
            let vpadding = pad_top + pad_bottom;
            self.row_pref_height[row] = self.row_pref_height[row].max(size.pref_height + vpadding);
            self.row_min_height[row] = self.row_min_height[row].max(size.min_height + vpadding);
        }

        let mut uniform_min_width: f32 = 0.0;
        let mut uniform_min_height: f32 = 0.0;
        let mut uniform_pref_width: f32 = 0.0;
        let mut uniform_pref_height: f32 = 0.0;
        for cell in &self.cells {
            if cell.row >= rows {
                continue;
            }
            // A spanning cell that expands makes every spanned column expand,
            // unless one of them already does
            let expand_x = cell.expand_x_or_zero();
            let spanned = span(cell.column, cell.colspan_or_one(), columns);
            if expand_x != 0 && self.expand_width[spanned.clone()].iter().all(|e| *e == 0.0) {
                for expand in &mut self.expand_width[spanned] {
                    *expand = expand_x as f32;
                }
            }

            if cell.is_ignored() {
                continue;
            }
            if cell.uniform_x == Some(true) && cell.colspan_or_one() == 1 && cell.column < columns {
                let hpadding = cell.computed_pad_left + cell.computed_pad_right;
                uniform_min_width = uniform_min_width.max(self.column_min_width[cell.column] - hpadding);
                uniform_pref_width =
                    uniform_pref_width.max(self.column_pref_width[cell.column] - hpadding);
            }
            if cell.uniform_y == Some(true) {
                let vpadding = cell.computed_pad_top + cell.computed_pad_bottom;
                uniform_min_height = uniform_min_height.max(self.row_min_height[cell.row] - vpadding);
                uniform_pref_height =
                    uniform_pref_height.max(self.row_pref_height[cell.row] - vpadding);
            }
        }

        // Size uniform cells to the same width and height
        if uniform_pref_width > 0.0 || uniform_pref_height > 0.0 {
            for cell in &self.cells {
                if cell.row >= rows || cell.is_ignored() {
                    continue;
                }
                if uniform_pref_width > 0.0
                    && cell.uniform_x == Some(true)
                    && cell.colspan_or_one() == 1
                    && cell.column < columns
                {
                    let hpadding = cell.computed_pad_left + cell.computed_pad_right;
                    self.column_min_width[cell.column] = uniform_min_width + hpadding;
                    self.column_pref_width[cell.column] = uniform_pref_width + hpadding;
                }
                if uniform_pref_height > 0.0 && cell.uniform_y == Some(true) {
                    let vpadding = cell.computed_pad_top + cell.computed_pad_bottom;
                    self.row_min_height[cell.row] = uniform_min_height + vpadding;
                    self.row_pref_height[cell.row] = uniform_pref_height + vpadding;
                }
            }
        }

        // Spread the extra min and pref width of spanning cells over their columns
        for i in 0..self.cells.len() {
            let cell = &self.cells[i];
            let colspan = cell.colspan_or_one();
            if colspan == 1 || cell.is_ignored() {
                continue;
            }
            let size = measure(stage, cell);
            let spanned = span(cell.column, colspan, columns);

            let mut spanned_min_width = -(cell.computed_pad_left + cell.computed_pad_right);
            let mut spanned_pref_width = spanned_min_width;
            let mut total_expand_width = 0.0;
            for column in spanned.clone() {
                spanned_min_width += self.column_min_width[column];
                spanned_pref_width += self.column_pref_width[column];
                total_expand_width += self.expand_width[column];
            }

            let extra_min_width = (size.min_width - spanned_min_width).max(0.0);
            let extra_pref_width = (size.pref_width - spanned_pref_width).max(0.0);
            for column in spanned {
                let ratio = if total_expand_width == 0.0 {
                    1.0 / colspan as f32
                } else {
                    self.expand_width[column] / total_expand_width
                };
                self.column_min_width[column] += extra_min_width * ratio;
                self.column_pref_width[column] += extra_pref_width * ratio;
            }
        }

        self.table_min_width = self.column_min_width.iter().sum();
        self.table_pref_width = self.column_pref_width.iter().sum();
        self.table_min_height = self.row_min_height.iter().sum();
        self.table_pref_height = self
            .row_min_height
            .iter()
            .zip(&self.row_pref_height)
            .map(|(min, pref)| min.max(*pref))
            .sum();

        let (pad_top, pad_left, pad_bottom, pad_right) = self.resolved_pad(stage);
        let hpadding = pad_left + pad_right;
        let vpadding = pad_top + pad_bottom;
        self.table_min_width += hpadding;
        self.table_min_height += vpadding;
        self.table_pref_width = (self.table_pref_width + hpadding).max(self.table_min_width);
        self.table_pref_height = (self.table_pref_height + vpadding).max(self.table_min_height);
    }

    /// Distribute `layout_width` x `layout_height` over the cells, recording element bounds in the cells
    fn layout_cells(
        &mut self,
        stage: &mut Stage,
        layout_x: f32,
        layout_y: f32,
        layout_width: f32,
        layout_height: f32,
    ) {
        self.ensure_size(stage);

        let (pad_top, pad_left, pad_bottom, pad_right) = self.resolved_pad(stage);
        let hpadding = pad_left + pad_right;
        let vpadding = pad_top + pad_bottom;
        let (columns, rows) = (self.columns, self.rows);

        reset_len(&mut self.column_width, columns);
        reset_len(&mut self.row_height, rows);
        let total_expand_width: f32 = self.expand_width.iter().sum();
        let total_expand_height: f32 = self.expand_height.iter().sum();

        // Size columns and rows between min and pref, weighting the extra
        // space by how much each can grow
        let total_grow_width = self.table_pref_width - self.table_min_width;
        if total_grow_width == 0.0 {
            self.column_weighted_width.clone_from(&self.column_min_width);
        } else {
            let extra_width = total_grow_width.min((layout_width - self.table_min_width).max(0.0));
            reset_len(&mut self.column_weighted_width, columns);
            for i in 0..columns {
                let grow_width = self.column_pref_width[i] - self.column_min_width[i];
                let grow_ratio = grow_width / total_grow_width;
                self.column_weighted_width[i] = self.column_min_width[i] + extra_width * grow_ratio;
            }
        }

        let total_grow_height = self.table_pref_height - self.table_min_height;
        if total_grow_height == 0.0 {
            self.row_weighted_height.clone_from(&self.row_min_height);
        } else {
            let extra_height =
                total_grow_height.min((layout_height - self.table_min_height).max(0.0));
            reset_len(&mut self.row_weighted_height, rows);
            for i in 0..rows {
                let grow_height = self.row_pref_height[i] - self.row_min_height[i];
                let grow_ratio = grow_height / total_grow_height;
                self.row_weighted_height[i] = self.row_min_height[i] + extra_height * grow_ratio;
            }
        }

        // Element and cell sizes before expand and fill
        for i in 0..self.cells.len() {
            let cell = &self.cells[i];
            let (column, row, colspan) = (cell.column, cell.row, cell.colspan_or_one());
            if row >= rows {
                continue;
            }
            let spanned_weighted_width: f32 = self.column_weighted_width
                [span(column, colspan, columns)]
            .iter()
            .sum();
            let weighted_height = self.row_weighted_height[row];
            let size = measure(stage, cell);

            let cell = &mut self.cells[i];
            cell.element_width = (spanned_weighted_width
                - cell.computed_pad_left
                - cell.computed_pad_right)
                .min(size.pref_width);
            cell.element_height = (weighted_height
                - cell.computed_pad_top
                - cell.computed_pad_bottom)
                .min(size.pref_height);

            if colspan == 1 && column < columns {
                self.column_width[column] = self.column_width[column].max(spanned_weighted_width);
            }
            self.row_height[row] = self.row_height[row].max(weighted_height);
        }

        // Leftover space goes to expanding columns and rows; the last one
        // takes the rounding remainder
        if total_expand_width > 0.0 {
            let extra = layout_width - hpadding - self.column_width.iter().sum::<f32>();
            let mut used = 0.0;
            let mut last_index = 0;
            for i in 0..columns {
                if self.expand_width[i] == 0.0 {
                    continue;
                }
                let amount = extra * self.expand_width[i] / total_expand_width;
                self.column_width[i] += amount;
                used += amount;
                last_index = i;
            }
            if let Some(width) = self.column_width.get_mut(last_index) {
                *width += extra - used;
            }
        }

        if total_expand_height > 0.0 {
            let extra = layout_height - vpadding - self.row_height.iter().sum::<f32>();
            let mut used = 0.0;
            let mut last_index = 0;
            for i in 0..rows {
                if self.expand_height[i] == 0.0 {
                    continue;
                }
                let amount = extra * self.expand_height[i] / total_expand_height;
                self.row_height[i] += amount;
                used += amount;
                last_index = i;
            }
            if let Some(height) = self.row_height.get_mut(last_index) {
                *height += extra - used;
            }
        }

        // Spread the extra width of spanning cells evenly over their columns
        for cell in &self.cells {
            let colspan = cell.colspan_or_one();
            if colspan == 1 {
                continue;
            }
            let spanned = span(cell.column, colspan, columns);
            let mut extra_width: f32 = spanned
                .clone()
                .map(|column| self.column_weighted_width[column] - self.column_width[column])
                .sum();
            extra_width -= (cell.computed_pad_left + cell.computed_pad_right).max(0.0);
            extra_width /= colspan as f32;
            if extra_width > 0.0 {
                for column in spanned {
                    self.column_width[column] += extra_width;
                }
            }
        }

        let table_width = hpadding + self.column_width.iter().sum::<f32>();
        let table_height = vpadding + self.row_height.iter().sum::<f32>();

        // Position the logical table within the element
        let mut x = layout_x + pad_left;
        if self.align.is_right() {
            x += layout_width - table_width;
        } else if !self.align.is_left() {
            x += (layout_width - table_width) / 2.0;
        }
        let mut y = layout_y + pad_top;
        if self.align.is_bottom() {
            y += layout_height - table_height;
        } else if !self.align.is_top() {
            y += (layout_height - table_height) / 2.0;
        }

        // Place elements within their cells
        let (mut current_x, mut current_y) = (x, y);
        for i in 0..self.cells.len() {
            let cell = &self.cells[i];
            if cell.row >= rows {
                continue;
            }
            let element = cell.element;
            let spanned = span(cell.column, cell.colspan_or_one(), columns);
            let spanned_cell_width = self.column_width[spanned].iter().sum::<f32>()
                - cell.computed_pad_left
                - cell.computed_pad_right;
            let row_height = self.row_height[cell.row];
            let (fill_x, fill_y) = (cell.fill_x_or_zero(), cell.fill_y_or_zero());
            let (min_width, max_width, min_height, max_height) = if fill_x > 0.0 || fill_y > 0.0 {
                (
                    resolve(cell.min_width, stage, element),
                    resolve(cell.max_width, stage, element),
                    resolve(cell.min_height, stage, element),
                    resolve(cell.max_height, stage, element),
                )
            } else {
                (0.0, 0.0, 0.0, 0.0)
            };

            let cell = &mut self.cells[i];
            current_x += cell.computed_pad_left;

            if fill_x > 0.0 {
                cell.element_width = (spanned_cell_width * fill_x).max(min_width);
                if max_width > 0.0 {
                    cell.element_width = cell.element_width.min(max_width);
                }
            }
            if fill_y > 0.0 {
                cell.element_height = (row_height * fill_y
                    - cell.computed_pad_top
                    - cell.computed_pad_bottom)
                    .max(min_height);
                if max_height > 0.0 {
                    cell.element_height = cell.element_height.min(max_height);
                }
            }

            let align = cell.align_or_center();
            cell.element_x = if align.is_left() {
                current_x
            } else if align.is_right() {
                current_x + spanned_cell_width - cell.element_width
            } else {
                current_x + (spanned_cell_width - cell.element_width) / 2.0
            };
            cell.element_y = if align.is_top() {
                current_y + cell.computed_pad_top
            } else if align.is_bottom() {
                current_y + row_height - cell.element_height - cell.computed_pad_bottom
            } else {
                current_y
                    + (row_height - cell.element_height + cell.computed_pad_top
                        - cell.computed_pad_bottom)
                        / 2.0
            };

            if cell.end_row {
                current_x = x;
                current_y += row_height;
            } else {
                current_x += spanned_cell_width + cell.computed_pad_right;
            }
        }

        self.debug_rects.clear();
        if self.debug_lines.is_enabled() {
            self.compute_debug_rects(
                x,
                y,
                Rect::from_xywh(layout_x, layout_y, layout_width, layout_height),
                table_width - hpadding,
                table_height - vpadding,
            );
        }
    }

    fn compute_debug_rects(
        &mut self,
        x: f32,
        y: f32,
        layout: Rect,
        table_width: f32,
        table_height: f32,
    ) {
        let lines = self.debug_lines;
        if lines.table {
            self.debug_rects.push((layout, debug_colors::TABLE));
            self.debug_rects.push((
                Rect::from_xywh(x, y, table_width, table_height),
                debug_colors::TABLE,
            ));
        }

        let (mut current_x, mut current_y) = (x, y);
        for cell in &self.cells {
            if lines.element {
                self.debug_rects.push((
                    Rect::from_xywh(
                        cell.element_x,
                        cell.element_y,
                        cell.element_width,
                        cell.element_height,
                    ),
                    debug_colors::ELEMENT,
                ));
            }

            let spanned = span(cell.column, cell.colspan_or_one(), self.columns);
            let spanned_cell_width = self.column_width[spanned].iter().sum::<f32>()
                - cell.computed_pad_left
                - cell.computed_pad_right;
            let row_height = self.row_height.get(cell.row).copied().unwrap_or(0.0);
            current_x += cell.computed_pad_left;
            if lines.cell {
                self.debug_rects.push((
                    Rect::from_xywh(
                        current_x,
                        current_y + cell.computed_pad_top,
                        spanned_cell_width,
                        row_height - cell.computed_pad_top - cell.computed_pad_bottom,
                    ),
                    debug_colors::CELL,
                ));
            }

            if cell.end_row {
                current_x = x;
                current_y += row_height;
            } else {
                current_x += spanned_cell_width + cell.computed_pad_right;
            }
        }
    }
}

fn checked_pad(name: &'static str, value: Value) -> UiResult<Value> {
    match value {
        Value::Fixed(v) if v < 0.0 => Err(UiError::InvalidConfig {
            name,
            value: v,
            reason: "must be >= 0",
        }),
        value => Ok(value),
    }
}

impl Widget for Table {
    fn attached(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.id = Some(id);
        if let Some(element) = stage.element_mut(id) {
            element.set_touchable(Touchable::ChildrenOnly);
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.size_invalid = true;
    }

    fn min_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        self.table_min_width(stage)
    }

    fn min_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        self.table_min_height(stage)
    }

    fn pref_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let width = self.table_pref_width(stage);
        self.background.map_or(width, |b| width.max(b.min_width))
    }

    fn pref_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let height = self.table_pref_height(stage);
        self.background.map_or(height, |b| height.max(b.min_height))
    }

    fn layout(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let (width, height) = stage
            .element(id)
            .map(|e| (e.width(), e.height()))
            .ok_or(UiError::UnknownElement(id))?;
        self.layout_cells(stage, 0.0, 0.0, width, height);

        for cell in &mut self.cells {
            if self.round {
                cell.set_element_bounds(
                    cell.element_x.round_ties_even(),
                    cell.element_y.round_ties_even(),
                    cell.element_width.round_ties_even(),
                    cell.element_height.round_ties_even(),
                );
            }
            if let Some(element) = cell.element {
                if stage.parent(element) == Some(id) {
                    stage.set_bounds(
                        element,
                        cell.element_x,
                        cell.element_y,
                        cell.element_width,
                        cell.element_height,
                    )?;
                }
            }
        }

        // Children without a cell are validated too
        for child in stage.children(id).to_vec() {
            stage.validate(child)?;
        }
        Ok(())
    }

    fn draw(
        &mut self,
        stage: &mut Stage,
        id: ElementId,
        out: &mut DrawOutput,
        parent_alpha: f32,
    ) -> UiResult<()> {
        let Some(element) = stage.element(id) else {
            return Ok(());
        };
        let (width, height) = (element.width(), element.height());
        let alpha = element.color().a * parent_alpha;
        if let Some(background) = &self.background {
            background.draw(out, 0.0, 0.0, width, height, alpha);
        }

        if !self.clip {
            return stage.draw_children(id, out, alpha);
        }
        let (pad_top, pad_left, pad_bottom, pad_right) = self.resolved_pad(stage);
        let area = Rect::from_xywh(
            pad_left,
            pad_top,
            width - pad_left - pad_right,
            height - pad_top - pad_bottom,
        );
        if out.push_clip(stage.calculate_scissors(id, area)) {
            let result = stage.draw_children(id, out, alpha);
            out.pop_clip();
            result?;
        }
        Ok(())
    }

    fn draw_debug(&mut self, _stage: &mut Stage, _id: ElementId, out: &mut DrawOutput) {
        for (rect, color) in &self.debug_rects {
            out.outline(*rect, *color);
        }
    }

    fn hit(
        &mut self,
        stage: &mut Stage,
        id: ElementId,
        x: f32,
        y: f32,
        touchable: bool,
    ) -> HitOverride {
        if !self.clip {
            return HitOverride::Inherit;
        }
        let Some(element) = stage.element(id) else {
            return HitOverride::Miss;
        };
        if touchable && element.touchable() == Touchable::Disabled {
            return HitOverride::Miss;
        }
        if x < 0.0 || x >= element.width() || y < 0.0 || y >= element.height() {
            return HitOverride::Miss;
        }
        HitOverride::Inherit
    }

    fn child_removed(&mut self, child: ElementId) {
        self.clear_cell_element(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Block {
        width: f32,
        height: f32,
    }

    impl Widget for Block {
        fn pref_width(&mut self, _: &mut Stage, _: ElementId) -> f32 {
            self.width
        }

        fn pref_height(&mut self, _: &mut Stage, _: ElementId) -> f32 {
            self.height
        }
    }

    fn block(stage: &mut Stage, width: f32, height: f32) -> ElementId {
        stage.create_widget(Block { width, height })
    }

    fn table(stage: &mut Stage) -> ElementId {
        let table = stage.create_widget(Table::default());
        stage.add_element(stage.root(), table).unwrap();
        table
    }

    fn with_table<R>(stage: &mut Stage, id: ElementId, f: impl FnOnce(&mut Table, &mut Stage) -> R) -> R {
        stage.with_widget::<Table, _>(id, f).unwrap()
    }

    #[test]
    fn test_rows_and_columns() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        for _ in 0..3 {
            Table::add_to(&mut stage, t, None).unwrap();
        }
        with_table(&mut stage, t, |t, _| {
            t.row();
        });
        Table::add_to(&mut stage, t, None).unwrap();

        let cells = stage.widget::<Table>(t).unwrap().cells();
        assert_eq!((cells[2].column(), cells[2].row()), (2, 0));
        assert!(cells[2].is_end_row());
        assert_eq!((cells[3].column(), cells[3].row()), (0, 1));
        assert_eq!(cells[3].cell_above, Some(0));

        // Sizing ends the last row implicitly; adding reverts that
        stage.pref_width(t);
        let t_ref = stage.widget::<Table>(t).unwrap();
        assert_eq!((t_ref.columns(), t_ref.rows()), (3, 2));
        Table::add_to(&mut stage, t, None).unwrap();
        let t_ref = stage.widget::<Table>(t).unwrap();
        assert_eq!(t_ref.rows(), 1);
        assert_eq!(t_ref.cells()[4].column(), 1);
        assert!(!t_ref.cells()[3].is_end_row());
    }

    #[test]
    fn test_expand_distributes_remainder() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        let b = block(&mut stage, 10.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap().expand_x().fill_x();
        Table::add_to(&mut stage, t, Some(b)).unwrap().expand_xy(2, 0).fill_x();
        stage.set_size(t, 101.0, 10.0).unwrap();
        stage.validate(t).unwrap();

        let t_ref = stage.widget::<Table>(t).unwrap();
        let total = t_ref.column_width(0) + t_ref.column_width(1);
        assert_eq!(total, 101.0);
        assert!(t_ref.column_width(1) > t_ref.column_width(0));
    }

    #[test]
    fn test_space_is_not_additive() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        let b = block(&mut stage, 10.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap().space_right(6.0).unwrap();
        Table::add_to(&mut stage, t, Some(b)).unwrap().space_left(4.0).unwrap();

        assert_eq!(stage.pref_width(t), 26.0);
        let t_ref = stage.widget::<Table>(t).unwrap();
        assert_eq!(t_ref.cells()[0].computed_pad(), (0.0, 0.0, 0.0, 6.0));
        assert_eq!(t_ref.cells()[1].computed_pad(), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_alignment_and_padding() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 20.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        with_table(&mut stage, t, |t, _| {
            t.pad(5.0).unwrap().top().left();
        });
        stage.set_size(t, 100.0, 100.0).unwrap();
        stage.validate(t).unwrap();
        let bounds = stage.element(a).unwrap().bounds();
        assert_eq!(bounds, Rect::from_xywh(5.0, 5.0, 20.0, 10.0));

        with_table(&mut stage, t, |t, _| {
            t.bottom().right();
        });
        stage.invalidate(t);
        stage.validate(t).unwrap();
        let bounds = stage.element(a).unwrap().bounds();
        assert_eq!(bounds, Rect::from_xywh(75.0, 85.0, 20.0, 10.0));
    }

    #[test]
    fn test_rounding_is_ties_even() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 11.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        // Centered in 16 wide: x = 2.5
        stage.set_size(t, 16.0, 10.0).unwrap();
        stage.validate(t).unwrap();
        assert_eq!(stage.element(a).unwrap().x(), 2.0);

        with_table(&mut stage, t, |t, _| {
            t.set_round(false);
        });
        stage.invalidate(t);
        stage.validate(t).unwrap();
        assert_eq!(stage.element(a).unwrap().x(), 2.5);
    }

    #[test]
    fn test_uniform_columns() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        let b = block(&mut stage, 30.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap().uniform_x();
        Table::add_to(&mut stage, t, Some(b)).unwrap().uniform_x();
        assert_eq!(stage.pref_width(t), 60.0);
    }

    #[test]
    fn test_ignored_cell_is_left_out_of_sizing() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        let big = block(&mut stage, 80.0, 80.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        Table::add_to(&mut stage, t, Some(big)).unwrap().ignore();
        assert_eq!(stage.pref_width(t), 10.0);
        assert_eq!(stage.pref_height(t), 10.0);
    }

    #[test]
    fn test_removing_element_keeps_cell() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        stage.remove(a).unwrap();

        let t_ref = stage.widget_mut::<Table>(t).unwrap();
        assert_eq!(t_ref.cells().len(), 1);
        assert_eq!(t_ref.cells()[0].element(), None);
        assert!(t_ref.cell_for(a).is_none());
    }

    #[test]
    fn test_clear_and_reset() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        with_table(&mut stage, t, |t, stage| {
            t.column_defaults(0).expand_x();
            t.defaults().fill();
            t.pad(3.0).unwrap();
            t.clear(stage).unwrap();
            assert!(t.cells().is_empty());
            assert_eq!((t.rows(), t.columns()), (0, 0));
        });
        assert!(stage.children(t).is_empty());
        assert_eq!(stage.parent(a), None);

        with_table(&mut stage, t, |t, stage| {
            t.reset(stage).unwrap();
            assert_eq!(t.pad_values(), [None; 4]);
            assert_eq!(t.defaults().fill_x_value(), Some(0.0));
            let cell = t.add(stage, None).unwrap();
            assert_eq!(cell.expand_x_value(), Some(0));
        });
    }

    #[test]
    fn test_negative_table_pad_rejected() {
        let mut table = Table::default();
        assert!(table.pad(-2.0).is_err());
        assert!(table.pad_left(Value::PrefWidth).is_ok());
    }

    #[test]
    fn test_background_insets_are_default_pads() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = stage.create_widget(
            Table::default().with_background(Drawable::new(Color::BLACK).with_insets(1.0, 2.0, 3.0, 4.0)),
        );
        let a = block(&mut stage, 10.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        assert_eq!(stage.pref_width(t), 13.0);
        assert_eq!(stage.pref_height(t), 17.0);
    }

    #[test]
    fn test_clip_limits_hits() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        stage.set_size(t, 10.0, 10.0).unwrap();
        stage.validate(t).unwrap();
        // The child sticks out of the table
        stage.set_bounds(a, 5.0, 0.0, 20.0, 10.0).unwrap();

        assert_eq!(stage.hit(20.0, 5.0, true), Some(a));
        stage.widget_mut::<Table>(t).unwrap().set_clip(true);
        assert_eq!(stage.hit(20.0, 5.0, true), Some(stage.root()));
        assert_eq!(stage.hit(7.0, 5.0, true), Some(a));
    }

    #[test]
    fn test_debug_rects() {
        let mut stage = Stage::new(200.0, 200.0);
        let t = table(&mut stage);
        let a = block(&mut stage, 10.0, 10.0);
        Table::add_to(&mut stage, t, Some(a)).unwrap();
        with_table(&mut stage, t, |t, stage| {
            t.set_debug_lines(stage, DebugLines::none().with_cell(true)).unwrap();
        });
        assert!(stage.element(t).unwrap().debug());
        stage.set_size(t, 30.0, 30.0).unwrap();
        let out = stage.draw().unwrap();

        let rects = stage.widget::<Table>(t).unwrap().debug_rects();
        assert_eq!(rects, &[(Rect::from_xywh(10.0, 10.0, 10.0, 10.0), debug_colors::CELL)]);
        assert!(out
            .outlines()
            .any(|(rect, color)| color == debug_colors::CELL && rect == Rect::from_xywh(10.0, 10.0, 10.0, 10.0)));
    }
}
