//! HorizontalGroup: children in a row, optionally wrapping onto several rows.

use crate::align::Align;
use crate::element::Touchable;
use crate::error::{non_negative, UiResult};
use crate::stage::{ElementId, Stage};
use crate::widget::Widget;

/// One wrapped run of children: its length along the axis, its thickness
/// across it and how many children it holds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Line {
    pub(crate) length: f32,
    pub(crate) thickness: f32,
    pub(crate) count: usize,
}

/// Set the bounds of a child, rounded if asked, and lay it out
pub(crate) fn place(
    stage: &mut Stage,
    child: ElementId,
    round: bool,
    (x, y, width, height): (f32, f32, f32, f32),
) -> UiResult<()> {
    if round {
        stage.set_bounds(
            child,
            x.round_ties_even(),
            y.round_ties_even(),
            width.round_ties_even(),
            height.round_ties_even(),
        )?;
    } else {
        stage.set_bounds(child, x, y, width, height)?;
    }
    stage.validate(child)
}

#[derive(Debug)]
pub struct HorizontalGroup {
    size_invalid: bool,
    pref_width: f32,
    pref_height: f32,
    last_pref_height: f32,
    rows: Vec<Line>,
    align: Align,
    row_align: Align,
    reverse: bool,
    round: bool,
    wrap: bool,
    expand: bool,
    space: f32,
    wrap_space: f32,
    fill: f32,
    pad_top: f32,
    pad_left: f32,
    pad_bottom: f32,
    pad_right: f32,
}

impl Default for HorizontalGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl HorizontalGroup {
    pub fn new() -> Self {
        Self {
            size_invalid: true,
            pref_width: 0.0,
            pref_height: 0.0,
            last_pref_height: 0.0,
            rows: Vec::new(),
            align: Align::LEFT,
            row_align: Align::CENTER,
            reverse: false,
            round: true,
            wrap: false,
            expand: false,
            space: 0.0,
            wrap_space: 0.0,
            fill: 0.0,
            pad_top: 0.0,
            pad_left: 0.0,
            pad_bottom: 0.0,
            pad_right: 0.0,
        }
    }

    /// If true (the default), positions and sizes are rounded to integers
    pub fn set_round(&mut self, round: bool) -> &mut Self {
        self.round = round;
        self.size_invalid = true;
        self
    }

    pub fn is_round(&self) -> bool {
        self.round
    }

    /// Lay children out last to first
    pub fn reverse(&mut self, reverse: bool) -> &mut Self {
        self.reverse = reverse;
        self.size_invalid = true;
        self
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Space between children
    pub fn space(&mut self, space: f32) -> &mut Self {
        self.space = space;
        self.size_invalid = true;
        self
    }

    pub fn spacing(&self) -> f32 {
        self.space
    }

    /// Space between wrapped rows
    pub fn wrap_space(&mut self, wrap_space: f32) -> &mut Self {
        self.wrap_space = wrap_space;
        self.size_invalid = true;
        self
    }

    pub fn wrap_spacing(&self) -> f32 {
        self.wrap_space
    }

    pub fn pad(&mut self, pad: f32) -> UiResult<&mut Self> {
        self.pad_sides(pad, pad, pad, pad)
    }

    pub fn pad_sides(&mut self, top: f32, left: f32, bottom: f32, right: f32) -> UiResult<&mut Self> {
        self.pad_top = non_negative("pad_top", top)?;
        self.pad_left = non_negative("pad_left", left)?;
        self.pad_bottom = non_negative("pad_bottom", bottom)?;
        self.pad_right = non_negative("pad_right", right)?;
        self.size_invalid = true;
        Ok(self)
    }

    /// Padding as (top, left, bottom, right)
    pub fn padding(&self) -> (f32, f32, f32, f32) {
        (self.pad_top, self.pad_left, self.pad_bottom, self.pad_right)
    }

    /// Alignment of all the children within the group
    pub fn align(&mut self, align: Align) -> &mut Self {
        self.align = align;
        self
    }

    pub fn center(&mut self) -> &mut Self {
        self.align(Align::CENTER)
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

    /// Alignment of each child within its row, and of each row when wrapping
    pub fn row_align(&mut self, row_align: Align) -> &mut Self {
        self.row_align = row_align;
        self
    }

    pub fn row_center(&mut self) -> &mut Self {
        self.row_align(Align::CENTER)
    }

    pub fn row_top(&mut self) -> &mut Self {
        self.row_align = self.row_align.with_side(Align::TOP);
        self
    }

    pub fn row_left(&mut self) -> &mut Self {
        self.row_align = self.row_align.with_side(Align::LEFT);
        self
    }

    pub fn row_bottom(&mut self) -> &mut Self {
        self.row_align = self.row_align.with_side(Align::BOTTOM);
        self
    }

    pub fn row_right(&mut self) -> &mut Self {
        self.row_align = self.row_align.with_side(Align::RIGHT);
        self
    }

    pub fn row_alignment(&self) -> Align {
        self.row_align
    }

    /// Fraction of the row height children are stretched to; 0 keeps their pref height
    pub fn fill(&mut self, fill: f32) -> &mut Self {
        self.fill = fill;
        self
    }

    pub fn fill_amount(&self) -> f32 {
        self.fill
    }

    /// Use the whole group height for the row instead of the pref height
    pub fn expand(&mut self, expand: bool) -> &mut Self {
        self.expand = expand;
        self
    }

    pub fn is_expand(&self) -> bool {
        self.expand
    }

    /// Expand and fill
    pub fn grow(&mut self) -> &mut Self {
        self.expand = true;
        self.fill = 1.0;
        self
    }

    /// Start a new row when a child doesn't fit the group width. The pref
    /// width of a wrapping group is 0.
    pub fn wrap(&mut self, wrap: bool) -> &mut Self {
        self.wrap = wrap;
        self.size_invalid = true;
        self
    }

    pub fn is_wrap(&self) -> bool {
        self.wrap
    }

    fn ordered_children(&self, stage: &Stage, id: ElementId) -> Vec<ElementId> {
        let mut children = stage.children(id).to_vec();
        if self.reverse {
            children.reverse();
        }
        children
    }

    /// Child width when wrapping inside `group_width`
    fn wrapped_width(stage: &mut Stage, child: ElementId, group_width: f32) -> f32 {
        let width = stage.pref_width(child);
        if width > group_width {
            group_width.max(stage.min_width(child))
        } else {
            width
        }
    }

    /// Child height across a row of `row_height`
    fn child_height(&self, stage: &mut Stage, child: ElementId, row_height: f32) -> f32 {
        let mut height = if self.fill > 0.0 {
            row_height * self.fill
        } else {
            stage.pref_height(child)
        };
        if stage.has_widget(child) {
            height = height.max(stage.min_height(child));
            let max_height = stage.max_height(child);
            if max_height > 0.0 && height > max_height {
                height = max_height;
            }
        }
        height
    }

    fn ensure_size(&mut self, stage: &mut Stage, id: ElementId) {
        if self.size_invalid {
            self.compute_size(stage, id);
        }
    }

    fn compute_size(&mut self, stage: &mut Stage, id: ElementId) {
        self.size_invalid = false;
        let children = self.ordered_children(stage, id);
        self.pref_height = 0.0;

        if self.wrap {
            self.pref_width = 0.0;
            self.rows.clear();
            let pad = self.pad_left + self.pad_right;
            let group_width = stage.element(id).map_or(0.0, |e| e.width()) - pad;
            let (mut x, mut y, mut row_height, mut count) = (0.0f32, 0.0f32, 0.0f32, 0usize);
            for child in children {
                let width = Self::wrapped_width(stage, child, group_width);
                let height = stage.pref_height(child);
                let mut incr_x = width + if x > 0.0 { self.space } else { 0.0 };
                if x + incr_x > group_width && x > 0.0 {
                    self.rows.push(Line {
                        length: x,
                        thickness: row_height,
                        count,
                    });
                    self.pref_width = self.pref_width.max(x + pad);
                    if y > 0.0 {
                        y += self.wrap_space;
                    }
                    y += row_height;
                    row_height = 0.0;
                    x = 0.0;
                    count = 0;
                    incr_x = width;
                }
                x += incr_x;
                row_height = row_height.max(height);
                count += 1;
            }
            self.rows.push(Line {
                length: x,
                thickness: row_height,
                count,
            });
            self.pref_width = self.pref_width.max(x + pad);
            if y > 0.0 {
                y += self.wrap_space;
            }
            self.pref_height = y + row_height;
        } else {
            self.pref_width = self.pad_left
                + self.pad_right
                + self.space * children.len().saturating_sub(1) as f32;
            for child in children {
                self.pref_width += stage.pref_width(child);
                self.pref_height = self.pref_height.max(stage.pref_height(child));
            }
        }

        self.pref_height += self.pad_top + self.pad_bottom;
        if self.round {
            self.pref_width = self.pref_width.round_ties_even();
            self.pref_height = self.pref_height.round_ties_even();
        }
    }

    fn layout_row(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let (width, height) = stage
            .element(id)
            .map_or((0.0, 0.0), |e| (e.width(), e.height()));
        let row_height =
            if self.expand { height } else { self.pref_height } - self.pad_top - self.pad_bottom;
        let mut x = self.pad_left + self.align.offset_x(width, self.pref_width);
        let start_y = self.pad_top
            + self
                .align
                .offset_y(height - self.pad_top - self.pad_bottom, row_height);

        for child in self.ordered_children(stage, id) {
            let child_width = stage.pref_width(child);
            let child_height = self.child_height(stage, child, row_height);
            let y = start_y + self.row_align.offset_y(row_height, child_height);
            place(stage, child, self.round, (x, y, child_width, child_height))?;
            x += child_width + self.space;
        }
        Ok(())
    }

    fn layout_wrapped(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let pref_height = self.pref_height;
        if pref_height != self.last_pref_height {
            self.last_pref_height = pref_height;
            stage.invalidate_hierarchy(id);
        }

        let (width, height) = stage
            .element(id)
            .map_or((0.0, 0.0), |e| (e.width(), e.height()));
        let group_width = width - self.pad_left - self.pad_right;
        let max_width = self.pref_width - self.pad_left - self.pad_right;
        let x_start = self.pad_left + self.align.offset_x(width, self.pref_width);
        let mut row_y = self.pad_top + self.align.offset_y(height, pref_height);

        let mut children = self.ordered_children(stage, id).into_iter();
        for (index, row) in self.rows.iter().enumerate() {
            if index > 0 {
                row_y += self.wrap_space;
            }
            let mut x = x_start + self.row_align.offset_x(max_width, row.length);
            for child in children.by_ref().take(row.count) {
                let child_width = Self::wrapped_width(stage, child, group_width);
                let child_height = self.child_height(stage, child, row.thickness);
                let y = row_y + self.row_align.offset_y(row.thickness, child_height);
                place(stage, child, self.round, (x, y, child_width, child_height))?;
                x += child_width + self.space;
            }
            row_y += row.thickness;
        }
        Ok(())
    }
}

impl Widget for HorizontalGroup {
    fn attached(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        if let Some(element) = stage.element_mut(id) {
            element.set_touchable(Touchable::ChildrenOnly);
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.size_invalid = true;
    }

    fn pref_width(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        if self.wrap {
            return 0.0;
        }
        self.ensure_size(stage, id);
        self.pref_width
    }

    fn pref_height(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.ensure_size(stage, id);
        self.pref_height
    }

    fn layout(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.ensure_size(stage, id);
        if self.wrap {
            self.layout_wrapped(stage, id)
        } else {
            self.layout_row(stage, id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UiError;

    fn bounds(stage: &Stage, id: ElementId) -> (f32, f32, f32, f32) {
        let b = stage.element(id).unwrap().bounds();
        (b.x(), b.y(), b.width(), b.height())
    }

    fn sized(stage: &mut Stage, parent: ElementId, width: f32, height: f32) -> ElementId {
        let e = stage.create_element();
        stage.set_size(e, width, height).unwrap();
        stage.add_element(parent, e).unwrap();
        e
    }

    #[test]
    fn test_pref_size_sums_children() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = HorizontalGroup::new();
        group.space(5.0).pad(2.0).unwrap();
        let group = stage.create_widget(group);
        assert_eq!(stage.pref_width(group), 4.0);

        sized(&mut stage, group, 10.0, 10.0);
        sized(&mut stage, group, 20.0, 30.0);
        assert_eq!(stage.pref_width(group), 4.0 + 30.0 + 5.0);
        assert_eq!(stage.pref_height(group), 34.0);
    }

    #[test]
    fn test_row_layout() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = HorizontalGroup::new();
        group.space(5.0);
        let group = stage.create_widget(group);
        let a = sized(&mut stage, group, 10.0, 10.0);
        let b = sized(&mut stage, group, 20.0, 30.0);
        let c = sized(&mut stage, group, 30.0, 20.0);
        stage.set_size(group, 100.0, 50.0).unwrap();
        stage.validate(group).unwrap();

        // Left aligned, the row centered vertically and children centered in it
        assert_eq!(bounds(&stage, a), (0.0, 20.0, 10.0, 10.0));
        assert_eq!(bounds(&stage, b), (15.0, 10.0, 20.0, 30.0));
        assert_eq!(bounds(&stage, c), (40.0, 15.0, 30.0, 20.0));
    }

    #[test]
    fn test_reverse_and_right_align() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = HorizontalGroup::new();
        group.reverse(true).right().top().row_top();
        let group = stage.create_widget(group);
        let a = sized(&mut stage, group, 10.0, 10.0);
        let b = sized(&mut stage, group, 20.0, 30.0);
        stage.set_size(group, 100.0, 50.0).unwrap();
        stage.validate(group).unwrap();

        assert_eq!(bounds(&stage, b), (70.0, 0.0, 20.0, 30.0));
        assert_eq!(bounds(&stage, a), (90.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_grow_fills_height() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = HorizontalGroup::new();
        group.grow().pad_sides(4.0, 0.0, 6.0, 0.0).unwrap();
        let group = stage.create_widget(group);
        let a = sized(&mut stage, group, 10.0, 10.0);
        stage.set_size(group, 100.0, 50.0).unwrap();
        stage.validate(group).unwrap();
        assert_eq!(bounds(&stage, a), (0.0, 4.0, 10.0, 40.0));
    }

    #[test]
    fn test_wrapping() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = HorizontalGroup::new();
        group.wrap(true).space(5.0).wrap_space(2.0);
        let group = stage.create_widget(group);
        let a = sized(&mut stage, group, 20.0, 10.0);
        let b = sized(&mut stage, group, 20.0, 10.0);
        let c = sized(&mut stage, group, 20.0, 10.0);
        stage.set_size(group, 50.0, 40.0).unwrap();

        assert_eq!(stage.pref_width(group), 0.0);
        assert_eq!(stage.pref_height(group), 22.0);

        stage.validate(group).unwrap();
        assert_eq!(bounds(&stage, a), (0.0, 9.0, 20.0, 10.0));
        assert_eq!(bounds(&stage, b), (25.0, 9.0, 20.0, 10.0));
        // The short row is centered in the widest row: 12.5 rounds to even
        assert_eq!(bounds(&stage, c), (12.0, 21.0, 20.0, 10.0));
    }

    #[test]
    fn test_negative_pad_rejected() {
        let mut group = HorizontalGroup::new();
        assert!(matches!(
            group.pad(-1.0),
            Err(UiError::InvalidConfig { name: "pad_top", .. })
        ));
    }
}
