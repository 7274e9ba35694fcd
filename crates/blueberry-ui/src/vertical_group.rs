//! VerticalGroup: children in a column top to bottom, optionally wrapping onto several columns.

use crate::align::Align;
use crate::element::Touchable;
use crate::error::{non_negative, UiResult};
use crate::horizontal_group::{place, Line};
use crate::stage::{ElementId, Stage};
use crate::widget::Widget;

#[derive(Debug)]
pub struct VerticalGroup {
    size_invalid: bool,
    pref_width: f32,
    pref_height: f32,
    last_pref_width: f32,
    columns: Vec<Line>,
    align: Align,
    column_align: Align,
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

impl Default for VerticalGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl VerticalGroup {
    pub fn new() -> Self {
        Self {
            size_invalid: true,
            pref_width: 0.0,
            pref_height: 0.0,
            last_pref_width: 0.0,
            columns: Vec::new(),
            align: Align::TOP,
            column_align: Align::CENTER,
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

    pub fn space(&mut self, space: f32) -> &mut Self {
        self.space = space;
        self.size_invalid = true;
        self
    }

    pub fn spacing(&self) -> f32 {
        self.space
    }

    /// Space between wrapped columns
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

    pub fn padding(&self) -> (f32, f32, f32, f32) {
        (self.pad_top, self.pad_left, self.pad_bottom, self.pad_right)
    }

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

    /// Alignment of each child within its column, and of each column when wrapping
    pub fn column_align(&mut self, column_align: Align) -> &mut Self {
        self.column_align = column_align;
        self
    }

    pub fn column_center(&mut self) -> &mut Self {
        self.column_align(Align::CENTER)
    }

    pub fn column_top(&mut self) -> &mut Self {
        self.column_align = self.column_align.with_side(Align::TOP);
        self
    }

    pub fn column_left(&mut self) -> &mut Self {
        self.column_align = self.column_align.with_side(Align::LEFT);
        self
    }

    pub fn column_bottom(&mut self) -> &mut Self {
        self.column_align = self.column_align.with_side(Align::BOTTOM);
        self
    }

    pub fn column_right(&mut self) -> &mut Self {
        self.column_align = self.column_align.with_side(Align::RIGHT);
        self
    }

    pub fn column_alignment(&self) -> Align {
        self.column_align
    }

    /// Fraction of the column width children are stretched to
    pub fn fill(&mut self, fill: f32) -> &mut Self {
        self.fill = fill;
        self
    }

    pub fn fill_amount(&self) -> f32 {
        self.fill
    }

    pub fn expand(&mut self, expand: bool) -> &mut Self {
        self.expand = expand;
        self
    }

    pub fn is_expand(&self) -> bool {
        self.expand
    }

    pub fn grow(&mut self) -> &mut Self {
        self.expand = true;
        self.fill = 1.0;
        self
    }

    /// Start a new column when a child doesn't fit the group height. The pref
    /// height of a wrapping group is 0.
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

    fn wrapped_height(stage: &mut Stage, child: ElementId, group_height: f32) -> f32 {
        let height = stage.pref_height(child);
        if height > group_height {
            group_height.max(stage.min_height(child))
        } else {
            height
        }
    }

    fn child_width(&self, stage: &mut Stage, child: ElementId, column_width: f32) -> f32 {
        let mut width = if self.fill > 0.0 {
            column_width * self.fill
        } else {
            stage.pref_width(child)
        };
        if stage.has_widget(child) {
            width = width.max(stage.min_width(child));
            let max_width = stage.max_width(child);
            if max_width > 0.0 && width > max_width {
                width = max_width;
            }
        }
        width
    }

    fn ensure_size(&mut self, stage: &mut Stage, id: ElementId) {
        if self.size_invalid {
            self.compute_size(stage, id);
        }
    }

    fn compute_size(&mut self, stage: &mut Stage, id: ElementId) {
        self.size_invalid = false;
        let children = self.ordered_children(stage, id);
        self.pref_width = 0.0;

        if self.wrap {
            self.pref_height = 0.0;
            self.columns.clear();
            let pad = self.pad_top + self.pad_bottom;
            let group_height = stage.element(id).map_or(0.0, |e| e.height()) - pad;
            let (mut x, mut y, mut column_width, mut count) = (0.0f32, 0.0f32, 0.0f32, 0usize);
            for child in children {
                let width = stage.pref_width(child);
                let height = Self::wrapped_height(stage, child, group_height);
                let mut incr_y = height + if y > 0.0 { self.space } else { 0.0 };
                if y + incr_y > group_height && y > 0.0 {
                    self.columns.push(Line {
                        length: y,
                        thickness: column_width,
                        count,
                    });
                    self.pref_height = self.pref_height.max(y + pad);
                    if x > 0.0 {
                        x += self.wrap_space;
                    }
                    x += column_width;
                    column_width = 0.0;
                    y = 0.0;
                    count = 0;
                    incr_y = height;
                }
                y += incr_y;
                column_width = column_width.max(width);
                count += 1;
            }
            self.columns.push(Line {
                length: y,
                thickness: column_width,
                count,
            });
            self.pref_height = self.pref_height.max(y + pad);
            if x > 0.0 {
                x += self.wrap_space;
            }
            self.pref_width = x + column_width;
        } else {
            self.pref_height = self.pad_top
                + self.pad_bottom
                + self.space * children.len().saturating_sub(1) as f32;
            for child in children {
                self.pref_width = self.pref_width.max(stage.pref_width(child));
                self.pref_height += stage.pref_height(child);
            }
        }

        self.pref_width += self.pad_left + self.pad_right;
        if self.round {
            self.pref_width = self.pref_width.round_ties_even();
            self.pref_height = self.pref_height.round_ties_even();
        }
    }

    fn layout_column(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let (width, height) = stage
            .element(id)
            .map_or((0.0, 0.0), |e| (e.width(), e.height()));
        let column_width =
            if self.expand { width } else { self.pref_width } - self.pad_left - self.pad_right;
        let mut y = self.pad_top + self.align.offset_y(height, self.pref_height);
        let start_x = self.pad_left
            + self
                .align
                .offset_x(width - self.pad_left - self.pad_right, column_width);

        for child in self.ordered_children(stage, id) {
            let child_height = stage.pref_height(child);
            let child_width = self.child_width(stage, child, column_width);
            let x = start_x + self.column_align.offset_x(column_width, child_width);
            place(stage, child, self.round, (x, y, child_width, child_height))?;
            y += child_height + self.space;
        }
        Ok(())
    }

    fn layout_wrapped(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let pref_width = self.pref_width;
        if pref_width != self.last_pref_width {
            self.last_pref_width = pref_width;
            stage.invalidate_hierarchy(id);
        }

        let (width, height) = stage
            .element(id)
            .map_or((0.0, 0.0), |e| (e.width(), e.height()));
        let group_height = height - self.pad_top - self.pad_bottom;
        let max_height = self.pref_height - self.pad_top - self.pad_bottom;
        let y_start = self.pad_top + self.align.offset_y(height, self.pref_height);
        let mut column_x = self.pad_left + self.align.offset_x(width, pref_width);

        let mut children = self.ordered_children(stage, id).into_iter();
        for (index, column) in self.columns.iter().enumerate() {
            if index > 0 {
                column_x += self.wrap_space;
            }
            let mut y = y_start + self.column_align.offset_y(max_height, column.length);
            for child in children.by_ref().take(column.count) {
                let child_height = Self::wrapped_height(stage, child, group_height);
                let child_width = self.child_width(stage, child, column.thickness);
                let x = column_x + self.column_align.offset_x(column.thickness, child_width);
                place(stage, child, self.round, (x, y, child_width, child_height))?;
                y += child_height + self.space;
            }
            column_x += column.thickness;
        }
        Ok(())
    }
}

impl Widget for VerticalGroup {
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
        self.ensure_size(stage, id);
        self.pref_width
    }

    fn pref_height(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        if self.wrap {
            return 0.0;
        }
        self.ensure_size(stage, id);
        self.pref_height
    }

    fn layout(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.ensure_size(stage, id);
        if self.wrap {
            self.layout_wrapped(stage, id)
        } else {
            self.layout_column(stage, id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;

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
    fn test_column_layout() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = VerticalGroup::new();
        group.space(5.0);
        let group = stage.create_widget(group);
        let a = sized(&mut stage, group, 10.0, 10.0);
        let b = sized(&mut stage, group, 30.0, 20.0);
        assert_eq!(stage.pref_width(group), 30.0);
        assert_eq!(stage.pref_height(group), 35.0);

        stage.set_size(group, 100.0, 100.0).unwrap();
        stage.validate(group).unwrap();
        // Top aligned, the column centered horizontally
        assert_eq!(bounds(&stage, a), (45.0, 0.0, 10.0, 10.0));
        assert_eq!(bounds(&stage, b), (35.0, 15.0, 30.0, 20.0));
    }

    #[test]
    fn test_fill_respects_max_width() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = VerticalGroup::new();
        group.grow().column_left();
        let group = stage.create_widget(group);
        let mut capped = Container::new();
        capped.pref_size(10.0, 10.0).max_size(40.0, 0.0);
        let capped = stage.create_widget(capped);
        stage.add_element(group, capped).unwrap();
        let plain = sized(&mut stage, group, 10.0, 10.0);

        stage.set_size(group, 100.0, 100.0).unwrap();
        stage.validate(group).unwrap();
        assert_eq!(bounds(&stage, capped), (0.0, 0.0, 40.0, 10.0));
        assert_eq!(bounds(&stage, plain), (0.0, 10.0, 100.0, 10.0));
    }

    #[test]
    fn test_wrapping_into_columns() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = VerticalGroup::new();
        group.wrap(true).space(5.0).wrap_space(2.0);
        let group = stage.create_widget(group);
        let a = sized(&mut stage, group, 10.0, 20.0);
        let b = sized(&mut stage, group, 10.0, 20.0);
        let c = sized(&mut stage, group, 10.0, 20.0);
        stage.set_size(group, 40.0, 50.0).unwrap();

        assert_eq!(stage.pref_height(group), 0.0);
        assert_eq!(stage.pref_width(group), 22.0);

        stage.validate(group).unwrap();
        assert_eq!(bounds(&stage, a), (9.0, 0.0, 10.0, 20.0));
        assert_eq!(bounds(&stage, b), (9.0, 25.0, 10.0, 20.0));
        assert_eq!(bounds(&stage, c), (21.0, 12.0, 10.0, 20.0));
    }

    #[test]
    fn test_reverse_order() {
        let mut stage = Stage::new(200.0, 200.0);
        let mut group = VerticalGroup::new();
        group.reverse(true);
        let group = stage.create_widget(group);
        let a = sized(&mut stage, group, 10.0, 10.0);
        let b = sized(&mut stage, group, 10.0, 30.0);
        stage.set_size(group, 10.0, 40.0).unwrap();
        stage.validate(group).unwrap();
        assert_eq!(bounds(&stage, b).1, 0.0);
        assert_eq!(bounds(&stage, a).1, 30.0);
    }
}
