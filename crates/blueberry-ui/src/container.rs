//! Container: a group with a single child, sized and aligned within padding.

use crate::align::Align;
use crate::element::Touchable;
use crate::error::{UiError, UiResult};
use crate::output::DrawOutput;
use crate::primitives::Rect;
use crate::stage::{ElementId, Stage};
use crate::style::Drawable;
use crate::value::Value;
use crate::widget::{ChildPolicy, Widget};

pub struct Container {
    id: Option<ElementId>,
    element: Option<ElementId>,
    min_width: Value,
    min_height: Value,
    pref_width: Value,
    pref_height: Value,
    max_width: Value,
    max_height: Value,
    pad_top: Value,
    pad_left: Value,
    pad_bottom: Value,
    pad_right: Value,
    fill_x: f32,
    fill_y: f32,
    align: Align,
    background: Option<Drawable>,
    clip: bool,
    round: bool,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            id: None,
            element: None,
            min_width: Value::MinWidth,
            min_height: Value::MinHeight,
            pref_width: Value::PrefWidth,
            pref_height: Value::PrefHeight,
            max_width: Value::ZERO,
            max_height: Value::ZERO,
            pad_top: Value::ZERO,
            pad_left: Value::ZERO,
            pad_bottom: Value::ZERO,
            pad_right: Value::ZERO,
            fill_x: 0.0,
            fill_y: 0.0,
            align: Align::CENTER,
            background: None,
            clip: false,
            round: true,
        }
    }

    /// Builder form of [`Container::set_background`], for use before the container is on a stage
    pub fn with_background(mut self, background: Drawable) -> Self {
        self.apply_background(Some(background));
        self
    }

    /// Put `element` in the slot, replacing (and removing) the current one.
    ///
    /// `None` empties the slot.
    pub fn set_element(&mut self, stage: &mut Stage, element: Option<ElementId>) -> UiResult<()> {
        let id = self
            .id
            .ok_or(UiError::InvalidArgument("container is not attached to a stage"))?;
        if element == Some(id) {
            return Err(UiError::InvalidArgument("a container cannot hold itself"));
        }
        if element == self.element {
            return Ok(());
        }
        if let Some(old) = self.element.take() {
            if stage.parent(old) == Some(id) {
                stage.remove_element(id, old)?;
            }
        }
        if let Some(element) = element {
            stage.adopt(id, element, None)?;
        }
        self.element = element;
        Ok(())
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    /// Set the background and take its insets as padding. `None` clears both.
    pub fn set_background(&mut self, stage: &mut Stage, background: Option<Drawable>) {
        if self.background == background {
            return;
        }
        self.apply_background(background);
        if let Some(id) = self.id {
            stage.invalidate_hierarchy(id);
        }
    }

    fn apply_background(&mut self, background: Option<Drawable>) {
        self.background = background;
        let b = background.unwrap_or_default();
        self.pad_top = Value::Fixed(b.top_height);
        self.pad_left = Value::Fixed(b.left_width);
        self.pad_bottom = Value::Fixed(b.bottom_height);
        self.pad_right = Value::Fixed(b.right_width);
    }

    pub fn background(&self) -> Option<&Drawable> {
        self.background.as_ref()
    }

    // Size of the child

    /// Set min, pref and max size of the child to the same value
    pub fn size(&mut self, size: impl Into<Value>) -> &mut Self {
        let size = size.into();
        self.width(size).height(size)
    }

    pub fn width(&mut self, width: impl Into<Value>) -> &mut Self {
        let width = width.into();
        self.min_width = width;
        self.pref_width = width;
        self.max_width = width;
        self
    }

    pub fn height(&mut self, height: impl Into<Value>) -> &mut Self {
        let height = height.into();
        self.min_height = height;
        self.pref_height = height;
        self.max_height = height;
        self
    }

    pub fn min_size(&mut self, width: impl Into<Value>, height: impl Into<Value>) -> &mut Self {
        self.min_width = width.into();
        self.min_height = height.into();
        self
    }

    pub fn pref_size(&mut self, width: impl Into<Value>, height: impl Into<Value>) -> &mut Self {
        self.pref_width = width.into();
        self.pref_height = height.into();
        self
    }

    pub fn max_size(&mut self, width: impl Into<Value>, height: impl Into<Value>) -> &mut Self {
        self.max_width = width.into();
        self.max_height = height.into();
        self
    }

    // Padding

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
        let sides = [top.into(), left.into(), bottom.into(), right.into()];
        if let Some(Value::Fixed(v)) = sides
            .iter()
            .find(|side| matches!(side, Value::Fixed(v) if *v < 0.0))
        {
            return Err(UiError::InvalidConfig {
                name: "pad",
                value: *v,
                reason: "must be >= 0",
            });
        }
        let [top, left, bottom, right] = sides;
        self.pad_top = top;
        self.pad_left = left;
        self.pad_bottom = bottom;
        self.pad_right = right;
        Ok(self)
    }

    /// Resolved (top, left, bottom, right) padding
    pub fn resolved_pad(&self, stage: &mut Stage) -> (f32, f32, f32, f32) {
        let context = self.id;
        (
            self.pad_top.get(stage, context),
            self.pad_left.get(stage, context),
            self.pad_bottom.get(stage, context),
            self.pad_right.get(stage, context),
        )
    }

    // Fill and alignment

    pub fn fill(&mut self) -> &mut Self {
        self.fill_xy(1.0, 1.0)
    }

    pub fn fill_x(&mut self) -> &mut Self {
        self.fill_x = 1.0;
        self
    }

    pub fn fill_y(&mut self) -> &mut Self {
        self.fill_y = 1.0;
        self
    }

    pub fn fill_xy(&mut self, x: f32, y: f32) -> &mut Self {
        self.fill_x = x;
        self.fill_y = y;
        self
    }

    pub fn align(&mut self, align: Align) -> &mut Self {
        self.align = align;
        self
    }

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

    pub fn set_round(&mut self, round: bool) -> &mut Self {
        self.round = round;
        self
    }

    pub fn set_clip(&mut self, clip: bool) -> &mut Self {
        self.clip = clip;
        self
    }
}

impl Widget for Container {
    fn attached(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.id = Some(id);
        if let Some(element) = stage.element_mut(id) {
            element.set_touchable(Touchable::ChildrenOnly);
        }
        Ok(())
    }

    fn min_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let (_, left, _, right) = self.resolved_pad(stage);
        self.min_width.get(stage, self.element) + left + right
    }

    fn min_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let (top, _, bottom, _) = self.resolved_pad(stage);
        self.min_height.get(stage, self.element) + top + bottom
    }

    fn pref_width(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        let mut width = self.pref_width.get(stage, self.element);
        if let Some(background) = &self.background {
            width = width.max(background.min_width);
        }
        let (_, left, _, right) = self.resolved_pad(stage);
        self.min_width(stage, id).max(width + left + right)
    }

    fn pref_height(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        let mut height = self.pref_height.get(stage, self.element);
        if let Some(background) = &self.background {
            height = height.max(background.min_height);
        }
        let (top, _, bottom, _) = self.resolved_pad(stage);
        self.min_height(stage, id).max(height + top + bottom)
    }

    fn max_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let width = self.max_width.get(stage, self.element);
        if width > 0.0 {
            let (_, left, _, right) = self.resolved_pad(stage);
            return width + left + right;
        }
        width
    }

    fn max_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let height = self.max_height.get(stage, self.element);
        if height > 0.0 {
            let (top, _, bottom, _) = self.resolved_pad(stage);
            return height + top + bottom;
        }
        height
    }

    fn layout(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let Some(child) = self.element else {
            return Ok(());
        };
        let (pad_top, pad_left, pad_bottom, pad_right) = self.resolved_pad(stage);
        let (width, height) = stage
            .element(id)
            .map(|e| (e.width(), e.height()))
            .ok_or(UiError::UnknownElement(id))?;
        let container_width = width - pad_left - pad_right;
        let container_height = height - pad_top - pad_bottom;

        let context = Some(child);
        let min_width = self.min_width.get(stage, context);
        let min_height = self.min_height.get(stage, context);
        let pref_width = self.pref_width.get(stage, context);
        let pref_height = self.pref_height.get(stage, context);
        let max_width = self.max_width.get(stage, context);
        let max_height = self.max_height.get(stage, context);

        let mut width = if self.fill_x > 0.0 {
            container_width * self.fill_x
        } else {
            pref_width.min(container_width)
        };
        width = width.max(min_width);
        if max_width > 0.0 {
            width = width.min(max_width);
        }

        let mut height = if self.fill_y > 0.0 {
            container_height * self.fill_y
        } else {
            pref_height.min(container_height)
        };
        height = height.max(min_height);
        if max_height > 0.0 {
            height = height.min(max_height);
        }

        let mut x = pad_left + self.align.offset_x(container_width, width);
        let mut y = pad_top + self.align.offset_y(container_height, height);
        if self.round {
            x = x.round_ties_even();
            y = y.round_ties_even();
            width = width.round_ties_even();
            height = height.round_ties_even();
        }

        stage.set_bounds(child, x, y, width, height)?;
        stage.validate(child)
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

    fn child_removed(&mut self, child: ElementId) {
        if self.element == Some(child) {
            self.element = None;
        }
    }

    fn child_policy(&self) -> ChildPolicy {
        ChildPolicy::Dedicated("Container::set_element")
    }
}
