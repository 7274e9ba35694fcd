//! Split pane: two children side by side (or stacked) with a draggable
//! handle between them.

use blueberry_ui::{
    ChildPolicy, DrawOutput, Drawable, ElementId, Event, InputListener, ListenerRef, Point, Rect,
    Stage, UiError, UiResult, Widget,
};
use blueberry_ui_macros::WithBuilders;

#[derive(Clone, Copy, Debug, Default, PartialEq, WithBuilders)]
pub struct SplitPaneStyle {
    /// Drawn between the children. Its min size is the handle thickness.
    pub handle: Option<Drawable>,
    /// Replaces `handle` while the pointer is over it
    pub handle_over: Option<Drawable>,
}

pub struct SplitPane {
    id: Option<ElementId>,
    first: Option<ElementId>,
    second: Option<ElementId>,
    style: SplitPaneStyle,
    listener: ListenerRef,
    vertical: bool,
    clamp_split_amount: bool,
    split_amount: f32,
    min_amount: f32,
    max_amount: f32,
    first_bounds: Rect,
    second_bounds: Rect,
    handle_bounds: Rect,
    cursor_over_handle: bool,
    dragging: bool,
    last_point: Point,
    handle_position: Point,
}

impl SplitPane {
    /// A vertical pane stacks the first child above the second
    pub fn new(vertical: bool, style: SplitPaneStyle) -> Self {
        Self {
            id: None,
            first: None,
            second: None,
            style,
            listener: ListenerRef::input(HandleDrag),
            vertical,
            clamp_split_amount: true,
            split_amount: 0.5,
            min_amount: 0.0,
            max_amount: 1.0,
            first_bounds: Rect::ZERO,
            second_bounds: Rect::ZERO,
            handle_bounds: Rect::ZERO,
            cursor_over_handle: false,
            dragging: false,
            last_point: Point::zero(),
            handle_position: Point::zero(),
        }
    }

    pub fn set_first_widget(&mut self, stage: &mut Stage, widget: Option<ElementId>) -> UiResult<()> {
        let current = self.first;
        self.first = self.replace_slot(stage, current, widget)?;
        Ok(())
    }

    pub fn set_second_widget(&mut self, stage: &mut Stage, widget: Option<ElementId>) -> UiResult<()> {
        let current = self.second;
        self.second = self.replace_slot(stage, current, widget)?;
        Ok(())
    }

    fn replace_slot(
        &mut self,
        stage: &mut Stage,
        current: Option<ElementId>,
        widget: Option<ElementId>,
    ) -> UiResult<Option<ElementId>> {
        let id = self
            .id
            .ok_or(UiError::InvalidArgument("split pane is not attached to a stage"))?;
        if widget == Some(id) {
            return Err(UiError::InvalidArgument("a split pane cannot hold itself"));
        }
        if widget == current {
            return Ok(current);
        }
        if let Some(old) = current {
            if stage.parent(old) == Some(id) {
                stage.remove_element(id, old)?;
            }
        }
        if let Some(widget) = widget {
            stage.adopt(id, widget, None)?;
        }
        stage.invalidate_hierarchy(id);
        Ok(widget)
    }

    pub fn first_widget(&self) -> Option<ElementId> {
        self.first
    }

    pub fn second_widget(&self) -> Option<ElementId> {
        self.second
    }

    pub fn style(&self) -> &SplitPaneStyle {
        &self.style
    }

    pub fn set_style(&mut self, stage: &mut Stage, style: SplitPaneStyle) {
        self.style = style;
        self.invalidate_pane(stage, true);
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn set_vertical(&mut self, stage: &mut Stage, vertical: bool) {
        if self.vertical == vertical {
            return;
        }
        self.vertical = vertical;
        self.invalidate_pane(stage, true);
    }

    pub fn split_amount(&self) -> f32 {
        self.split_amount
    }

    /// Share of the available space given to the first child. Clamped again during layout.
    pub fn set_split_amount(&mut self, stage: &mut Stage, amount: f32) -> UiResult<()> {
        self.split_amount = unit("split_amount", amount)?;
        self.invalidate_pane(stage, false);
        Ok(())
    }

    pub fn min_split_amount(&self) -> f32 {
        self.min_amount
    }

    pub fn set_min_split_amount(&mut self, amount: f32) -> UiResult<()> {
        self.min_amount = unit("min_split_amount", amount)?;
        Ok(())
    }

    pub fn max_split_amount(&self) -> f32 {
        self.max_amount
    }

    pub fn set_max_split_amount(&mut self, amount: f32) -> UiResult<()> {
        self.max_amount = unit("max_split_amount", amount)?;
        Ok(())
    }

    pub fn is_clamp_split_amount(&self) -> bool {
        self.clamp_split_amount
    }

    /// Keep the split within the min sizes of the children during layout
    pub fn set_clamp_split_amount(&mut self, clamp: bool) {
        self.clamp_split_amount = clamp;
    }

    pub fn is_cursor_over_handle(&self) -> bool {
        self.cursor_over_handle
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn handle_bounds(&self) -> Rect {
        self.handle_bounds
    }

    fn invalidate_pane(&self, stage: &mut Stage, hierarchy: bool) {
        if let Some(id) = self.id {
            if hierarchy {
                stage.invalidate_hierarchy(id);
            } else {
                stage.invalidate(id);
            }
        }
    }

    fn handle_size(&self) -> (f32, f32) {
        self.style
            .handle
            .map_or((0.0, 0.0), |h| (h.min_width, h.min_height))
    }

    /// Min size of a slot along the split axis. Plain elements do not constrain the split.
    fn slot_min(&self, stage: &mut Stage, slot: Option<ElementId>) -> f32 {
        match slot {
            Some(child) if stage.has_widget(child) => {
                if self.vertical {
                    stage.min_height(child)
                } else {
                    stage.min_width(child)
                }
            }
            _ => 0.0,
        }
    }

    fn clamp(&mut self, stage: &mut Stage, width: f32, height: f32) {
        let (handle_width, handle_height) = self.handle_size();
        let available = if self.vertical {
            height - handle_height
        } else {
            width - handle_width
        };
        let first_min = self.slot_min(stage, self.first);
        let second_min = self.slot_min(stage, self.second);

        let mut min = self.min_amount;
        let mut max = self.max_amount;
        if self.first.is_some() {
            min = min.max((first_min / available).min(1.0));
        }
        if self.second.is_some() {
            max = max.min(1.0 - (second_min / available).min(1.0));
        }

        self.split_amount = if min > max {
            // Both children cannot fit, split the difference
            0.5 * (min + max)
        } else {
            self.split_amount.min(max).max(min)
        };
    }

    fn calculate_bounds(&mut self, width: f32, height: f32) {
        let (handle_width, handle_height) = self.handle_size();
        if self.vertical {
            let available = height - handle_height;
            let top = (available * self.split_amount).trunc();
            self.first_bounds = Rect::from_xywh(0.0, 0.0, width, top);
            self.handle_bounds = Rect::from_xywh(0.0, top, width, handle_height);
            self.second_bounds =
                Rect::from_xywh(0.0, top + handle_height, width, available - top);
        } else {
            let available = width - handle_width;
            let left = (available * self.split_amount).trunc();
            self.first_bounds = Rect::from_xywh(0.0, 0.0, left, height);
            self.handle_bounds = Rect::from_xywh(left, 0.0, handle_width, height);
            self.second_bounds =
                Rect::from_xywh(left + handle_width, 0.0, available - left, height);
        }
    }

    fn touch_down(&mut self, x: f32, y: f32) -> bool {
        if !self.handle_bounds.contains(Point::new(x, y)) {
            return false;
        }
        self.last_point = Point::new(x, y);
        self.handle_position = Point::new(x, y);
        self.dragging = true;
        true
    }

    /// Follow the pointer over a pane of the given size, returning true when the split moved
    fn drag(&mut self, width: f32, height: f32, x: f32, y: f32) -> bool {
        if !self.dragging {
            return false;
        }
        let (handle_width, handle_height) = self.handle_size();
        let (available, position) = if self.vertical {
            self.handle_position.y += y - self.last_point.y;
            (height - handle_height, self.handle_position.y)
        } else {
            self.handle_position.x += x - self.last_point.x;
            (width - handle_width, self.handle_position.x)
        };
        self.last_point = Point::new(x, y);
        if available <= 0.0 {
            return false;
        }
        self.split_amount = position.max(0.0).min(available) / available;
        true
    }
}

fn unit(name: &'static str, value: f32) -> UiResult<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(UiError::InvalidConfig {
            name,
            value,
            reason: "must be between 0 and 1",
        })
    }
}

impl Widget for SplitPane {
    fn pref_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let first = self.first.map_or(0.0, |c| stage.pref_width(c));
        let second = self.second.map_or(0.0, |c| stage.pref_width(c));
        if self.vertical {
            first.max(second)
        } else {
            first + self.handle_size().0 + second
        }
    }

    fn pref_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let first = self.first.map_or(0.0, |c| stage.pref_height(c));
        let second = self.second.map_or(0.0, |c| stage.pref_height(c));
        if self.vertical {
            first + self.handle_size().1 + second
        } else {
            first.max(second)
        }
    }

    fn min_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let first = self.first.map_or(0.0, |c| stage.min_width(c));
        let second = self.second.map_or(0.0, |c| stage.min_width(c));
        if self.vertical {
            first.max(second)
        } else {
            first + self.handle_size().0 + second
        }
    }

    fn min_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let first = self.first.map_or(0.0, |c| stage.min_height(c));
        let second = self.second.map_or(0.0, |c| stage.min_height(c));
        if self.vertical {
            first + self.handle_size().1 + second
        } else {
            first.max(second)
        }
    }

    fn layout(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let Some(element) = stage.element(id) else {
            return Ok(());
        };
        let (width, height) = (element.width(), element.height());
        if self.clamp_split_amount {
            self.clamp(stage, width, height);
        }
        self.calculate_bounds(width, height);

        for (slot, bounds) in [(self.first, self.first_bounds), (self.second, self.second_bounds)] {
            if let Some(child) = slot {
                stage.set_bounds(child, bounds.x(), bounds.y(), bounds.width(), bounds.height())?;
                stage.validate(child)?;
            }
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
        let alpha = stage.element(id).map_or(1.0, |e| e.color().a) * parent_alpha;

        for (slot, bounds) in [(self.first, self.first_bounds), (self.second, self.second_bounds)] {
            let Some(child) = slot else {
                continue;
            };
            if !stage.element(child).is_some_and(|e| e.is_visible()) {
                continue;
            }
            if out.push_clip(stage.calculate_scissors(id, bounds)) {
                let result = stage.draw_element(child, out, alpha);
                out.pop_clip();
                result?;
            }
        }

        let handle = self
            .cursor_over_handle
            .then_some(self.style.handle_over)
            .flatten()
            .or(self.style.handle);
        if let Some(handle) = handle {
            let r = self.handle_bounds;
            handle.draw(out, r.x(), r.y(), r.width(), r.height(), alpha);
        }
        Ok(())
    }

    fn child_removed(&mut self, child: ElementId) {
        if self.first == Some(child) {
            self.first = None;
        }
        if self.second == Some(child) {
            self.second = None;
        }
    }

    fn child_policy(&self) -> ChildPolicy {
        ChildPolicy::Dedicated("SplitPane::set_first_widget")
    }

    fn attached(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.id = Some(id);
        stage.add_listener(id, self.listener.clone())?;
        Ok(())
    }
}

/// Drags the handle and tracks hovering over it
struct HandleDrag;

impl HandleDrag {
    fn pane_mut<'a>(stage: &'a mut Stage, event: &Event) -> Option<&'a mut SplitPane> {
        event
            .listener_element()
            .and_then(|pane| stage.widget_mut::<SplitPane>(pane))
    }
}

impl InputListener for HandleDrag {
    fn touch_down(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        _pointer: i32,
        _button: i32,
    ) -> bool {
        if !Self::pane_mut(stage, event).is_some_and(|p| p.touch_down(x, y)) {
            return false;
        }
        // Grabbing the handle takes focus away from whatever was being edited
        if let Err(err) = stage.set_keyboard_focus(None) {
            log::warn!("clearing keyboard focus for a split drag failed: {err}");
        }
        true
    }

    fn touch_dragged(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32, _pointer: i32) {
        let Some(pane) = event.listener_element() else {
            return;
        };
        let Some((width, height)) = stage.element(pane).map(|e| (e.width(), e.height())) else {
            return;
        };
        if stage
            .widget_mut::<SplitPane>(pane)
            .is_some_and(|p| p.drag(width, height, x, y))
        {
            stage.invalidate(pane);
        }
    }

    fn touch_up(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        _pointer: i32,
        _button: i32,
    ) {
        if let Some(p) = Self::pane_mut(stage, event) {
            p.dragging = false;
            p.cursor_over_handle = p.handle_bounds.contains(Point::new(x, y));
        }
    }

    fn mouse_moved(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32) -> bool {
        if let Some(p) = Self::pane_mut(stage, event) {
            p.cursor_over_handle = p.handle_bounds.contains(Point::new(x, y));
        }
        false
    }

    fn exit(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        _x: f32,
        _y: f32,
        _pointer: i32,
        _to: Option<ElementId>,
    ) {
        if let Some(p) = Self::pane_mut(stage, event) {
            if !p.dragging {
                p.cursor_over_handle = false;
            }
        }
    }
}
