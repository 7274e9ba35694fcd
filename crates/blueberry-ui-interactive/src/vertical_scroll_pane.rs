//! A lighter scroll pane for lists and text: scroll bars that always show and
//! take space, smooth wheel scrolling and no flicking.

use blueberry_ui::{
    ChildPolicy, DrawOutput, Drawable, ElementId, Event, HitOverride, InputListener, ListenerRef,
    Point, Rect, Stage, Touchable, UiError, UiResult, Widget,
};
use blueberry_ui_macros::WithBuilders;

use crate::scroll_pane::{approach, clamp_to, percent};

const DEFAULT_SIZE: f32 = 150.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, WithBuilders)]
pub struct VerticalScrollPaneStyle {
    pub background: Option<Drawable>,
    pub h_scroll: Option<Drawable>,
    pub h_scroll_knob: Option<Drawable>,
    pub v_scroll: Option<Drawable>,
    pub v_scroll_knob: Option<Drawable>,
}

/// Scrolls a single child. It takes the scroll focus while the pointer is
/// over it, so the wheel works without a click first.
pub struct VerticalScrollPane {
    id: Option<ElementId>,
    element: Option<ElementId>,
    style: VerticalScrollPaneStyle,
    bar_listener: ListenerRef,
    wheel_listener: ListenerRef,

    disable_x: bool,
    disable_y: bool,
    scroll_x: bool,
    scroll_y: bool,
    area_width: f32,
    area_height: f32,
    widget_area_bounds: Rect,
    h_scroll_bounds: Rect,
    h_knob_bounds: Rect,
    v_scroll_bounds: Rect,
    v_knob_bounds: Rect,

    amount_x: f32,
    amount_y: f32,
    visual_amount_x: f32,
    visual_amount_y: f32,
    max_x: f32,
    max_y: f32,

    last_point: Point,
    handle_position: f32,
    drag_h: bool,
    drag_v: bool,
}

impl VerticalScrollPane {
    pub fn new(style: VerticalScrollPaneStyle) -> Self {
        Self {
            id: None,
            element: None,
            style,
            bar_listener: ListenerRef::input(BarInput),
            wheel_listener: ListenerRef::input(WheelInput),
            disable_x: false,
            disable_y: false,
            scroll_x: false,
            scroll_y: false,
            area_width: 0.0,
            area_height: 0.0,
            widget_area_bounds: Rect::ZERO,
            h_scroll_bounds: Rect::ZERO,
            h_knob_bounds: Rect::ZERO,
            v_scroll_bounds: Rect::ZERO,
            v_knob_bounds: Rect::ZERO,
            amount_x: 0.0,
            amount_y: 0.0,
            visual_amount_x: 0.0,
            visual_amount_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            last_point: Point::zero(),
            handle_position: 0.0,
            drag_h: false,
            drag_v: false,
        }
    }

    pub fn set_element(&mut self, stage: &mut Stage, element: Option<ElementId>) -> UiResult<()> {
        let id = self
            .id
            .ok_or(UiError::InvalidArgument("scroll pane is not attached to a stage"))?;
        if element == Some(id) {
            return Err(UiError::InvalidArgument("a scroll pane cannot scroll itself"));
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
        stage.invalidate_hierarchy(id);
        Ok(())
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn style(&self) -> &VerticalScrollPaneStyle {
        &self.style
    }

    pub fn set_style(&mut self, stage: &mut Stage, style: VerticalScrollPaneStyle) {
        self.style = style;
        if let Some(id) = self.id {
            stage.invalidate_hierarchy(id);
        }
    }

    /// Move the visual amounts toward the amounts
    pub fn update(&mut self, delta: f32) {
        self.visual_amount_x = approach(self.visual_amount_x, self.amount_x, delta);
        self.visual_amount_y = approach(self.visual_amount_y, self.amount_y, delta);
    }

    pub fn set_scrolling_disabled(&mut self, stage: &mut Stage, x: bool, y: bool) {
        self.disable_x = x;
        self.disable_y = y;
        if let Some(id) = self.id {
            stage.invalidate_hierarchy(id);
        }
    }

    pub fn is_scrolling_disabled_x(&self) -> bool {
        self.disable_x
    }

    pub fn is_scrolling_disabled_y(&self) -> bool {
        self.disable_y
    }

    pub fn is_scroll_x(&self) -> bool {
        self.scroll_x
    }

    pub fn is_scroll_y(&self) -> bool {
        self.scroll_y
    }

    /// A knob is being dragged
    pub fn is_dragging(&self) -> bool {
        self.drag_h || self.drag_v
    }

    pub fn mouse_wheel_x(&self) -> f32 {
        self.area_width
            .min((self.area_width * 0.9).max(self.max_x * 0.1) / 4.0)
    }

    pub fn mouse_wheel_y(&self) -> f32 {
        self.area_height
            .min((self.area_height * 0.9).max(self.max_y * 0.1) / 4.0)
    }

    pub fn scroll_x(&self) -> f32 {
        self.amount_x
    }

    pub fn set_scroll_x(&mut self, pixels: f32) {
        self.amount_x = clamp_to(pixels, 0.0, self.max_x);
    }

    pub fn scroll_y(&self) -> f32 {
        self.amount_y
    }

    pub fn set_scroll_y(&mut self, pixels: f32) {
        self.amount_y = clamp_to(pixels, 0.0, self.max_y);
    }

    pub fn visual_scroll_x(&self) -> f32 {
        self.visual_amount_x
    }

    pub fn visual_scroll_y(&self) -> f32 {
        self.visual_amount_y
    }

    pub fn scroll_percent_x(&self) -> f32 {
        percent(self.amount_x, self.max_x)
    }

    pub fn scroll_percent_y(&self) -> f32 {
        percent(self.amount_y, self.max_y)
    }

    pub fn set_scroll_percent_x(&mut self, percent: f32) {
        self.amount_x = self.max_x * clamp_to(percent, 0.0, 1.0);
    }

    pub fn set_scroll_percent_y(&mut self, percent: f32) {
        self.amount_y = self.max_y * clamp_to(percent, 0.0, 1.0);
    }

    pub fn visual_scroll_percent_x(&self) -> f32 {
        percent(self.visual_amount_x, self.max_x)
    }

    pub fn visual_scroll_percent_y(&self) -> f32 {
        percent(self.visual_amount_y, self.max_y)
    }

    pub fn max_x(&self) -> f32 {
        self.max_x
    }

    pub fn max_y(&self) -> f32 {
        self.max_y
    }

    pub fn scroll_width(&self) -> f32 {
        self.area_width
    }

    pub fn scroll_height(&self) -> f32 {
        self.area_height
    }

    fn bar_touch_down(&mut self, event: &mut Event, x: f32, y: f32) -> bool {
        let point = Point::new(x, y);
        if self.scroll_x && self.h_scroll_bounds.contains(point) {
            event.stop();
            if self.h_knob_bounds.contains(point) {
                self.last_point = point;
                self.handle_position = self.h_knob_bounds.x();
                self.drag_h = true;
                return true;
            }
            let page = if x < self.h_knob_bounds.x() {
                -self.area_width
            } else {
                self.area_width
            };
            self.set_scroll_x(self.amount_x + page);
            return true;
        }
        if self.scroll_y && self.v_scroll_bounds.contains(point) {
            event.stop();
            if self.v_knob_bounds.contains(point) {
                self.last_point = point;
                self.handle_position = self.v_knob_bounds.y();
                self.drag_v = true;
                return true;
            }
            let page = if y < self.v_knob_bounds.y() {
                -self.area_height
            } else {
                self.area_height
            };
            self.set_scroll_y(self.amount_y + page);
            return true;
        }
        false
    }

    fn bar_dragged(&mut self, x: f32, y: f32) {
        if self.drag_h {
            let (bar, knob) = (self.h_scroll_bounds, self.h_knob_bounds);
            self.handle_position += x - self.last_point.x;
            let position = clamp_to(
                self.handle_position,
                bar.x(),
                bar.x() + bar.width() - knob.width(),
            );
            let total = bar.width() - knob.width();
            if total != 0.0 {
                self.set_scroll_percent_x((position - bar.x()) / total);
            }
        } else if self.drag_v {
            let (bar, knob) = (self.v_scroll_bounds, self.v_knob_bounds);
            self.handle_position += y - self.last_point.y;
            let position = clamp_to(
                self.handle_position,
                bar.y(),
                bar.y() + bar.height() - knob.height(),
            );
            let total = bar.height() - knob.height();
            if total != 0.0 {
                self.set_scroll_percent_y((position - bar.y()) / total);
            }
        }
        self.last_point = Point::new(x, y);
    }

    fn wheel(&mut self, amount_x: f32, amount_y: f32) -> bool {
        if !self.scroll_x && !self.scroll_y {
            return false;
        }
        if self.scroll_y {
            self.set_scroll_y(self.amount_y + self.mouse_wheel_y() * amount_y);
        }
        if self.scroll_x {
            self.set_scroll_x(self.amount_x + self.mouse_wheel_x() * amount_x);
        }
        true
    }

    fn update_widget_position(&self, stage: &mut Stage) -> UiResult<()> {
        let Some(widget) = self.element else {
            return Ok(());
        };
        let area = self.widget_area_bounds;
        let mut x = area.x();
        let mut y = area.y();
        if self.scroll_x {
            x -= self.visual_amount_x.floor();
        }
        if self.scroll_y {
            y -= self.visual_amount_y.floor();
        }
        stage.set_position(widget, x, y)?;
        stage.set_culling_area(
            widget,
            Some(Rect::from_xywh(
                (area.x() - x).trunc(),
                (area.y() - y).trunc(),
                area.width(),
                area.height(),
            )),
        )
    }
}

impl Widget for VerticalScrollPane {
    fn pref_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let Some(widget) = self.element else {
            return DEFAULT_SIZE;
        };
        let b = self.style.background.unwrap_or_default();
        stage.pref_width(widget) + b.left_width + b.right_width
    }

    fn pref_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let Some(widget) = self.element else {
            return DEFAULT_SIZE;
        };
        let b = self.style.background.unwrap_or_default();
        stage.pref_height(widget) + b.top_height + b.bottom_height
    }

    fn min_width(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
        0.0
    }

    fn min_height(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
        0.0
    }

    fn layout(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        let Some(element) = stage.element(id) else {
            return Ok(());
        };
        let (width, height) = (element.width(), element.height());
        let b = self.style.background.unwrap_or_default();
        let s = self.style;

        let bar_height = s
            .h_scroll_knob
            .map_or(0.0, |k| k.min_height)
            .max(s.h_scroll.map_or(0.0, |d| d.min_height));
        let bar_width = s
            .v_scroll_knob
            .map_or(0.0, |k| k.min_width)
            .max(s.v_scroll.map_or(0.0, |d| d.min_width));

        self.area_width = width - b.left_width - b.right_width;
        self.area_height = height - b.top_height - b.bottom_height;

        let Some(widget) = self.element else {
            return Ok(());
        };
        let mut widget_width = stage.pref_width(widget);
        let mut widget_height = stage.pref_height(widget);

        self.scroll_x = !self.disable_x && widget_width > self.area_width;
        self.scroll_y = !self.disable_y && widget_height > self.area_height;
        if self.scroll_y {
            self.area_width -= bar_width;
        }
        if self.scroll_x {
            self.area_height -= bar_height;
        }
        self.widget_area_bounds =
            Rect::from_xywh(b.left_width, b.top_height, self.area_width, self.area_height);

        widget_width = if self.disable_x {
            self.area_width
        } else {
            widget_width.max(self.area_width)
        };
        widget_height = if self.disable_y {
            self.area_height
        } else {
            widget_height.max(self.area_height)
        };
        self.max_x = widget_width - self.area_width;
        self.max_y = widget_height - self.area_height;
        self.amount_x = clamp_to(self.amount_x, 0.0, self.max_x);
        self.amount_y = clamp_to(self.amount_y, 0.0, self.max_y);

        self.h_scroll_bounds = Rect::ZERO;
        self.h_knob_bounds = Rect::ZERO;
        if let (true, Some(knob)) = (self.scroll_x, s.h_scroll_knob) {
            let h = s.h_scroll.map_or(knob.min_height, |d| d.min_height);
            let bar_y = height - b.bottom_height - h;
            self.h_scroll_bounds = Rect::from_xywh(b.left_width, bar_y, self.area_width, h);
            let knob_width = knob
                .min_width
                .max((self.area_width * self.area_width / widget_width).trunc())
                .trunc();
            let knob_x = b.left_width
                + ((self.area_width - knob_width) * self.scroll_percent_x()).trunc();
            self.h_knob_bounds = Rect::from_xywh(knob_x, bar_y, knob_width, knob.min_height.trunc());
        }

        self.v_scroll_bounds = Rect::ZERO;
        self.v_knob_bounds = Rect::ZERO;
        if let (true, Some(knob)) = (self.scroll_y, s.v_scroll_knob) {
            let w = s.v_scroll.map_or(knob.min_width, |d| d.min_width);
            let bar_x = width - b.right_width - w;
            self.v_scroll_bounds = Rect::from_xywh(bar_x, b.top_height, w, self.area_height);
            let knob_height = knob
                .min_height
                .max((self.area_height * self.area_height / widget_height).trunc())
                .trunc();
            let knob_y = b.top_height
                + ((self.area_height - knob_height) * self.scroll_percent_y()).trunc();
            self.v_knob_bounds = Rect::from_xywh(
                (width - b.right_width - knob.min_width).trunc(),
                knob_y,
                knob.min_width.trunc(),
                knob_height,
            );
        }

        self.update_widget_position(stage)?;
        stage.set_size(widget, widget_width, widget_height)?;
        stage.validate(widget)
    }

    fn act(&mut self, _stage: &mut Stage, _id: ElementId, delta: f32) -> UiResult<()> {
        self.update(delta);
        Ok(())
    }

    fn draw(
        &mut self,
        stage: &mut Stage,
        id: ElementId,
        out: &mut DrawOutput,
        parent_alpha: f32,
    ) -> UiResult<()> {
        if self.element.is_none() {
            return Ok(());
        }
        let Some(element) = stage.element(id) else {
            return Ok(());
        };
        let (width, height) = (element.width(), element.height());
        let alpha = element.color().a * parent_alpha;

        if self.scroll_x {
            let (bar, knob) = (self.h_scroll_bounds, self.h_knob_bounds);
            let x = bar.x() + ((bar.width() - knob.width()) * self.visual_scroll_percent_x()).trunc();
            self.h_knob_bounds = Rect::from_xywh(x, knob.y(), knob.width(), knob.height());
        }
        if self.scroll_y {
            let (bar, knob) = (self.v_scroll_bounds, self.v_knob_bounds);
            let y =
                bar.y() + ((bar.height() - knob.height()) * self.visual_scroll_percent_y()).trunc();
            self.v_knob_bounds = Rect::from_xywh(knob.x(), y, knob.width(), knob.height());
        }
        self.update_widget_position(stage)?;

        if let Some(background) = self.style.background {
            background.draw(out, 0.0, 0.0, width, height, alpha);
        }
        if out.push_clip(stage.calculate_scissors(id, self.widget_area_bounds)) {
            let result = stage.draw_children(id, out, alpha);
            out.pop_clip();
            result?;
        }
        if alpha <= 0.0 {
            return Ok(());
        }

        let parts = [
            (self.scroll_x, self.style.h_scroll, self.h_scroll_bounds),
            (self.scroll_x, self.style.h_scroll_knob, self.h_knob_bounds),
            (self.scroll_y, self.style.v_scroll, self.v_scroll_bounds),
            (self.scroll_y, self.style.v_scroll_knob, self.v_knob_bounds),
        ];
        for (shown, drawable, r) in parts {
            if let (true, Some(d)) = (shown, drawable) {
                d.draw(out, r.x(), r.y(), r.width(), r.height(), alpha);
            }
        }
        Ok(())
    }

    fn hit(
        &mut self,
        stage: &mut Stage,
        id: ElementId,
        x: f32,
        y: f32,
        touchable: bool,
    ) -> HitOverride {
        let Some(element) = stage.element(id) else {
            return HitOverride::Miss;
        };
        if x < 0.0 || x >= element.width() || y < 0.0 || y >= element.height() {
            return HitOverride::Miss;
        }
        if touchable && element.touchable() == Touchable::Enabled && element.is_visible() {
            let point = Point::new(x, y);
            if (self.scroll_x && self.h_scroll_bounds.contains(point))
                || (self.scroll_y && self.v_scroll_bounds.contains(point))
            {
                return HitOverride::Target(id);
            }
        }
        HitOverride::Inherit
    }

    fn child_removed(&mut self, child: ElementId) {
        if self.element == Some(child) {
            self.element = None;
        }
    }

    fn child_policy(&self) -> ChildPolicy {
        ChildPolicy::Dedicated("VerticalScrollPane::set_element")
    }

    fn attached(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.id = Some(id);
        stage.set_size(id, DEFAULT_SIZE, DEFAULT_SIZE)?;
        stage.add_capture_listener(id, self.bar_listener.clone())?;
        stage.add_listener(id, self.wheel_listener.clone())?;
        Ok(())
    }
}

fn pane_mut<'a>(stage: &'a mut Stage, event: &Event) -> Option<&'a mut VerticalScrollPane> {
    event
        .listener_element()
        .and_then(|pane| stage.widget_mut::<VerticalScrollPane>(pane))
}

/// Scroll focus follows the pointer; the bars page and drag
struct BarInput;

impl InputListener for BarInput {
    fn enter(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        _x: f32,
        _y: f32,
        _pointer: i32,
        _from: Option<ElementId>,
    ) {
        if let Some(pane) = event.listener_element() {
            if let Err(err) = stage.set_scroll_focus(Some(pane)) {
                log::warn!("scroll pane {pane:?} could not take scroll focus: {err}");
            }
        }
    }

    fn exit(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        _x: f32,
        _y: f32,
        _pointer: i32,
        to: Option<ElementId>,
    ) {
        let Some(pane) = event.listener_element() else {
            return;
        };
        // Moving onto the child is not leaving
        if to.is_some_and(|to| stage.is_descendant_of(to, pane)) {
            return;
        }
        if stage.scroll_focus() == Some(pane) {
            if let Err(err) = stage.set_scroll_focus(None) {
                log::warn!("scroll pane {pane:?} could not release scroll focus: {err}");
            }
        }
    }

    fn touch_down(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
    ) -> bool {
        if pointer == 0 && button != 0 {
            return false;
        }
        let Some(pane) = event.listener_element() else {
            return false;
        };
        if let Err(err) = stage.set_scroll_focus(Some(pane)) {
            log::warn!("scroll pane {pane:?} could not take scroll focus: {err}");
        }
        pane_mut(stage, event).is_some_and(|p| p.bar_touch_down(event, x, y))
    }

    fn touch_up(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        _x: f32,
        _y: f32,
        _pointer: i32,
        _button: i32,
    ) {
        if let Some(p) = pane_mut(stage, event) {
            p.drag_h = false;
            p.drag_v = false;
        }
    }

    fn touch_dragged(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32, _pointer: i32) {
        if let Some(p) = pane_mut(stage, event) {
            p.bar_dragged(x, y);
        }
    }
}

/// Positive amounts scroll toward the end
struct WheelInput;

impl InputListener for WheelInput {
    fn scrolled(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        _x: f32,
        _y: f32,
        amount_x: f32,
        amount_y: f32,
    ) -> bool {
        pane_mut(stage, event).is_some_and(|p| p.wheel(amount_x, amount_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueberry_ui::Color;

    fn knob_style() -> VerticalScrollPaneStyle {
        VerticalScrollPaneStyle::default()
            .with_v_scroll(Drawable::new(Color::BLACK).with_min_size(10.0, 0.0))
            .with_v_scroll_knob(Drawable::new(Color::WHITE).with_min_size(10.0, 10.0))
    }

    /// A 100x100 pane at (50, 50) over a 50x300 child
    fn list() -> (Stage, ElementId, ElementId) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut stage = Stage::new(400.0, 400.0);
        let pane = stage.create_widget(VerticalScrollPane::new(knob_style()));
        stage.add_element(stage.root(), pane).unwrap();
        stage.set_bounds(pane, 50.0, 50.0, 100.0, 100.0).unwrap();
        let child = stage.create_element();
        stage.set_size(child, 50.0, 300.0).unwrap();
        stage
            .with_widget::<VerticalScrollPane, _>(pane, |p, stage| p.set_element(stage, Some(child)))
            .unwrap()
            .unwrap();
        stage.validate(pane).unwrap();
        (stage, pane, child)
    }

    #[test]
    fn test_bar_takes_space() {
        let (stage, pane, child) = list();
        let p = stage.widget::<VerticalScrollPane>(pane).unwrap();
        assert!(p.is_scroll_y());
        assert!(!p.is_scroll_x());
        assert_eq!(p.scroll_width(), 90.0);
        assert_eq!(p.max_y(), 200.0);
        // 100 * 100 / 300
        assert_eq!(p.v_knob_bounds, Rect::from_xywh(90.0, 0.0, 10.0, 33.0));

        let child = stage.element(child).unwrap();
        assert_eq!((child.width(), child.height()), (90.0, 300.0));
    }

    #[test]
    fn test_pref_size_without_child() {
        let mut stage = Stage::new(400.0, 400.0);
        let pane = stage.create_widget(VerticalScrollPane::new(VerticalScrollPaneStyle::default()));
        assert_eq!(stage.pref_width(pane), 150.0);
        assert_eq!(stage.pref_height(pane), 150.0);
        assert_eq!(stage.min_height(pane), 0.0);
    }

    #[test]
    fn test_visual_scroll_is_smoothed() {
        let (mut stage, pane, _) = list();
        let p = stage.widget_mut::<VerticalScrollPane>(pane).unwrap();
        p.set_scroll_y(100.0);
        p.update(0.1);
        assert!((p.visual_scroll_y() - 70.0).abs() < 0.01);
        p.update(1.0);
        assert_eq!(p.visual_scroll_y(), 100.0);
    }

    #[test]
    fn test_hover_gives_wheel_focus() {
        let (mut stage, pane, _) = list();
        stage.mouse_moved(60.0, 60.0).unwrap();
        stage.act(0.0).unwrap();
        assert_eq!(stage.scroll_focus(), Some(pane));

        // min(100, max(90, 20) / 4)
        assert!(stage.scrolled(0.0, 2.0).unwrap());
        assert_eq!(stage.widget::<VerticalScrollPane>(pane).unwrap().scroll_y(), 45.0);

        stage.mouse_moved(300.0, 300.0).unwrap();
        stage.act(0.0).unwrap();
        assert_eq!(stage.scroll_focus(), None);
    }

    #[test]
    fn test_knob_drag_and_paging() {
        let (mut stage, pane, _) = list();
        // Stage (145, 55) is local (95, 5), on the knob
        assert_eq!(stage.hit(145.0, 55.0, true), Some(pane));
        assert!(stage.touch_down(145.0, 55.0, 0, 0).unwrap());
        assert!(stage.widget::<VerticalScrollPane>(pane).unwrap().is_dragging());

        // Knob travel is 67
        stage.touch_dragged(145.0, 88.5, 0).unwrap();
        assert_eq!(stage.widget::<VerticalScrollPane>(pane).unwrap().scroll_y(), 100.0);
        stage.touch_up(145.0, 88.5, 0, 0).unwrap();
        assert!(!stage.widget::<VerticalScrollPane>(pane).unwrap().is_dragging());

        // Above the knob pages up
        stage.validate(pane).unwrap();
        stage
            .widget_mut::<VerticalScrollPane>(pane)
            .unwrap()
            .set_scroll_y(200.0);
        stage.invalidate(pane);
        stage.validate(pane).unwrap();
        stage.touch_down(145.0, 52.0, 0, 0).unwrap();
        assert_eq!(stage.widget::<VerticalScrollPane>(pane).unwrap().scroll_y(), 100.0);
    }

    #[test]
    fn test_set_element_rejects_self_and_generic_add() {
        let (mut stage, pane, _) = list();
        let result = stage
            .with_widget::<VerticalScrollPane, _>(pane, |p, stage| p.set_element(stage, Some(pane)))
            .unwrap();
        assert!(result.is_err());
        let other = stage.create_element();
        assert!(stage.add_element(pane, other).is_err());
    }
}
