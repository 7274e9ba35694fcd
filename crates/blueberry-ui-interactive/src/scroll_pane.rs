//! Scroll pane: shows part of a larger child and scrolls it with flicks,
//! the mouse wheel and scroll bars.
//!
//! Scrolling keeps two amounts per axis. The *amount* is where the pane
//! wants to be; the *visual amount* is what is drawn and, with smooth
//! scrolling on, chases the amount over a few frames. A release while
//! panning starts a fling that decays linearly over the fling time, and
//! amounts past the edges (overscroll) spring back once the touch ends.

use std::cell::RefCell;
use std::rc::Rc;

use blueberry_ui::transition::fade;
use blueberry_ui::{
    ChildPolicy, DrawOutput, Drawable, ElementId, Event, HitOverride, InputListener,
    ListenerRef, Point, Rect, Stage, Touchable, UiError, UiResult, Widget,
};
use blueberry_ui_macros::WithBuilders;

use crate::gesture::{ElementGestureListener, GestureHandler};

/// Size of a pane without a child, and before anything lays it out
const DEFAULT_SIZE: f32 = 150.0;

/// Release velocity, in pixels per second, below which a flick does not fling
const MIN_FLING_VELOCITY: f32 = 150.0;

/// Drawables of a scroll pane. Every part is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, WithBuilders)]
pub struct ScrollPaneStyle {
    pub background: Option<Drawable>,
    /// Fills the square between the two bars when both are shown
    pub corner: Option<Drawable>,
    pub h_scroll: Option<Drawable>,
    pub h_scroll_knob: Option<Drawable>,
    pub h_scroll_knob_over: Option<Drawable>,
    pub h_scroll_knob_down: Option<Drawable>,
    pub v_scroll: Option<Drawable>,
    pub v_scroll_knob: Option<Drawable>,
    pub v_scroll_knob_over: Option<Drawable>,
    pub v_scroll_knob_down: Option<Drawable>,
}

/// Behavior switches and tuning of a scroll pane
#[derive(Clone, Copy, Debug, PartialEq, WithBuilders)]
pub struct ScrollPaneConfig {
    /// Seconds the bars take to fade out
    pub fade_alpha_seconds: f32,
    /// Seconds the bars stay fully visible after the last scroll
    pub fade_delay_seconds: f32,
    /// Seconds a fling lasts
    pub fling_time: f32,
    /// How far past an edge the pane may be dragged
    pub overscroll_distance: f32,
    /// Spring back speed right at the edge, in pixels per second
    pub overscroll_speed_min: f32,
    /// Spring back speed at the full overscroll distance
    pub overscroll_speed_max: f32,
    pub overscroll_x: bool,
    pub overscroll_y: bool,
    /// Keep the amounts within the overscroll range while flinging and panning
    pub clamp: bool,
    pub smooth_scrolling: bool,
    /// Fade the bars out when idle. Faded bars draw over the child instead of taking space.
    pub fade_scroll_bars: bool,
    /// Scroll by dragging the content
    pub flick_scroll: bool,
    /// Size the knobs by the visible share of the child
    pub variable_size_knobs: bool,
    pub v_scroll_on_right: bool,
    pub h_scroll_on_bottom: bool,
    /// Take touch focus away from the child once the pane starts scrolling
    pub cancel_touch_focus: bool,
    /// Allow paging and knob dragging on the bars
    pub scroll_bar_touch: bool,
    pub force_scroll_x: bool,
    pub force_scroll_y: bool,
    pub disable_x: bool,
    pub disable_y: bool,
    /// Draw bars over the child even when they do not fade
    pub scrollbars_on_top: bool,
}

impl Default for ScrollPaneConfig {
    fn default() -> Self {
        Self {
            fade_alpha_seconds: 1.0,
            fade_delay_seconds: 1.0,
            fling_time: 0.1,
            overscroll_distance: 50.0,
            overscroll_speed_min: 30.0,
            overscroll_speed_max: 200.0,
            overscroll_x: true,
            overscroll_y: true,
            clamp: true,
            smooth_scrolling: true,
            fade_scroll_bars: true,
            flick_scroll: true,
            variable_size_knobs: true,
            v_scroll_on_right: true,
            h_scroll_on_bottom: true,
            cancel_touch_focus: true,
            scroll_bar_touch: true,
            force_scroll_x: false,
            force_scroll_y: false,
            disable_x: false,
            disable_y: false,
            scrollbars_on_top: false,
        }
    }
}

/// A group with a single scrolled child.
///
/// The child goes through [`ScrollPane::set_element`]; the generic
/// `Stage::add_element` refuses it.
pub struct ScrollPane {
    id: Option<ElementId>,
    element: Option<ElementId>,
    style: ScrollPaneStyle,
    config: ScrollPaneConfig,

    flick: Rc<RefCell<ElementGestureListener<FlickScroll>>>,
    flick_listener: ListenerRef,
    bar_listener: ListenerRef,
    wheel_listener: ListenerRef,

    scroll_x: bool,
    scroll_y: bool,
    area_width: f32,
    area_height: f32,
    widget_area_bounds: Rect,
    h_scroll_bounds: Rect,
    h_knob_bounds: Rect,
    v_scroll_bounds: Rect,
    v_knob_bounds: Rect,
    h_knob: Option<Drawable>,
    v_knob: Option<Drawable>,

    amount_x: f32,
    amount_y: f32,
    visual_amount_x: f32,
    visual_amount_y: f32,
    max_x: f32,
    max_y: f32,

    touch_scroll_h: bool,
    touch_scroll_v: bool,
    cursor_over_h_knob: bool,
    cursor_over_v_knob: bool,
    last_point: Point,
    handle_position: f32,
    dragging_pointer: Option<i32>,

    fade_alpha: f32,
    fade_delay: f32,
    fling_timer: f32,
    velocity_x: f32,
    velocity_y: f32,
}

impl ScrollPane {
    pub fn new(style: ScrollPaneStyle) -> Self {
        Self::with_config(style, ScrollPaneConfig::default())
    }

    pub fn with_config(style: ScrollPaneStyle, config: ScrollPaneConfig) -> Self {
        let (flick, flick_listener) =
            ListenerRef::shared(ElementGestureListener::new(FlickScroll));
        Self {
            id: None,
            element: None,
            style,
            config,
            flick,
            flick_listener,
            bar_listener: ListenerRef::input(ScrollBarInput),
            wheel_listener: ListenerRef::input(WheelInput),
            scroll_x: false,
            scroll_y: false,
            area_width: 0.0,
            area_height: 0.0,
            widget_area_bounds: Rect::ZERO,
            h_scroll_bounds: Rect::ZERO,
            h_knob_bounds: Rect::ZERO,
            v_scroll_bounds: Rect::ZERO,
            v_knob_bounds: Rect::ZERO,
            h_knob: style.h_scroll_knob,
            v_knob: style.v_scroll_knob,
            amount_x: 0.0,
            amount_y: 0.0,
            visual_amount_x: 0.0,
            visual_amount_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            touch_scroll_h: false,
            touch_scroll_v: false,
            cursor_over_h_knob: false,
            cursor_over_v_knob: false,
            last_point: Point::zero(),
            handle_position: 0.0,
            dragging_pointer: None,
            fade_alpha: if config.fade_scroll_bars {
                0.0
            } else {
                config.fade_alpha_seconds
            },
            fade_delay: 0.0,
            fling_timer: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }

    /// Put `element` in the pane, replacing (and removing) the current child.
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

    pub fn style(&self) -> &ScrollPaneStyle {
        &self.style
    }

    pub fn set_style(&mut self, stage: &mut Stage, style: ScrollPaneStyle) {
        self.style = style;
        self.h_knob = style.h_scroll_knob;
        self.v_knob = style.v_scroll_knob;
        self.invalidate_pane(stage);
    }

    pub fn config(&self) -> &ScrollPaneConfig {
        &self.config
    }

    fn invalidate_pane(&self, stage: &mut Stage) {
        if let Some(id) = self.id {
            stage.invalidate_hierarchy(id);
        }
    }

    // Kinematics

    /// Advance fading, flinging, smooth scrolling and overscroll recovery by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        self.update_knobs();
        let panning = self.is_panning();
        let c = self.config;

        if self.fade_alpha > 0.0
            && c.fade_scroll_bars
            && !panning
            && !self.touch_scroll_h
            && !self.touch_scroll_v
        {
            self.fade_delay -= delta;
            if self.fade_delay <= 0.0 {
                self.fade_alpha = (self.fade_alpha - delta).max(0.0);
            }
        }

        if self.fling_timer > 0.0 {
            self.reset_fade();

            let alpha = self.fling_timer / c.fling_time;
            self.amount_x -= self.velocity_x * alpha * delta;
            self.amount_y -= self.velocity_y * alpha * delta;
            self.clamp();

            // A fling stops dead at the overscroll limit
            if self.amount_x == -c.overscroll_distance {
                self.velocity_x = 0.0;
            }
            if self.amount_x >= self.max_x + c.overscroll_distance {
                self.velocity_x = 0.0;
            }
            if self.amount_y == -c.overscroll_distance {
                self.velocity_y = 0.0;
            }
            if self.amount_y >= self.max_y + c.overscroll_distance {
                self.velocity_y = 0.0;
            }

            self.fling_timer -= delta;
            if self.fling_timer <= 0.0 {
                self.velocity_x = 0.0;
                self.velocity_y = 0.0;
                log::trace!("fling finished at ({}, {})", self.amount_x, self.amount_y);
            }
        }

        let knob_drag_is_coarse_h = !self.touch_scroll_h
            || (self.scroll_x
                && self.max_x / (self.h_scroll_bounds.width() - self.h_knob_bounds.width())
                    > self.area_width * 0.1);
        let knob_drag_is_coarse_v = !self.touch_scroll_v
            || (self.scroll_y
                && self.max_y / (self.v_scroll_bounds.height() - self.v_knob_bounds.height())
                    > self.area_height * 0.1);
        if c.smooth_scrolling
            && self.fling_timer <= 0.0
            && !panning
            && knob_drag_is_coarse_h
            && knob_drag_is_coarse_v
        {
            self.visual_amount_x = approach(self.visual_amount_x, self.amount_x, delta);
            self.visual_amount_y = approach(self.visual_amount_y, self.amount_y, delta);
        } else {
            self.visual_amount_x = self.amount_x;
            self.visual_amount_y = self.amount_y;
        }

        if !panning {
            if c.overscroll_x && self.scroll_x {
                self.amount_x = self.recover(self.amount_x, self.max_x, delta);
            }
            if c.overscroll_y && self.scroll_y {
                self.amount_y = self.recover(self.amount_y, self.max_y, delta);
            }
        }
    }

    /// Move an overscrolled amount back toward `[0, max]`, faster the further out it is
    fn recover(&mut self, amount: f32, max: f32, delta: f32) -> f32 {
        let c = self.config;
        let speed = |over: f32| {
            (c.overscroll_speed_min
                + (c.overscroll_speed_max - c.overscroll_speed_min) * over
                    / c.overscroll_distance)
                * delta
        };
        if amount < 0.0 {
            self.reset_fade();
            (amount + speed(-amount)).min(0.0)
        } else if amount > max {
            self.reset_fade();
            (amount - speed(amount - max)).max(max)
        } else {
            amount
        }
    }

    fn clamp(&mut self) {
        if !self.config.clamp {
            return;
        }
        let c = self.config;
        self.amount_x = if c.overscroll_x {
            clamp_to(
                self.amount_x,
                -c.overscroll_distance,
                self.max_x + c.overscroll_distance,
            )
        } else {
            clamp_to(self.amount_x, 0.0, self.max_x)
        };
        self.amount_y = if c.overscroll_y {
            clamp_to(
                self.amount_y,
                -c.overscroll_distance,
                self.max_y + c.overscroll_distance,
            )
        } else {
            clamp_to(self.amount_y, 0.0, self.max_y)
        };
    }

    /// Pick the knob drawables for the pressed and hovered states
    fn update_knobs(&mut self) {
        let s = &self.style;
        self.h_knob = self
            .touch_scroll_h
            .then_some(s.h_scroll_knob_down)
            .flatten()
            .or(self.cursor_over_h_knob.then_some(s.h_scroll_knob_over).flatten())
            .or(s.h_scroll_knob);
        self.v_knob = self
            .touch_scroll_v
            .then_some(s.v_scroll_knob_down)
            .flatten()
            .or(self.cursor_over_v_knob.then_some(s.v_scroll_knob_over).flatten())
            .or(s.v_scroll_knob);
    }

    /// Show the bars again and restart the fade delay
    pub fn reset_fade(&mut self) {
        self.fade_alpha = self.config.fade_alpha_seconds;
        self.fade_delay = self.config.fade_delay_seconds;
    }

    /// Stop any bar drag and abandon the current flick
    pub fn cancel(&mut self) {
        self.end_drag();
        // A busy listener is the one cancelling, and resets itself
        if let Ok(mut flick) = self.flick.try_borrow_mut() {
            flick.detector_mut().cancel();
        }
    }

    fn end_drag(&mut self) {
        self.dragging_pointer = None;
        self.touch_scroll_h = false;
        self.touch_scroll_v = false;
    }

    /// Send a touch up to every other touch focus, so the child stops
    /// tracking a touch the pane has taken over
    pub fn cancel_touch_focus(&self, stage: &mut Stage) {
        if let Some(id) = self.id {
            stage.cancel_touch_focus_except(&self.flick_listener, id);
        }
    }

    /// Start a fling of `seconds` with the given velocities in pixels per second
    pub fn fling(&mut self, seconds: f32, velocity_x: f32, velocity_y: f32) {
        self.fling_timer = seconds;
        self.velocity_x = velocity_x;
        self.velocity_y = velocity_y;
    }

    // Input

    /// Returns true when the pane took over the touch
    fn flick_pan(&mut self, delta_x: f32, delta_y: f32) -> bool {
        self.reset_fade();
        self.amount_x -= delta_x;
        self.amount_y -= delta_y;
        self.clamp();
        self.config.cancel_touch_focus
            && ((self.scroll_x && delta_x != 0.0) || (self.scroll_y && delta_y != 0.0))
    }

    fn flick_fling(&mut self, velocity_x: f32, velocity_y: f32) -> bool {
        let mut cancel = false;
        if velocity_x.abs() > MIN_FLING_VELOCITY && self.scroll_x {
            self.fling_timer = self.config.fling_time;
            self.velocity_x = velocity_x / 2.0;
            cancel = self.config.cancel_touch_focus;
        }
        if velocity_y.abs() > MIN_FLING_VELOCITY && self.scroll_y {
            self.fling_timer = self.config.fling_time;
            self.velocity_y = velocity_y / 2.0;
            cancel = self.config.cancel_touch_focus;
        }
        cancel
    }

    fn wheel(&mut self, amount_x: f32, amount_y: f32) -> bool {
        self.reset_fade();
        if self.scroll_y {
            self.set_scroll_y(self.amount_y + self.mouse_wheel_y() * amount_y);
        } else if self.scroll_x {
            let amount = if amount_x != 0.0 { amount_x } else { amount_y };
            self.set_scroll_x(self.amount_x + self.mouse_wheel_x() * amount);
        } else {
            return false;
        }
        true
    }

    /// Pixels one wheel notch scrolls vertically
    pub fn mouse_wheel_y(&self) -> f32 {
        self.area_height
            .min((self.area_height * 0.9).max(self.max_y * 0.1) / 4.0)
    }

    pub fn mouse_wheel_x(&self) -> f32 {
        self.area_width
            .min((self.area_width * 0.9).max(self.max_x * 0.1) / 4.0)
    }

    /// A touch landed at local `(x, y)`. Pages or starts a knob drag when it is on a bar.
    fn bar_touch_down(&mut self, event: &mut Event, x: f32, y: f32, pointer: i32) -> bool {
        if !self.config.flick_scroll {
            self.reset_fade();
        }
        if self.fade_alpha == 0.0 {
            return false;
        }
        let point = Point::new(x, y);

        if self.config.scroll_bar_touch && self.scroll_x && self.h_scroll_bounds.contains(point) {
            event.stop();
            self.reset_fade();
            if self.h_knob_bounds.contains(point) {
                self.last_point = point;
                self.handle_position = self.h_knob_bounds.x();
                self.touch_scroll_h = true;
                self.dragging_pointer = Some(pointer);
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

        if self.config.scroll_bar_touch && self.scroll_y && self.v_scroll_bounds.contains(point) {
            event.stop();
            self.reset_fade();
            if self.v_knob_bounds.contains(point) {
                self.last_point = point;
                self.handle_position = self.v_knob_bounds.y();
                self.touch_scroll_v = true;
                self.dragging_pointer = Some(pointer);
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

    fn bar_dragged(&mut self, x: f32, y: f32, pointer: i32) {
        if self.dragging_pointer != Some(pointer) {
            return;
        }
        if self.touch_scroll_h {
            let bar = self.h_scroll_bounds;
            let knob = self.h_knob_bounds;
            let position = clamp_to(
                self.handle_position + x - self.last_point.x,
                bar.x(),
                bar.x() + bar.width() - knob.width(),
            );
            self.handle_position = position;
            let total = bar.width() - knob.width();
            if total != 0.0 {
                self.set_scroll_percent_x((position - bar.x()) / total);
            }
            self.last_point = Point::new(x, y);
        } else if self.touch_scroll_v {
            let bar = self.v_scroll_bounds;
            let knob = self.v_knob_bounds;
            let position = clamp_to(
                self.handle_position + y - self.last_point.y,
                bar.y(),
                bar.y() + bar.height() - knob.height(),
            );
            self.handle_position = position;
            let total = bar.height() - knob.height();
            if total != 0.0 {
                self.set_scroll_percent_y((position - bar.y()) / total);
            }
            self.last_point = Point::new(x, y);
        }
    }

    fn cursor_moved(&mut self, x: f32, y: f32) {
        let point = Point::new(x, y);
        self.cursor_over_h_knob = self.scroll_x && self.h_knob_bounds.contains(point);
        self.cursor_over_v_knob = self.scroll_y && self.v_knob_bounds.contains(point);
        if !self.config.flick_scroll {
            self.reset_fade();
        }
    }

    // Scroll position

    /// Scroll so the local rectangle of the child is visible, or centered on the chosen axes
    pub fn scroll_to(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        center_horizontal: bool,
        center_vertical: bool,
    ) {
        self.amount_x = clamp_to(
            scroll_target(self.amount_x, self.area_width, x, width, center_horizontal),
            0.0,
            self.max_x,
        );
        self.amount_y = clamp_to(
            scroll_target(self.amount_y, self.area_height, y, height, center_vertical),
            0.0,
            self.max_y,
        );
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

    pub fn scroll_percent_x(&self) -> f32 {
        percent(self.amount_x, self.max_x)
    }

    pub fn set_scroll_percent_x(&mut self, percent: f32) {
        self.set_scroll_x(self.max_x * clamp_to(percent, 0.0, 1.0));
    }

    pub fn scroll_percent_y(&self) -> f32 {
        percent(self.amount_y, self.max_y)
    }

    pub fn set_scroll_percent_y(&mut self, percent: f32) {
        self.set_scroll_y(self.max_y * clamp_to(percent, 0.0, 1.0));
    }

    pub fn visual_scroll_x(&self) -> f32 {
        if self.scroll_x {
            self.visual_amount_x
        } else {
            0.0
        }
    }

    pub fn visual_scroll_y(&self) -> f32 {
        if self.scroll_y {
            self.visual_amount_y
        } else {
            0.0
        }
    }

    pub fn visual_scroll_percent_x(&self) -> f32 {
        percent(self.visual_amount_x, self.max_x)
    }

    pub fn visual_scroll_percent_y(&self) -> f32 {
        percent(self.visual_amount_y, self.max_y)
    }

    /// Jump the visual amounts to the amounts, skipping smooth scrolling
    pub fn update_visual_scroll(&mut self) {
        self.visual_amount_x = self.amount_x;
        self.visual_amount_y = self.amount_y;
    }

    pub fn max_x(&self) -> f32 {
        self.max_x
    }

    pub fn max_y(&self) -> f32 {
        self.max_y
    }

    /// Width of the visible area
    pub fn scroll_width(&self) -> f32 {
        self.area_width
    }

    pub fn scroll_height(&self) -> f32 {
        self.area_height
    }

    /// Height of the horizontal bar, or its knob when that is taller
    pub fn scroll_bar_height(&self) -> f32 {
        let knob = self.style.h_scroll_knob.map_or(0.0, |d| d.min_height);
        let bar = self.style.h_scroll.map_or(0.0, |d| d.min_height);
        knob.max(bar)
    }

    pub fn scroll_bar_width(&self) -> f32 {
        let knob = self.style.v_scroll_knob.map_or(0.0, |d| d.min_width);
        let bar = self.style.v_scroll.map_or(0.0, |d| d.min_width);
        knob.max(bar)
    }

    pub fn is_scroll_x(&self) -> bool {
        self.scroll_x
    }

    pub fn is_scroll_y(&self) -> bool {
        self.scroll_y
    }

    pub fn is_left_edge(&self) -> bool {
        !self.scroll_x || self.amount_x <= 0.0
    }

    pub fn is_right_edge(&self) -> bool {
        !self.scroll_x || self.amount_x >= self.max_x
    }

    pub fn is_top_edge(&self) -> bool {
        !self.scroll_y || self.amount_y <= 0.0
    }

    pub fn is_bottom_edge(&self) -> bool {
        !self.scroll_y || self.amount_y >= self.max_y
    }

    /// A scroll bar knob is being dragged
    pub fn is_dragging(&self) -> bool {
        self.dragging_pointer.is_some()
    }

    /// The content is being dragged
    pub fn is_panning(&self) -> bool {
        self.flick
            .try_borrow()
            .map_or(false, |flick| flick.detector().is_panning())
    }

    pub fn is_flinging(&self) -> bool {
        self.fling_timer > 0.0
    }

    pub fn velocity_x(&self) -> f32 {
        self.velocity_x
    }

    pub fn set_velocity_x(&mut self, velocity: f32) {
        self.velocity_x = velocity;
    }

    pub fn velocity_y(&self) -> f32 {
        self.velocity_y
    }

    pub fn set_velocity_y(&mut self, velocity: f32) {
        self.velocity_y = velocity;
    }

    // Configuration

    pub fn set_overscroll(&mut self, x: bool, y: bool) {
        self.config.overscroll_x = x;
        self.config.overscroll_y = y;
    }

    pub fn setup_overscroll(&mut self, distance: f32, speed_min: f32, speed_max: f32) {
        self.config.overscroll_distance = distance;
        self.config.overscroll_speed_min = speed_min;
        self.config.overscroll_speed_max = speed_max;
    }

    pub fn overscroll_distance(&self) -> f32 {
        self.config.overscroll_distance
    }

    /// Show a bar on the axis even when the child fits
    pub fn set_force_scroll(&mut self, stage: &mut Stage, x: bool, y: bool) {
        self.config.force_scroll_x = x;
        self.config.force_scroll_y = y;
        self.invalidate_pane(stage);
    }

    pub fn is_force_scroll_x(&self) -> bool {
        self.config.force_scroll_x
    }

    pub fn is_force_scroll_y(&self) -> bool {
        self.config.force_scroll_y
    }

    pub fn set_fling_time(&mut self, seconds: f32) {
        self.config.fling_time = seconds;
    }

    pub fn set_clamp(&mut self, clamp: bool) {
        self.config.clamp = clamp;
    }

    pub fn set_scroll_bar_positions(&mut self, stage: &mut Stage, bottom: bool, right: bool) {
        self.config.h_scroll_on_bottom = bottom;
        self.config.v_scroll_on_right = right;
        self.invalidate_pane(stage);
    }

    pub fn set_fade_scroll_bars(&mut self, stage: &mut Stage, fade: bool) {
        if self.config.fade_scroll_bars == fade {
            return;
        }
        self.config.fade_scroll_bars = fade;
        if !fade {
            self.fade_alpha = self.config.fade_alpha_seconds;
        }
        self.invalidate_pane(stage);
    }

    pub fn setup_fade_scroll_bars(&mut self, alpha_seconds: f32, delay_seconds: f32) {
        self.config.fade_alpha_seconds = alpha_seconds;
        self.config.fade_delay_seconds = delay_seconds;
    }

    pub fn fade_scroll_bars(&self) -> bool {
        self.config.fade_scroll_bars
    }

    pub fn set_scroll_bar_touch(&mut self, enabled: bool) {
        self.config.scroll_bar_touch = enabled;
    }

    pub fn set_smooth_scrolling(&mut self, smooth: bool) {
        self.config.smooth_scrolling = smooth;
    }

    pub fn set_scrollbars_on_top(&mut self, stage: &mut Stage, on_top: bool) {
        self.config.scrollbars_on_top = on_top;
        self.invalidate_pane(stage);
    }

    pub fn variable_size_knobs(&self) -> bool {
        self.config.variable_size_knobs
    }

    pub fn set_variable_size_knobs(&mut self, variable: bool) {
        self.config.variable_size_knobs = variable;
    }

    pub fn set_cancel_touch_focus(&mut self, cancel: bool) {
        self.config.cancel_touch_focus = cancel;
    }

    pub fn set_scrolling_disabled(&mut self, stage: &mut Stage, x: bool, y: bool) {
        if self.config.disable_x == x && self.config.disable_y == y {
            return;
        }
        self.config.disable_x = x;
        self.config.disable_y = y;
        self.invalidate_pane(stage);
    }

    pub fn is_scrolling_disabled_x(&self) -> bool {
        self.config.disable_x
    }

    pub fn is_scrolling_disabled_y(&self) -> bool {
        self.config.disable_y
    }

    /// Turn content dragging on or off, registering or removing its listener
    pub fn set_flick_scroll(&mut self, stage: &mut Stage, flick_scroll: bool) -> UiResult<()> {
        if self.config.flick_scroll == flick_scroll {
            return Ok(());
        }
        self.config.flick_scroll = flick_scroll;
        if let Some(id) = self.id {
            if flick_scroll {
                stage.add_listener(id, self.flick_listener.clone())?;
            } else {
                stage.remove_listener(id, &self.flick_listener)?;
            }
        }
        self.invalidate_pane(stage);
        Ok(())
    }

    pub fn set_flick_scroll_tap_square_size(&mut self, half_size: f32) {
        if let Ok(mut flick) = self.flick.try_borrow_mut() {
            flick.detector_mut().set_tap_square_size(half_size);
        }
    }

    // Layout helpers

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
        if !self.config.fade_scroll_bars && self.config.scrollbars_on_top {
            if self.scroll_x && !self.config.h_scroll_on_bottom {
                y += self.scroll_bar_height();
            }
            if self.scroll_y && !self.config.v_scroll_on_right {
                x += self.scroll_bar_width();
            }
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

    fn background_insets(&self) -> (f32, f32, f32, f32) {
        let b = self.style.background.unwrap_or_default();
        (b.left_width, b.right_width, b.top_height, b.bottom_height)
    }
}

impl Widget for ScrollPane {
    fn pref_width(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let Some(widget) = self.element else {
            return DEFAULT_SIZE;
        };
        let (left, right, _, _) = self.background_insets();
        let mut width = stage.pref_width(widget) + left + right;
        if self.config.force_scroll_y || !self.config.fade_scroll_bars {
            width += self.scroll_bar_width();
        }
        width
    }

    fn pref_height(&mut self, stage: &mut Stage, _id: ElementId) -> f32 {
        let Some(widget) = self.element else {
            return DEFAULT_SIZE;
        };
        let (_, _, top, bottom) = self.background_insets();
        let mut height = stage.pref_height(widget) + top + bottom;
        if self.config.force_scroll_x || !self.config.fade_scroll_bars {
            height += self.scroll_bar_height();
        }
        height
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
        let (bg_left, bg_right, bg_top, bg_bottom) = self.background_insets();
        let bar_width = self.scroll_bar_width();
        let bar_height = self.scroll_bar_height();
        let c = self.config;

        self.area_width = width - bg_left - bg_right;
        self.area_height = height - bg_top - bg_bottom;

        let Some(widget) = self.element else {
            return Ok(());
        };
        let mut widget_width = stage.pref_width(widget);
        let mut widget_height = stage.pref_height(widget);

        self.scroll_x = c.force_scroll_x || (widget_width > self.area_width && !c.disable_x);
        self.scroll_y = c.force_scroll_y || (widget_height > self.area_height && !c.disable_y);

        // Bars that do not fade take space, which can make the other axis scroll too
        if !c.fade_scroll_bars {
            if self.scroll_y {
                self.area_width -= bar_width;
                if !self.scroll_x && widget_width > self.area_width && !c.disable_x {
                    self.scroll_x = true;
                }
            }
            if self.scroll_x {
                self.area_height -= bar_height;
                if !self.scroll_y && widget_height > self.area_height && !c.disable_y {
                    self.scroll_y = true;
                    self.area_width -= bar_width;
                }
            }
        }

        let mut area = (bg_left, bg_top, self.area_width, self.area_height);
        if c.fade_scroll_bars {
            if self.scroll_x && self.scroll_y {
                self.area_height -= bar_height;
                self.area_width -= bar_width;
            }
        } else if c.scrollbars_on_top {
            if self.scroll_x {
                area.3 += bar_height;
            }
            if self.scroll_y {
                area.2 += bar_width;
            }
        } else {
            if self.scroll_x && !c.h_scroll_on_bottom {
                area.1 += bar_height;
            }
            if self.scroll_y && !c.v_scroll_on_right {
                area.0 += bar_width;
            }
        }
        self.widget_area_bounds = Rect::from_xywh(area.0, area.1, area.2, area.3);

        widget_width = if c.disable_x {
            self.area_width
        } else {
            widget_width.max(self.area_width)
        };
        widget_height = if c.disable_y {
            self.area_height
        } else {
            widget_height.max(self.area_height)
        };

        self.max_x = widget_width - self.area_width;
        self.max_y = widget_height - self.area_height;
        if c.fade_scroll_bars && self.scroll_x && self.scroll_y {
            self.max_y -= bar_height;
            self.max_x -= bar_width;
        }
        if !self.is_panning() {
            self.amount_x = clamp_to(self.amount_x, 0.0, self.max_x);
            self.amount_y = clamp_to(self.amount_y, 0.0, self.max_y);
        }

        self.h_scroll_bounds = Rect::ZERO;
        self.h_knob_bounds = Rect::ZERO;
        if self.scroll_x {
            if let Some(knob) = self.style.h_scroll_knob {
                let h = self.style.h_scroll.map_or(knob.min_height, |bar| bar.min_height);
                let bar_x = if c.v_scroll_on_right {
                    bg_left
                } else {
                    bg_left + bar_width
                };
                let bar_y = if c.h_scroll_on_bottom {
                    height - bg_bottom - h
                } else {
                    bg_top
                };
                self.h_scroll_bounds = Rect::from_xywh(bar_x, bar_y, self.area_width, h);
                let knob_width = if c.variable_size_knobs {
                    knob.min_width
                        .max((self.area_width * self.area_width / widget_width).trunc())
                        .trunc()
                } else {
                    knob.min_width.trunc()
                };
                let knob_x = bar_x
                    + ((self.area_width - knob_width) * self.scroll_percent_x()).trunc();
                self.h_knob_bounds =
                    Rect::from_xywh(knob_x, bar_y, knob_width, knob.min_height.trunc());
            }
        }

        self.v_scroll_bounds = Rect::ZERO;
        self.v_knob_bounds = Rect::ZERO;
        if self.scroll_y {
            if let Some(knob) = self.style.v_scroll_knob {
                let w = self.style.v_scroll.map_or(knob.min_width, |bar| bar.min_width);
                let bar_x = if c.v_scroll_on_right {
                    width - bg_right - w
                } else {
                    bg_left
                };
                let bar_y = if c.h_scroll_on_bottom {
                    bg_top
                } else {
                    bg_top + bar_height
                };
                self.v_scroll_bounds = Rect::from_xywh(bar_x, bar_y, w, self.area_height);
                let knob_height = if c.variable_size_knobs {
                    knob.min_height
                        .max((self.area_height * self.area_height / widget_height).trunc())
                        .trunc()
                } else {
                    knob.min_height.trunc()
                };
                let knob_x = if c.v_scroll_on_right {
                    (width - bg_right - knob.min_width).trunc()
                } else {
                    bg_left.trunc()
                };
                let knob_y = bar_y
                    + ((self.area_height - knob_height) * self.scroll_percent_y()).trunc();
                self.v_knob_bounds =
                    Rect::from_xywh(knob_x, knob_y, knob.min_width.trunc(), knob_height);
            }
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
        let Some(element) = stage.element(id) else {
            return Ok(());
        };
        let (width, height) = (element.width(), element.height());
        let alpha = element.color().a * parent_alpha;
        if self.element.is_none() {
            return Ok(());
        }

        // Knobs follow the visual amount, which moves between layouts
        if self.scroll_x {
            let bar = self.h_scroll_bounds;
            let knob_x = bar.x()
                + ((bar.width() - self.h_knob_bounds.width()) * self.visual_scroll_percent_x())
                    .trunc();
            self.h_knob_bounds = Rect::from_xywh(
                knob_x,
                self.h_knob_bounds.y(),
                self.h_knob_bounds.width(),
                self.h_knob_bounds.height(),
            );
        }
        if self.scroll_y {
            let bar = self.v_scroll_bounds;
            let knob_y = bar.y()
                + ((bar.height() - self.v_knob_bounds.height()) * self.visual_scroll_percent_y())
                    .trunc();
            self.v_knob_bounds = Rect::from_xywh(
                self.v_knob_bounds.x(),
                knob_y,
                self.v_knob_bounds.width(),
                self.v_knob_bounds.height(),
            );
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

        let bar_alpha = alpha * fade(self.fade_alpha / self.config.fade_alpha_seconds);
        if bar_alpha <= 0.0 {
            return Ok(());
        }
        let draw_rect = |out: &mut DrawOutput, drawable: Option<Drawable>, r: Rect| {
            if let Some(d) = drawable {
                d.draw(out, r.x(), r.y(), r.width(), r.height(), bar_alpha);
            }
        };
        if self.scroll_x && self.scroll_y {
            let corner = Rect::from_xywh(
                self.v_scroll_bounds.x(),
                self.h_scroll_bounds.y(),
                self.v_scroll_bounds.width(),
                self.h_scroll_bounds.height(),
            );
            draw_rect(out, self.style.corner, corner);
        }
        if self.scroll_x && self.style.h_scroll_knob.is_some() {
            draw_rect(out, self.style.h_scroll, self.h_scroll_bounds);
            draw_rect(out, self.h_knob, self.h_knob_bounds);
        }
        if self.scroll_y && self.style.v_scroll_knob.is_some() {
            draw_rect(out, self.style.v_scroll, self.v_scroll_bounds);
            draw_rect(out, self.v_knob, self.v_knob_bounds);
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
        // A dragged bar keeps the touch even where it overlaps the child
        if touchable && element.touchable() == Touchable::Enabled && element.is_visible() {
            let point = Point::new(x, y);
            if (self.scroll_x && self.touch_scroll_h && self.h_scroll_bounds.contains(point))
                || (self.scroll_y && self.touch_scroll_v && self.v_scroll_bounds.contains(point))
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
        ChildPolicy::Dedicated("ScrollPane::set_element")
    }

    fn attached(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.id = Some(id);
        stage.set_size(id, DEFAULT_SIZE, DEFAULT_SIZE)?;
        stage.add_capture_listener(id, self.bar_listener.clone())?;
        if self.config.flick_scroll {
            stage.add_listener(id, self.flick_listener.clone())?;
        }
        stage.add_listener(id, self.wheel_listener.clone())?;
        Ok(())
    }
}

/// `f32::clamp` without the panic when `max < min`; `min` wins then
pub(crate) fn clamp_to(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

pub(crate) fn percent(amount: f32, max: f32) -> f32 {
    if max == 0.0 {
        0.0
    } else {
        clamp_to(amount / max, 0.0, 1.0)
    }
}

/// Move `visual` toward `target` at no less than 200 px/s, without overshooting
pub(crate) fn approach(visual: f32, target: f32, delta: f32) -> f32 {
    if visual < target {
        target.min(visual + (200.0 * delta).max((target - visual) * 7.0 * delta))
    } else if visual > target {
        target.max(visual - (200.0 * delta).max((visual - target) * 7.0 * delta))
    } else {
        visual
    }
}

/// Amount that brings `[start, start + length)` into a visible span of `visible` pixels
fn scroll_target(amount: f32, visible: f32, start: f32, length: f32, center: bool) -> f32 {
    if center {
        return start - visible / 2.0 + length / 2.0;
    }
    let mut amount = amount;
    if start + length > amount + visible {
        amount = start + length - visible;
    }
    if start < amount {
        amount = start;
    }
    amount
}

/// Capture listener that pages and drags on the scroll bars
struct ScrollBarInput;

impl InputListener for ScrollBarInput {
    fn touch_down(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
    ) -> bool {
        let Some(pane) = event.listener_element() else {
            return false;
        };
        if stage.widget::<ScrollPane>(pane).map_or(true, ScrollPane::is_dragging) {
            return false;
        }
        if pointer == 0 && button != 0 {
            return false;
        }
        if let Err(err) = stage.set_scroll_focus(Some(pane)) {
            log::warn!("scroll pane {pane:?} could not take scroll focus: {err}");
        }
        stage
            .widget_mut::<ScrollPane>(pane)
            .is_some_and(|p| p.bar_touch_down(event, x, y, pointer))
    }

    fn touch_up(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        _x: f32,
        _y: f32,
        pointer: i32,
        _button: i32,
    ) {
        let Some(pane) = event.listener_element() else {
            return;
        };
        if let Some(p) = stage.widget_mut::<ScrollPane>(pane) {
            if p.dragging_pointer == Some(pointer) {
                p.cancel();
            }
        }
    }

    fn touch_dragged(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32, pointer: i32) {
        let Some(pane) = event.listener_element() else {
            return;
        };
        if let Some(p) = stage.widget_mut::<ScrollPane>(pane) {
            p.bar_dragged(x, y, pointer);
        }
    }

    fn mouse_moved(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32) -> bool {
        if let Some(p) = event
            .listener_element()
            .and_then(|pane| stage.widget_mut::<ScrollPane>(pane))
        {
            p.cursor_moved(x, y);
        }
        false
    }
}

/// Scrolls on the mouse wheel. Positive amounts scroll toward the end.
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
        event
            .listener_element()
            .and_then(|pane| stage.widget_mut::<ScrollPane>(pane))
            .is_some_and(|p| p.wheel(amount_x, amount_y))
    }
}

/// Drags and flings the content
struct FlickScroll;

impl FlickScroll {
    fn pane_mut<'a>(stage: &'a mut Stage, event: &Event) -> Option<&'a mut ScrollPane> {
        event
            .listener_element()
            .and_then(|pane| stage.widget_mut::<ScrollPane>(pane))
    }

    fn take_over(stage: &mut Stage, event: &Event) {
        let Some(pane) = event.listener_element() else {
            return;
        };
        let Some(listener) = stage
            .widget::<ScrollPane>(pane)
            .map(|p| p.flick_listener.clone())
        else {
            return;
        };
        stage.cancel_touch_focus_except(&listener, pane);
    }
}

impl GestureHandler for FlickScroll {
    fn touch_down(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        _x: f32,
        _y: f32,
        _pointer: i32,
        _button: i32,
    ) {
        if let Some(p) = Self::pane_mut(stage, event) {
            p.fling_timer = 0.0;
        }
    }

    fn pan(&mut self, stage: &mut Stage, event: &mut Event, _x: f32, _y: f32, dx: f32, dy: f32) {
        if Self::pane_mut(stage, event).is_some_and(|p| p.flick_pan(dx, dy)) {
            Self::take_over(stage, event);
        }
    }

    fn fling(&mut self, stage: &mut Stage, event: &mut Event, vx: f32, vy: f32, _button: i32) {
        if Self::pane_mut(stage, event).is_some_and(|p| p.flick_fling(vx, vy)) {
            Self::take_over(stage, event);
        }
    }

    fn cancelled(&mut self, stage: &mut Stage, event: &mut Event) {
        if let Some(p) = Self::pane_mut(stage, event) {
            p.end_drag();
        }
    }
}
