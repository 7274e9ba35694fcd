//! Event listeners.
//!
//! Anything implementing [`EventListener`] can be registered on an element,
//! including closures of the form `FnMut(&mut Stage, &mut Event) -> bool`.
//! Listeners are shared through [`ListenerRef`] handles so the stage can keep
//! the listener that handled a touch down as touch focus.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::{Event, InputKind};
use crate::primitives::Point;
use crate::stage::{ElementId, Stage};

pub trait EventListener {
    /// Try to handle the event. Returning true marks it handled.
    fn handle(&mut self, stage: &mut Stage, event: &mut Event) -> bool;
}

impl<F> EventListener for F
where
    F: FnMut(&mut Stage, &mut Event) -> bool,
{
    fn handle(&mut self, stage: &mut Stage, event: &mut Event) -> bool {
        self(stage, event)
    }
}

/// Shared handle to a registered listener, compared by identity
#[derive(Clone)]
pub struct ListenerRef(Rc<RefCell<dyn EventListener>>);

impl ListenerRef {
    pub fn new<L: EventListener + 'static>(listener: L) -> Self {
        Self(Rc::new(RefCell::new(listener)))
    }

    /// Wrap an [`InputListener`] so it can be registered
    pub fn input<L: InputListener + 'static>(listener: L) -> Self {
        Self::new(InputHandler(listener))
    }

    /// Register a listener while keeping typed access to it
    pub fn shared<L: EventListener + 'static>(listener: L) -> (Rc<RefCell<L>>, Self) {
        let shared = Rc::new(RefCell::new(listener));
        let handle = Self(shared.clone());
        (shared, handle)
    }

    pub fn handle(&self, stage: &mut Stage, event: &mut Event) -> bool {
        match self.0.try_borrow_mut() {
            Ok(mut listener) => listener.handle(stage, event),
            Err(_) => {
                log::warn!("listener re-entered while handling an event, skipping");
                false
            }
        }
    }
}

impl PartialEq for ListenerRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ListenerRef {}

impl fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerRef({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// Typed input callbacks, with coordinates in the listener element's space.
///
/// Register through [`ListenerRef::input`].
#[allow(unused_variables)]
pub trait InputListener {
    /// Return true to handle the touch and receive the matching drags and touch up
    fn touch_down(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
    ) -> bool {
        false
    }

    /// Called when a touch handled by `touch_down` ends, or when touch focus is cancelled
    fn touch_up(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
    ) {
    }

    fn touch_dragged(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32, pointer: i32) {}

    fn mouse_moved(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32) -> bool {
        false
    }

    fn scrolled(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        amount_x: f32,
        amount_y: f32,
    ) -> bool {
        false
    }

    /// The pointer moved over the element, `from` is the element it left
    fn enter(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        from: Option<ElementId>,
    ) {
    }

    /// The pointer moved out of the element, `to` is the element it entered
    fn exit(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        to: Option<ElementId>,
    ) {
    }

    fn key_down(&mut self, stage: &mut Stage, event: &mut Event, key_code: i32) -> bool {
        false
    }

    fn key_up(&mut self, stage: &mut Stage, event: &mut Event, key_code: i32) -> bool {
        false
    }

    fn key_typed(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        key_code: i32,
        character: Option<char>,
    ) -> bool {
        false
    }
}

/// Adapts an [`InputListener`] into an [`EventListener`]
pub struct InputHandler<L>(pub L);

impl<L: InputListener> EventListener for InputHandler<L> {
    fn handle(&mut self, stage: &mut Stage, event: &mut Event) -> bool {
        let Some(input) = event.as_input().copied() else {
            return false;
        };
        let listener = &mut self.0;

        match input.kind {
            InputKind::KeyDown => return listener.key_down(stage, event, input.key_code),
            InputKind::KeyUp => return listener.key_up(stage, event, input.key_code),
            InputKind::KeyTyped => {
                return listener.key_typed(stage, event, input.key_code, input.character)
            }
            _ => {}
        }

        let local = match event.listener_element() {
            Some(id) => stage.stage_to_local(id, input.stage_position()),
            None => input.stage_position(),
        };
        let (x, y) = (local.x, local.y);

        match input.kind {
            InputKind::TouchDown => {
                listener.touch_down(stage, event, x, y, input.pointer, input.button)
            }
            InputKind::TouchUp => {
                listener.touch_up(stage, event, x, y, input.pointer, input.button);
                true
            }
            InputKind::TouchDragged => {
                listener.touch_dragged(stage, event, x, y, input.pointer);
                true
            }
            InputKind::MouseMoved => listener.mouse_moved(stage, event, x, y),
            InputKind::Scrolled => listener.scrolled(
                stage,
                event,
                x,
                y,
                input.scroll_amount_x,
                input.scroll_amount_y,
            ),
            InputKind::Enter => {
                listener.enter(stage, event, x, y, input.pointer, input.related_element);
                false
            }
            InputKind::Exit => {
                listener.exit(stage, event, x, y, input.pointer, input.related_element);
                false
            }
            InputKind::KeyDown | InputKind::KeyUp | InputKind::KeyTyped => false,
        }
    }
}

type ClickedFn = Box<dyn FnMut(&mut Stage, &mut Event, f32, f32)>;

/// Detects clicks: a touch down and touch up over the same element.
///
/// Tracks pressed and over state for visual feedback and counts taps that
/// follow each other within the tap count interval.
pub struct ClickListener {
    /// Mouse button to react to, -1 for any
    button: i32,
    tap_square_size: f32,
    tap_count_interval: f32,
    visual_pressed_duration: f32,
    touch_down: Option<Point>,
    pressed_pointer: i32,
    pressed_button: i32,
    pressed: bool,
    over: bool,
    cancelled: bool,
    visual_pressed_until: f32,
    tap_count: u32,
    last_tap_time: Option<f32>,
    clicked: Option<ClickedFn>,
}

impl Default for ClickListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickListener {
    pub fn new() -> Self {
        Self {
            button: 0,
            tap_square_size: 14.0,
            tap_count_interval: 0.4,
            visual_pressed_duration: 0.1,
            touch_down: None,
            pressed_pointer: -1,
            pressed_button: -1,
            pressed: false,
            over: false,
            cancelled: false,
            visual_pressed_until: 0.0,
            tap_count: 0,
            last_tap_time: None,
            clicked: None,
        }
    }

    pub fn with_button(mut self, button: i32) -> Self {
        self.button = button;
        self
    }

    /// Half the size of the square a touch may drift within and still count as a click
    pub fn with_tap_square_size(mut self, half_size: f32) -> Self {
        self.tap_square_size = half_size;
        self
    }

    /// Seconds between taps for them to count as a multi-tap
    pub fn with_tap_count_interval(mut self, seconds: f32) -> Self {
        self.tap_count_interval = seconds;
        self
    }

    pub fn with_clicked(mut self, f: impl FnMut(&mut Stage, &mut Event, f32, f32) + 'static) -> Self {
        self.clicked = Some(Box::new(f));
        self
    }

    /// Forget the current press so its touch up is not a click
    pub fn cancel(&mut self) {
        if self.pressed_pointer == -1 {
            return;
        }
        self.cancelled = true;
        self.pressed = false;
    }

    /// Whether the point is over the element, or still within the tap square
    pub fn is_over_element(&self, stage: &mut Stage, element: ElementId, x: f32, y: f32) -> bool {
        match stage.hit_local(element, x, y, true) {
            Some(hit) if stage.is_descendant_of(hit, element) => true,
            _ => self.in_tap_square_at(x, y),
        }
    }

    pub fn in_tap_square_at(&self, x: f32, y: f32) -> bool {
        self.touch_down.is_some_and(|down| {
            (x - down.x).abs() < self.tap_square_size && (y - down.y).abs() < self.tap_square_size
        })
    }

    pub fn in_tap_square(&self) -> bool {
        self.touch_down.is_some()
    }

    pub fn invalidate_tap_square(&mut self) {
        self.touch_down = None;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Pressed, or released less than the visual pressed duration ago
    pub fn is_visual_pressed(&self, now: f32) -> bool {
        self.pressed || now < self.visual_pressed_until
    }

    pub fn is_over(&self) -> bool {
        self.over || self.pressed
    }

    pub fn tap_count(&self) -> u32 {
        self.tap_count
    }

    pub fn set_tap_count(&mut self, tap_count: u32) {
        self.tap_count = tap_count;
    }

    pub fn pressed_pointer(&self) -> i32 {
        self.pressed_pointer
    }

    pub fn pressed_button(&self) -> i32 {
        self.pressed_button
    }

    pub fn touch_down_position(&self) -> Option<Point> {
        self.touch_down
    }
}

impl InputListener for ClickListener {
    fn touch_down(
        &mut self,
        stage: &mut Stage,
        _event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
    ) -> bool {
        if self.pressed {
            return false;
        }
        if pointer == 0 && self.button != -1 && button != self.button {
            return false;
        }
        self.pressed = true;
        self.pressed_pointer = pointer;
        self.pressed_button = button;
        self.touch_down = Some(Point::new(x, y));
        self.visual_pressed_until = stage.time() + self.visual_pressed_duration;
        true
    }

    fn touch_dragged(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32, pointer: i32) {
        if pointer != self.pressed_pointer || self.cancelled {
            return;
        }
        let Some(element) = event.listener_element() else {
            return;
        };
        self.pressed = self.is_over_element(stage, element, x, y);
        if !self.pressed {
            self.invalidate_tap_square();
        }
    }

    fn touch_up(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
    ) {
        if pointer != self.pressed_pointer {
            return;
        }
        let cancel = event.as_input().is_some_and(|input| input.is_touch_focus_cancel());
        if !self.cancelled && !cancel {
            let mut over = event
                .listener_element()
                .is_some_and(|element| self.is_over_element(stage, element, x, y));
            if over && pointer == 0 && self.button != -1 && button != self.button {
                over = false;
            }
            if over {
                let now = stage.time();
                if self
                    .last_tap_time
                    .map_or(true, |last| now - last > self.tap_count_interval)
                {
                    self.tap_count = 0;
                }
                self.tap_count += 1;
                self.last_tap_time = Some(now);
                if let Some(clicked) = self.clicked.as_mut() {
                    clicked(stage, event, x, y);
                }
            }
        }
        self.pressed = false;
        self.pressed_pointer = -1;
        self.pressed_button = -1;
        self.cancelled = false;
    }

    fn enter(
        &mut self,
        _stage: &mut Stage,
        _event: &mut Event,
        _x: f32,
        _y: f32,
        pointer: i32,
        _from: Option<ElementId>,
    ) {
        if pointer == -1 && !self.cancelled {
            self.over = true;
        }
    }

    fn exit(
        &mut self,
        _stage: &mut Stage,
        _event: &mut Event,
        _x: f32,
        _y: f32,
        pointer: i32,
        _to: Option<ElementId>,
    ) {
        if pointer == -1 && !self.cancelled {
            self.over = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputEvent;

    fn button(stage: &mut Stage) -> ElementId {
        let id = stage.create_element();
        stage.element_mut(id).unwrap().set_position(10.0, 10.0);
        stage.set_size(id, 50.0, 20.0).unwrap();
        stage.add_element(stage.root(), id).unwrap();
        id
    }

    #[test]
    fn test_closure_is_listener() {
        let mut stage = Stage::new(10.0, 10.0);
        let listener = ListenerRef::new(|_: &mut Stage, event: &mut Event| {
            event.stop();
            true
        });
        let mut event = Event::new(crate::event::EventKind::Change);
        assert!(listener.handle(&mut stage, &mut event));
        assert!(event.is_stopped());
        assert_eq!(listener, listener.clone());
        assert_ne!(listener, ListenerRef::new(|_: &mut Stage, _: &mut Event| false));
    }

    #[test]
    fn test_click_through_stage() {
        let mut stage = Stage::new(200.0, 200.0);
        let id = button(&mut stage);
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = clicks.clone();
        let (click, handle) = ListenerRef::shared(InputHandler(ClickListener::new().with_clicked(
            move |_, _, x, y| sink.borrow_mut().push((x, y)),
        )));
        stage.add_listener(id, handle).unwrap();

        assert!(stage.touch_down(15.0, 12.0, 0, 0).unwrap());
        assert!(click.borrow().0.is_pressed());
        stage.touch_up(16.0, 13.0, 0, 0).unwrap();
        assert!(!click.borrow().0.is_pressed());
        assert_eq!(*clicks.borrow(), [(6.0, 3.0)]);
        assert_eq!(click.borrow().0.tap_count(), 1);

        stage.act(0.1).unwrap();
        stage.touch_down(15.0, 12.0, 0, 0).unwrap();
        stage.touch_up(15.0, 12.0, 0, 0).unwrap();
        assert_eq!(click.borrow().0.tap_count(), 2);
    }

    #[test]
    fn test_release_outside_is_not_a_click() {
        let mut stage = Stage::new(200.0, 200.0);
        let id = button(&mut stage);
        let clicks = Rc::new(RefCell::new(0));
        let sink = clicks.clone();
        stage
            .add_listener(
                id,
                ListenerRef::input(
                    ClickListener::new().with_clicked(move |_, _, _, _| *sink.borrow_mut() += 1),
                ),
            )
            .unwrap();

        stage.touch_down(15.0, 12.0, 0, 0).unwrap();
        stage.touch_dragged(150.0, 150.0, 0).unwrap();
        stage.touch_up(150.0, 150.0, 0, 0).unwrap();
        assert_eq!(*clicks.borrow(), 0);
    }

    #[test]
    fn test_cancelled_touch_focus_is_not_a_click() {
        let mut stage = Stage::new(200.0, 200.0);
        let id = button(&mut stage);
        let clicks = Rc::new(RefCell::new(0));
        let sink = clicks.clone();
        stage
            .add_listener(
                id,
                ListenerRef::input(
                    ClickListener::new().with_clicked(move |_, _, _, _| *sink.borrow_mut() += 1),
                ),
            )
            .unwrap();

        stage.touch_down(15.0, 12.0, 0, 0).unwrap();
        stage.cancel_touch_focus(id);
        stage.touch_up(15.0, 12.0, 0, 0).unwrap();
        assert_eq!(*clicks.borrow(), 0);
    }

    #[test]
    fn test_wrong_button_ignored() {
        let mut stage = Stage::new(200.0, 200.0);
        let id = button(&mut stage);
        stage
            .add_listener(id, ListenerRef::input(ClickListener::new()))
            .unwrap();
        assert!(!stage.touch_down(15.0, 12.0, 0, 1).unwrap());
    }

    #[test]
    fn test_input_handler_ignores_other_events() {
        let mut stage = Stage::new(10.0, 10.0);
        let mut handler = InputHandler(ClickListener::new());
        let mut event = Event::new(crate::event::EventKind::Change);
        assert!(!handler.handle(&mut stage, &mut event));

        let mut key = Event::input(InputEvent::new(InputKind::KeyDown));
        assert!(!handler.handle(&mut stage, &mut key));
    }
}
