//! Events and their capture-then-bubble dispatch through the element tree.
//!
//! [`Stage::fire`] delivers an event to a target element in three phases:
//!
//! 1. capture listeners of every ancestor, outermost first
//! 2. the target's capture listeners, then its regular listeners
//! 3. regular listeners of every ancestor, innermost first (only if the event bubbles)
//!
//! Stopping the event ends dispatch after the listeners of the element that
//! is currently being notified.

use crate::error::{UiError, UiResult};
use crate::listener::ListenerRef;
use crate::primitives::Point;
use crate::stage::{ElementId, Stage};

/// Input event types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// A new touch for a pointer on the stage was detected
    TouchDown,
    /// A pointer has stopped touching the stage
    TouchUp,
    /// A pointer that is touching the stage has moved
    TouchDragged,
    /// The mouse pointer has moved without a button pressed
    MouseMoved,
    /// The pointer moved over an element
    Enter,
    /// The pointer moved out of an element
    Exit,
    /// The mouse wheel has been scrolled
    Scrolled,
    KeyDown,
    KeyUp,
    KeyTyped,
}

/// Pointer and keyboard input routed through the stage
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub stage_x: f32,
    pub stage_y: f32,
    /// Pointer index, -1 for the mouse when no button is down
    pub pointer: i32,
    pub button: i32,
    pub key_code: i32,
    pub character: Option<char>,
    pub scroll_amount_x: f32,
    pub scroll_amount_y: f32,
    /// The other element of an enter or exit
    pub related_element: Option<ElementId>,
    /// Whether a listener handling a touch down gains touch focus
    pub touch_focus: bool,
    /// Stage clock at the time of the event, in seconds
    pub time: f32,
}

/// Stage coordinate used for touch-up events that cancel touch focus
pub const TOUCH_FOCUS_CANCEL: f32 = i32::MIN as f32;

impl InputEvent {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            stage_x: 0.0,
            stage_y: 0.0,
            pointer: 0,
            button: 0,
            key_code: 0,
            character: None,
            scroll_amount_x: 0.0,
            scroll_amount_y: 0.0,
            related_element: None,
            touch_focus: true,
            time: 0.0,
        }
    }

    pub fn with_position(mut self, stage_x: f32, stage_y: f32) -> Self {
        self.stage_x = stage_x;
        self.stage_y = stage_y;
        self
    }

    pub fn with_pointer(mut self, pointer: i32, button: i32) -> Self {
        self.pointer = pointer;
        self.button = button;
        self
    }

    pub fn with_key(mut self, key_code: i32, character: Option<char>) -> Self {
        self.key_code = key_code;
        self.character = character;
        self
    }

    pub fn with_scroll(mut self, amount_x: f32, amount_y: f32) -> Self {
        self.scroll_amount_x = amount_x;
        self.scroll_amount_y = amount_y;
        self
    }

    pub fn with_related(mut self, related: Option<ElementId>) -> Self {
        self.related_element = related;
        self
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    pub fn stage_position(&self) -> Point {
        Point::new(self.stage_x, self.stage_y)
    }

    /// True for the synthetic touch-up sent when touch focus is cancelled
    pub fn is_touch_focus_cancel(&self) -> bool {
        self.stage_x == TOUCH_FOCUS_CANCEL || self.stage_y == TOUCH_FOCUS_CANCEL
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusType {
    Keyboard,
    Scroll,
}

/// Fired when an element gains or loses keyboard or scroll focus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusEvent {
    pub focused: bool,
    pub focus_type: FocusType,
    /// The element losing focus when gaining it, and vice versa
    pub related_element: Option<ElementId>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Input(InputEvent),
    Focus(FocusEvent),
    /// A widget's value changed
    Change,
    /// Application-defined event
    Custom(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    target: Option<ElementId>,
    listener_element: Option<ElementId>,
    pub(crate) capture: bool,
    bubbles: bool,
    handled: bool,
    stopped: bool,
    cancelled: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            listener_element: None,
            capture: false,
            bubbles: true,
            handled: false,
            stopped: false,
            cancelled: false,
        }
    }

    pub fn input(input: InputEvent) -> Self {
        Self::new(EventKind::Input(input))
    }

    pub fn focus(focus: FocusEvent) -> Self {
        Self::new(EventKind::Focus(focus))
    }

    pub fn as_input(&self) -> Option<&InputEvent> {
        match &self.kind {
            EventKind::Input(input) => Some(input),
            _ => None,
        }
    }

    pub fn as_input_mut(&mut self) -> Option<&mut InputEvent> {
        match &mut self.kind {
            EventKind::Input(input) => Some(input),
            _ => None,
        }
    }

    pub fn as_focus(&self) -> Option<&FocusEvent> {
        match &self.kind {
            EventKind::Focus(focus) => Some(focus),
            _ => None,
        }
    }

    pub fn input_kind(&self) -> Option<InputKind> {
        self.as_input().map(|input| input.kind)
    }

    /// Marks the event handled, which makes the stage input methods return true
    pub fn handle(&mut self) {
        self.handled = true;
    }

    /// Halts propagation once the current element's listeners have run
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Stops and handles the event, and asks the code that fired it to skip its default action
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.stopped = true;
        self.handled = true;
    }

    pub fn reset(&mut self) {
        self.target = None;
        self.listener_element = None;
        self.capture = false;
        self.bubbles = true;
        self.handled = false;
        self.stopped = false;
        self.cancelled = false;
    }

    /// Element the event was fired at
    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<ElementId>) {
        self.target = target;
    }

    /// Element whose listener is currently being notified
    pub fn listener_element(&self) -> Option<ElementId> {
        self.listener_element
    }

    pub fn set_listener_element(&mut self, element: Option<ElementId>) {
        self.listener_element = element;
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn set_bubbles(&mut self, bubbles: bool) {
        self.bubbles = bubbles;
    }

    /// True while capture listeners are being notified
    pub fn is_capture(&self) -> bool {
        self.capture
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Stage {
    /// Fire an event at `target`, running the capture, target and bubble phases.
    ///
    /// Returns whether the event was cancelled.
    pub fn fire(&mut self, target: ElementId, event: &mut Event) -> UiResult<bool> {
        if !self.contains(target) {
            return Err(UiError::InvalidArgument("fire target is not a live element"));
        }
        event.set_target(Some(target));

        let mut ascendants = Vec::new();
        let mut parent = self.parent(target);
        while let Some(id) = parent {
            ascendants.push(id);
            parent = self.parent(id);
        }

        // Capture, root first
        for &ascendant in ascendants.iter().rev() {
            if self.contains(ascendant) {
                self.notify(ascendant, event, true)?;
            }
            if event.is_stopped() {
                return Ok(event.is_cancelled());
            }
        }

        if self.contains(target) {
            self.notify(target, event, true)?;
        }
        if event.is_stopped() {
            return Ok(event.is_cancelled());
        }
        if self.contains(target) {
            self.notify(target, event, false)?;
        }
        if !event.bubbles() || event.is_stopped() {
            return Ok(event.is_cancelled());
        }

        // Bubble, parent first
        for &ascendant in &ascendants {
            if self.contains(ascendant) {
                self.notify(ascendant, event, false)?;
            }
            if event.is_stopped() {
                break;
            }
        }
        Ok(event.is_cancelled())
    }

    /// Notify the capture or regular listeners of one element.
    ///
    /// Listeners added during the notification are not called; listeners
    /// removed during it stay in place until it finishes. A listener that
    /// handles a touch down gains touch focus for its pointer and button.
    /// Returns whether the event was cancelled.
    pub fn notify(&mut self, id: ElementId, event: &mut Event, capture: bool) -> UiResult<bool> {
        let target = event
            .target()
            .ok_or(UiError::InvalidArgument("event target must be set before notify"))?;

        let list = self.listener_list_mut(id, capture)?;
        if list.is_empty() {
            return Ok(event.is_cancelled());
        }
        list.begin();
        let count = list.len();

        event.set_listener_element(Some(id));
        event.capture = capture;

        for index in 0..count {
            let Some(listener) = self
                .listener_list_mut(id, capture)
                .ok()
                .and_then(|list| list.get(index).cloned())
            else {
                break;
            };

            if listener.handle(self, event) {
                event.handle();
                if let Some(input) = event.as_input() {
                    if input.kind == InputKind::TouchDown && input.touch_focus {
                        let (pointer, button) = (input.pointer, input.button);
                        self.add_touch_focus(listener.clone(), id, target, pointer, button);
                    }
                }
            }
        }

        // The element may have been destroyed by one of its listeners
        if let Ok(list) = self.listener_list_mut(id, capture) {
            list.end()?;
        }
        Ok(event.is_cancelled())
    }

    /// Add a listener, returning false if it is already registered
    pub fn add_listener(&mut self, id: ElementId, listener: ListenerRef) -> UiResult<bool> {
        let list = self.listener_list_mut(id, false)?;
        if list.contains(&listener) {
            return Ok(false);
        }
        list.push(listener);
        Ok(true)
    }

    pub fn remove_listener(&mut self, id: ElementId, listener: &ListenerRef) -> UiResult<bool> {
        Ok(self.listener_list_mut(id, false)?.remove_value(listener))
    }

    /// Add a capture listener, returning false if it is already registered
    pub fn add_capture_listener(&mut self, id: ElementId, listener: ListenerRef) -> UiResult<bool> {
        let list = self.listener_list_mut(id, true)?;
        if list.contains(&listener) {
            return Ok(false);
        }
        list.push(listener);
        Ok(true)
    }

    pub fn remove_capture_listener(
        &mut self,
        id: ElementId,
        listener: &ListenerRef,
    ) -> UiResult<bool> {
        Ok(self.listener_list_mut(id, true)?.remove_value(listener))
    }

    /// Remove every listener and capture listener of an element
    pub fn clear_listeners(&mut self, id: ElementId) -> UiResult<()> {
        self.listener_list_mut(id, false)?.clear();
        self.listener_list_mut(id, true)?.clear();
        Ok(())
    }

    pub fn listeners(&self, id: ElementId) -> &[ListenerRef] {
        self.try_node(id)
            .map_or(&[], |node| node.listeners.as_slice())
    }

    pub fn capture_listeners(&self, id: ElementId) -> &[ListenerRef] {
        self.try_node(id)
            .map_or(&[], |node| node.capture_listeners.as_slice())
    }
}
