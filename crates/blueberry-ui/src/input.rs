//! Input entry points of the stage: pointer, wheel and key events, touch
//! focus, and keyboard and scroll focus.
//!
//! All coordinates are stage coordinates. Mapping window or screen positions
//! into the stage is the host's business.

use crate::element::Touchable;
use crate::error::UiResult;
use crate::event::{Event, FocusEvent, FocusType, InputEvent, InputKind, TOUCH_FOCUS_CANCEL};
use crate::listener::ListenerRef;
use crate::stage::{ElementId, Stage, TouchFocus, MAX_POINTERS};

fn pointer_slot(pointer: i32) -> Option<usize> {
    usize::try_from(pointer).ok().filter(|p| *p < MAX_POINTERS)
}

impl Stage {
    fn input_event(&self, kind: InputKind) -> InputEvent {
        InputEvent::new(kind).with_time(self.time())
    }

    /// A pointer went down. Returns whether a listener handled it.
    pub fn touch_down(&mut self, x: f32, y: f32, pointer: i32, button: i32) -> UiResult<bool> {
        if let Some(slot) = pointer_slot(pointer) {
            let state = &mut self.pointers[slot];
            state.touched = true;
            state.x = x;
            state.y = y;
        }

        let input = self
            .input_event(InputKind::TouchDown)
            .with_position(x, y)
            .with_pointer(pointer, button);
        let mut event = Event::input(input);

        let root = self.root();
        match self.hit(x, y, true) {
            Some(target) => {
                self.fire(target, &mut event)?;
            }
            None => {
                if self.element(root).is_some_and(|e| e.touchable() == Touchable::Enabled) {
                    self.fire(root, &mut event)?;
                }
            }
        }
        Ok(event.is_handled())
    }

    /// A pointer went up. Only touch focus listeners for the pointer and button receive it.
    pub fn touch_up(&mut self, x: f32, y: f32, pointer: i32, button: i32) -> UiResult<bool> {
        if let Some(slot) = pointer_slot(pointer) {
            let state = &mut self.pointers[slot];
            state.touched = false;
            state.x = x;
            state.y = y;
        }
        if self.touch_focuses.is_empty() {
            return Ok(false);
        }

        let input = self
            .input_event(InputKind::TouchUp)
            .with_position(x, y)
            .with_pointer(pointer, button);
        let mut event = Event::input(input);

        let focuses = self.touch_focuses.clone();
        for focus in focuses {
            if focus.pointer != pointer || focus.button != button {
                continue;
            }
            // Touch focus already gone
            if !self.take_touch_focus(&focus) {
                continue;
            }
            self.deliver_to_focus(&focus, &mut event);
        }
        Ok(event.is_handled())
    }

    /// A touching pointer moved. Only touch focus listeners for the pointer receive it.
    pub fn touch_dragged(&mut self, x: f32, y: f32, pointer: i32) -> UiResult<bool> {
        if let Some(slot) = pointer_slot(pointer) {
            self.pointers[slot].x = x;
            self.pointers[slot].y = y;
        }
        self.mouse_x = x;
        self.mouse_y = y;
        if self.touch_focuses.is_empty() {
            return Ok(false);
        }

        let input = self
            .input_event(InputKind::TouchDragged)
            .with_position(x, y)
            .with_pointer(pointer, 0);
        let mut event = Event::input(input);

        let focuses = self.touch_focuses.clone();
        for focus in focuses {
            if focus.pointer != pointer || !self.touch_focuses.contains(&focus) {
                continue;
            }
            self.deliver_to_focus(&focus, &mut event);
        }
        Ok(event.is_handled())
    }

    /// The mouse moved with no button down
    pub fn mouse_moved(&mut self, x: f32, y: f32) -> UiResult<bool> {
        self.mouse_x = x;
        self.mouse_y = y;

        let input = self.input_event(InputKind::MouseMoved).with_position(x, y);
        let mut event = Event::input(input);
        let target = self.hit(x, y, true).unwrap_or(self.root());
        self.fire(target, &mut event)?;
        Ok(event.is_handled())
    }

    /// The mouse wheel turned. Goes to the scroll focus, or the root without one.
    pub fn scrolled(&mut self, amount_x: f32, amount_y: f32) -> UiResult<bool> {
        let input = self
            .input_event(InputKind::Scrolled)
            .with_position(self.mouse_x, self.mouse_y)
            .with_scroll(amount_x, amount_y);
        let mut event = Event::input(input);
        let target = self.scroll_focus.unwrap_or(self.root());
        self.fire(target, &mut event)?;
        Ok(event.is_handled())
    }

    pub fn key_down(&mut self, key_code: i32) -> UiResult<bool> {
        self.fire_key(self.input_event(InputKind::KeyDown).with_key(key_code, None))
    }

    pub fn key_up(&mut self, key_code: i32) -> UiResult<bool> {
        self.fire_key(self.input_event(InputKind::KeyUp).with_key(key_code, None))
    }

    pub fn key_typed(&mut self, key_code: i32, character: char) -> UiResult<bool> {
        self.fire_key(
            self.input_event(InputKind::KeyTyped)
                .with_key(key_code, Some(character)),
        )
    }

    fn fire_key(&mut self, input: InputEvent) -> UiResult<bool> {
        let mut event = Event::input(input);
        let target = self.keyboard_focus.unwrap_or(self.root());
        self.fire(target, &mut event)?;
        Ok(event.is_handled())
    }

    pub fn mouse_position(&self) -> (f32, f32) {
        (self.mouse_x, self.mouse_y)
    }

    pub fn mouse_over(&self) -> Option<ElementId> {
        self.mouse_over
    }

    /// Whether the pointer is currently down
    pub fn is_touched(&self, pointer: i32) -> bool {
        pointer_slot(pointer).is_some_and(|slot| self.pointers[slot].touched)
    }

    // Enter and exit

    /// Fire enter and exit for every pointer and the mouse whose element changed
    pub(crate) fn update_pointer_over(&mut self) -> UiResult<()> {
        for slot in 0..MAX_POINTERS {
            let state = self.pointers[slot];
            let pointer = slot as i32;
            if !state.touched {
                // The pointer is gone
                if let Some(over_last) = state.over {
                    self.pointers[slot].over = None;
                    if self.contains(over_last) {
                        let input = self
                            .input_event(InputKind::Exit)
                            .with_position(state.x, state.y)
                            .with_pointer(pointer, 0)
                            .with_related(Some(over_last));
                        self.fire(over_last, &mut Event::input(input))?;
                    }
                }
                continue;
            }
            let over = self.fire_enter_and_exit(state.over, state.x, state.y, pointer)?;
            self.pointers[slot].over = over;
        }

        let (x, y) = (self.mouse_x, self.mouse_y);
        self.mouse_over = self.fire_enter_and_exit(self.mouse_over, x, y, -1)?;
        Ok(())
    }

    fn fire_enter_and_exit(
        &mut self,
        over_last: Option<ElementId>,
        x: f32,
        y: f32,
        pointer: i32,
    ) -> UiResult<Option<ElementId>> {
        let over = self.hit(x, y, true);
        if over == over_last {
            return Ok(over_last);
        }

        if let Some(last) = over_last.filter(|id| self.contains(*id)) {
            let input = self
                .input_event(InputKind::Exit)
                .with_position(x, y)
                .with_pointer(pointer, 0)
                .with_related(over);
            self.fire(last, &mut Event::input(input))?;
        }
        if let Some(over) = over.filter(|id| self.contains(*id)) {
            let input = self
                .input_event(InputKind::Enter)
                .with_position(x, y)
                .with_pointer(pointer, 0)
                .with_related(over_last);
            self.fire(over, &mut Event::input(input))?;
        }
        Ok(over)
    }

    // Touch focus

    /// Route the rest of a touch to `listener`, which handled its touch down
    pub fn add_touch_focus(
        &mut self,
        listener: ListenerRef,
        listener_element: ElementId,
        target: ElementId,
        pointer: i32,
        button: i32,
    ) {
        log::debug!("touch focus for pointer {pointer} button {button} on {listener_element:?}");
        self.touch_focuses.push(TouchFocus {
            listener,
            listener_element,
            target,
            pointer,
            button,
        });
    }

    pub fn remove_touch_focus(
        &mut self,
        listener: &ListenerRef,
        listener_element: ElementId,
        target: ElementId,
        pointer: i32,
        button: i32,
    ) {
        self.touch_focuses.retain(|focus| {
            !(focus.listener == *listener
                && focus.listener_element == listener_element
                && focus.target == target
                && focus.pointer == pointer
                && focus.button == button)
        });
    }

    pub fn touch_focus_count(&self) -> usize {
        self.touch_focuses.len()
    }

    /// Whether `listener` on `element` holds touch focus for any pointer
    pub fn has_touch_focus(&self, listener: &ListenerRef, element: ElementId) -> bool {
        self.touch_focuses
            .iter()
            .any(|focus| focus.listener == *listener && focus.listener_element == element)
    }

    /// Cancel every touch focus whose listener belongs to `element`.
    ///
    /// Each affected listener receives a touch up at [`TOUCH_FOCUS_CANCEL`].
    pub fn cancel_touch_focus(&mut self, element: ElementId) {
        self.cancel_touch_focus_where(|focus| focus.listener_element == element);
    }

    /// Cancel every touch focus except the one of `listener` on `element`
    pub fn cancel_touch_focus_except(&mut self, listener: &ListenerRef, element: ElementId) {
        self.cancel_touch_focus_where(|focus| {
            !(focus.listener == *listener && focus.listener_element == element)
        });
    }

    /// Cancel every touch focus
    pub fn cancel_all_touch_focus(&mut self) {
        self.cancel_touch_focus_where(|_| true);
    }

    fn cancel_touch_focus_where(&mut self, matches: impl Fn(&TouchFocus) -> bool) {
        let focuses = self.touch_focuses.clone();
        for focus in focuses {
            if !matches(&focus) || !self.take_touch_focus(&focus) {
                continue;
            }
            let input = self
                .input_event(InputKind::TouchUp)
                .with_position(TOUCH_FOCUS_CANCEL, TOUCH_FOCUS_CANCEL)
                .with_pointer(focus.pointer, focus.button);
            let mut event = Event::input(input);
            self.deliver_to_focus(&focus, &mut event);
        }
    }

    fn take_touch_focus(&mut self, focus: &TouchFocus) -> bool {
        match self.touch_focuses.iter().position(|f| f == focus) {
            Some(index) => {
                self.touch_focuses.remove(index);
                true
            }
            None => false,
        }
    }

    fn deliver_to_focus(&mut self, focus: &TouchFocus, event: &mut Event) {
        event.set_target(Some(focus.target));
        event.set_listener_element(Some(focus.listener_element));
        event.capture = false;
        if focus.listener.handle(self, event) {
            event.handle();
        }
    }

    // Keyboard and scroll focus

    pub fn keyboard_focus(&self) -> Option<ElementId> {
        self.keyboard_focus
    }

    pub fn scroll_focus(&self) -> Option<ElementId> {
        self.scroll_focus
    }

    /// Move keyboard focus, firing focus events at the old and new holders.
    ///
    /// Either holder can veto by cancelling its event. Returns whether the
    /// change happened.
    pub fn set_keyboard_focus(&mut self, element: Option<ElementId>) -> UiResult<bool> {
        let old = self.keyboard_focus;
        let success = self.change_focus(old, element, FocusType::Keyboard)?;
        if success {
            self.keyboard_focus = element;
        }
        Ok(success)
    }

    /// Move scroll focus, firing focus events at the old and new holders
    pub fn set_scroll_focus(&mut self, element: Option<ElementId>) -> UiResult<bool> {
        let old = self.scroll_focus;
        let success = self.change_focus(old, element, FocusType::Scroll)?;
        if success {
            self.scroll_focus = element;
        }
        Ok(success)
    }

    fn change_focus(
        &mut self,
        old: Option<ElementId>,
        new: Option<ElementId>,
        focus_type: FocusType,
    ) -> UiResult<bool> {
        if old == new {
            return Ok(true);
        }

        if let Some(old) = old.filter(|id| self.contains(*id)) {
            let mut event = Event::focus(FocusEvent {
                focused: false,
                focus_type,
                related_element: new,
            });
            if self.fire(old, &mut event)? {
                return Ok(false);
            }
        }

        if let Some(new) = new {
            // The holder is visible to focus listeners while they run
            self.set_focus_slot(focus_type, Some(new));
            let mut event = Event::focus(FocusEvent {
                focused: true,
                focus_type,
                related_element: old,
            });
            if self.fire(new, &mut event)? {
                self.set_focus_slot(focus_type, old);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn set_focus_slot(&mut self, focus_type: FocusType, element: Option<ElementId>) {
        match focus_type {
            FocusType::Keyboard => self.keyboard_focus = element,
            FocusType::Scroll => self.scroll_focus = element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn input_recorder(log: &Log, name: &'static str, handles: bool) -> ListenerRef {
        let log = log.clone();
        ListenerRef::new(move |_: &mut Stage, event: &mut Event| {
            if let Some(input) = event.as_input() {
                log.borrow_mut().push(format!("{name}:{:?}", input.kind));
            }
            handles
        })
    }

    fn boxed(stage: &mut Stage, x: f32, y: f32) -> ElementId {
        let id = stage.create_element();
        stage.set_bounds(id, x, y, 20.0, 20.0).unwrap();
        stage.add_element(stage.root(), id).unwrap();
        id
    }

    #[test]
    fn test_touch_focus_routes_up_and_drag() {
        let mut stage = Stage::new(100.0, 100.0);
        let log = Log::default();
        let a = boxed(&mut stage, 0.0, 0.0);
        let b = boxed(&mut stage, 50.0, 0.0);
        stage.add_listener(a, input_recorder(&log, "a", true)).unwrap();
        stage.add_listener(b, input_recorder(&log, "b", true)).unwrap();

        assert!(stage.touch_down(5.0, 5.0, 0, 0).unwrap());
        assert_eq!(stage.touch_focus_count(), 1);
        assert!(stage.is_touched(0));

        // Dragging over `b` still goes to `a`
        assert!(stage.touch_dragged(55.0, 5.0, 0).unwrap());
        // Other pointers have no focus
        assert!(!stage.touch_dragged(55.0, 5.0, 1).unwrap());
        // Wrong button is not delivered
        assert!(!stage.touch_up(55.0, 5.0, 0, 1).unwrap());
        assert!(stage.touch_up(55.0, 5.0, 0, 0).unwrap());
        assert_eq!(stage.touch_focus_count(), 0);

        assert_eq!(*log.borrow(), ["a:TouchDown", "a:TouchDragged", "a:TouchUp"]);
    }

    #[test]
    fn test_unhandled_touch_down_gets_no_focus() {
        let mut stage = Stage::new(100.0, 100.0);
        let log = Log::default();
        let a = boxed(&mut stage, 0.0, 0.0);
        stage.add_listener(a, input_recorder(&log, "a", false)).unwrap();
        assert!(!stage.touch_down(5.0, 5.0, 0, 0).unwrap());
        assert_eq!(stage.touch_focus_count(), 0);
        assert!(!stage.touch_up(5.0, 5.0, 0, 0).unwrap());
    }

    #[test]
    fn test_cancel_touch_focus_except() {
        let mut stage = Stage::new(100.0, 100.0);
        let log = Log::default();
        let a = boxed(&mut stage, 0.0, 0.0);
        let keep = input_recorder(&log, "keep", true);
        let (cancelled, cancelled_ref) = {
            let log = log.clone();
            ListenerRef::shared(move |_: &mut Stage, event: &mut Event| {
                if let Some(input) = event.as_input() {
                    let name = if input.is_touch_focus_cancel() { "cancel" } else { "other" };
                    log.borrow_mut().push(format!("{name}:{:?}", input.kind));
                }
                true
            })
        };
        stage.add_listener(a, keep.clone()).unwrap();
        stage.add_listener(a, cancelled_ref).unwrap();
        stage.touch_down(5.0, 5.0, 0, 0).unwrap();
        assert_eq!(stage.touch_focus_count(), 2);

        stage.cancel_touch_focus_except(&keep, a);
        assert_eq!(stage.touch_focus_count(), 1);
        assert!(stage.has_touch_focus(&keep, a));
        assert_eq!(log.borrow().last().map(String::as_str), Some("cancel:TouchUp"));
        drop(cancelled);
    }

    #[test]
    fn test_enter_exit_on_act() {
        let mut stage = Stage::new(100.0, 100.0);
        let log = Log::default();
        let a = boxed(&mut stage, 0.0, 0.0);
        let b = boxed(&mut stage, 50.0, 0.0);
        stage.add_listener(a, input_recorder(&log, "a", false)).unwrap();
        stage.add_listener(b, input_recorder(&log, "b", false)).unwrap();

        stage.mouse_moved(5.0, 5.0).unwrap();
        stage.act(0.016).unwrap();
        assert_eq!(stage.mouse_over(), Some(a));

        stage.mouse_moved(55.0, 5.0).unwrap();
        stage.act(0.016).unwrap();
        assert_eq!(stage.mouse_over(), Some(b));

        // Same element, no new events
        stage.act(0.016).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                "a:MouseMoved",
                "a:Enter",
                "b:MouseMoved",
                "a:Exit",
                "b:Enter"
            ]
        );
    }

    #[test]
    fn test_key_and_scroll_routing() {
        let mut stage = Stage::new(100.0, 100.0);
        let log = Log::default();
        let a = boxed(&mut stage, 0.0, 0.0);
        stage.add_listener(a, input_recorder(&log, "a", true)).unwrap();
        stage
            .add_listener(stage.root(), input_recorder(&log, "root", false))
            .unwrap();

        assert!(!stage.key_down(42).unwrap());
        assert!(stage.set_keyboard_focus(Some(a)).unwrap());
        assert!(stage.key_typed(42, 'x').unwrap());
        assert!(stage.set_scroll_focus(Some(a)).unwrap());
        assert!(stage.scrolled(0.0, 1.0).unwrap());

        // Handled events still bubble to the root
        assert_eq!(
            *log.borrow(),
            [
                "root:KeyDown",
                "a:KeyTyped",
                "root:KeyTyped",
                "a:Scrolled",
                "root:Scrolled"
            ]
        );
    }

    #[test]
    fn test_focus_veto() {
        let mut stage = Stage::new(100.0, 100.0);
        let a = boxed(&mut stage, 0.0, 0.0);
        let b = boxed(&mut stage, 50.0, 0.0);
        let veto = Rc::new(RefCell::new(true));

        assert!(stage.set_keyboard_focus(Some(a)).unwrap());
        let flag = veto.clone();
        stage
            .add_listener(
                a,
                ListenerRef::new(move |_: &mut Stage, event: &mut Event| {
                    if let EventKind::Focus(focus) = event.kind {
                        if !focus.focused && *flag.borrow() {
                            event.cancel();
                        }
                    }
                    false
                }),
            )
            .unwrap();

        assert!(!stage.set_keyboard_focus(Some(b)).unwrap());
        assert_eq!(stage.keyboard_focus(), Some(a));

        *veto.borrow_mut() = false;
        assert!(stage.set_keyboard_focus(Some(b)).unwrap());
        assert_eq!(stage.keyboard_focus(), Some(b));
    }

    #[test]
    fn test_new_holder_can_refuse_focus() {
        let mut stage = Stage::new(100.0, 100.0);
        let a = boxed(&mut stage, 0.0, 0.0);
        stage
            .add_listener(
                a,
                ListenerRef::new(|_: &mut Stage, event: &mut Event| {
                    if event.as_focus().is_some_and(|f| f.focused) {
                        event.cancel();
                    }
                    false
                }),
            )
            .unwrap();
        assert!(!stage.set_scroll_focus(Some(a)).unwrap());
        assert_eq!(stage.scroll_focus(), None);
    }

    #[test]
    fn test_removing_focused_subtree_clears_focus() {
        let mut stage = Stage::new(100.0, 100.0);
        let group = stage.create_group();
        stage.add_element(stage.root(), group).unwrap();
        let a = stage.create_element();
        stage.add_element(group, a).unwrap();
        stage.set_keyboard_focus(Some(a)).unwrap();
        stage.set_scroll_focus(Some(a)).unwrap();

        stage.remove(group).unwrap();
        assert_eq!(stage.keyboard_focus(), None);
        assert_eq!(stage.scroll_focus(), None);
    }
}
