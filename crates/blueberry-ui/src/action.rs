//! Timed changes attached to elements.
//!
//! An element runs its actions on every [`Stage::act`]; an action that
//! reports completion is dropped. Actions compose: [`SequenceAction`] runs
//! its children one after another, [`ParallelAction`] all at once.

use crate::color::Color;
use crate::listener::ListenerRef;
use crate::stage::{ElementId, Stage};
use crate::transition::{lerp_f32, EasingFn};

pub trait Action {
    /// Advance by `delta` seconds. Returns true once the action is done.
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool;

    /// Rewind so the action can run again
    fn restart(&mut self) {}
}

/// Progress of a [`TemporalAction`] for one update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// First update since the start or the last restart
    pub first: bool,
    /// Eased completion, from 0 to 1 (1 to 0 when reversed)
    pub percent: f32,
    /// The duration has been reached
    pub last: bool,
}

/// Clock shared by the actions that interpolate over a duration
#[derive(Clone, Copy, Debug, Default)]
pub struct TemporalAction {
    duration: f32,
    time: f32,
    easing: Option<EasingFn>,
    reverse: bool,
    began: bool,
    complete: bool,
}

impl TemporalAction {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Advance the clock, returning `None` once complete
    pub fn step(&mut self, delta: f32) -> Option<Step> {
        if self.complete {
            return None;
        }
        let first = !self.began;
        self.began = true;
        self.time += delta;
        self.complete = self.time >= self.duration;

        let mut percent = if self.complete {
            1.0
        } else {
            let linear = self.time / self.duration;
            self.easing.map_or(linear, |ease| ease(linear))
        };
        if self.reverse {
            percent = 1.0 - percent;
        }
        Some(Step {
            first,
            percent,
            last: self.complete,
        })
    }

    /// Skip to the end on the next update
    pub fn finish(&mut self) {
        self.time = self.duration;
    }

    pub fn restart(&mut self) {
        self.time = 0.0;
        self.began = false;
        self.complete = false;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration;
    }

    pub fn easing(&self) -> Option<EasingFn> {
        self.easing
    }

    pub fn set_easing(&mut self, easing: Option<EasingFn>) {
        self.easing = easing;
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Animates the alpha of the element's color
#[derive(Clone, Debug)]
pub struct AlphaAction {
    pub temporal: TemporalAction,
    start: f32,
    end: f32,
}

impl AlphaAction {
    pub fn new(alpha: f32, duration: f32) -> Self {
        Self {
            temporal: TemporalAction::new(duration),
            start: 0.0,
            end: alpha,
        }
    }

    pub fn fade_in(duration: f32) -> Self {
        Self::new(1.0, duration)
    }

    pub fn fade_out(duration: f32) -> Self {
        Self::new(0.0, duration)
    }

    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.temporal = self.temporal.with_easing(easing);
        self
    }
}

impl Action for AlphaAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool {
        let Some(step) = self.temporal.step(delta) else {
            return true;
        };
        let Some(element) = stage.element_mut(id) else {
            return true;
        };
        if step.first {
            self.start = element.color().a;
        }
        let color = element.color();
        element.set_color(Color {
            a: lerp_f32(self.start, self.end, step.percent),
            ..color
        });
        step.last
    }

    fn restart(&mut self) {
        self.temporal.restart();
    }
}

/// Moves the element to a position
#[derive(Clone, Debug)]
pub struct MoveToAction {
    pub temporal: TemporalAction,
    start: (f32, f32),
    end: (f32, f32),
}

impl MoveToAction {
    pub fn new(x: f32, y: f32, duration: f32) -> Self {
        Self {
            temporal: TemporalAction::new(duration),
            start: (0.0, 0.0),
            end: (x, y),
        }
    }

    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.temporal = self.temporal.with_easing(easing);
        self
    }
}

impl Action for MoveToAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool {
        let Some(step) = self.temporal.step(delta) else {
            return true;
        };
        let Some(element) = stage.element_mut(id) else {
            return true;
        };
        if step.first {
            self.start = (element.x(), element.y());
        }
        element.set_position(
            lerp_f32(self.start.0, self.end.0, step.percent),
            lerp_f32(self.start.1, self.end.1, step.percent),
        );
        step.last
    }

    fn restart(&mut self) {
        self.temporal.restart();
    }
}

/// Resizes the element, invalidating its layout along the way
#[derive(Clone, Debug)]
pub struct SizeToAction {
    pub temporal: TemporalAction,
    start: (f32, f32),
    end: (f32, f32),
}

impl SizeToAction {
    pub fn new(width: f32, height: f32, duration: f32) -> Self {
        Self {
            temporal: TemporalAction::new(duration),
            start: (0.0, 0.0),
            end: (width, height),
        }
    }

    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.temporal = self.temporal.with_easing(easing);
        self
    }
}

impl Action for SizeToAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool {
        let Some(step) = self.temporal.step(delta) else {
            return true;
        };
        let Some(element) = stage.element(id) else {
            return true;
        };
        if step.first {
            self.start = (element.width(), element.height());
        }
        let width = lerp_f32(self.start.0, self.end.0, step.percent);
        let height = lerp_f32(self.start.1, self.end.1, step.percent);
        stage.set_size(id, width, height).is_err() || step.last
    }

    fn restart(&mut self) {
        self.temporal.restart();
    }
}

/// Scales the element around its origin
#[derive(Clone, Debug)]
pub struct ScaleToAction {
    pub temporal: TemporalAction,
    start: (f32, f32),
    end: (f32, f32),
}

impl ScaleToAction {
    pub fn new(scale_x: f32, scale_y: f32, duration: f32) -> Self {
        Self {
            temporal: TemporalAction::new(duration),
            start: (1.0, 1.0),
            end: (scale_x, scale_y),
        }
    }

    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.temporal = self.temporal.with_easing(easing);
        self
    }
}

impl Action for ScaleToAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool {
        let Some(step) = self.temporal.step(delta) else {
            return true;
        };
        let Some(element) = stage.element_mut(id) else {
            return true;
        };
        if step.first {
            self.start = (element.scale_x(), element.scale_y());
        }
        element.set_scale(
            lerp_f32(self.start.0, self.end.0, step.percent),
            lerp_f32(self.start.1, self.end.1, step.percent),
        );
        step.last
    }

    fn restart(&mut self) {
        self.temporal.restart();
    }
}

/// Waits, then runs the wrapped action if there is one
pub struct DelayAction {
    duration: f32,
    time: f32,
    action: Option<Box<dyn Action>>,
}

impl DelayAction {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            time: 0.0,
            action: None,
        }
    }

    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }
}

impl Action for DelayAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool {
        let mut delta = delta;
        if self.time < self.duration {
            self.time += delta;
            if self.time < self.duration {
                return false;
            }
            // Hand the overshoot to the wrapped action
            delta = self.time - self.duration;
        }
        match self.action.as_mut() {
            Some(action) => action.update(stage, id, delta),
            None => true,
        }
    }

    fn restart(&mut self) {
        self.time = 0.0;
        if let Some(action) = self.action.as_mut() {
            action.restart();
        }
    }
}

/// Runs its actions one after another
#[derive(Default)]
pub struct SequenceAction {
    actions: Vec<Box<dyn Action>>,
    index: usize,
}

impl SequenceAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for SequenceAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool {
        let Some(action) = self.actions.get_mut(self.index) else {
            return true;
        };
        if action.update(stage, id, delta) {
            if !stage.contains(id) {
                return true;
            }
            self.index += 1;
        }
        self.index >= self.actions.len()
    }

    fn restart(&mut self) {
        self.index = 0;
        for action in &mut self.actions {
            action.restart();
        }
    }
}

/// Runs its actions together until every one of them is done
#[derive(Default)]
pub struct ParallelAction {
    actions: Vec<Box<dyn Action>>,
    done: Vec<bool>,
    complete: bool,
}

impl ParallelAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self.done.push(false);
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for ParallelAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, delta: f32) -> bool {
        if self.complete {
            return true;
        }
        self.complete = true;
        for (action, done) in self.actions.iter_mut().zip(self.done.iter_mut()) {
            if !*done {
                *done = action.update(stage, id, delta);
            }
            if !*done {
                self.complete = false;
            }
            if !stage.contains(id) {
                return true;
            }
        }
        self.complete
    }

    fn restart(&mut self) {
        self.complete = false;
        self.done.iter_mut().for_each(|done| *done = false);
        for action in &mut self.actions {
            action.restart();
        }
    }
}

/// Removes an element from its parent. Without a target it removes the element running it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoveElementAction {
    target: Option<ElementId>,
    removed: bool,
}

impl RemoveElementAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(target: ElementId) -> Self {
        Self {
            target: Some(target),
            removed: false,
        }
    }
}

impl Action for RemoveElementAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, _delta: f32) -> bool {
        if !self.removed {
            self.removed = true;
            let target = self.target.unwrap_or(id);
            if let Err(err) = stage.remove(target) {
                log::warn!("remove element action on {target:?} failed: {err}");
            }
        }
        true
    }

    fn restart(&mut self) {
        self.removed = false;
    }
}

/// Removes a listener from an element. Without a target it uses the element running it.
#[derive(Clone, Debug)]
pub struct RemoveListenerAction {
    listener: ListenerRef,
    capture: bool,
    target: Option<ElementId>,
}

impl RemoveListenerAction {
    pub fn new(listener: ListenerRef, capture: bool) -> Self {
        Self {
            listener,
            capture,
            target: None,
        }
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }
}

impl Action for RemoveListenerAction {
    fn update(&mut self, stage: &mut Stage, id: ElementId, _delta: f32) -> bool {
        let target = self.target.unwrap_or(id);
        let result = if self.capture {
            stage.remove_capture_listener(target, &self.listener)
        } else {
            stage.remove_listener(target, &self.listener)
        };
        if let Err(err) = result {
            log::warn!("remove listener action on {target:?} failed: {err}");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::transition::ease_in;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn element(stage: &mut Stage) -> ElementId {
        let id = stage.create_element();
        stage.add_element(stage.root(), id).unwrap();
        id
    }

    #[test]
    fn test_temporal_steps() {
        let mut t = TemporalAction::new(1.0);
        let first = t.step(0.25).unwrap();
        assert!(first.first && !first.last);
        assert!(approx(first.percent, 0.25));
        let end = t.step(1.0).unwrap();
        assert!(end.last && !end.first);
        assert_eq!(end.percent, 1.0);
        assert!(t.step(0.1).is_none());

        t.restart();
        assert!(t.step(0.0).unwrap().first);
    }

    #[test]
    fn test_temporal_reverse_and_easing() {
        let mut t = TemporalAction::new(1.0).with_reverse(true);
        assert!(approx(t.step(0.25).unwrap().percent, 0.75));

        let mut t = TemporalAction::new(1.0).with_easing(ease_in);
        assert!(approx(t.step(0.5).unwrap().percent, ease_in(0.5)));

        let mut t = TemporalAction::new(10.0);
        t.finish();
        assert!(t.step(0.0).unwrap().last);
    }

    #[test]
    fn test_alpha_action_through_stage() {
        let mut stage = Stage::new(100.0, 100.0);
        let id = element(&mut stage);
        stage.add_action(id, AlphaAction::fade_out(1.0)).unwrap();

        stage.act(0.5).unwrap();
        assert!(approx(stage.element(id).unwrap().color().a, 0.5));
        assert!(stage.has_actions(id));

        stage.act(0.5).unwrap();
        assert_eq!(stage.element(id).unwrap().color().a, 0.0);
        assert!(!stage.has_actions(id));
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let mut stage = Stage::new(100.0, 100.0);
        let id = element(&mut stage);
        let sequence = SequenceAction::new()
            .then(MoveToAction::new(10.0, 0.0, 1.0))
            .then(SizeToAction::new(4.0, 4.0, 1.0));
        stage.add_action(id, sequence).unwrap();

        stage.act(1.0).unwrap();
        assert_eq!(stage.element(id).unwrap().x(), 10.0);
        assert_eq!(stage.element(id).unwrap().width(), 0.0);

        stage.act(0.5).unwrap();
        assert!(approx(stage.element(id).unwrap().width(), 2.0));
        stage.act(0.5).unwrap();
        assert_eq!(stage.element(id).unwrap().width(), 4.0);
        assert!(!stage.has_actions(id));
    }

    #[test]
    fn test_parallel_waits_for_longest() {
        let mut stage = Stage::new(100.0, 100.0);
        let id = element(&mut stage);
        let parallel = ParallelAction::new()
            .with(ScaleToAction::new(2.0, 2.0, 0.5))
            .with(MoveToAction::new(0.0, 20.0, 1.0));
        stage.add_action(id, parallel).unwrap();

        stage.act(0.5).unwrap();
        assert_eq!(stage.element(id).unwrap().scale_x(), 2.0);
        assert!(stage.has_actions(id));
        stage.act(0.5).unwrap();
        assert_eq!(stage.element(id).unwrap().y(), 20.0);
        assert!(!stage.has_actions(id));
    }

    #[test]
    fn test_delay_then_remove() {
        let mut stage = Stage::new(100.0, 100.0);
        let id = element(&mut stage);
        stage
            .add_action(id, DelayAction::new(1.0).then(RemoveElementAction::new()))
            .unwrap();

        stage.act(0.6).unwrap();
        assert_eq!(stage.parent(id), Some(stage.root()));
        stage.act(0.6).unwrap();
        assert_eq!(stage.parent(id), None);
        assert!(stage.contains(id));
    }

    #[test]
    fn test_remove_listener_action() {
        let mut stage = Stage::new(100.0, 100.0);
        let id = element(&mut stage);
        let listener = ListenerRef::new(|_: &mut Stage, _: &mut Event| false);
        stage.add_listener(id, listener.clone()).unwrap();
        stage
            .add_action(id, RemoveListenerAction::new(listener, false))
            .unwrap();
        stage.act(0.1).unwrap();
        assert!(stage.listeners(id).is_empty());
    }
}
