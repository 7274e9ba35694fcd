//! Tap, pan and fling detection for a single pointer.
//!
//! [`GestureDetector`] works on stage coordinates and the stage clock and
//! knows nothing about elements. [`ElementGestureListener`] feeds it the
//! touch events of an element and reports gestures to a [`GestureHandler`]
//! in the element's local coordinates.

use blueberry_ui::{ElementId, Event, EventListener, InputKind, Point, Stage};
use blueberry_ui_macros::WithBuilders;

/// Number of drag samples averaged for the fling velocity
const VELOCITY_SAMPLES: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, WithBuilders)]
pub struct GestureConfig {
    /// Half the side of the square a touch may wander in and still be a tap
    pub half_tap_square_size: f32,
    /// Seconds between taps that still count as consecutive
    pub tap_count_interval: f32,
    /// A touch up is a fling only if the last drag was at most this many seconds before it
    pub max_fling_delay: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            half_tap_square_size: 20.0,
            tap_count_interval: 0.4,
            max_fling_delay: 0.15,
        }
    }
}

/// A gesture recognized by [`GestureDetector`], in stage coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Tap {
        x: f32,
        y: f32,
        count: u32,
        button: i32,
    },
    Pan {
        x: f32,
        y: f32,
        delta_x: f32,
        delta_y: f32,
    },
    /// Velocity in pixels per second
    Fling {
        velocity_x: f32,
        velocity_y: f32,
        button: i32,
    },
}

/// Averages the last few drag steps into a velocity
#[derive(Clone, Debug)]
struct VelocityTracker {
    last_x: f32,
    last_y: f32,
    delta_x: f32,
    delta_y: f32,
    last_time: f32,
    /// (dx, dy, dt) ring buffer
    samples: [(f32, f32, f32); VELOCITY_SAMPLES],
    sample_count: usize,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self {
            last_x: 0.0,
            last_y: 0.0,
            delta_x: 0.0,
            delta_y: 0.0,
            last_time: f32::NEG_INFINITY,
            samples: [(0.0, 0.0, 0.0); VELOCITY_SAMPLES],
            sample_count: 0,
        }
    }
}

impl VelocityTracker {
    fn start(&mut self, x: f32, y: f32, time: f32) {
        *self = Self {
            last_x: x,
            last_y: y,
            last_time: time,
            ..Self::default()
        };
    }

    fn update(&mut self, x: f32, y: f32, time: f32) {
        self.delta_x = x - self.last_x;
        self.delta_y = y - self.last_y;
        self.last_x = x;
        self.last_y = y;
        let delta_time = time - self.last_time;
        self.last_time = time;
        self.samples[self.sample_count % VELOCITY_SAMPLES] = (self.delta_x, self.delta_y, delta_time);
        self.sample_count += 1;
    }

    fn velocity(&self) -> (f32, f32) {
        let count = self.sample_count.min(VELOCITY_SAMPLES);
        if count == 0 {
            return (0.0, 0.0);
        }
        let (dx, dy, dt) = self.samples[..count]
            .iter()
            .fold((0.0f32, 0.0f32, 0.0f32), |(sx, sy, st), &(x, y, t)| {
                (sx + x, sy + y, st + t)
            });
        // The sums share the sample count, so the means cancel out
        if dt == 0.0 {
            return (0.0, 0.0);
        }
        (dx / dt, dy / dt)
    }
}

#[derive(Clone, Copy, Debug)]
struct LastTap {
    x: f32,
    y: f32,
    button: i32,
    pointer: i32,
    time: f32,
}

/// Turns touch down, drag and up into taps, pans and flings.
///
/// Only pointer 0 is tracked.
#[derive(Clone, Debug, Default)]
pub struct GestureDetector {
    config: GestureConfig,
    in_tap_square: bool,
    tap_square_center: (f32, f32),
    tap_count: u32,
    last_tap: Option<LastTap>,
    panning: bool,
    /// Set by `cancel`; the rest of the current touch is ignored
    suppressed: bool,
    tracker: VelocityTracker,
}

impl GestureDetector {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    pub fn set_tap_square_size(&mut self, half_size: f32) {
        self.config.half_tap_square_size = half_size;
    }

    /// Start tracking a touch. Returns false for pointers other than 0.
    pub fn touch_down(&mut self, x: f32, y: f32, pointer: i32, _button: i32, time: f32) -> bool {
        if pointer != 0 {
            return false;
        }
        self.tracker.start(x, y, time);
        self.in_tap_square = true;
        self.suppressed = false;
        self.tap_square_center = (x, y);
        true
    }

    /// Returns a pan once the pointer has left the tap square
    pub fn touch_dragged(&mut self, x: f32, y: f32, pointer: i32, time: f32) -> Option<Gesture> {
        if pointer != 0 || self.suppressed {
            return None;
        }
        self.tracker.update(x, y, time);

        let (center_x, center_y) = self.tap_square_center;
        if self.in_tap_square && !self.within_tap_square(x, y, center_x, center_y) {
            self.in_tap_square = false;
        }
        if self.in_tap_square {
            return None;
        }
        self.panning = true;
        Some(Gesture::Pan {
            x,
            y,
            delta_x: self.tracker.delta_x,
            delta_y: self.tracker.delta_y,
        })
    }

    /// Returns a tap if the touch stayed in the tap square, otherwise a fling
    /// if the pointer was still moving when it went up.
    pub fn touch_up(
        &mut self,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
        time: f32,
    ) -> Option<Gesture> {
        if pointer != 0 {
            return None;
        }
        let (center_x, center_y) = self.tap_square_center;
        if self.in_tap_square && !self.within_tap_square(x, y, center_x, center_y) {
            self.in_tap_square = false;
        }
        self.panning = false;
        if self.suppressed {
            return None;
        }

        if self.in_tap_square {
            let consecutive = self.last_tap.is_some_and(|last| {
                last.button == button
                    && last.pointer == pointer
                    && time - last.time <= self.config.tap_count_interval
                    && self.within_tap_square(x, y, last.x, last.y)
            });
            if !consecutive {
                self.tap_count = 0;
            }
            self.tap_count += 1;
            self.last_tap = Some(LastTap {
                x,
                y,
                button,
                pointer,
                time,
            });
            return Some(Gesture::Tap {
                x,
                y,
                count: self.tap_count,
                button,
            });
        }

        if time - self.tracker.last_time < self.config.max_fling_delay {
            self.tracker.update(x, y, time);
            let (velocity_x, velocity_y) = self.tracker.velocity();
            return Some(Gesture::Fling {
                velocity_x,
                velocity_y,
                button,
            });
        }
        None
    }

    /// Ignore the rest of the current touch
    pub fn cancel(&mut self) {
        self.suppressed = true;
    }

    /// Forget the current touch, as when touch focus is taken away
    pub fn reset(&mut self) {
        self.panning = false;
        self.in_tap_square = false;
        self.tracker.last_time = f32::NEG_INFINITY;
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    /// The current touch can no longer become a tap
    pub fn invalidate_tap_square(&mut self) {
        self.in_tap_square = false;
    }

    pub fn tap_count(&self) -> u32 {
        self.tap_count
    }

    fn within_tap_square(&self, x: f32, y: f32, center_x: f32, center_y: f32) -> bool {
        let half = self.config.half_tap_square_size;
        (x - center_x).abs() < half && (y - center_y).abs() < half
    }
}

/// Gesture callbacks, with positions and amounts in the listener element's space
#[allow(unused_variables)]
pub trait GestureHandler {
    fn touch_down(
        &mut self,
        stage: &mut Stage,
        event: &mut Event,
        x: f32,
        y: f32,
        pointer: i32,
        button: i32,
    ) {
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
    }

    fn tap(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32, count: u32, button: i32) {}

    fn pan(&mut self, stage: &mut Stage, event: &mut Event, x: f32, y: f32, delta_x: f32, delta_y: f32) {}

    fn fling(&mut self, stage: &mut Stage, event: &mut Event, velocity_x: f32, velocity_y: f32, button: i32) {}

    /// Touch focus was taken away in the middle of a gesture
    fn cancelled(&mut self, stage: &mut Stage, event: &mut Event) {}
}

/// Event listener that detects gestures on the element it is registered on.
///
/// It handles every touch down, so it becomes touch focus and receives the
/// drags and the touch up of the touch.
pub struct ElementGestureListener<H> {
    detector: GestureDetector,
    handler: H,
}

impl<H: GestureHandler> ElementGestureListener<H> {
    pub fn new(handler: H) -> Self {
        Self::with_config(GestureConfig::default(), handler)
    }

    pub fn with_config(config: GestureConfig, handler: H) -> Self {
        Self {
            detector: GestureDetector::new(config),
            handler,
        }
    }

    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut GestureDetector {
        &mut self.detector
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    fn report(&mut self, stage: &mut Stage, event: &mut Event, element: ElementId, gesture: Gesture) {
        match gesture {
            Gesture::Tap { x, y, count, button } => {
                let local = stage.stage_to_local(element, Point::new(x, y));
                self.handler.tap(stage, event, local.x, local.y, count, button);
            }
            Gesture::Pan {
                x,
                y,
                delta_x,
                delta_y,
            } => {
                let (delta_x, delta_y) = local_amount(stage, element, delta_x, delta_y);
                let local = stage.stage_to_local(element, Point::new(x, y));
                self.handler.pan(stage, event, local.x, local.y, delta_x, delta_y);
            }
            Gesture::Fling {
                velocity_x,
                velocity_y,
                button,
            } => {
                let (velocity_x, velocity_y) = local_amount(stage, element, velocity_x, velocity_y);
                self.handler.fling(stage, event, velocity_x, velocity_y, button);
            }
        }
    }
}

impl<H: GestureHandler> EventListener for ElementGestureListener<H> {
    fn handle(&mut self, stage: &mut Stage, event: &mut Event) -> bool {
        let Some(input) = event.as_input().copied() else {
            return false;
        };
        let Some(element) = event.listener_element() else {
            return false;
        };
        let (x, y) = (input.stage_x, input.stage_y);

        match input.kind {
            InputKind::TouchDown => {
                self.detector
                    .touch_down(x, y, input.pointer, input.button, input.time);
                let local = stage.stage_to_local(element, input.stage_position());
                self.handler
                    .touch_down(stage, event, local.x, local.y, input.pointer, input.button);
                true
            }
            InputKind::TouchUp => {
                if input.is_touch_focus_cancel() {
                    self.detector.reset();
                    self.handler.cancelled(stage, event);
                    return false;
                }
                if let Some(gesture) =
                    self.detector
                        .touch_up(x, y, input.pointer, input.button, input.time)
                {
                    self.report(stage, event, element, gesture);
                }
                let local = stage.stage_to_local(element, input.stage_position());
                self.handler
                    .touch_up(stage, event, local.x, local.y, input.pointer, input.button);
                true
            }
            InputKind::TouchDragged => {
                if let Some(gesture) = self.detector.touch_dragged(x, y, input.pointer, input.time) {
                    self.report(stage, event, element, gesture);
                }
                true
            }
            _ => false,
        }
    }
}

/// A stage-space offset expressed in the element's space
fn local_amount(stage: &Stage, element: ElementId, x: f32, y: f32) -> (f32, f32) {
    let amount = stage.stage_to_local(element, Point::new(x, y));
    let origin = stage.stage_to_local(element, Point::zero());
    (amount.x - origin.x, amount.y - origin.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueberry_ui::ListenerRef;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.5
    }

    #[test]
    fn test_tap_inside_square() {
        let mut detector = GestureDetector::default();
        assert!(detector.touch_down(10.0, 10.0, 0, 0, 0.0));
        assert_eq!(detector.touch_dragged(15.0, 12.0, 0, 0.05), None);
        assert_eq!(
            detector.touch_up(15.0, 12.0, 0, 0, 0.1),
            Some(Gesture::Tap {
                x: 15.0,
                y: 12.0,
                count: 1,
                button: 0
            })
        );

        // A second tap soon after counts up, a late one starts over
        detector.touch_down(14.0, 12.0, 0, 0, 0.2);
        assert!(matches!(
            detector.touch_up(14.0, 12.0, 0, 0, 0.25),
            Some(Gesture::Tap { count: 2, .. })
        ));
        detector.touch_down(14.0, 12.0, 0, 0, 2.0);
        assert!(matches!(
            detector.touch_up(14.0, 12.0, 0, 0, 2.05),
            Some(Gesture::Tap { count: 1, .. })
        ));
    }

    #[test]
    fn test_pan_then_fling() {
        let mut detector = GestureDetector::default();
        detector.touch_down(0.0, 0.0, 0, 0, 0.0);
        assert_eq!(
            detector.touch_dragged(0.0, 30.0, 0, 0.01),
            Some(Gesture::Pan {
                x: 0.0,
                y: 30.0,
                delta_x: 0.0,
                delta_y: 30.0
            })
        );
        assert!(detector.is_panning());
        detector.touch_dragged(0.0, 60.0, 0, 0.02);

        let Some(Gesture::Fling { velocity_y, .. }) = detector.touch_up(0.0, 90.0, 0, 0, 0.03) else {
            panic!("expected a fling");
        };
        assert!(approx(velocity_y, 3000.0));
        assert!(!detector.is_panning());
    }

    #[test]
    fn test_no_fling_after_pause() {
        let mut detector = GestureDetector::default();
        detector.touch_down(0.0, 0.0, 0, 0, 0.0);
        detector.touch_dragged(0.0, 40.0, 0, 0.1);
        assert_eq!(detector.touch_up(0.0, 40.0, 0, 0, 1.0), None);
    }

    #[test]
    fn test_cancel_suppresses_rest_of_touch() {
        let mut detector = GestureDetector::default();
        detector.touch_down(0.0, 0.0, 0, 0, 0.0);
        detector.cancel();
        assert_eq!(detector.touch_dragged(0.0, 50.0, 0, 0.01), None);
        assert_eq!(detector.touch_up(0.0, 50.0, 0, 0, 0.02), None);

        // The next touch works again
        detector.touch_down(0.0, 0.0, 0, 0, 1.0);
        assert!(detector.touch_up(0.0, 0.0, 0, 0, 1.05).is_some());
    }

    #[test]
    fn test_second_pointer_ignored() {
        let mut detector = GestureDetector::default();
        assert!(!detector.touch_down(0.0, 0.0, 1, 0, 0.0));
        assert_eq!(detector.touch_dragged(0.0, 50.0, 1, 0.01), None);
    }

    #[derive(Default)]
    struct Recorder {
        pans: Vec<(f32, f32, f32, f32)>,
        taps: Vec<(f32, f32, u32)>,
        cancelled: bool,
    }

    impl GestureHandler for Recorder {
        fn tap(&mut self, _: &mut Stage, _: &mut Event, x: f32, y: f32, count: u32, _: i32) {
            self.taps.push((x, y, count));
        }

        fn pan(&mut self, _: &mut Stage, _: &mut Event, x: f32, y: f32, dx: f32, dy: f32) {
            self.pans.push((x, y, dx, dy));
        }

        fn cancelled(&mut self, _: &mut Stage, _: &mut Event) {
            self.cancelled = true;
        }
    }

    fn listener_stage() -> (Stage, ElementId, Rc<RefCell<ElementGestureListener<Recorder>>>) {
        let mut stage = Stage::new(200.0, 200.0);
        let e = stage.create_element();
        stage.set_bounds(e, 50.0, 40.0, 100.0, 100.0).unwrap();
        stage.add_element(stage.root(), e).unwrap();
        let (listener, handle) = ListenerRef::shared(ElementGestureListener::new(Recorder::default()));
        stage.add_listener(e, handle).unwrap();
        (stage, e, listener)
    }

    #[test]
    fn test_listener_reports_local_coordinates() {
        let (mut stage, _, listener) = listener_stage();

        assert!(stage.touch_down(60.0, 50.0, 0, 0).unwrap());
        stage.touch_up(61.0, 50.0, 0, 0).unwrap();
        assert_eq!(listener.borrow().handler().taps, [(11.0, 10.0, 1)]);

        stage.touch_down(60.0, 50.0, 0, 0).unwrap();
        stage.touch_dragged(60.0, 90.0, 0).unwrap();
        assert_eq!(listener.borrow().handler().pans, [(10.0, 50.0, 0.0, 40.0)]);
        stage.touch_up(60.0, 90.0, 0, 0).unwrap();
        assert!(!listener.borrow().detector().is_panning());
    }

    #[test]
    fn test_focus_cancel_resets_detector() {
        let (mut stage, e, listener) = listener_stage();
        stage.touch_down(60.0, 50.0, 0, 0).unwrap();
        stage.touch_dragged(60.0, 90.0, 0).unwrap();
        assert!(listener.borrow().detector().is_panning());

        stage.cancel_touch_focus(e);
        let listener = listener.borrow();
        assert!(listener.handler().cancelled);
        assert!(!listener.detector().is_panning());
    }
}
