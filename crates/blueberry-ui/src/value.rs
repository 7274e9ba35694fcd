//! Lazily computed layout scalars.

use crate::stage::{ElementId, Stage};
use crate::widget::Metric;

/// A size or spacing that is computed when layout asks for it.
///
/// Most values are evaluated against a context element, normally the element
/// in the cell being laid out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Fixed(f32),
    MinWidth,
    MinHeight,
    PrefWidth,
    PrefHeight,
    MaxWidth,
    MaxHeight,
    /// A fraction of the width of `of`, or of the context when `of` is unset
    PercentWidth { percent: f32, of: Option<ElementId> },
    /// A fraction of the height of `of`, or of the context when `of` is unset
    PercentHeight { percent: f32, of: Option<ElementId> },
}

impl Default for Value {
    fn default() -> Self {
        Value::ZERO
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Fixed(value)
    }
}

impl Value {
    pub const ZERO: Value = Value::Fixed(0.0);

    pub const fn percent_width(percent: f32) -> Self {
        Value::PercentWidth { percent, of: None }
    }

    pub const fn percent_height(percent: f32) -> Self {
        Value::PercentHeight { percent, of: None }
    }

    /// Percentage of another element's width; the context is ignored
    pub const fn percent_width_of(percent: f32, of: ElementId) -> Self {
        Value::PercentWidth {
            percent,
            of: Some(of),
        }
    }

    /// Percentage of another element's height; the context is ignored
    pub const fn percent_height_of(percent: f32, of: ElementId) -> Self {
        Value::PercentHeight {
            percent,
            of: Some(of),
        }
    }

    /// Evaluate against `context`.
    ///
    /// Metric variants use the context's widget metrics, or its current size
    /// if it has no widget. Everything but `Fixed` is 0 without a context.
    pub fn get(&self, stage: &mut Stage, context: Option<ElementId>) -> f32 {
        let metric = match *self {
            Value::Fixed(value) => return value,
            Value::PercentWidth { percent, of } => {
                return of
                    .or(context)
                    .and_then(|id| stage.element(id))
                    .map_or(0.0, |e| e.width() * percent);
            }
            Value::PercentHeight { percent, of } => {
                return of
                    .or(context)
                    .and_then(|id| stage.element(id))
                    .map_or(0.0, |e| e.height() * percent);
            }
            Value::MinWidth => Metric::MinWidth,
            Value::MinHeight => Metric::MinHeight,
            Value::PrefWidth => Metric::PrefWidth,
            Value::PrefHeight => Metric::PrefHeight,
            Value::MaxWidth => Metric::MaxWidth,
            Value::MaxHeight => Metric::MaxHeight,
        };

        let Some(id) = context else {
            return 0.0;
        };
        if stage.has_widget(id) {
            return stage.metric(id, metric);
        }
        stage.element(id).map_or(0.0, |e| match metric {
            Metric::MinWidth | Metric::PrefWidth | Metric::MaxWidth => e.width(),
            Metric::MinHeight | Metric::PrefHeight | Metric::MaxHeight => e.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UiResult;
    use crate::widget::Widget;

    struct Labelish;

    impl Widget for Labelish {
        fn pref_width(&mut self, _: &mut Stage, _: ElementId) -> f32 {
            40.0
        }

        fn pref_height(&mut self, _: &mut Stage, _: ElementId) -> f32 {
            10.0
        }

        fn min_width(&mut self, _: &mut Stage, _: ElementId) -> f32 {
            15.0
        }

        fn layout(&mut self, _: &mut Stage, _: ElementId) -> UiResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fixed_without_context() {
        let mut stage = Stage::new(10.0, 10.0);
        assert_eq!(Value::Fixed(3.5).get(&mut stage, None), 3.5);
        assert_eq!(Value::from(2.0).get(&mut stage, None), 2.0);
        assert_eq!(Value::ZERO.get(&mut stage, None), 0.0);
    }

    #[test]
    fn test_context_dependent_without_context() {
        let mut stage = Stage::new(10.0, 10.0);
        for value in [
            Value::MinWidth,
            Value::PrefHeight,
            Value::MaxWidth,
            Value::percent_width(0.5),
        ] {
            assert_eq!(value.get(&mut stage, None), 0.0);
        }
    }

    #[test]
    fn test_percent_laws() {
        let mut stage = Stage::new(10.0, 10.0);
        let e = stage.create_element();
        stage.set_size(e, 80.0, 30.0).unwrap();
        for p in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(Value::percent_width(p).get(&mut stage, Some(e)), 80.0 * p);
            assert_eq!(Value::percent_height(p).get(&mut stage, Some(e)), 30.0 * p);
        }

        // The delegate wins over the context, and tracks live geometry
        let other = stage.create_element();
        stage.set_size(other, 200.0, 0.0).unwrap();
        let half = Value::percent_width_of(0.5, other);
        assert_eq!(half.get(&mut stage, Some(e)), 100.0);
        stage.set_size(other, 50.0, 0.0).unwrap();
        assert_eq!(half.get(&mut stage, None), 25.0);
    }

    #[test]
    fn test_metrics() {
        let mut stage = Stage::new(10.0, 10.0);
        let plain = stage.create_element();
        stage.set_size(plain, 7.0, 9.0).unwrap();
        assert_eq!(Value::PrefWidth.get(&mut stage, Some(plain)), 7.0);
        assert_eq!(Value::MaxHeight.get(&mut stage, Some(plain)), 9.0);

        let widget = stage.create_widget(Labelish);
        assert_eq!(Value::PrefWidth.get(&mut stage, Some(widget)), 40.0);
        assert_eq!(Value::MinWidth.get(&mut stage, Some(widget)), 15.0);
        assert_eq!(Value::MinHeight.get(&mut stage, Some(widget)), 10.0);
        assert_eq!(Value::MaxWidth.get(&mut stage, Some(widget)), 0.0);
    }
}
