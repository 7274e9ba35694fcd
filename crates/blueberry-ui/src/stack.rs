//! Stack: every child is sized to fill the group, drawn on top of each other.

use crate::element::Touchable;
use crate::error::UiResult;
use crate::stage::{ElementId, Stage};
use crate::widget::Widget;

/// Initial size of a stack before any layout sizes it
const INITIAL_SIZE: f32 = 150.0;

#[derive(Debug)]
pub struct Stack {
    size_invalid: bool,
    pref_width: f32,
    pref_height: f32,
    min_width: f32,
    min_height: f32,
    max_width: f32,
    max_height: f32,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self {
            size_invalid: true,
            pref_width: 0.0,
            pref_height: 0.0,
            min_width: 0.0,
            min_height: 0.0,
            max_width: 0.0,
            max_height: 0.0,
        }
    }

    fn ensure_size(&mut self, stage: &mut Stage, id: ElementId) {
        if !self.size_invalid {
            return;
        }
        self.size_invalid = false;
        self.pref_width = 0.0;
        self.pref_height = 0.0;
        self.min_width = 0.0;
        self.min_height = 0.0;
        self.max_width = 0.0;
        self.max_height = 0.0;

        for child in stage.children(id).to_vec() {
            self.pref_width = self.pref_width.max(stage.pref_width(child));
            self.pref_height = self.pref_height.max(stage.pref_height(child));
            self.min_width = self.min_width.max(stage.min_width(child));
            self.min_height = self.min_height.max(stage.min_height(child));

            // Max is the tightest of the children that have one
            let max_width = stage.max_width(child);
            if max_width > 0.0 {
                self.max_width = if self.max_width == 0.0 {
                    max_width
                } else {
                    self.max_width.min(max_width)
                };
            }
            let max_height = stage.max_height(child);
            if max_height > 0.0 {
                self.max_height = if self.max_height == 0.0 {
                    max_height
                } else {
                    self.max_height.min(max_height)
                };
            }
        }
    }
}

impl Widget for Stack {
    fn attached(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        if let Some(element) = stage.element_mut(id) {
            element.set_touchable(Touchable::ChildrenOnly);
        }
        stage.set_size(id, INITIAL_SIZE, INITIAL_SIZE)
    }

    fn invalidate(&mut self) {
        self.size_invalid = true;
    }

    fn pref_width(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.ensure_size(stage, id);
        self.pref_width
    }

    fn pref_height(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.ensure_size(stage, id);
        self.pref_height
    }

    fn min_width(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.ensure_size(stage, id);
        self.min_width
    }

    fn min_height(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.ensure_size(stage, id);
        self.min_height
    }

    fn max_width(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.ensure_size(stage, id);
        self.max_width
    }

    fn max_height(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.ensure_size(stage, id);
        self.max_height
    }

    fn layout(&mut self, stage: &mut Stage, id: ElementId) -> UiResult<()> {
        self.ensure_size(stage, id);
        let (width, height) = stage
            .element(id)
            .map_or((0.0, 0.0), |e| (e.width(), e.height()));
        for child in stage.children(id).to_vec() {
            stage.set_bounds(child, 0.0, 0.0, width, height)?;
            stage.validate(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;

    #[test]
    fn test_metrics_over_children() {
        let mut stage = Stage::new(300.0, 300.0);
        let stack = stage.create_widget(Stack::new());
        assert_eq!(stage.element(stack).unwrap().width(), 150.0);

        let small = stage.create_element();
        stage.set_size(small, 10.0, 60.0).unwrap();
        let wide = stage.create_element();
        stage.set_size(wide, 80.0, 5.0).unwrap();
        stage.add_element(stack, small).unwrap();
        stage.add_element(stack, wide).unwrap();

        assert_eq!(stage.pref_width(stack), 80.0);
        assert_eq!(stage.pref_height(stack), 60.0);
        assert_eq!(stage.min_width(stack), 80.0);
        // Plain children have no max
        assert_eq!(stage.max_width(stack), 0.0);

        let mut capped = Container::new();
        capped.max_size(50.0, 40.0);
        let capped = stage.create_widget(capped);
        stage.add_element(stack, capped).unwrap();
        assert_eq!(stage.max_width(stack), 50.0);
        assert_eq!(stage.max_height(stack), 40.0);
    }

    #[test]
    fn test_children_fill_the_stack() {
        let mut stage = Stage::new(300.0, 300.0);
        let stack = stage.create_widget(Stack::new());
        let a = stage.create_element();
        let b = stage.create_group();
        stage.add_element(stack, a).unwrap();
        stage.add_element(stack, b).unwrap();
        stage.set_size(stack, 70.0, 30.0).unwrap();
        stage.validate(stack).unwrap();
        for child in [a, b] {
            let bounds = stage.element(child).unwrap().bounds();
            assert_eq!((bounds.x(), bounds.y(), bounds.width(), bounds.height()), (0.0, 0.0, 70.0, 30.0));
        }
    }
}
