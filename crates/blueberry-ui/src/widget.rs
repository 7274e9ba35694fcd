//! Widget trait: the layout and drawing capability of an element
//!
//! A plain element has a position and a size and nothing else. Attaching a
//! [`Widget`] gives the element layout metrics, a layout pass, a per-frame
//! update and custom drawing.
//!
//! # Example
//!
//! ```ignore
//! use blueberry_ui::{ElementId, Stage, UiResult, Widget};
//!
//! struct Spacer {
//!     size: f32,
//! }
//!
//! impl Widget for Spacer {
//!     fn pref_width(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
//!         self.size
//!     }
//!
//!     fn pref_height(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
//!         self.size
//!     }
//! }
//!
//! let mut stage = Stage::new(800.0, 600.0);
//! let spacer = stage.create_widget(Spacer { size: 12.0 });
//! assert_eq!(stage.pref_width(spacer), 12.0);
//! ```
//!
//! # Note on `&mut Stage`
//!
//! The stage owns every widget. While one of the trait methods runs, the
//! stage has moved that widget out of its slot so the method can receive
//! `&mut Stage` and reach its children. During that time the element
//! behaves like a plain element: its metrics are its current size and typed
//! access to it fails.

use std::any::Any;

use crate::error::UiResult;
use crate::output::DrawOutput;
use crate::stage::{ElementId, Stage};

/// Downcasting support for boxed widgets
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Result of a widget's hit test override
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitOverride {
    /// Use the regular element or group hit test
    Inherit,
    /// Nothing is hit
    Miss,
    /// This element is hit
    Target(ElementId),
}

/// Whether the generic `Stage::add_element` may add children to a widget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildPolicy {
    Any,
    /// Children go through a dedicated setter, named here for the error message
    Dedicated(&'static str),
}

/// Layout, update and drawing behavior attached to an element.
///
/// Every method has a default, so a widget only implements what it needs.
/// Sizes of 0 for the max metrics mean "no maximum".
pub trait Widget: AsAny {
    fn pref_width(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
        0.0
    }

    fn pref_height(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
        0.0
    }

    fn min_width(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.pref_width(stage, id)
    }

    fn min_height(&mut self, stage: &mut Stage, id: ElementId) -> f32 {
        self.pref_height(stage, id)
    }

    fn max_width(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
        0.0
    }

    fn max_height(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
        0.0
    }

    /// Drop cached sizes. The stage has already flagged the element for layout.
    fn invalidate(&mut self) {}

    /// Position and size the children within the element's current bounds
    fn layout(&mut self, _stage: &mut Stage, _id: ElementId) -> UiResult<()> {
        Ok(())
    }

    /// Per-frame update, after the element's actions have run
    fn act(&mut self, _stage: &mut Stage, _id: ElementId, _delta: f32) -> UiResult<()> {
        Ok(())
    }

    /// Record the element's drawing in its local space.
    ///
    /// The default draws the children with the element's alpha applied.
    fn draw(
        &mut self,
        stage: &mut Stage,
        id: ElementId,
        out: &mut DrawOutput,
        parent_alpha: f32,
    ) -> UiResult<()> {
        let alpha = stage.element(id).map_or(1.0, |e| e.color().a) * parent_alpha;
        stage.draw_children(id, out, alpha)
    }

    /// Extra debug output, recorded after `draw` when the element has debug on
    fn draw_debug(&mut self, _stage: &mut Stage, _id: ElementId, _out: &mut DrawOutput) {}

    /// Hit test override, with the point in the element's local coordinates
    fn hit(
        &mut self,
        _stage: &mut Stage,
        _id: ElementId,
        _x: f32,
        _y: f32,
        _touchable: bool,
    ) -> HitOverride {
        HitOverride::Inherit
    }

    /// A child was removed from this element through the generic tree API
    fn child_removed(&mut self, _child: ElementId) {}

    fn child_policy(&self) -> ChildPolicy {
        ChildPolicy::Any
    }

    /// Called once, right after the widget is placed on the stage
    fn attached(&mut self, _stage: &mut Stage, _id: ElementId) -> UiResult<()> {
        Ok(())
    }
}

/// Layout metric selector used by [`Stage::metric`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    MinWidth,
    MinHeight,
    PrefWidth,
    PrefHeight,
    MaxWidth,
    MaxHeight,
}
