//! # blueberry-ui
//!
//! Retained-mode UI toolkit core, independent of any graphics API.
//!
//! Elements live in a [`Stage`] arena and are addressed by [`ElementId`].
//! Drawing produces a backend agnostic [`DrawOutput`]; a renderer crate turns
//! it into pixels.
//!
//! ## Core Types
//!
//! - [`Stage`] - Owns the element tree, routes input and drives layout
//! - [`Element`] - Geometry, transform and visibility of one node
//! - [`Widget`] - Behavior attached to an element (layout, drawing, hit tests)
//!
//! ## Layout
//!
//! - [`Table`] / [`Cell`] - Grid layout with per cell constraints
//! - [`Container`], [`Stack`], [`HorizontalGroup`], [`VerticalGroup`]
//! - [`Value`] - Lazily computed sizes and spacing
//!
//! ## Input & Events
//!
//! - [`Event`] / [`InputEvent`] / [`FocusEvent`] - Capture then bubble dispatch
//! - [`EventListener`], [`InputListener`], [`ClickListener`]
//!
//! ## Utilities
//!
//! - [`Action`] - Timed changes attached to elements
//! - [`Pool`] - Reusable object pool
//! - [`DelayedRemovalList`] - List that can be mutated while being iterated

mod align;
mod cell;
mod color;
mod container;
mod debug;
mod delayed_removal;
mod element;
mod error;
mod event;
mod group;
mod horizontal_group;
mod input;
mod listener;
mod output;
mod pool;
mod primitives;
mod stack;
mod stage;
mod style;
mod table;
mod value;
mod vertical_group;
mod widget;
pub mod action;
pub mod transition;

// Core types
pub use color::*;
pub use element::*;
pub use error::{UiError, UiResult};
pub use output::*;
pub use primitives::*;
pub use stage::{ElementId, Stage, MAX_POINTERS};
pub use style::*;
pub use widget::*;

// Layout
pub use align::*;
pub use cell::*;
pub use container::*;
pub use debug::*;
pub use horizontal_group::HorizontalGroup;
pub use stack::*;
pub use table::*;
pub use value::*;
pub use vertical_group::*;

// Input & Events
pub use event::*;
pub use listener::*;

// Utilities
pub use action::*;
pub use delayed_removal::*;
pub use pool::*;
pub use transition::*;
