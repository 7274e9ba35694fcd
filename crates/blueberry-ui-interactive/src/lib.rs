//! # blueberry-ui-interactive
//!
//! Pointer-driven composite widgets for blueberry-ui.
//!
//! - [`ScrollPane`] - Flick, fling and overscroll scrolling with fading bars
//! - [`VerticalScrollPane`] - Plain scroll bars and smooth wheel scrolling
//! - [`SplitPane`] - Two children with a draggable handle between them
//! - [`ElementGestureListener`] - Tap, pan and fling detection for any element

mod gesture;
mod scroll_pane;
mod split_pane;
mod vertical_scroll_pane;

pub use gesture::*;
pub use scroll_pane::{ScrollPane, ScrollPaneConfig, ScrollPaneStyle};
pub use split_pane::*;
pub use vertical_scroll_pane::*;
