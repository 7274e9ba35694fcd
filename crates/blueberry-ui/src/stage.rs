//! The stage: owner of every element, and the root of the scene graph.
//!
//! Elements live in a generational arena. An [`ElementId`] is a copyable,
//! non-owning handle; once an element is destroyed its id goes stale and
//! every lookup through it fails instead of reaching a recycled slot.
//!
//! The stage also drives the frame: [`Stage::act`] advances the clock and
//! runs actions and widget updates, [`Stage::draw`] validates layout and
//! records draw commands. Input entry points live in the `input` module.

use glam::{Affine2, Vec2};

use crate::action::Action;
use crate::color::debug_colors;
use crate::delayed_removal::DelayedRemovalList;
use crate::element::Element;
use crate::error::{UiError, UiResult};
use crate::listener::ListenerRef;
use crate::output::DrawOutput;
use crate::primitives::{Point, Rect};
use crate::widget::{Metric, Widget};

/// Number of touch pointers tracked for enter and exit events
pub const MAX_POINTERS: usize = 20;

/// Handle to an element owned by a [`Stage`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    index: u32,
    generation: u32,
}

impl ElementId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

pub(crate) struct Node {
    pub(crate) element: Element,
    pub(crate) is_group: bool,
    pub(crate) children: Vec<ElementId>,
    /// Whether a widget is attached, also while it is moved out for a call
    pub(crate) has_widget: bool,
    pub(crate) widget: Option<Box<dyn Widget>>,
    /// Invalidated while the widget was moved out; replayed on restore
    pub(crate) pending_invalidate: bool,
    /// Children removed while the widget was moved out; replayed on restore
    pub(crate) pending_removed: Vec<ElementId>,
    pub(crate) listeners: DelayedRemovalList<ListenerRef>,
    pub(crate) capture_listeners: DelayedRemovalList<ListenerRef>,
    pub(crate) actions: Vec<Box<dyn Action>>,
    pub(crate) culling_area: Option<Rect>,
}

impl Node {
    fn new(is_group: bool) -> Self {
        Self {
            element: Element::new(),
            is_group,
            children: Vec::new(),
            has_widget: false,
            widget: None,
            pending_invalidate: false,
            pending_removed: Vec::new(),
            listeners: DelayedRemovalList::new(),
            capture_listeners: DelayedRemovalList::new(),
            actions: Vec::new(),
            culling_area: None,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PointerState {
    pub(crate) over: Option<ElementId>,
    pub(crate) touched: bool,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// A listener that handled a touch down and receives the rest of that touch
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TouchFocus {
    pub(crate) listener: ListenerRef,
    pub(crate) listener_element: ElementId,
    pub(crate) target: ElementId,
    pub(crate) pointer: i32,
    pub(crate) button: i32,
}

pub struct Stage {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ElementId,
    width: f32,
    height: f32,
    time: f32,
    debug: bool,

    pub(crate) keyboard_focus: Option<ElementId>,
    pub(crate) scroll_focus: Option<ElementId>,
    pub(crate) mouse_over: Option<ElementId>,
    pub(crate) mouse_x: f32,
    pub(crate) mouse_y: f32,
    pub(crate) pointers: [PointerState; MAX_POINTERS],
    pub(crate) touch_focuses: Vec<TouchFocus>,
}

impl Stage {
    /// Create a stage whose root group covers a `width` x `height` viewport
    pub fn new(width: f32, height: f32) -> Self {
        let mut stage = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: ElementId {
                index: 0,
                generation: 0,
            },
            width,
            height,
            time: 0.0,
            debug: false,
            keyboard_focus: None,
            scroll_focus: None,
            mouse_over: None,
            mouse_x: 0.0,
            mouse_y: 0.0,
            pointers: [PointerState::default(); MAX_POINTERS],
            touch_focuses: Vec::new(),
        };
        stage.root = stage.insert(Node::new(true));
        if let Some(root) = stage.element_mut(stage.root) {
            root.width = width;
            root.height = height;
            root.needs_layout = false;
        }
        stage
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Resize the viewport. Elements that fill their parent follow on the next validation.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        let root = self.root;
        self.set_size_internal(root, width, height);
        self.invalidate_subtree(root);
    }

    /// Seconds accumulated by [`act`](Self::act)
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Turn debug output on or off for the root group
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        let root = self.root;
        if let Some(element) = self.element_mut(root) {
            element.debug = debug;
        }
    }

    // Arena

    fn insert(&mut self, node: Node) -> ElementId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            ElementId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ElementId {
                index,
                generation: 0,
            }
        }
    }

    /// Create a leaf element, not yet part of the tree
    pub fn create_element(&mut self) -> ElementId {
        let id = self.insert(Node::new(false));
        log::debug!("created element {id:?}");
        id
    }

    /// Create a group without layout behavior
    pub fn create_group(&mut self) -> ElementId {
        let id = self.insert(Node::new(true));
        log::debug!("created group {id:?}");
        id
    }

    /// Create a group driven by `widget`, and let the widget set itself up
    pub fn create_widget<W: Widget + 'static>(&mut self, widget: W) -> ElementId {
        let mut node = Node::new(true);
        node.has_widget = true;
        let id = self.insert(node);
        log::debug!("created {} {id:?}", std::any::type_name::<W>());

        let mut widget: Box<dyn Widget> = Box::new(widget);
        if let Err(err) = widget.attached(self, id) {
            log::warn!("widget setup for {id:?} failed: {err}");
        }
        self.restore_widget(id, widget);
        id
    }

    /// Remove an element from the tree and free it together with its descendants
    pub fn destroy(&mut self, id: ElementId) -> UiResult<()> {
        if id == self.root {
            return Err(UiError::InvalidArgument("the root cannot be destroyed"));
        }
        self.node(id)?;
        if let Some(parent) = self.parent(id) {
            self.remove_element(parent, id)?;
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
        }

        self.forget_stale();
        log::debug!("destroyed {id:?}");
        Ok(())
    }

    /// Drop focus and hover state that refers to freed elements
    fn forget_stale(&mut self) {
        let live = |stage: &Stage, id: Option<ElementId>| id.filter(|id| stage.contains(*id));
        self.keyboard_focus = live(self, self.keyboard_focus);
        self.scroll_focus = live(self, self.scroll_focus);
        self.mouse_over = live(self, self.mouse_over);
        for i in 0..MAX_POINTERS {
            self.pointers[i].over = live(self, self.pointers[i].over);
        }
        let focuses = std::mem::take(&mut self.touch_focuses);
        self.touch_focuses = focuses
            .into_iter()
            .filter(|focus| self.contains(focus.listener_element) && self.contains(focus.target))
            .collect();
    }

    /// Whether the id refers to a live element of this stage
    pub fn contains(&self, id: ElementId) -> bool {
        self.try_node(id).is_some()
    }

    /// Number of live elements, the root included
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn try_node(&self, id: ElementId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn try_node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn node(&self, id: ElementId) -> UiResult<&Node> {
        self.try_node(id).ok_or(UiError::UnknownElement(id))
    }

    pub(crate) fn node_mut(&mut self, id: ElementId) -> UiResult<&mut Node> {
        self.try_node_mut(id).ok_or(UiError::UnknownElement(id))
    }

    pub(crate) fn listener_list_mut(
        &mut self,
        id: ElementId,
        capture: bool,
    ) -> UiResult<&mut DelayedRemovalList<ListenerRef>> {
        let node = self.node_mut(id)?;
        Ok(if capture {
            &mut node.capture_listeners
        } else {
            &mut node.listeners
        })
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.try_node(id).map(|node| &node.element)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.try_node_mut(id).map(|node| &mut node.element)
    }

    pub fn is_group(&self, id: ElementId) -> bool {
        self.try_node(id).is_some_and(|node| node.is_group)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).and_then(|element| element.parent)
    }

    // Widgets

    pub fn has_widget(&self, id: ElementId) -> bool {
        self.try_node(id).is_some_and(|node| node.has_widget)
    }

    pub(crate) fn take_widget(&mut self, id: ElementId) -> Option<Box<dyn Widget>> {
        self.try_node_mut(id).and_then(|node| node.widget.take())
    }

    /// Put a widget back into its slot, dropping it if the element is gone.
    ///
    /// Removals and invalidations that happened while it was out are replayed.
    /// A removed child that was added back in the meantime is not reported.
    pub(crate) fn restore_widget(&mut self, id: ElementId, mut widget: Box<dyn Widget>) {
        let Some(node) = self.try_node_mut(id) else {
            log::debug!("dropping widget of {id:?}, its element is gone");
            return;
        };
        if node.widget.is_some() {
            log::warn!("widget slot of {id:?} was refilled while its widget was out");
            return;
        }
        let removed = std::mem::take(&mut node.pending_removed);
        let invalidated = std::mem::take(&mut node.pending_invalidate);
        for child in removed {
            if self.parent(child) != Some(id) {
                widget.child_removed(child);
            }
        }
        if invalidated {
            widget.invalidate();
        }
        if let Some(node) = self.try_node_mut(id) {
            node.widget = Some(widget);
        }
    }

    pub fn widget<W: Widget + 'static>(&self, id: ElementId) -> Option<&W> {
        self.try_node(id)?
            .widget
            .as_deref()?
            .as_any()
            .downcast_ref::<W>()
    }

    pub fn widget_mut<W: Widget + 'static>(&mut self, id: ElementId) -> Option<&mut W> {
        self.try_node_mut(id)?
            .widget
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<W>()
    }

    /// Run `f` with the typed widget and the stage.
    ///
    /// Fails if the element is gone, holds another widget type, or its widget
    /// is already in use further up the call stack.
    pub fn with_widget<W, R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut W, &mut Stage) -> R,
    ) -> UiResult<R>
    where
        W: Widget + 'static,
    {
        let mismatch = UiError::WidgetMismatch {
            id,
            expected: std::any::type_name::<W>(),
        };
        let mut widget = self.node_mut(id)?.widget.take().ok_or(mismatch.clone())?;
        let result = match (*widget).as_any_mut().downcast_mut::<W>() {
            Some(typed) => Ok(f(typed, self)),
            None => Err(mismatch),
        };
        self.restore_widget(id, widget);
        result
    }

    // Layout protocol

    /// Query a layout metric.
    ///
    /// Plain elements report their current size as min and pref, and 0 (unbounded) as max.
    pub fn metric(&mut self, id: ElementId, metric: Metric) -> f32 {
        let Some(node) = self.try_node_mut(id) else {
            return 0.0;
        };
        let Some(mut widget) = node.widget.take() else {
            let element = &node.element;
            return match metric {
                Metric::MinWidth | Metric::PrefWidth => element.width,
                Metric::MinHeight | Metric::PrefHeight => element.height,
                Metric::MaxWidth | Metric::MaxHeight => 0.0,
            };
        };
        let value = match metric {
            Metric::MinWidth => widget.min_width(self, id),
            Metric::MinHeight => widget.min_height(self, id),
            Metric::PrefWidth => widget.pref_width(self, id),
            Metric::PrefHeight => widget.pref_height(self, id),
            Metric::MaxWidth => widget.max_width(self, id),
            Metric::MaxHeight => widget.max_height(self, id),
        };
        self.restore_widget(id, widget);
        value
    }

    pub fn min_width(&mut self, id: ElementId) -> f32 {
        self.metric(id, Metric::MinWidth)
    }

    pub fn min_height(&mut self, id: ElementId) -> f32 {
        self.metric(id, Metric::MinHeight)
    }

    pub fn pref_width(&mut self, id: ElementId) -> f32 {
        self.metric(id, Metric::PrefWidth)
    }

    pub fn pref_height(&mut self, id: ElementId) -> f32 {
        self.metric(id, Metric::PrefHeight)
    }

    pub fn max_width(&mut self, id: ElementId) -> f32 {
        self.metric(id, Metric::MaxWidth)
    }

    pub fn max_height(&mut self, id: ElementId) -> f32 {
        self.metric(id, Metric::MaxHeight)
    }

    /// Flag the element for layout and drop its widget's cached sizes
    pub fn invalidate(&mut self, id: ElementId) {
        if let Some(node) = self.try_node_mut(id) {
            node.element.needs_layout = true;
            match node.widget.as_mut() {
                Some(widget) => widget.invalidate(),
                None if node.has_widget => node.pending_invalidate = true,
                None => {}
            }
        }
    }

    /// Invalidate the element and every ancestor
    pub fn invalidate_hierarchy(&mut self, id: ElementId) {
        let mut current = Some(id);
        while let Some(id) = current {
            self.invalidate(id);
            current = self.parent(id);
        }
    }

    fn invalidate_subtree(&mut self, id: ElementId) {
        self.invalidate(id);
        let children = self.children(id).to_vec();
        for child in children {
            self.invalidate_subtree(child);
        }
    }

    /// Make sure the element is laid out.
    ///
    /// Elements that fill their parent are sized to it first (to the viewport
    /// when the parent is the root). Layout only runs if the element was
    /// invalidated since its last layout.
    pub fn validate(&mut self, id: ElementId) -> UiResult<()> {
        let node = self.node(id)?;
        let element = &node.element;
        if element.fill_parent {
            if let Some(parent) = element.parent {
                let (width, height) = if parent == self.root {
                    (self.width, self.height)
                } else {
                    self.element(parent)
                        .map_or((0.0, 0.0), |p| (p.width, p.height))
                };
                self.set_size(id, width, height)?;
            }
        }

        if !self.node(id)?.element.needs_layout {
            return Ok(());
        }
        self.node_mut(id)?.element.needs_layout = false;
        self.layout(id)?;

        // Layout may invalidate the hierarchy (wrapping groups do); a widget
        // parent lays out again itself, otherwise settle here.
        if self.element(id).is_some_and(|e| e.needs_layout) {
            if self.parent(id).is_some_and(|parent| self.has_widget(parent)) {
                return Ok(());
            }
            for _ in 0..5 {
                self.node_mut(id)?.element.needs_layout = false;
                self.layout(id)?;
                if !self.element(id).is_some_and(|e| e.needs_layout) {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Run the widget's layout pass unconditionally
    pub fn layout(&mut self, id: ElementId) -> UiResult<()> {
        let Some(mut widget) = self.take_widget(id) else {
            return Ok(());
        };
        log::trace!("layout {id:?}");
        let result = widget.layout(self, id);
        self.restore_widget(id, widget);
        result
    }

    /// Size the element to its preferred size, then validate it
    pub fn pack(&mut self, id: ElementId) -> UiResult<()> {
        let width = self.pref_width(id);
        let height = self.pref_height(id);
        self.set_size(id, width, height)?;
        self.validate(id)
    }

    fn set_size_internal(&mut self, id: ElementId, width: f32, height: f32) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        if element.width == width && element.height == height {
            return false;
        }
        element.width = width;
        element.height = height;
        true
    }

    /// Set the size, invalidating the element when it changes
    pub fn set_size(&mut self, id: ElementId, width: f32, height: f32) -> UiResult<()> {
        self.node(id)?;
        if self.set_size_internal(id, width, height) {
            self.invalidate(id);
        }
        Ok(())
    }

    pub fn set_width(&mut self, id: ElementId, width: f32) -> UiResult<()> {
        let height = self.node(id)?.element.height;
        self.set_size(id, width, height)
    }

    pub fn set_height(&mut self, id: ElementId, height: f32) -> UiResult<()> {
        let width = self.node(id)?.element.width;
        self.set_size(id, width, height)
    }

    pub fn size_by(&mut self, id: ElementId, dw: f32, dh: f32) -> UiResult<()> {
        let element = &self.node(id)?.element;
        let (width, height) = (element.width + dw, element.height + dh);
        self.set_size(id, width, height)
    }

    /// Set position and size, invalidating the element when the size changes
    pub fn set_bounds(
        &mut self,
        id: ElementId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> UiResult<()> {
        self.node_mut(id)?.element.set_position(x, y);
        self.set_size(id, width, height)
    }

    pub fn set_position(&mut self, id: ElementId, x: f32, y: f32) -> UiResult<()> {
        self.node_mut(id)?.element.set_position(x, y);
        Ok(())
    }

    // Coordinates

    /// Convert a stage point into the element's local space
    pub fn stage_to_local(&self, id: ElementId, point: Point) -> Point {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            chain.push(id);
            current = self.parent(id);
        }
        chain
            .iter()
            .rev()
            .filter_map(|id| self.element(*id))
            .fold(point, |p, element| element.parent_to_local(p))
    }

    /// Convert a point in the element's local space to stage space
    pub fn local_to_stage(&self, id: ElementId, point: Point) -> Point {
        let mut point = point;
        let mut current = Some(id);
        while let Some(id) = current {
            let Some(element) = self.element(id) else {
                break;
            };
            point = element.local_to_parent(point);
            current = element.parent;
        }
        point
    }

    /// Convert a local point into the space of an ascendant
    pub fn local_to_ascendant(
        &self,
        id: ElementId,
        ascendant: ElementId,
        point: Point,
    ) -> UiResult<Point> {
        let mut point = point;
        let mut current = id;
        while current != ascendant {
            let element = &self.node(current)?.element;
            point = element.local_to_parent(point);
            current = element
                .parent
                .ok_or(UiError::InvalidArgument("element is not a descendant of the ascendant"))?;
        }
        Ok(point)
    }

    /// Map a rectangle in the element's local space to a stage-space scissor rectangle.
    ///
    /// Only positions are accumulated; rotated or scaled ancestors are not accounted for.
    pub fn calculate_scissors(&self, id: ElementId, rect: Rect) -> Rect {
        let mut offset_x = 0.0;
        let mut offset_y = 0.0;
        let mut current = Some(id);
        while let Some(id) = current {
            let Some(element) = self.element(id) else {
                break;
            };
            offset_x += element.x;
            offset_y += element.y;
            current = element.parent;
        }
        rect.translate(offset_x, offset_y)
    }

    // Actions and the frame

    /// Attach an action; it runs every `act` until it reports completion
    pub fn add_action(&mut self, id: ElementId, action: impl Action + 'static) -> UiResult<()> {
        self.node_mut(id)?.actions.push(Box::new(action));
        Ok(())
    }

    pub fn has_actions(&self, id: ElementId) -> bool {
        self.try_node(id).is_some_and(|node| !node.actions.is_empty())
    }

    pub fn clear_actions(&mut self, id: ElementId) -> UiResult<()> {
        self.node_mut(id)?.actions.clear();
        Ok(())
    }

    /// Advance the clock, refresh enter and exit state, and update every element
    pub fn act(&mut self, delta: f32) -> UiResult<()> {
        self.time += delta;
        self.update_pointer_over()?;
        let root = self.root;
        self.act_element(root, delta)
    }

    fn act_element(&mut self, id: ElementId, delta: f32) -> UiResult<()> {
        let actions = std::mem::take(&mut self.node_mut(id)?.actions);
        let mut remaining = Vec::with_capacity(actions.len());
        for mut action in actions {
            if !self.contains(id) {
                return Ok(());
            }
            if !action.update(self, id, delta) {
                remaining.push(action);
            }
        }
        let Some(node) = self.try_node_mut(id) else {
            return Ok(());
        };
        // Actions added while the list was out run from the next frame on
        remaining.append(&mut node.actions);
        node.actions = remaining;

        if let Some(mut widget) = self.take_widget(id) {
            let result = widget.act(self, id, delta);
            self.restore_widget(id, widget);
            result?;
        }

        let children = self.children(id).to_vec();
        for child in children {
            if self.parent(child) == Some(id) {
                self.act_element(child, delta)?;
            }
        }
        Ok(())
    }

    // Drawing

    /// Validate and record the visible tree
    pub fn draw(&mut self) -> UiResult<DrawOutput> {
        let mut out = DrawOutput::new();
        let root = self.root;
        self.draw_element(root, &mut out, 1.0)?;
        Ok(out)
    }

    /// Validate and record one element and its children
    pub fn draw_element(
        &mut self,
        id: ElementId,
        out: &mut DrawOutput,
        parent_alpha: f32,
    ) -> UiResult<()> {
        if !self.element(id).is_some_and(|e| e.visible) {
            return Ok(());
        }
        self.validate(id)?;

        let element = &self.node(id)?.element;
        let local = if element.transform {
            element.local_transform()
        } else {
            Affine2::from_translation(Vec2::new(element.x, element.y))
        };
        let debug = element.debug;
        let (width, height, alpha) = (element.width, element.height, element.color.a);
        let saved = out.transform();
        out.set_transform(saved * local);

        let result = match self.take_widget(id) {
            Some(mut widget) => {
                let result = widget.draw(self, id, out, parent_alpha);
                if debug {
                    widget.draw_debug(self, id, out);
                }
                self.restore_widget(id, widget);
                result
            }
            None => self.draw_children(id, out, alpha * parent_alpha),
        };

        if debug {
            out.outline(Rect::from_xywh(0.0, 0.0, width, height), debug_colors::ELEMENT);
        }
        out.set_transform(saved);
        result
    }

    /// Record the visible children, skipping those outside the culling area
    pub fn draw_children(&mut self, id: ElementId, out: &mut DrawOutput, alpha: f32) -> UiResult<()> {
        let node = self.node(id)?;
        let children = node.children.clone();
        let culling_area = node.culling_area;

        for child in children {
            let Some(element) = self.element(child) else {
                continue;
            };
            if !element.visible {
                continue;
            }
            if let Some(area) = culling_area {
                if !area.overlaps(&element.bounds()) {
                    continue;
                }
            }
            self.draw_element(child, out, alpha)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;
    use crate::color::Color;
    use crate::style::Drawable;

    struct Fixed {
        width: f32,
        height: f32,
        layouts: u32,
    }

    impl Fixed {
        fn new(width: f32, height: f32) -> Self {
            Self {
                width,
                height,
                layouts: 0,
            }
        }
    }

    impl Widget for Fixed {
        fn pref_width(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
            self.width
        }

        fn pref_height(&mut self, _stage: &mut Stage, _id: ElementId) -> f32 {
            self.height
        }

        fn layout(&mut self, _stage: &mut Stage, _id: ElementId) -> UiResult<()> {
            self.layouts += 1;
            Ok(())
        }
    }

    #[test]
    fn test_stale_ids() {
        let mut stage = Stage::new(100.0, 100.0);
        let a = stage.create_element();
        stage.destroy(a).unwrap();
        assert!(!stage.contains(a));
        assert!(stage.element(a).is_none());
        assert_eq!(stage.set_size(a, 1.0, 1.0), Err(UiError::UnknownElement(a)));

        // The slot is reused under a new generation
        let b = stage.create_element();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(stage.element(a).is_none());
    }

    #[test]
    fn test_destroy_frees_subtree() {
        let mut stage = Stage::new(100.0, 100.0);
        let group = stage.create_group();
        let child = stage.create_element();
        stage.add_element(stage.root(), group).unwrap();
        stage.add_element(group, child).unwrap();
        assert_eq!(stage.len(), 3);

        stage.destroy(group).unwrap();
        assert!(!stage.contains(child));
        assert!(stage.children(stage.root()).is_empty());
        assert_eq!(stage.len(), 1);
        assert!(stage.destroy(stage.root()).is_err());
    }

    #[test]
    fn test_plain_metrics() {
        let mut stage = Stage::new(100.0, 100.0);
        let e = stage.create_element();
        stage.set_size(e, 30.0, 40.0).unwrap();
        assert_eq!(stage.pref_width(e), 30.0);
        assert_eq!(stage.min_height(e), 40.0);
        assert_eq!(stage.max_width(e), 0.0);
    }

    #[test]
    fn test_widget_metrics_and_typed_access() {
        let mut stage = Stage::new(100.0, 100.0);
        let w = stage.create_widget(Fixed::new(12.0, 8.0));
        assert_eq!(stage.pref_width(w), 12.0);
        assert_eq!(stage.min_width(w), 12.0);
        assert!(stage.widget::<Fixed>(w).is_some());
        assert!(stage.widget::<Container>(w).is_none());
        assert!(matches!(
            stage.with_widget::<Container, _>(w, |_, _| ()),
            Err(UiError::WidgetMismatch { .. })
        ));
        let width = stage.with_widget::<Fixed, _>(w, |f, _| f.width).unwrap();
        assert_eq!(width, 12.0);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut stage = Stage::new(100.0, 100.0);
        let w = stage.create_widget(Fixed::new(12.0, 8.0));
        stage.validate(w).unwrap();
        stage.validate(w).unwrap();
        assert_eq!(stage.widget::<Fixed>(w).unwrap().layouts, 1);

        stage.invalidate(w);
        stage.validate(w).unwrap();
        assert_eq!(stage.widget::<Fixed>(w).unwrap().layouts, 2);

        // Same size, no invalidation
        stage.set_size(w, 0.0, 0.0).unwrap();
        stage.validate(w).unwrap();
        assert_eq!(stage.widget::<Fixed>(w).unwrap().layouts, 2);
    }

    #[test]
    fn test_pack_and_fill_parent() {
        let mut stage = Stage::new(320.0, 240.0);
        let w = stage.create_widget(Fixed::new(12.0, 8.0));
        stage.pack(w).unwrap();
        assert_eq!(stage.element(w).unwrap().bounds(), Rect::from_xywh(0.0, 0.0, 12.0, 8.0));

        stage.add_element(stage.root(), w).unwrap();
        stage.element_mut(w).unwrap().set_fill_parent(true);
        stage.validate(w).unwrap();
        assert_eq!(stage.element(w).unwrap().width(), 320.0);

        stage.resize(640.0, 480.0);
        stage.validate(w).unwrap();
        assert_eq!(stage.element(w).unwrap().height(), 480.0);
    }

    #[test]
    fn test_invalidate_hierarchy_reaches_ancestors() {
        let mut stage = Stage::new(100.0, 100.0);
        let outer = stage.create_widget(Fixed::new(1.0, 1.0));
        let inner = stage.create_widget(Fixed::new(1.0, 1.0));
        stage.add_element(outer, inner).unwrap();
        stage.validate(outer).unwrap();
        stage.validate(inner).unwrap();

        stage.invalidate_hierarchy(inner);
        assert!(stage.element(inner).unwrap().needs_layout());
        assert!(stage.element(outer).unwrap().needs_layout());
    }

    #[test]
    fn test_coordinate_chain() {
        let mut stage = Stage::new(100.0, 100.0);
        let group = stage.create_group();
        let child = stage.create_element();
        stage.add_element(stage.root(), group).unwrap();
        stage.add_element(group, child).unwrap();
        stage.set_position(group, 10.0, 20.0).unwrap();
        stage.set_position(child, 5.0, 5.0).unwrap();

        let local = stage.stage_to_local(child, Point::new(16.0, 26.0));
        assert_eq!(local, Point::new(1.0, 1.0));
        assert_eq!(stage.local_to_stage(child, local), Point::new(16.0, 26.0));
        assert_eq!(
            stage.local_to_ascendant(child, group, Point::new(1.0, 1.0)),
            Ok(Point::new(6.0, 6.0))
        );
        assert_eq!(
            stage.calculate_scissors(child, Rect::from_xywh(0.0, 0.0, 4.0, 4.0)),
            Rect::from_xywh(15.0, 25.0, 4.0, 4.0)
        );
    }

    #[test]
    fn test_draw_alpha_and_culling() {
        let mut stage = Stage::new(100.0, 100.0);
        let group = stage.create_group();
        stage.add_element(stage.root(), group).unwrap();
        stage
            .element_mut(group)
            .unwrap()
            .set_color(Color::WHITE.with_alpha(0.5));

        let mut boxes = Vec::new();
        for x in [0.0, 50.0, 200.0] {
            let c = stage.create_widget(Container::new().with_background(Drawable::new(Color::BLACK)));
            stage.set_bounds(c, x, 0.0, 10.0, 10.0).unwrap();
            stage.add_element(group, c).unwrap();
            boxes.push(c);
        }
        stage.set_culling_area(group, Some(Rect::from_xywh(0.0, 0.0, 100.0, 100.0))).unwrap();

        let out = stage.draw().unwrap();
        let fills: Vec<_> = out.fills().collect();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[1].0, Rect::from_xywh(50.0, 0.0, 10.0, 10.0));
        assert_eq!(fills[0].1.a, 0.5);
    }

    #[test]
    fn test_debug_outline() {
        let mut stage = Stage::new(100.0, 100.0);
        let e = stage.create_element();
        stage.set_bounds(e, 1.0, 2.0, 3.0, 4.0).unwrap();
        stage.add_element(stage.root(), e).unwrap();
        stage.element_mut(e).unwrap().set_debug(true);
        let out = stage.draw().unwrap();
        let outlines: Vec<_> = out.outlines().collect();
        assert_eq!(outlines, [(Rect::from_xywh(1.0, 2.0, 3.0, 4.0), debug_colors::ELEMENT)]);
    }
}
