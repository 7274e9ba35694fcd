//! Tree operations on the stage: parenting, ordering, lookup and hit testing.

use crate::element::Touchable;
use crate::error::{UiError, UiResult};
use crate::primitives::{Point, Rect};
use crate::stage::{ElementId, Stage};
use crate::widget::{ChildPolicy, HitOverride};

impl Stage {
    /// Children of a group in draw order. Empty for leaves and stale ids.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.try_node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Append `child` to `parent`, removing it from its previous parent first.
    ///
    /// Widgets that manage their children through dedicated setters reject this
    /// with [`UiError::Unsupported`].
    pub fn add_element(&mut self, parent: ElementId, child: ElementId) -> UiResult<()> {
        self.check_child_policy(parent, "add_element")?;
        self.adopt(parent, child, None)
    }

    /// Insert `child` at `index` in `parent`'s children, appending when out of range
    pub fn insert_element(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> UiResult<()> {
        self.check_child_policy(parent, "insert_element")?;
        self.adopt(parent, child, Some(index))
    }

    fn check_child_policy(&self, parent: ElementId, operation: &'static str) -> UiResult<()> {
        let node = self.node(parent)?;
        if let Some(widget) = node.widget.as_ref() {
            if let ChildPolicy::Dedicated(use_instead) = widget.child_policy() {
                return Err(UiError::Unsupported {
                    operation,
                    use_instead,
                });
            }
        }
        Ok(())
    }

    /// Parent `child` under `parent` without consulting the parent's child policy.
    ///
    /// Widgets use this for their dedicated slots.
    pub fn adopt(
        &mut self,
        parent: ElementId,
        child: ElementId,
        index: Option<usize>,
    ) -> UiResult<()> {
        if !self.node(parent)?.is_group {
            return Err(UiError::InvalidArgument("elements can only be added to groups"));
        }
        self.node(child)?;
        if child == self.root() {
            return Err(UiError::InvalidArgument("the root cannot be added to a group"));
        }
        if self.is_descendant_of(parent, child) {
            return Err(UiError::InvalidArgument(
                "an element cannot be added to itself or one of its descendants",
            ));
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_element(old_parent, child)?;
        }

        let node = self.node_mut(parent)?;
        match index {
            Some(index) if index < node.children.len() => node.children.insert(index, child),
            _ => node.children.push(child),
        }
        self.node_mut(child)?.element.parent = Some(parent);
        log::debug!("{child:?} added to {parent:?}");
        self.invalidate_hierarchy(parent);
        Ok(())
    }

    /// Remove `child` from `parent`. Returns false if it was not a child.
    ///
    /// Keyboard and scroll focus held inside the removed subtree is released.
    pub fn remove_element(&mut self, parent: ElementId, child: ElementId) -> UiResult<bool> {
        let Some(position) = self
            .node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
        else {
            return Ok(false);
        };

        if self
            .keyboard_focus
            .is_some_and(|focus| self.is_descendant_of(focus, child))
        {
            self.set_keyboard_focus(None)?;
        }
        if self
            .scroll_focus
            .is_some_and(|focus| self.is_descendant_of(focus, child))
        {
            self.set_scroll_focus(None)?;
        }

        // Focus listeners may have restructured the tree
        let node = self.node_mut(parent)?;
        let position = match node.children.get(position) {
            Some(c) if *c == child => position,
            _ => match node.children.iter().position(|c| *c == child) {
                Some(position) => position,
                None => return Ok(false),
            },
        };
        node.children.remove(position);
        match node.widget.as_mut() {
            Some(widget) => widget.child_removed(child),
            None if node.has_widget => node.pending_removed.push(child),
            None => {}
        }
        if let Some(element) = self.element_mut(child) {
            element.parent = None;
        }
        log::debug!("{child:?} removed from {parent:?}");
        self.invalidate_hierarchy(parent);
        Ok(true)
    }

    /// Remove the element from its parent, returning false if it had none
    pub fn remove(&mut self, id: ElementId) -> UiResult<bool> {
        match self.node(id)?.element.parent {
            Some(parent) => self.remove_element(parent, id),
            None => Ok(false),
        }
    }

    /// Remove every child of a group. The children stay alive.
    pub fn clear_children(&mut self, id: ElementId) -> UiResult<()> {
        let children = self.node(id)?.children.clone();
        for child in children.into_iter().rev() {
            self.remove_element(id, child)?;
        }
        Ok(())
    }

    /// Move the element to the end of its parent's children, drawing it last
    pub fn to_front(&mut self, id: ElementId) -> UiResult<()> {
        self.reorder(id, true)
    }

    /// Move the element to the start of its parent's children, drawing it first
    pub fn to_back(&mut self, id: ElementId) -> UiResult<()> {
        self.reorder(id, false)
    }

    fn reorder(&mut self, id: ElementId, front: bool) -> UiResult<()> {
        let Some(parent) = self.node(id)?.element.parent else {
            return Ok(());
        };
        let children = &mut self.node_mut(parent)?.children;
        if let Some(position) = children.iter().position(|c| *c == id) {
            children.remove(position);
            if front {
                children.push(id);
            } else {
                children.insert(0, id);
            }
        }
        Ok(())
    }

    /// Whether `id` is `ancestor` or lies below it
    pub fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `id` is `descendant` or lies above it
    pub fn is_ascendant_of(&self, id: ElementId, descendant: ElementId) -> bool {
        self.is_descendant_of(descendant, id)
    }

    /// Find a descendant by name, checking direct children before going deeper
    pub fn find_by_name(&self, id: ElementId, name: &str) -> Option<ElementId> {
        let children = self.children(id);
        if let Some(found) = children
            .iter()
            .find(|child| self.element(**child).and_then(|e| e.name()) == Some(name))
        {
            return Some(*found);
        }
        children
            .iter()
            .filter(|child| self.is_group(**child))
            .find_map(|child| self.find_by_name(*child, name))
    }

    /// Children completely outside this rectangle are not drawn.
    ///
    /// Only meaningful for groups whose children are neither rotated nor scaled.
    pub fn set_culling_area(&mut self, id: ElementId, area: Option<Rect>) -> UiResult<()> {
        self.node_mut(id)?.culling_area = area;
        Ok(())
    }

    pub fn culling_area(&self, id: ElementId) -> Option<Rect> {
        self.try_node(id).and_then(|node| node.culling_area)
    }

    /// Turn debug output on for the element and everything below it
    pub fn debug_all(&mut self, id: ElementId) -> UiResult<()> {
        self.set_debug_recursive(id, true)
    }

    pub fn set_debug_recursive(&mut self, id: ElementId, debug: bool) -> UiResult<()> {
        self.node_mut(id)?.element.debug = debug;
        let children = self.children(id).to_vec();
        for child in children {
            self.set_debug_recursive(child, debug)?;
        }
        Ok(())
    }

    // Hit testing

    /// Deepest element under a stage-space point
    pub fn hit(&mut self, stage_x: f32, stage_y: f32, touchable: bool) -> Option<ElementId> {
        let root = self.root();
        let local = self.stage_to_local(root, Point::new(stage_x, stage_y));
        self.hit_local(root, local.x, local.y, touchable)
    }

    /// Hit test `id` with the point in its parent's coordinates
    pub fn hit_element(
        &mut self,
        id: ElementId,
        x: f32,
        y: f32,
        touchable: bool,
    ) -> Option<ElementId> {
        let local = self.element(id)?.parent_to_local(Point::new(x, y));
        self.hit_local(id, local.x, local.y, touchable)
    }

    /// Hit test `id` with the point in its own coordinates.
    ///
    /// Groups test their visible children last to first and fall back to
    /// their own bounds.
    pub fn hit_local(
        &mut self,
        id: ElementId,
        x: f32,
        y: f32,
        touchable: bool,
    ) -> Option<ElementId> {
        if let Some(mut widget) = self.take_widget(id) {
            let result = widget.hit(self, id, x, y, touchable);
            self.restore_widget(id, widget);
            match result {
                HitOverride::Inherit => {}
                HitOverride::Miss => return None,
                HitOverride::Target(hit) => return Some(hit),
            }
        }
        self.hit_default(id, x, y, touchable)
    }

    /// Regular element and group hit test, without the widget override
    pub fn hit_default(
        &mut self,
        id: ElementId,
        x: f32,
        y: f32,
        touchable: bool,
    ) -> Option<ElementId> {
        let node = self.try_node(id)?;
        if !node.element.visible {
            return None;
        }

        if node.is_group {
            if touchable && node.element.touchable == Touchable::Disabled {
                return None;
            }
            let children = node.children.clone();
            for child in children.into_iter().rev() {
                let Some(element) = self.element(child) else {
                    continue;
                };
                if !element.visible {
                    continue;
                }
                let local = element.parent_to_local(Point::new(x, y));
                if let Some(hit) = self.hit_local(child, local.x, local.y, touchable) {
                    return Some(hit);
                }
            }
        }

        let element = self.element(id)?;
        if touchable && element.touchable != Touchable::Enabled {
            return None;
        }
        element.contains_local(x, y).then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;

    fn placed(stage: &mut Stage, parent: ElementId, x: f32, y: f32, w: f32, h: f32) -> ElementId {
        let id = stage.create_element();
        stage.set_bounds(id, x, y, w, h).unwrap();
        stage.add_element(parent, id).unwrap();
        id
    }

    #[test]
    fn test_reparenting() {
        let mut stage = Stage::new(100.0, 100.0);
        let a = stage.create_group();
        let b = stage.create_group();
        let child = stage.create_element();
        stage.add_element(a, child).unwrap();
        stage.add_element(b, child).unwrap();
        assert!(stage.children(a).is_empty());
        assert_eq!(stage.children(b), [child]);
        assert_eq!(stage.parent(child), Some(b));

        // Adding again does not duplicate
        stage.add_element(b, child).unwrap();
        assert_eq!(stage.children(b), [child]);
    }

    #[test]
    fn test_cycles_rejected() {
        let mut stage = Stage::new(100.0, 100.0);
        let a = stage.create_group();
        let b = stage.create_group();
        stage.add_element(a, b).unwrap();
        assert!(matches!(stage.add_element(b, a), Err(UiError::InvalidArgument(_))));
        assert!(matches!(stage.add_element(a, a), Err(UiError::InvalidArgument(_))));

        let leaf = stage.create_element();
        assert!(stage.add_element(leaf, a).is_err());
    }

    #[test]
    fn test_dedicated_child_policy() {
        let mut stage = Stage::new(100.0, 100.0);
        let container = stage.create_widget(Container::new());
        let child = stage.create_element();
        assert_eq!(
            stage.add_element(container, child),
            Err(UiError::Unsupported {
                operation: "add_element",
                use_instead: "Container::set_element",
            })
        );
    }

    #[test]
    fn test_insert_and_order() {
        let mut stage = Stage::new(100.0, 100.0);
        let g = stage.create_group();
        let a = stage.create_element();
        let b = stage.create_element();
        let c = stage.create_element();
        stage.add_element(g, a).unwrap();
        stage.add_element(g, b).unwrap();
        stage.insert_element(g, 0, c).unwrap();
        assert_eq!(stage.children(g), [c, a, b]);

        stage.to_front(c).unwrap();
        assert_eq!(stage.children(g), [a, b, c]);
        stage.to_back(b).unwrap();
        assert_eq!(stage.children(g), [b, a, c]);

        assert!(stage.remove(a).unwrap());
        assert!(!stage.remove(a).unwrap());
        stage.clear_children(g).unwrap();
        assert!(stage.children(g).is_empty());
        assert!(stage.contains(b));
    }

    #[test]
    fn test_find_by_name_prefers_shallow() {
        let mut stage = Stage::new(100.0, 100.0);
        let root = stage.root();
        let inner = stage.create_group();
        let deep = stage.create_element();
        let shallow = stage.create_element();
        stage.add_element(root, inner).unwrap();
        stage.add_element(inner, deep).unwrap();
        stage.add_element(root, shallow).unwrap();
        stage.element_mut(deep).unwrap().set_name("ok");
        stage.element_mut(shallow).unwrap().set_name("ok");

        assert_eq!(stage.find_by_name(root, "ok"), Some(shallow));
        assert_eq!(stage.find_by_name(inner, "ok"), Some(deep));
        assert_eq!(stage.find_by_name(root, "missing"), None);
    }

    #[test]
    fn test_hit_topmost_child_wins() {
        let mut stage = Stage::new(100.0, 100.0);
        let root = stage.root();
        let below = placed(&mut stage, root, 0.0, 0.0, 50.0, 50.0);
        let above = placed(&mut stage, root, 25.0, 25.0, 50.0, 50.0);

        assert_eq!(stage.hit(30.0, 30.0, true), Some(above));
        assert_eq!(stage.hit(10.0, 10.0, true), Some(below));
        // Nothing but the root
        assert_eq!(stage.hit(90.0, 5.0, true), Some(root));
        assert_eq!(stage.hit(150.0, 5.0, true), None);

        // Right and bottom edges are exclusive
        assert_eq!(stage.hit(75.0, 30.0, true), Some(root));
    }

    #[test]
    fn test_hit_touchable_and_visibility() {
        let mut stage = Stage::new(100.0, 100.0);
        let root = stage.root();
        let group = stage.create_group();
        stage.set_bounds(group, 0.0, 0.0, 60.0, 60.0).unwrap();
        stage.add_element(root, group).unwrap();
        let child = placed(&mut stage, group, 10.0, 10.0, 10.0, 10.0);

        stage.element_mut(group).unwrap().set_touchable(Touchable::ChildrenOnly);
        assert_eq!(stage.hit(15.0, 15.0, true), Some(child));
        assert_eq!(stage.hit(40.0, 40.0, true), Some(root));
        assert_eq!(stage.hit(40.0, 40.0, false), Some(group));

        stage.element_mut(group).unwrap().set_touchable(Touchable::Disabled);
        assert_eq!(stage.hit(15.0, 15.0, true), Some(root));
        assert_eq!(stage.hit(15.0, 15.0, false), Some(child));

        stage.element_mut(group).unwrap().set_touchable(Touchable::Enabled);
        stage.element_mut(child).unwrap().set_visible(false);
        assert_eq!(stage.hit(15.0, 15.0, true), Some(group));
    }

    #[test]
    fn test_hit_through_scaled_group() {
        let mut stage = Stage::new(200.0, 200.0);
        let root = stage.root();
        let group = stage.create_group();
        stage.set_bounds(group, 100.0, 100.0, 10.0, 10.0).unwrap();
        stage.element_mut(group).unwrap().set_scale(2.0, 2.0);
        stage.add_element(root, group).unwrap();
        let child = placed(&mut stage, group, 5.0, 5.0, 5.0, 5.0);

        // (5..10) local maps to (110..120) on stage
        assert_eq!(stage.hit(115.0, 115.0, true), Some(child));
        assert_eq!(stage.hit(105.0, 105.0, true), Some(group));
    }

    #[test]
    fn test_debug_all() {
        let mut stage = Stage::new(100.0, 100.0);
        let root = stage.root();
        let group = stage.create_group();
        stage.add_element(root, group).unwrap();
        let leaf = placed(&mut stage, group, 0.0, 0.0, 1.0, 1.0);
        stage.debug_all(group).unwrap();
        assert!(stage.element(leaf).unwrap().debug());
        assert!(!stage.element(root).unwrap().debug());
    }
}
