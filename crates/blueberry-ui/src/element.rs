//! Element state: geometry, flags and coordinate conversion.
//!
//! An [`Element`] is the data every node of the scene graph carries. Its tree
//! links are [`ElementId`] handles into the owning [`Stage`](crate::Stage),
//! never owning references. Operations that can change an element's size live
//! on the stage, since a size change must invalidate the element's layout.

use glam::{Affine2, Vec2};

use crate::color::Color;
use crate::primitives::{Point, Rect};
use crate::stage::ElementId;

/// How an element takes part in hit testing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Touchable {
    /// The element and its children can be hit
    #[default]
    Enabled,
    /// Neither the element nor its children can be hit
    Disabled,
    /// Only the children can be hit, the element itself is transparent to input
    ChildrenOnly,
}

#[derive(Clone, Debug)]
pub struct Element {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    origin_x: f32,
    origin_y: f32,
    scale_x: f32,
    scale_y: f32,
    /// Degrees, counter-clockwise in y-up terms (clockwise on a y-down screen)
    rotation: f32,

    pub(crate) visible: bool,
    pub(crate) touchable: Touchable,
    pub(crate) debug: bool,
    /// Size to the parent on every validation
    pub(crate) fill_parent: bool,
    pub(crate) needs_layout: bool,
    /// Apply this group's transform to its children when drawing
    pub(crate) transform: bool,

    pub(crate) name: Option<String>,
    pub(crate) color: Color,
    pub(crate) parent: Option<ElementId>,
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

impl Element {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            origin_x: 0.0,
            origin_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            visible: true,
            touchable: Touchable::Enabled,
            debug: false,
            fill_parent: false,
            needs_layout: true,
            transform: false,
            name: None,
            color: Color::WHITE,
            parent: None,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_xywh(self.x, self.y, self.width, self.height)
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn origin_x(&self) -> f32 {
        self.origin_x
    }

    pub fn origin_y(&self) -> f32 {
        self.origin_y
    }

    pub fn set_origin(&mut self, origin_x: f32, origin_y: f32) {
        self.origin_x = origin_x;
        self.origin_y = origin_y;
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn set_scale(&mut self, scale_x: f32, scale_y: f32) {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
    }

    pub fn rotate_by(&mut self, degrees: f32) {
        self.rotation += degrees;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn touchable(&self) -> Touchable {
        self.touchable
    }

    pub fn set_touchable(&mut self, touchable: Touchable) {
        self.touchable = touchable;
    }

    pub fn is_touchable(&self) -> bool {
        self.touchable == Touchable::Enabled
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn fill_parent(&self) -> bool {
        self.fill_parent
    }

    pub fn set_fill_parent(&mut self, fill_parent: bool) {
        self.fill_parent = fill_parent;
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    pub fn is_transform(&self) -> bool {
        self.transform
    }

    pub fn set_transform(&mut self, transform: bool) {
        self.transform = transform;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Whether the point, in this element's local coordinates, lies inside its bounds
    pub fn contains_local(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && x < self.width && y >= 0.0 && y < self.height
    }

    /// Convert a point from the parent's coordinate space into this element's
    pub fn parent_to_local(&self, point: Point) -> Point {
        let child_x = self.x;
        let child_y = self.y;

        if self.rotation == 0.0 {
            if self.scale_x == 1.0 && self.scale_y == 1.0 {
                return Point::new(point.x - child_x, point.y - child_y);
            }
            let origin_x = self.origin_x;
            let origin_y = self.origin_y;
            return Point::new(
                (point.x - child_x - origin_x) / self.scale_x + origin_x,
                (point.y - child_y - origin_y) / self.scale_y + origin_y,
            );
        }

        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let origin_x = self.origin_x;
        let origin_y = self.origin_y;
        let tox = point.x - child_x - origin_x;
        let toy = point.y - child_y - origin_y;
        Point::new(
            (tox * cos + toy * sin) / self.scale_x + origin_x,
            (tox * -sin + toy * cos) / self.scale_y + origin_y,
        )
    }

    /// Convert a point from this element's coordinate space into its parent's
    pub fn local_to_parent(&self, point: Point) -> Point {
        let rotation = -self.rotation;
        let scale_x = self.scale_x;
        let scale_y = self.scale_y;
        let x = self.x;
        let y = self.y;

        if rotation == 0.0 {
            if scale_x == 1.0 && scale_y == 1.0 {
                return Point::new(point.x + x, point.y + y);
            }
            let origin_x = self.origin_x;
            let origin_y = self.origin_y;
            return Point::new(
                (point.x - origin_x) * scale_x + origin_x + x,
                (point.y - origin_y) * scale_y + origin_y + y,
            );
        }

        let (sin, cos) = rotation.to_radians().sin_cos();
        let origin_x = self.origin_x;
        let origin_y = self.origin_y;
        let tox = (point.x - origin_x) * scale_x;
        let toy = (point.y - origin_y) * scale_y;
        Point::new(
            tox * cos + toy * sin + origin_x + x,
            tox * -sin + toy * cos + origin_y + y,
        )
    }

    /// Local-to-parent transform as an affine matrix.
    ///
    /// Equivalent to [`local_to_parent`](Self::local_to_parent) and used by draw output.
    pub fn local_transform(&self) -> Affine2 {
        let origin = Vec2::new(self.origin_x, self.origin_y);
        Affine2::from_translation(Vec2::new(self.x, self.y) + origin)
            * Affine2::from_angle(self.rotation.to_radians())
            * Affine2::from_scale(Vec2::new(self.scale_x, self.scale_y))
            * Affine2::from_translation(-origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn approx_point(a: Point, b: Point) -> bool {
        approx(a.x, b.x) && approx(a.y, b.y)
    }

    fn sample() -> Element {
        let mut e = Element::new();
        e.set_position(10.0, 20.0);
        e.width = 40.0;
        e.height = 30.0;
        e
    }

    #[test]
    fn test_translation_fast_path() {
        let e = sample();
        assert_eq!(e.parent_to_local(Point::new(15.0, 25.0)), Point::new(5.0, 5.0));
        assert_eq!(e.local_to_parent(Point::new(5.0, 5.0)), Point::new(15.0, 25.0));
    }

    #[test]
    fn test_scale_about_origin() {
        let mut e = sample();
        e.set_origin(20.0, 15.0);
        e.set_scale(2.0, 2.0);
        let local = e.parent_to_local(Point::new(30.0, 35.0));
        assert!(approx_point(local, Point::new(20.0, 15.0)));
        let local = e.parent_to_local(Point::new(50.0, 35.0));
        assert!(approx_point(local, Point::new(30.0, 15.0)));
    }

    #[test]
    fn test_rotation_round_trip() {
        let mut e = sample();
        e.set_origin(20.0, 15.0);
        e.set_rotation(37.0);
        e.set_scale(1.5, 0.5);
        for p in [
            Point::new(0.0, 0.0),
            Point::new(13.0, -4.0),
            Point::new(40.0, 30.0),
        ] {
            let back = e.parent_to_local(e.local_to_parent(p));
            assert!(approx_point(back, p), "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn test_quarter_turn() {
        let mut e = Element::new();
        e.set_rotation(90.0);
        // Origin at (0, 0): local +x maps onto parent +y
        let p = e.local_to_parent(Point::new(1.0, 0.0));
        assert!(approx_point(p, Point::new(0.0, 1.0)), "{p:?}");
    }

    #[test]
    fn test_affine_matches_local_to_parent() {
        let mut e = sample();
        e.set_origin(5.0, 7.0);
        e.set_rotation(-25.0);
        e.set_scale(1.25, 2.0);
        let affine = e.local_transform();
        for p in [Point::new(0.0, 0.0), Point::new(12.0, 3.0)] {
            let expected = e.local_to_parent(p);
            let got: Point = affine.transform_point2(p.into()).into();
            assert!(approx_point(got, expected), "{got:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_contains_local() {
        let e = sample();
        assert!(e.contains_local(0.0, 0.0));
        assert!(!e.contains_local(40.0, 10.0));
        assert!(!e.contains_local(-0.1, 10.0));
    }
}
