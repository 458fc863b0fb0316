//! Screen-space geometry for hit testing.
//!
//! Coordinates are device pixels with y growing downward.  A control placed
//! in landscape orientation is drawn rotated 90° clockwise about its anchor,
//! so its hit box is the rotated rectangle and pointer positions have to be
//! rotated back before they mean anything to the control.

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle anchored at `(x, y)` with the given size.
    pub fn at(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Inscribed ellipse test.
    pub fn ellipse_contains(&self, x: f32, y: f32) -> bool {
        let rx = self.width() / 2.0;
        let ry = self.height() / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let dx = (x - (self.left + rx)) / rx;
        let dy = (y - (self.top + ry)) / ry;
        dx * dx + dy * dy <= 1.0
    }

    /// The rectangle after a 90° clockwise turn about its top-left corner.
    pub fn rotated(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        Self::new(self.left - h, self.top, self.left, self.top + w)
    }

    /// Grow every edge outward by `padding`.
    pub fn inflated(&self, padding: f32) -> Self {
        Self::new(
            self.left - padding,
            self.top - padding,
            self.right + padding,
            self.bottom + padding,
        )
    }

    /// Rotate when `landscape`, otherwise unchanged.
    pub fn oriented(&self, landscape: bool) -> Self {
        if landscape { self.rotated() } else { *self }
    }
}

/// Position of `(x, y)` inside `rect` in control-local units: `0.0..=1.0`
/// across the unrotated width and height.
///
/// `rect` is the unrotated rectangle; for landscape controls the pointer is
/// measured from the rotated anchor and turned back.
pub fn local_pos(x: f32, y: f32, rect: &Rect, landscape: bool) -> (f32, f32) {
    let bx = x - rect.left;
    let by = y - rect.top;
    let (cx, cy) = if landscape { (by, -bx) } else { (bx, by) };
    (cx / rect.width(), cy / rect.height())
}
