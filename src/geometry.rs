// ABOUTME: Logical-point geometry shared by the popover controller and resize mapper
// ABOUTME: Top-left origin with y growing downward, matching winit's screen coordinates

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Component-wise linear interpolation; `t` is not clamped.
    pub fn lerp(self, other: Size, t: f64) -> Size {
        Size {
            width: self.width + (other.width - self.width) * t,
            height: self.height + (other.height - self.height) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub origin: Point,
    pub size: Size,
}

/// Vertical gap between the status item and the popover's top edge.
pub const ANCHOR_GAP: f64 = 4.0;

impl Frame {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.max_x()
            && point.y >= self.origin.y
            && point.y <= self.max_y()
    }

    /// Keeps the top-left corner where it is; the bottom edge moves.
    pub fn with_size(&self, size: Size) -> Frame {
        Frame {
            origin: self.origin,
            size,
        }
    }

    /// Frame for a popover of `size` hanging below `icon`, horizontally centred on it.
    pub fn anchored_below(icon: Frame, size: Size) -> Frame {
        let centre = icon.origin.x + icon.size.width / 2.0;
        let x = (centre - size.width / 2.0).max(0.0);
        Frame {
            origin: Point::new(x, icon.max_y() + ANCHOR_GAP),
            size,
        }
    }
}
