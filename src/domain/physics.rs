//! Minimal arcade physics: axis-aligned boxes and a fixed-step integrator.
//!
//! ## Coordinate system
//!
//! Logical canvas pixels, origin top-left, +y pointing down.
//! Velocities are px/s, accelerations px/s². Every simulation step advances
//! by the same `dt`, so results are reproducible for a given input sequence.
//!
//! ## Overlap rule
//!
//! Two boxes overlap when their interiors intersect. Boxes that merely share
//! an edge do NOT overlap (a bird resting exactly on the ground line is still
//! alive until it sinks one sub-pixel further).

/// Axis-aligned rectangle: `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Rectangle of size `w×h` centred on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Rect { x: cx - w / 2.0, y: cy - h / 2.0, w, h }
    }

    #[inline]
    pub fn left(&self) -> f32 { self.x }
    #[inline]
    pub fn right(&self) -> f32 { self.x + self.w }
    #[inline]
    pub fn top(&self) -> f32 { self.y }
    #[inline]
    pub fn bottom(&self) -> f32 { self.y + self.h }

    /// Strict interior intersection test.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Degenerate rectangles (zero or negative extent) never collide.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Vertical kinematic state of a body under constant gravity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinematics {
    pub y: f32,
    pub vy: f32,
}

/// Semi-implicit Euler: velocity first, then position with the new velocity.
/// Stable for the constant-acceleration case and cheap enough for one body.
#[inline]
pub fn integrate(k: Kinematics, gravity: f32, dt: f32) -> Kinematics {
    let vy = k.vy + gravity * dt;
    Kinematics { y: k.y + vy * dt, vy }
}

/// Horizontal drift at constant velocity.
#[inline]
pub fn advance_x(x: f32, vx: f32, dt: f32) -> f32 {
    x + vx * dt
}

/// Wrap a scrolling texture offset into `[0, period)`.
#[inline]
pub fn wrap_offset(offset: f32, period: f32) -> f32 {
    if period <= 0.0 { return 0.0; }
    offset.rem_euclid(period)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── overlaps ──

    #[test]
    fn overlapping_boxes_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(30.0, -40.0, 5.0, 5.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn contained_box_collides() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(40.0, 40.0, 2.0, 2.0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn centered_rect_geometry() {
        let r = Rect::centered(100.0, 300.0, 50.0, 36.0);
        assert_eq!(r.left(), 75.0);
        assert_eq!(r.right(), 125.0);
        assert_eq!(r.top(), 282.0);
        assert_eq!(r.bottom(), 318.0);
    }

    #[test]
    fn empty_rect_detection() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(Rect::new(0.0, 0.0, 5.0, -1.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    // ── integrate ──

    #[test]
    fn gravity_accelerates_downward() {
        let k = integrate(Kinematics { y: 0.0, vy: 0.0 }, 1000.0, 0.1);
        assert!((k.vy - 100.0).abs() < 1e-4);
        assert!((k.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn upward_velocity_decays_then_falls() {
        let mut k = Kinematics { y: 300.0, vy: -350.0 };
        let mut peak = k.y;
        for _ in 0..120 {
            k = integrate(k, 1000.0, 1.0 / 60.0);
            peak = peak.min(k.y);
        }
        assert!(peak < 300.0, "body should rise first");
        assert!(k.y > 300.0, "body should end below its start");
        assert!(k.vy > 0.0);
    }

    #[test]
    fn advance_x_moves_left_with_negative_velocity() {
        assert!((advance_x(850.0, -200.0, 0.5) - 750.0).abs() < 1e-4);
    }

    #[test]
    fn wrap_offset_stays_in_period() {
        assert!((wrap_offset(805.0, 800.0) - 5.0).abs() < 1e-4);
        assert!((wrap_offset(-5.0, 800.0) - 795.0).abs() < 1e-4);
        assert_eq!(wrap_offset(12.0, 0.0), 0.0);
    }
}
