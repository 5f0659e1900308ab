//! Game rules, kept free of scene state so they can be unit-tested directly:
//!   - pipe-gap placement bounds and pipe geometry
//!   - scoring predicate
//!   - reward tiers for leaderboard payouts

use crate::config::PhysicsConfig;
use super::entity::PipePair;
use super::physics::Rect;

/// Inclusive integer range for a pair's gap top.
///
/// Keeps `pipe_margin` clear at the top and `pipe_margin` between the gap
/// bottom and the ground, so the gap never touches the ground strip.
/// Collapses to a single value when the canvas is too small.
pub fn gap_top_bounds(p: &PhysicsConfig) -> (i32, i32) {
    let min = p.pipe_margin as i32;
    let max = (p.canvas_height - p.ground_height - p.pipe_gap - p.pipe_margin) as i32;
    (min, max.max(min))
}

/// Top-of-ground y coordinate.
#[inline]
pub fn ground_top(p: &PhysicsConfig) -> f32 {
    p.canvas_height - p.ground_height
}

/// Top and bottom obstacle boxes of a pair.
pub fn pipe_rects(pair: &PipePair, p: &PhysicsConfig) -> (Rect, Rect) {
    let left = pair.x - p.pipe_width / 2.0;
    let gap_bottom = pair.gap_top + p.pipe_gap;
    let top = Rect::new(left, 0.0, p.pipe_width, pair.gap_top);
    let bottom = Rect::new(left, gap_bottom, p.pipe_width, ground_top(p) - gap_bottom);
    (top, bottom)
}

/// Has the pair scrolled completely past the left edge?
#[inline]
pub fn is_offscreen(pair: &PipePair, p: &PhysicsConfig) -> bool {
    pair.x + p.pipe_width / 2.0 < 0.0
}

/// A pair scores once its centre is behind the bird's centre.
#[inline]
pub fn passed(pair: &PipePair, bird_x: f32) -> bool {
    pair.x < bird_x
}

/// Entries beyond this rank receive nothing and are omitted from exports.
pub const REWARD_RANKS: usize = 250;

/// Fixed payout tiers (whole USDC) by 1-based rank.
pub fn reward_for_rank(rank: usize) -> u32 {
    match rank {
        1 => 1000,
        2 => 550,
        3 => 350,
        4..=10 => 150,
        11..=50 => 60,
        51..=250 => 50,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gap_bounds() {
        assert_eq!(gap_top_bounds(&PhysicsConfig::default()), (100, 228));
    }

    #[test]
    fn gap_never_reaches_ground_or_top_margin() {
        let p = PhysicsConfig::default();
        let (min, max) = gap_top_bounds(&p);
        for gap_top in [min, max] {
            let pair = PipePair::new(400.0, gap_top as f32);
            let (top, bottom) = pipe_rects(&pair, &p);
            assert!(top.bottom() >= p.pipe_margin);
            assert!(bottom.top() + p.pipe_margin <= ground_top(&p));
            assert!(!bottom.is_empty());
        }
    }

    #[test]
    fn tiny_canvas_collapses_bounds() {
        let p = PhysicsConfig { canvas_height: 300.0, ..PhysicsConfig::default() };
        let (min, max) = gap_top_bounds(&p);
        assert_eq!(min, max);
    }

    #[test]
    fn pipe_rects_share_gap() {
        let p = PhysicsConfig::default();
        let (top, bottom) = pipe_rects(&PipePair::new(850.0, 150.0), &p);
        assert_eq!(top, Rect::new(824.0, 0.0, 52.0, 150.0));
        assert_eq!(bottom, Rect::new(824.0, 310.0, 52.0, 178.0));
        assert_eq!(bottom.top() - top.bottom(), 160.0);
    }

    #[test]
    fn offscreen_after_right_edge_passes_zero() {
        let p = PhysicsConfig::default();
        assert!(!is_offscreen(&PipePair::new(-25.0, 100.0), &p));
        assert!(is_offscreen(&PipePair::new(-27.0, 100.0), &p));
    }

    #[test]
    fn passed_is_strict() {
        assert!(!passed(&PipePair::new(100.0, 100.0), 100.0));
        assert!(passed(&PipePair::new(99.9, 100.0), 100.0));
    }

    #[test]
    fn reward_tiers() {
        assert_eq!(reward_for_rank(1), 1000);
        assert_eq!(reward_for_rank(2), 550);
        assert_eq!(reward_for_rank(3), 350);
        assert_eq!(reward_for_rank(4), 150);
        assert_eq!(reward_for_rank(10), 150);
        assert_eq!(reward_for_rank(11), 60);
        assert_eq!(reward_for_rank(50), 60);
        assert_eq!(reward_for_rank(51), 50);
        assert_eq!(reward_for_rank(250), 50);
        assert_eq!(reward_for_rank(251), 0);
        assert_eq!(reward_for_rank(0), 0);
    }
}
