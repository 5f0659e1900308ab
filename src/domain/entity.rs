//! Entities: the bird (player body), pipe pairs, and the ground strip.
//! Plain data; behaviour lives in `sim::step`.

use super::physics::{Kinematics, Rect};

/// Game mode for a run. Only Competition runs reach the leaderboard.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Mode {
    #[default]
    Practice,
    Competition,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Practice => "PRACTICE",
            Mode::Competition => "COMPETITION",
        }
    }
}

/// Frame input: a flap is edge-triggered (fresh press or click only).
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub flap: bool,
}

/// The player body. Horizontal position is fixed; only y moves.
#[derive(Clone, Debug)]
pub struct Bird {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    /// Red failure tint, set once the run ends.
    pub tinted: bool,
}

impl Bird {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Bird { x, y, vy: 0.0, width, height, tinted: false }
    }

    pub fn hitbox(&self) -> Rect {
        Rect::centered(self.x, self.y, self.width, self.height)
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics { y: self.y, vy: self.vy }
    }

    pub fn apply(&mut self, k: Kinematics) {
        self.y = k.y;
        self.vy = k.vy;
    }
}

/// Two obstacles sharing one gap. `x` is the horizontal centre of both pipes.
#[derive(Clone, Debug, PartialEq)]
pub struct PipePair {
    pub x: f32,
    pub gap_top: f32,
    /// Set the first time the bird passes this pair; never cleared.
    pub scored: bool,
}

impl PipePair {
    pub fn new(x: f32, gap_top: f32) -> Self {
        PipePair { x, gap_top, scored: false }
    }
}

/// The looping ground strip. Solid across the full canvas width.
#[derive(Clone, Debug)]
pub struct Ground {
    pub top: f32,
    pub height: f32,
    pub width: f32,
}

impl Ground {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, self.top, self.width, self.height)
    }
}
