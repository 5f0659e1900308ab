//! GameScene: one playable run, from spawn to final score.
//!
//! ## Lifecycle
//!
//!   Running ──(collision / ground / top boundary)──▶ Ended
//!
//! `Ended` is terminal for the instance. Playing again means building a
//! fresh scene; the controller drops the old one first, which releases
//! every timer it owns (all timers are plain counters on this struct).
//!
//! ## Context
//!
//! The scene never reads global session state. The controller hands it a
//! `SceneContext` (wallet address + mode) and a `ScoreSink` for the
//! competition-mode submission that fires at the moment of termination.

use std::rc::Rc;

use rand::rngs::StdRng;

use crate::config::PhysicsConfig;
use crate::domain::entity::{Bird, Ground, Mode, PipePair};
use crate::domain::rules;
use super::event::GameEvent;

/// Destination for scene-side score submissions (`POST /submit-score`).
/// Fire-and-forget: implementations must not block and cannot fail the run.
pub trait ScoreSink {
    fn submit_score(&self, wallet_address: &str, score: u32);
}

/// Per-run snapshot of the session.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneContext {
    pub wallet_address: String,
    pub mode: Mode,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SceneState {
    Running,
    Ended,
}

pub struct GameScene {
    pub ctx: SceneContext,
    pub physics: PhysicsConfig,
    pub state: SceneState,

    // ── Entities ──
    pub bird: Bird,
    /// Live pairs, oldest (leftmost) first.
    pub pipes: Vec<PipePair>,
    pub ground: Ground,

    // ── Run tracking ──
    pub score: u32,
    pub tick: u64,

    // ── Scrolling textures (presentation only) ──
    pub bg_offset: f32,
    pub ground_offset: f32,

    // ── Timers (simulated ms) ──
    pub(super) spawn_timer_ms: u32,
    pub(super) since_end_ms: u32,
    pub(super) die_cued: bool,
    pub(super) reported: bool,

    pub(super) pending: Vec<GameEvent>,
    pub(super) rng: StdRng,
    sink: Rc<dyn ScoreSink>,
}

impl GameScene {
    pub fn new(ctx: SceneContext, physics: PhysicsConfig, sink: Rc<dyn ScoreSink>, rng: StdRng) -> Self {
        let ground_top = rules::ground_top(&physics);
        let bird = Bird::new(
            physics.bird_x,
            physics.canvas_height / 2.0,
            physics.bird_width,
            physics.bird_height,
        );
        let ground = Ground {
            top: ground_top,
            height: physics.ground_height,
            width: physics.canvas_width,
        };
        tracing::debug!(mode = ?ctx.mode, "scene created");

        GameScene {
            ctx,
            physics,
            state: SceneState::Running,
            bird,
            pipes: Vec::new(),
            ground,
            score: 0,
            tick: 0,
            bg_offset: 0.0,
            ground_offset: 0.0,
            spawn_timer_ms: 0,
            since_end_ms: 0,
            die_cued: false,
            reported: false,
            pending: vec![GameEvent::Started],
            rng,
            sink,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == SceneState::Running
    }

    /// Flap: override vertical velocity with the fixed impulse.
    /// No-op once the run has ended.
    pub fn flap(&mut self) {
        if !self.is_running() { return; }
        self.bird.vy = self.physics.flap_velocity;
        self.pending.push(GameEvent::Flapped);
    }

    /// Terminal collision handler. Idempotent: only the first call after
    /// `Running` has any effect.
    ///
    /// Freezes physics, tints the bird, and in Competition mode submits
    /// the final score immediately through the scene's sink.
    pub fn hit_obstacle(&mut self) {
        if !self.is_running() { return; }
        self.state = SceneState::Ended;
        self.bird.tinted = true;
        self.since_end_ms = 0;
        self.pending.push(GameEvent::Hit);

        let final_score = self.score;
        tracing::info!(score = final_score, mode = ?self.ctx.mode, "run ended");
        if self.ctx.mode == Mode::Competition {
            self.sink.submit_score(&self.ctx.wallet_address, final_score);
        }
    }

    /// Events queued since the last step (scene creation, external flaps
    /// and collisions). `step` drains these together with its own.
    pub(super) fn take_pending(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::scene_with;
    use super::*;

    #[test]
    fn new_scene_starts_running_at_zero() {
        let (scene, _) = scene_with(Mode::Practice, PhysicsConfig::default());
        assert!(scene.is_running());
        assert_eq!(scene.score, 0);
        assert!(scene.pipes.is_empty());
        assert_eq!(scene.bird.y, 300.0);
        assert_eq!(scene.ground.top, 488.0);
    }

    #[test]
    fn flap_overrides_velocity() {
        let (mut scene, _) = scene_with(Mode::Practice, PhysicsConfig::default());
        for prior in [500.0, -100.0, 0.0, -350.0, 1234.5] {
            scene.bird.vy = prior;
            scene.flap();
            assert_eq!(scene.bird.vy, -350.0);
        }
    }

    #[test]
    fn flap_ignored_after_end() {
        let (mut scene, _) = scene_with(Mode::Practice, PhysicsConfig::default());
        scene.hit_obstacle();
        scene.bird.vy = 42.0;
        scene.flap();
        assert_eq!(scene.bird.vy, 42.0);
    }

    #[test]
    fn hit_is_idempotent_and_submits_once() {
        let (mut scene, sink) = scene_with(Mode::Competition, PhysicsConfig::default());
        scene.score = 3;
        for _ in 0..5 {
            scene.hit_obstacle();
        }
        assert_eq!(scene.state, SceneState::Ended);
        assert!(scene.bird.tinted);
        assert_eq!(*sink.calls.borrow(), vec![("0xabc".to_string(), 3)]);
        let hits = scene.take_pending().iter().filter(|e| **e == GameEvent::Hit).count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn practice_never_submits() {
        let (mut scene, sink) = scene_with(Mode::Practice, PhysicsConfig::default());
        scene.hit_obstacle();
        assert!(sink.calls.borrow().is_empty());
    }
}
