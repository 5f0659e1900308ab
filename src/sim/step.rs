//! The step function: advances a scene by one fixed tick.
//!
//! Processing order (Running):
//!   1. Flap input (velocity override)
//!   2. Bird integration (gravity)
//!   3. Pipe drift + off-screen culling
//!   4. Spawn timer (new pair enters at the right edge)
//!   5. Texture scrolling
//!   6. Scoring sweep (one pass over live pairs, per-pair `scored` flag)
//!   7. Collision checks (pipes, ground, top boundary)
//!
//! Once Ended, physics is frozen and only the end timers run:
//!   die cue after `die_delay_ms`, final report after `report_delay_ms`.

use rand::Rng;

use crate::domain::entity::{FrameInput, PipePair};
use crate::domain::physics;
use crate::domain::rules;
use super::event::GameEvent;
use super::scene::{GameScene, SceneState};

/// Background scroll (0.5 px per 60 Hz frame).
const BG_SCROLL_SPEED: f32 = 30.0;
/// Ground scroll (2 px per 60 Hz frame).
const GROUND_SCROLL_SPEED: f32 = 120.0;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(scene: &mut GameScene, input: FrameInput, dt_ms: u32) -> Vec<GameEvent> {
    scene.tick += 1;

    match scene.state {
        SceneState::Running => {
            let dt = dt_ms as f32 / 1000.0;
            if input.flap { scene.flap(); }
            resolve_bird(scene, dt);
            resolve_pipes(scene, dt);
            resolve_spawn(scene, dt_ms);
            resolve_scrolling(scene, dt);
            resolve_scoring(scene);
            resolve_collisions(scene);
        }
        SceneState::Ended => resolve_end_timers(scene, dt_ms),
    }

    scene.take_pending()
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_bird(scene: &mut GameScene, dt: f32) {
    let k = physics::integrate(scene.bird.kinematics(), scene.physics.gravity, dt);
    scene.bird.apply(k);
}

fn resolve_pipes(scene: &mut GameScene, dt: f32) {
    let vx = -scene.physics.pipe_speed;
    for pair in scene.pipes.iter_mut() {
        pair.x = physics::advance_x(pair.x, vx, dt);
    }
    let p = &scene.physics;
    scene.pipes.retain(|pair| !rules::is_offscreen(pair, p));
}

fn resolve_spawn(scene: &mut GameScene, dt_ms: u32) {
    let interval = scene.physics.spawn_interval_ms.max(1);
    scene.spawn_timer_ms += dt_ms;
    while scene.spawn_timer_ms >= interval {
        scene.spawn_timer_ms -= interval;
        spawn_pair(scene);
    }
}

/// Add one pair just beyond the right edge with a uniformly random gap.
pub(super) fn spawn_pair(scene: &mut GameScene) {
    let (min, max) = rules::gap_top_bounds(&scene.physics);
    let gap_top = scene.rng.gen_range(min..=max) as f32;
    let x = scene.physics.canvas_width + 50.0;
    scene.pipes.push(PipePair::new(x, gap_top));
}

fn resolve_scrolling(scene: &mut GameScene, dt: f32) {
    let period = scene.physics.canvas_width;
    scene.bg_offset = physics::wrap_offset(scene.bg_offset + BG_SCROLL_SPEED * dt, period);
    scene.ground_offset = physics::wrap_offset(scene.ground_offset + GROUND_SCROLL_SPEED * dt, period);
}

// ══════════════════════════════════════════════════════════════
// Scoring
// ══════════════════════════════════════════════════════════════

/// Single sweep over live pairs. The `scored` flag makes each pair count
/// at most once no matter how many ticks it spends behind the bird.
fn resolve_scoring(scene: &mut GameScene) {
    let bird_x = scene.bird.x;
    let mut gained = 0;
    for pair in scene.pipes.iter_mut() {
        if !pair.scored && rules::passed(pair, bird_x) {
            pair.scored = true;
            gained += 1;
        }
    }
    for _ in 0..gained {
        scene.score += 1;
        scene.pending.push(GameEvent::Scored { score: scene.score });
    }
}

// ══════════════════════════════════════════════════════════════
// Collisions
// ══════════════════════════════════════════════════════════════

fn resolve_collisions(scene: &mut GameScene) {
    if check_collision(scene) {
        scene.hit_obstacle();
    }
}

fn check_collision(scene: &GameScene) -> bool {
    let hitbox = scene.bird.hitbox();

    if hitbox.top() < 0.0 { return true; }
    if hitbox.overlaps(&scene.ground.rect()) { return true; }

    scene.pipes.iter().any(|pair| {
        let (top, bottom) = rules::pipe_rects(pair, &scene.physics);
        (!top.is_empty() && hitbox.overlaps(&top))
            || (!bottom.is_empty() && hitbox.overlaps(&bottom))
    })
}

// ══════════════════════════════════════════════════════════════
// End timers
// ══════════════════════════════════════════════════════════════

fn resolve_end_timers(scene: &mut GameScene, dt_ms: u32) {
    scene.since_end_ms = scene.since_end_ms.saturating_add(dt_ms);

    if !scene.die_cued && scene.since_end_ms >= scene.physics.die_delay_ms {
        scene.die_cued = true;
        scene.pending.push(GameEvent::Died);
    }
    if !scene.reported && scene.since_end_ms >= scene.physics.report_delay_ms {
        scene.reported = true;
        scene.pending.push(GameEvent::GameOver { score: scene.score });
    }
}
