//! Headless demo driver
//!
//! Drops a full budget of balls across the field and runs the fixed-step
//! simulation to settlement, logging the outcome. A renderer would
//! consume the same read-only state between steps.

use plinko_drop::consts::SIM_DT;
use plinko_drop::{GamePhase, Session, Tuning};

fn main() {
    env_logger::init();

    let seed = std::env::var("PLINKO_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);
    let tuning = match std::env::var("PLINKO_TUNING") {
        Ok(path) => Tuning::load_or_default(path),
        Err(_) => Tuning::default(),
    };
    log::info!("Plinko Drop (headless) starting, seed {seed}");

    let mut session = Session::new(tuning, seed);
    session.new_game();

    let width = session.playfield.tuning.playfield_width;
    let total = session.settings.balls_allowed;
    let mut dropped = 0u32;
    let mut ticks = 0u64;

    while session.phase == GamePhase::Playing {
        // Sweep drop positions across the field, one ball every quarter second
        if dropped < total && ticks % 15 == 0 {
            let x = width * (dropped as f32 + 0.5) / total as f32;
            session.drop_ball(x);
            dropped += 1;
        }

        for event in session.step(SIM_DT) {
            match event.box_index {
                Some(i) => log::info!(
                    "ball {} settled in box {i} for {} (x={:.1})",
                    event.ball_id,
                    event.value,
                    event.x
                ),
                None => log::info!("ball {} missed every box (x={:.1})", event.ball_id, event.x),
            }
        }

        ticks += 1;
        if ticks > 60 * 600 {
            log::warn!("session did not finish within the tick budget");
            break;
        }
    }

    log::info!(
        "game over after {ticks} ticks: score {} (best {})",
        session.score,
        session.best_score
    );
}
