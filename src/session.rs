//! Game-shell state machine
//!
//! The thin layer input handling and rendering talk to: menu and pause
//! navigation, the ball budget, cumulative score and the session-best
//! score. The physics core underneath never sees any of these counters.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BALLS_ALLOWED, MAX_BALLS_ALLOWED, MIN_BALLS_ALLOWED};
use crate::sim::{PlinkoState, SettleEvent, tick};
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Menu,
    Playing,
    Paused,
    GameOver,
}

/// Player-adjustable knobs from the settings screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Outline drawing only; physics never reads this
    pub debug_overlay: bool,
    pub balls_allowed: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debug_overlay: false,
            balls_allowed: DEFAULT_BALLS_ALLOWED,
        }
    }
}

/// One play session: a playfield plus the counters around it
#[derive(Debug)]
pub struct Session {
    pub phase: GamePhase,
    pub playfield: PlinkoState,
    pub settings: SessionSettings,
    /// Running score for the current game
    pub score: u64,
    /// Best score this session; never persisted
    pub best_score: u64,
    pub balls_dropped: u32,
    pub game_over_reason: Option<&'static str>,
    /// Rolls the small random horizontal kick for dropped balls. Kept
    /// apart from the sim's cosmetics stream so mocking one cannot
    /// change the other.
    rng: Pcg32,
}

impl Session {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            phase: GamePhase::Menu,
            playfield: PlinkoState::new(tuning, seed),
            settings: SessionSettings::default(),
            score: 0,
            best_score: 0,
            balls_dropped: 0,
            game_over_reason: None,
            rng: Pcg32::seed_from_u64(seed ^ 0x5EED_BA11),
        }
    }

    /// Reset counters and playfield, then enter play
    pub fn new_game(&mut self) {
        self.score = 0;
        self.balls_dropped = 0;
        self.game_over_reason = None;
        self.playfield.reset_playfield();
        self.phase = GamePhase::Playing;
        log::info!("new game: {} balls", self.settings.balls_allowed);
    }

    /// Drop a ball at `x` with a small random horizontal kick
    ///
    /// No-op outside of play or once the budget is spent.
    pub fn drop_ball(&mut self, x: f32) -> Option<u32> {
        if self.phase != GamePhase::Playing || self.balls_dropped >= self.settings.balls_allowed {
            return None;
        }
        let spawn_vx = self.playfield.tuning.spawn_vx;
        let vx = self.rng.random_range(-spawn_vx..=spawn_vx);
        let id = self.playfield.spawn_ball(x, vx);
        self.balls_dropped += 1;
        log::debug!("ball {id} dropped at x={x:.1}");
        Some(id)
    }

    /// Advance the session by one fixed timestep
    ///
    /// Only the `Playing` phase simulates. Settle events are folded into
    /// the score here and also returned for UI feedback.
    pub fn step(&mut self, dt: f32) -> Vec<SettleEvent> {
        if self.phase != GamePhase::Playing {
            return Vec::new();
        }

        let events = tick(&mut self.playfield, dt);
        for event in &events {
            self.score += u64::from(event.value);
            match event.box_index {
                Some(i) => log::debug!("ball {} settled in box {i} for {}", event.ball_id, event.value),
                None => log::debug!("ball {} settled outside every box", event.ball_id),
            }
        }

        if self.balls_dropped == self.settings.balls_allowed && self.playfield.balls.is_empty() {
            self.game_over_reason = Some("All Balls Used");
            if self.score > self.best_score {
                self.best_score = self.score;
            }
            self.phase = GamePhase::GameOver;
            log::info!("game over: score {} (best {})", self.score, self.best_score);
        }

        events
    }

    /// Toggle between `Playing` and `Paused`; ignored elsewhere
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
    }

    /// Back out to the menu (from pause or game over)
    pub fn to_menu(&mut self) {
        self.phase = GamePhase::Menu;
    }

    /// Set the ball budget, clamped to the settings-screen range
    pub fn set_balls_allowed(&mut self, count: u32) {
        self.settings.balls_allowed = count.clamp(MIN_BALLS_ALLOWED, MAX_BALLS_ALLOWED);
    }

    /// Balls still available to drop
    pub fn balls_left(&self) -> u32 {
        self.settings.balls_allowed - self.balls_dropped
    }
}
