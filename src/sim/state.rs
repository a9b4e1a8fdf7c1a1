//! Simulation state and entity types
//!
//! Everything a renderer reads between steps lives here as plain public
//! fields: positions, radii, colors.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

use super::layout;

/// An sRGB color from the fixed arcade palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const CYAN: Rgb = Rgb::new(0, 255, 255);
    pub const MAGENTA: Rgb = Rgb::new(255, 0, 255);
    pub const ORANGE: Rgb = Rgb::new(255, 165, 0);
    pub const PURPLE: Rgb = Rgb::new(128, 0, 128);
}

/// Peg colors are drawn from this table at layout time
pub const PEG_PALETTE: [Rgb; 5] = [Rgb::RED, Rgb::BLUE, Rgb::GREEN, Rgb::ORANGE, Rgb::PURPLE];

/// Dropped balls and collision sparks share the bright half of the palette
pub const BALL_PALETTE: [Rgb; 5] = [Rgb::WHITE, Rgb::YELLOW, Rgb::BLUE, Rgb::CYAN, Rgb::MAGENTA];

/// A short-lived collision spark
///
/// Purely cosmetic: sparks never touch physics or score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Rgb,
    /// Remaining ticks; pruned the step this reaches zero
    pub lifetime: u32,
}

/// A falling ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Rgb,
    /// One-way flag, set when the lower edge reaches the scoring strip.
    /// A finalized ball is never simulated again, only drained into
    /// scoring at the end of the step.
    pub finalized: bool,
}

/// A fixed circular obstacle. Owns the sparks spawned at its location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peg {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Rgb,
    pub particles: Vec<Particle>,
}

/// One scoring slot at the bottom of the playfield
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBox {
    pub left: f32,
    pub right: f32,
    /// Top edge; shared with the finalization trigger height
    pub top: f32,
    pub value: u32,
}

impl ScoreBox {
    /// Horizontal span test used for scoring (inclusive on both edges)
    #[inline]
    pub fn contains_x(&self, x: f32) -> bool {
        self.left <= x && x <= self.right
    }
}

/// Cosmetics RNG seed, kept for snapshots
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete simulation state
///
/// All mutable collections are owned here and mutated only by
/// [`tick`](super::tick::tick) and the explicit spawn/reset operations,
/// so one full step is always visible before a renderer reads anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlinkoState {
    pub tuning: Tuning,
    /// Seed of the cosmetics stream
    pub rng_state: RngState,
    /// Fixed obstacles in grid order (row-major, top to bottom)
    pub pegs: Vec<Peg>,
    /// Active balls in drop order
    pub balls: Vec<Ball>,
    /// Scoring slots, left to right
    pub boxes: Vec<ScoreBox>,
    /// Simulation tick counter
    pub time_ticks: u64,
    next_id: u32,
    /// Live cosmetics stream; restarts from `rng_state` after deserialize
    #[serde(skip, default = "default_rng")]
    pub(crate) rng: Pcg32,
}

impl PlinkoState {
    /// Create a fresh playfield with the given cosmetics seed
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let pegs = layout::generate_pegs(&tuning, &mut rng);
        let boxes = layout::generate_boxes(&tuning);
        Self {
            tuning,
            rng_state,
            pegs,
            balls: Vec::new(),
            boxes,
            time_ticks: 0,
            next_id: 1,
            rng,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Drop a new ball at `x`, just below the ceiling
    ///
    /// The caller supplies `initial_vx` so the cosmetics stream never
    /// feeds physics. Budget enforcement is also the caller's concern.
    pub fn spawn_ball(&mut self, x: f32, initial_vx: f32) -> u32 {
        let id = self.next_entity_id();
        let color = BALL_PALETTE[self.rng.random_range(0..BALL_PALETTE.len())];
        self.balls.push(Ball {
            id,
            pos: Vec2::new(x, self.tuning.spawn_y),
            vel: Vec2::new(initial_vx, 0.0),
            radius: self.tuning.ball_radius,
            color,
            finalized: false,
        });
        id
    }

    /// Regenerate the peg layout and clear all balls and sparks
    ///
    /// Score and session counters are untouched; they belong to the
    /// caller.
    pub fn reset_playfield(&mut self) {
        self.pegs = layout::generate_pegs(&self.tuning, &mut self.rng);
        self.boxes = layout::generate_boxes(&self.tuning);
        self.balls.clear();
    }

    /// Total live sparks across all pegs
    pub fn particle_count(&self) -> usize {
        self.pegs.iter().map(|p| p.particles.len()).sum()
    }
}
