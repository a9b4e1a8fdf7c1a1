//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, and only for cosmetics (colors, spark bursts) -
//!   physics randomness is supplied by the caller
//! - Stable iteration order (drop order for balls, grid order for pegs)
//! - No rendering or platform dependencies

pub mod collision;
pub mod layout;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, ball_peg_collision, reflect_velocity, reflect_velocity_damped};
pub use layout::{generate_boxes, generate_pegs};
pub use state::{BALL_PALETTE, Ball, PEG_PALETTE, Particle, Peg, PlinkoState, Rgb, ScoreBox};
pub use tick::{SettleEvent, tick};
