//! Data-driven game balance
//!
//! Every dimension and physics constant the simulation reads comes in
//! through [`Tuning`] rather than a global, so tests and headless
//! harnesses can drive scaled-down fields without a display.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts;

/// Injected playfield configuration
///
/// `Default` reproduces the reference field: 800x600, eight peg rows,
/// five scoring boxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Playfield dimensions (px)
    pub playfield_width: f32,
    pub playfield_height: f32,

    // Ball physics
    pub ball_radius: f32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    pub max_ball_speed: f32,
    /// Fraction of speed kept on wall and ceiling bounces
    pub wall_bounce: f32,
    /// Fraction of the normal component kept on peg bounces
    pub peg_damping: f32,
    pub spawn_y: f32,
    /// Largest initial horizontal speed a dropped ball can get (px/s)
    pub spawn_vx: f32,

    // Peg grid
    pub peg_radius: f32,
    pub peg_spacing_x: f32,
    pub peg_spacing_y: f32,
    pub peg_offset_top: f32,
    pub peg_rows: u32,

    // Scoring strip
    pub box_count: u32,
    pub box_height: f32,
    /// Point values, cycled when boxes outnumber entries
    pub box_values: Vec<u32>,

    // Collision spark bursts
    pub particle_burst: u32,
    pub particle_lifetime_ticks: u32,
    pub particle_speed_min: f32,
    pub particle_speed_max: f32,
    pub particle_gravity: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            playfield_width: consts::PLAYFIELD_WIDTH,
            playfield_height: consts::PLAYFIELD_HEIGHT,

            ball_radius: consts::BALL_RADIUS,
            gravity: consts::GRAVITY,
            max_ball_speed: consts::MAX_BALL_SPEED,
            wall_bounce: consts::WALL_BOUNCE_FACTOR,
            peg_damping: consts::COLLISION_DAMPING,
            spawn_y: consts::SPAWN_Y,
            spawn_vx: consts::SPAWN_VX,

            peg_radius: consts::PEG_RADIUS,
            peg_spacing_x: consts::PEG_SPACING_X,
            peg_spacing_y: consts::PEG_SPACING_Y,
            peg_offset_top: consts::PEG_OFFSET_TOP,
            peg_rows: consts::NUM_PEG_ROWS,

            box_count: consts::BOX_COUNT,
            box_height: consts::BOX_HEIGHT,
            box_values: consts::BOX_VALUES.to_vec(),

            particle_burst: consts::PARTICLE_BURST,
            particle_lifetime_ticks: consts::PARTICLE_LIFETIME_TICKS,
            particle_speed_min: consts::PARTICLE_SPEED_MIN,
            particle_speed_max: consts::PARTICLE_SPEED_MAX,
            particle_gravity: consts::PARTICLE_GRAVITY,
        }
    }
}

impl Tuning {
    /// Top edge of the scoring strip; reaching it finalizes a ball
    #[inline]
    pub fn strip_top(&self) -> f32 {
        self.playfield_height - self.box_height
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(io::Error::other)
    }

    /// Load tuning from a JSON file, falling back to the reference values
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(&path) {
            Ok(tuning) => {
                log::info!("loaded tuning from {}", path.as_ref().display());
                tuning
            }
            Err(err) => {
                log::warn!("using default tuning: {err}");
                Self::default()
            }
        }
    }

    /// Write tuning to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strip_top_matches_reference_field() {
        let tuning = Tuning::default();
        assert_eq!(tuning.strip_top(), 520.0);
    }

    #[test]
    fn load_reads_saved_tuning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuning.json");

        let mut tuning = Tuning::default();
        tuning.peg_rows = 3;
        tuning.box_values = vec![5, 7];
        tuning.save(&path).unwrap();

        let loaded = Tuning::load(&path).unwrap();
        assert_eq!(loaded.peg_rows, 3);
        assert_eq!(loaded.box_values, vec![5, 7]);
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let tuning = Tuning::load_or_default("/definitely/not/here.json");
        assert_eq!(tuning.peg_rows, consts::NUM_PEG_ROWS);
    }
}
