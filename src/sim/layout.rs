//! Playfield generation: the triangular peg grid and the scoring strip

use glam::Vec2;
use rand::Rng;

use crate::tuning::Tuning;

use super::state::{PEG_PALETTE, Peg, ScoreBox};

/// Build the Galton grid
///
/// Row `r` holds `r + 3` pegs, horizontally centered on the playfield
/// with fixed spacing. Colors are cosmetic, drawn uniformly from the peg
/// palette; nothing random touches the geometry.
pub fn generate_pegs(tuning: &Tuning, rng: &mut impl Rng) -> Vec<Peg> {
    let mut pegs = Vec::new();
    for row in 0..tuning.peg_rows {
        let peg_count = row + 3;
        let row_width = (peg_count - 1) as f32 * tuning.peg_spacing_x;
        let start_x = (tuning.playfield_width - row_width) / 2.0;
        let y = tuning.peg_offset_top + row as f32 * tuning.peg_spacing_y;
        for i in 0..peg_count {
            let x = start_x + i as f32 * tuning.peg_spacing_x;
            let color = PEG_PALETTE[rng.random_range(0..PEG_PALETTE.len())];
            pegs.push(Peg {
                pos: Vec2::new(x, y),
                radius: tuning.peg_radius,
                color,
                particles: Vec::new(),
            });
        }
    }
    pegs
}

/// Partition the bottom strip into equal-width scoring boxes
///
/// The value table is cycled when boxes outnumber entries.
pub fn generate_boxes(tuning: &Tuning) -> Vec<ScoreBox> {
    let width = tuning.playfield_width / tuning.box_count as f32;
    let top = tuning.strip_top();
    (0..tuning.box_count)
        .map(|i| {
            let left = i as f32 * width;
            let value = if tuning.box_values.is_empty() {
                0
            } else {
                tuning.box_values[i as usize % tuning.box_values.len()]
            };
            ScoreBox {
                left,
                right: left + width,
                top,
                value,
            }
        })
        .collect()
}
