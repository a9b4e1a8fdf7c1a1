//! Fixed timestep simulation step
//!
//! One call advances every spark, ball and scoring check atomically; a
//! renderer only ever reads state between calls.

use glam::Vec2;
use rand::Rng;

use super::collision::{ball_peg_collision, reflect_velocity_damped};
use super::state::{BALL_PALETTE, Particle, PlinkoState};

/// A ball that reached the scoring strip this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleEvent {
    pub ball_id: u32,
    /// Horizontal position at settlement (what the box match used)
    pub x: f32,
    /// Index of the winning box, or `None` for a zero-score drop
    pub box_index: Option<usize>,
    pub value: u32,
}

/// Advance the playfield by one fixed timestep of `dt` seconds
///
/// Returns the balls that settled this step, in drop order. Score
/// accumulation belongs to the caller.
pub fn tick(state: &mut PlinkoState, dt: f32) -> Vec<SettleEvent> {
    state.time_ticks += 1;

    // Age sparks before the balls move, so a burst spawned this step
    // first decays on the next one
    let particle_gravity = state.tuning.particle_gravity;
    for peg in &mut state.pegs {
        for particle in &mut peg.particles {
            particle.pos += particle.vel * dt;
            particle.vel.y += particle_gravity * dt;
            particle.lifetime = particle.lifetime.saturating_sub(1);
        }
        peg.particles.retain(|p| p.lifetime > 0);
    }

    let gravity = state.tuning.gravity;
    let max_speed = state.tuning.max_ball_speed;
    let wall_bounce = state.tuning.wall_bounce;
    let damping = state.tuning.peg_damping;
    let width = state.tuning.playfield_width;
    let strip_top = state.tuning.strip_top();

    // Contact points collected during the ball pass; bursts are spawned
    // afterwards (deferred to avoid borrow issues with the pegs)
    let mut contacts: Vec<(usize, Vec2)> = Vec::new();

    for ball in &mut state.balls {
        if ball.finalized {
            continue;
        }

        ball.vel.y += gravity * dt;
        ball.vel = ball.vel.clamp_length_max(max_speed);
        ball.pos += ball.vel * dt;

        // Side walls: clamp back in and reflect with energy loss
        if ball.pos.x - ball.radius < 0.0 {
            ball.pos.x = ball.radius;
            ball.vel.x = -ball.vel.x * wall_bounce;
        } else if ball.pos.x + ball.radius > width {
            ball.pos.x = width - ball.radius;
            ball.vel.x = -ball.vel.x * wall_bounce;
        }

        // Ceiling only; the floor is the scoring trigger, not a wall
        if ball.pos.y - ball.radius < 0.0 {
            ball.pos.y = ball.radius;
            ball.vel.y = -ball.vel.y * wall_bounce;
        }

        // Resolve against every peg in grid order. Each resolution is
        // local: push out to tangency, reflect through the normal, move
        // on. A ball overlapping several pegs resolves one by one.
        for (peg_idx, peg) in state.pegs.iter().enumerate() {
            let result = ball_peg_collision(ball.pos, ball.radius, peg.pos, peg.radius);
            if !result.hit {
                continue;
            }
            ball.pos += result.normal * result.penetration;
            ball.vel = reflect_velocity_damped(ball.vel, result.normal, damping);
            contacts.push((peg_idx, ball.pos));
        }

        if ball.pos.y + ball.radius >= strip_top {
            ball.finalized = true;
        }
    }

    // One spark burst per contact: a shared palette color, uniform
    // directions, uniform speeds. Sparks belong to the peg that was hit.
    let burst = state.tuning.particle_burst;
    let lifetime = state.tuning.particle_lifetime_ticks;
    let speed_min = state.tuning.particle_speed_min;
    let speed_max = state.tuning.particle_speed_max;
    for (peg_idx, contact) in contacts {
        let color = BALL_PALETTE[state.rng.random_range(0..BALL_PALETTE.len())];
        for _ in 0..burst {
            let speed = state.rng.random_range(speed_min..=speed_max);
            let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
            state.pegs[peg_idx].particles.push(Particle {
                pos: contact,
                vel: Vec2::new(speed * angle.cos(), speed * angle.sin()),
                color,
                lifetime,
            });
        }
    }

    // Transfer finalized balls out of the active set and into scoring.
    // First box whose span contains x and whose top is at or above the
    // ball's lower edge wins; no match is a deliberate zero-score drop.
    let mut events = Vec::new();
    let boxes = &state.boxes;
    state.balls.retain(|ball| {
        if !ball.finalized {
            return true;
        }
        let hit = boxes
            .iter()
            .enumerate()
            .find(|(_, b)| b.contains_x(ball.pos.x) && ball.pos.y + ball.radius >= b.top);
        let (box_index, value) = match hit {
            Some((i, b)) => (Some(i), b.value),
            None => (None, 0),
        };
        events.push(SettleEvent {
            ball_id: ball.id,
            x: ball.pos.x,
            box_index,
            value,
        });
        false
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    const EPS: f32 = 1e-3;

    fn field() -> PlinkoState {
        PlinkoState::new(Tuning::default(), 42)
    }

    fn open_field() -> PlinkoState {
        let mut state = field();
        state.pegs.clear();
        state
    }

    /// Run ticks until every ball has settled, returning all events
    fn run_to_settlement(state: &mut PlinkoState, max_ticks: u32) -> Vec<SettleEvent> {
        let mut events = Vec::new();
        for _ in 0..max_ticks {
            events.extend(tick(state, SIM_DT));
            if state.balls.is_empty() {
                return events;
            }
        }
        panic!("balls did not settle within {max_ticks} ticks");
    }

    #[test]
    fn speed_clamp_is_exact() {
        let mut state = open_field();
        state.spawn_ball(400.0, 0.0);
        state.balls[0].vel = Vec2::new(3000.0, 4000.0);

        tick(&mut state, SIM_DT);

        let speed = state.balls[0].vel.length();
        assert!((speed - state.tuning.max_ball_speed).abs() < EPS);
    }

    #[test]
    fn open_field_drop_lands_in_the_box_under_it() {
        // Scenario: no obstacles, dead drop above the center box
        let mut state = open_field();
        state.spawn_ball(400.0, 0.0);

        let max_speed = state.tuning.max_ball_speed;
        let mut events = Vec::new();
        for _ in 0..600 {
            events.extend(tick(&mut state, SIM_DT));
            for ball in &state.balls {
                assert!(ball.vel.length() <= max_speed + EPS);
                assert_eq!(ball.vel.x, 0.0);
            }
            if state.balls.is_empty() {
                break;
            }
        }

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].box_index, Some(2));
        assert_eq!(events[0].value, 50);
    }

    #[test]
    fn peg_hit_resolves_to_tangency_and_flips_vertical_velocity() {
        // Scenario: ball sunk into a lone peg from straight above,
        // moving straight down
        let mut state = open_field();
        let peg_pos = Vec2::new(400.0, 300.0);
        state.pegs.push(crate::sim::Peg {
            pos: peg_pos,
            radius: state.tuning.peg_radius,
            color: crate::sim::Rgb::RED,
            particles: Vec::new(),
        });

        state.spawn_ball(400.0, 0.0);
        let overlap = 6.0;
        let sum_radii = state.tuning.ball_radius + state.tuning.peg_radius;
        state.balls[0].pos = Vec2::new(400.0, peg_pos.y - (sum_radii - overlap));
        state.balls[0].vel = Vec2::new(0.0, 600.0);
        let incoming_vy = state.balls[0].vel.y;

        tick(&mut state, SIM_DT);

        let ball = &state.balls[0];
        let dist = (ball.pos - peg_pos).length();
        assert!((dist - sum_radii).abs() < EPS, "no residual overlap, got {dist}");
        assert!(ball.vel.y < 0.0, "vertical velocity should flip");
        assert!(ball.vel.y.abs() < incoming_vy + state.tuning.gravity * SIM_DT);
    }

    #[test]
    fn peg_bounce_cannot_gain_energy_through_the_normal() {
        let mut state = open_field();
        let peg_pos = Vec2::new(400.0, 300.0);
        state.pegs.push(crate::sim::Peg {
            pos: peg_pos,
            radius: state.tuning.peg_radius,
            color: crate::sim::Rgb::BLUE,
            particles: Vec::new(),
        });

        state.spawn_ball(400.0, 0.0);
        state.balls[0].pos = Vec2::new(400.0, 280.0);
        state.balls[0].vel = Vec2::new(0.0, 300.0);

        // Velocity entering the resolution includes this tick's gravity
        let v_in = (state.balls[0].vel.y + state.tuning.gravity * SIM_DT).abs();
        tick(&mut state, SIM_DT);
        let v_out = state.balls[0].vel.y.abs();
        assert!(v_out < v_in, "bounce gained energy: {v_out} >= {v_in}");
        assert!((v_out / v_in - state.tuning.peg_damping * 2.0 + 1.0).abs() < 1e-2);
    }

    #[test]
    fn peg_hit_spawns_a_burst_on_the_peg() {
        let mut state = open_field();
        let peg_pos = Vec2::new(400.0, 300.0);
        state.pegs.push(crate::sim::Peg {
            pos: peg_pos,
            radius: state.tuning.peg_radius,
            color: crate::sim::Rgb::GREEN,
            particles: Vec::new(),
        });

        state.spawn_ball(400.0, 0.0);
        state.balls[0].pos = Vec2::new(398.0, 285.0);
        state.balls[0].vel = Vec2::new(0.0, 300.0);

        tick(&mut state, SIM_DT);

        let burst = state.tuning.particle_burst as usize;
        assert_eq!(state.pegs[0].particles.len(), burst);
        let lifetime = state.tuning.particle_lifetime_ticks;
        assert!(state.pegs[0].particles.iter().all(|p| p.lifetime == lifetime));
        // Whole burst shares one color
        let first = state.pegs[0].particles[0].color;
        assert!(state.pegs[0].particles.iter().all(|p| p.color == first));
        let speed_min = state.tuning.particle_speed_min;
        let speed_max = state.tuning.particle_speed_max;
        for p in &state.pegs[0].particles {
            let speed = p.vel.length();
            assert!(speed >= speed_min - EPS && speed <= speed_max + EPS);
        }
    }

    #[test]
    fn particles_expire_after_exactly_their_lifetime() {
        let mut state = open_field();
        state.pegs.push(crate::sim::Peg {
            pos: Vec2::new(400.0, 300.0),
            radius: 12.0,
            color: crate::sim::Rgb::RED,
            particles: Vec::new(),
        });
        state.pegs[0].particles.push(Particle {
            pos: Vec2::new(400.0, 300.0),
            vel: Vec2::new(60.0, 0.0),
            color: crate::sim::Rgb::CYAN,
            lifetime: 5,
        });

        for step in 1..=4 {
            tick(&mut state, SIM_DT);
            assert_eq!(state.particle_count(), 1, "gone too early at step {step}");
        }
        tick(&mut state, SIM_DT);
        assert_eq!(state.particle_count(), 0, "retained past its lifetime");
    }

    #[test]
    fn finalized_ball_is_never_moved_again() {
        let mut state = field();
        state.spawn_ball(400.0, 0.0);
        state.balls[0].pos = Vec2::new(333.0, 250.0);
        state.balls[0].vel = Vec2::new(500.0, 500.0);
        state.balls[0].finalized = true;

        let events = tick(&mut state, SIM_DT);

        // Drained untouched: the settle position is exactly where it was
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].x, 333.0);
        assert!(state.balls.is_empty());
    }

    #[test]
    fn settle_scores_even_far_below_strip() {
        // Documented behavior: the box match has no lower y-bound, so a
        // ball that somehow finalizes far below the strip still scores
        let mut state = open_field();
        state.spawn_ball(400.0, 0.0);
        state.balls[0].pos = Vec2::new(400.0, state.tuning.playfield_height + 200.0);

        let events = tick(&mut state, SIM_DT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].box_index, Some(2));
        assert_eq!(events[0].value, 50);
    }

    #[test]
    fn settle_outside_all_boxes_scores_zero() {
        let mut state = open_field();
        state.spawn_ball(400.0, 0.0);
        state.balls[0].pos = Vec2::new(state.tuning.playfield_width + 100.0, 560.0);
        state.balls[0].finalized = true;

        let events = tick(&mut state, SIM_DT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].box_index, None);
        assert_eq!(events[0].value, 0);
        assert!(state.balls.is_empty());
    }

    #[test]
    fn one_ball_per_box_accumulates_the_full_value_table() {
        // Scenario: a dead drop centered in each box's span, no pegs
        let mut state = open_field();
        let centers: Vec<f32> = state
            .boxes
            .iter()
            .map(|b| (b.left + b.right) / 2.0)
            .collect();
        for x in centers {
            state.spawn_ball(x, 0.0);
        }

        let events = run_to_settlement(&mut state, 1200);
        let total: u32 = events.iter().map(|e| e.value).sum();
        assert_eq!(total, 10 + 20 + 50 + 20 + 10);
        assert!(events.iter().all(|e| e.box_index.is_some()));
    }

    #[test]
    fn reset_regenerates_the_field_and_clears_everything() {
        let mut state = field();
        state.spawn_ball(390.0, 40.0);
        state.spawn_ball(410.0, -40.0);
        for _ in 0..120 {
            tick(&mut state, SIM_DT);
        }

        state.reset_playfield();

        let expected: u32 = (0..state.tuning.peg_rows).map(|r| r + 3).sum();
        assert_eq!(state.pegs.len(), expected as usize);
        assert!(state.balls.is_empty());
        assert_eq!(state.particle_count(), 0);
    }

    #[test]
    fn full_field_drops_always_settle() {
        let mut state = field();
        for i in 0..10 {
            state.spawn_ball(80.0 + i as f32 * 72.0, if i % 2 == 0 { 90.0 } else { -90.0 });
        }
        let events = run_to_settlement(&mut state, 60 * 120);
        assert_eq!(events.len(), 10);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn speed_never_exceeds_the_cap(
            x in 12.0f32..788.0,
            vx in -1500.0f32..1500.0,
            vy in -1500.0f32..1500.0,
        ) {
            let mut state = field();
            state.spawn_ball(x, 0.0);
            state.balls[0].vel = Vec2::new(vx, vy);

            let max_speed = state.tuning.max_ball_speed;
            for _ in 0..240 {
                tick(&mut state, SIM_DT);
                for ball in &state.balls {
                    prop_assert!(ball.vel.length() <= max_speed + EPS);
                }
                if state.balls.is_empty() {
                    break;
                }
            }
        }

        #[test]
        fn walls_contain_every_ball(
            x in 12.0f32..788.0,
            vx in -1500.0f32..1500.0,
        ) {
            let mut state = field();
            state.spawn_ball(x, vx);

            let width = state.tuning.playfield_width;
            for _ in 0..600 {
                tick(&mut state, SIM_DT);
                for ball in &state.balls {
                    prop_assert!(ball.pos.x >= ball.radius - EPS);
                    prop_assert!(ball.pos.x <= width - ball.radius + EPS);
                }
                if state.balls.is_empty() {
                    break;
                }
            }
        }

        #[test]
        fn no_ball_ends_a_step_inside_a_peg(
            x in 12.0f32..788.0,
            vx in -600.0f32..600.0,
        ) {
            let mut state = field();
            state.spawn_ball(x, vx);

            for _ in 0..600 {
                tick(&mut state, SIM_DT);
                for ball in &state.balls {
                    for peg in &state.pegs {
                        let dist = (ball.pos - peg.pos).length();
                        prop_assert!(dist >= ball.radius + peg.radius - EPS);
                    }
                }
                if state.balls.is_empty() {
                    break;
                }
            }
        }
    }
}
