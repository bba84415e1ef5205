//! Stepping over obstacles no taller than the stair step distance.
//!
//! A step is tried when a grounded sweep hits something that is not walkable:
//! lift the character, move it forward over the obstacle, then drop it back
//! down onto whatever is there.

use super::{
    solver::Solver,
    types::{BodyKind, CollisionHit, Vec3},
};
use crate::{
    character::{CharacterState, StairStepGroundMode},
    utils::normalize_or_zero,
};

/// Climb as many consecutive steps as the configuration allows.
///
/// Stops as soon as a step does not gain height. Returns the steps taken.
pub fn solve_stair_steps(
    solver: &Solver<'_>,
    state: &mut CharacterState,
    delta: &mut Vec3,
    distance: &mut f32,
    sweep_normal: &mut Vec3,
) -> usize {
    let config = solver.config;
    if !config.allow_stair_stepping || state.attached_body.is_some() {
        return 0;
    }

    let up = -state.gravity;
    let mut steps = 0;
    while steps < config.max_stair_step_iterations as usize {
        let before = state.transient.position;
        if !solve_stair_step(solver, state, delta, distance, sweep_normal) {
            break;
        }
        steps += 1;
        log::debug!("stair step {steps} to {:?}", state.transient.position);
        if (state.transient.position - before).dot(&up) <= 0.0 {
            break;
        }
    }
    steps
}

/// One step attempt. On success moves the character and rewrites the sweep
/// inputs so the caller continues with the displacement left after the step.
pub fn solve_stair_step(
    solver: &Solver<'_>,
    state: &mut CharacterState,
    delta: &mut Vec3,
    distance: &mut f32,
    sweep_normal: &mut Vec3,
) -> bool {
    let config = solver.config;
    let contact_offset = config.kinematic_contact_offset;
    let gravity = state.gravity;
    let orientation = state.transient.orientation;
    let position = state.transient.position;

    let direction = normalize_or_zero(*delta);
    if direction == Vec3::zeros() || solver.is_stable_ground(*sweep_normal, gravity) {
        return false;
    }

    // Up, as far as the ceiling allows.
    let up_cast = config.stair_step_distance + contact_offset;
    let up_hit = solver
        .cast_recording(&mut state.contacts, position, orientation, -gravity, up_cast, *delta)
        .unwrap_or_else(|| CollisionHit::miss(up_cast));
    let climb = (up_hit.distance - contact_offset).max(0.0);
    if climb <= 0.0 {
        return false;
    }
    let mut raised = position - gravity * climb;

    // Forward, with whatever displacement the sweep has left.
    let forward = (delta.norm() - *distance).max(0.0);
    if forward <= 0.0 {
        return false;
    }
    let remaining = direction * forward;

    let forward_cast = forward + contact_offset;
    let forward_hit =
        solver.cast_recording(&mut state.contacts, raised, orientation, direction, forward_cast, *delta);
    let forward_trace = forward_hit.unwrap_or_else(|| CollisionHit::miss(forward_cast));
    let advance = (forward_trace.distance - contact_offset).max(0.0);
    if advance <= 0.0 || advance < config.stair_step_min_forward_distance {
        return false;
    }
    let blocked_by_dynamic = forward_trace
        .body
        .and_then(|body| solver.world.body(body))
        .is_some_and(|body| !body.kind.is_kinematic());
    if blocked_by_dynamic {
        return false;
    }
    raised += direction * advance;

    // Down, onto the step.
    let down_cast = config.stair_step_distance + contact_offset;
    let down_hit =
        solver.cast_recording(&mut state.contacts, raised, orientation, gravity, down_cast, *delta);
    let mode = config.stair_step_ground_mode;
    if down_hit.is_none() && mode != StairStepGroundMode::None {
        return false;
    }
    let landing = down_hit.unwrap_or_else(|| CollisionHit::miss(down_cast));
    let needs_stable = matches!(
        mode,
        StairStepGroundMode::RequireStableSolid | StairStepGroundMode::RequireStableGround
    );
    let needs_tag = matches!(
        mode,
        StairStepGroundMode::RequireGround | StairStepGroundMode::RequireStableGround
    );
    if needs_stable && !solver.is_stable_ground(landing.normal, gravity) {
        return false;
    }
    if needs_tag && !solver.has_ground_tag(&landing) {
        return false;
    }

    state.transient.position = raised + gravity * (landing.distance - contact_offset).max(0.0);
    *delta = remaining;
    *distance = advance;
    if let Some(hit) = forward_hit {
        *sweep_normal = hit.normal;
    }
    true
}
