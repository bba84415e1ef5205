//! Sweep-and-slide.
//!
//! The character is shape-cast along its displacement, stopped one contact
//! offset short of the first surface, and the rest of the displacement is
//! redirected along the surface. Up to [`MAX_SWEEP_PLANES`] planes are
//! resolved; the second plane forms a crease with the first.

use super::{
    settings::{DIRECTION_ROUNDING_DECIMALS, MAX_SWEEP_PLANES},
    solver::Solver,
    stair_step::solve_stair_steps,
    unstuck::solve_unstuck,
    types::Vec3,
};
use crate::{
    character::CharacterState,
    controller::CharacterEvent,
    utils::{normalize_or_zero, project_on_plane, round_toward_zero},
};

/// Summary of one sweep, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SweepReport {
    /// Sliding planes hit.
    pub planes: usize,
    /// Penetration resolves performed when a cast started embedded.
    pub unstuck_solves: u32,
    /// Stair steps climbed.
    pub stair_steps: usize,
    /// Displacement left unresolved when the sweep ended.
    pub residual: Vec3,
}

/// Shape of the corner formed by two sliding planes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    /// The planes face each other; only motion along their crease is possible.
    Acute,
    Obtuse,
}

/// Resolution of a displacement against the crease of two planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreaseResolution {
    pub corner: Corner,
    /// Remaining displacement, along the crease.
    pub delta: Vec3,
    /// Small position correction out of an obtuse corner.
    pub nudge: Vec3,
}

pub fn classify_corner(first_plane: Vec3, normal: Vec3) -> Corner {
    if round_toward_zero(first_plane.dot(&normal), DIRECTION_ROUNDING_DECIMALS) < 0.0 {
        Corner::Acute
    } else {
        Corner::Obtuse
    }
}

/// Constrain the displacement left after hitting `normal` to the crease it forms with `first_plane`.
///
/// `distance` is how far the character moved before hitting the second plane.
pub fn resolve_crease(
    first_plane: Vec3,
    normal: Vec3,
    delta: Vec3,
    distance: f32,
    gravity: Vec3,
    nudge_factor: f32,
) -> CreaseResolution {
    let mut wish =
        project_on_plane(normalize_or_zero(delta), first_plane) * (delta.norm() - distance).max(0.0);
    wish = project_on_plane(normalize_or_zero(wish), normal) * (wish.norm() - distance).max(0.0);

    let crease = normalize_or_zero(first_plane.cross(&normal));
    let crease_distance = wish.dot(&crease);

    let corner = classify_corner(first_plane, normal);
    let mut nudge = Vec3::zeros();
    if corner == Corner::Obtuse {
        // Falling into an obtuse corner can wedge the character; lift it out along the corner.
        let average = normalize_or_zero(normal + first_plane);
        let heading = normalize_or_zero(delta + average);
        if round_toward_zero(heading.dot(&gravity), DIRECTION_ROUNDING_DECIMALS) > 0.0 {
            nudge = average * nudge_factor;
        }
    }

    CreaseResolution {
        corner,
        delta: project_on_plane(crease, normal) * crease_distance,
        nudge,
    }
}

/// Move the character along `delta`, sliding along whatever it hits.
///
/// On return `delta` holds the unresolved remainder.
pub fn solve_sweep(solver: &Solver<'_>, state: &mut CharacterState, delta: &mut Vec3) -> SweepReport {
    let config = solver.config;
    let contact_offset = config.kinematic_contact_offset;
    let original_direction = normalize_or_zero(*delta);
    let orientation = state.transient.orientation;

    let mut report = SweepReport::default();
    let mut first_plane = Vec3::zeros();
    let mut i = 0;

    while i < MAX_SWEEP_PLANES {
        let direction = normalize_or_zero(*delta);
        if direction == Vec3::zeros() {
            break;
        }
        // Never slide back against the requested direction.
        if round_toward_zero(original_direction.dot(&direction), DIRECTION_ROUNDING_DECIMALS) < 0.0 {
            break;
        }

        let length = delta.norm();
        let Some(hit) = solver.cast_recording(
            &mut state.contacts,
            state.transient.position,
            orientation,
            direction,
            length + contact_offset,
            *delta,
        ) else {
            state.transient.position += *delta;
            *delta = Vec3::zeros();
            break;
        };
        state.events.push(CharacterEvent::Collision(hit));

        if hit.distance <= 0.0 && report.unstuck_solves < config.max_unstuck_iterations {
            let push = solve_unstuck(solver, state, contact_offset);
            state.transient.position += push;
            report.unstuck_solves += 1;
            continue;
        }

        let mut distance = (hit.distance - contact_offset).max(0.0);
        let mut normal = hit.normal;
        state.transient.position += direction * distance;

        if state.grounded {
            report.stair_steps += solve_stair_steps(solver, state, delta, &mut distance, &mut normal);
        }

        if i == 0 {
            first_plane = normal;
            *delta = project_on_plane(normalize_or_zero(*delta), normal)
                * (delta.norm() - distance).max(0.0);
        } else if i == 1 {
            let crease = resolve_crease(
                first_plane,
                normal,
                *delta,
                distance,
                state.gravity,
                config.obtuse_corner_nudge,
            );
            state.transient.position += crease.nudge;
            *delta = crease.delta;
        }

        // Damp what is left by how squarely the plane was hit.
        *delta *= 1.0 - normalize_or_zero(*delta).dot(&normal).abs();
        if !config.slide_skip_multiplier_while_airborne || state.grounded {
            *delta *= config.slide_multiplier;
            if config.slide_account_for_friction {
                if let Some(friction) = hit.friction {
                    *delta *= (1.0 - friction).clamp(0.0, 1.0);
                }
            }
        }

        report.planes += 1;
        i += 1;
    }

    report.residual = *delta;
    log::trace!("sweep: {report:?}");
    report
}
