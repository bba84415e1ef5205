//! Contacts with dynamic bodies and the impulses pushed back onto them.

use super::{
    query::PhysicsBodies,
    types::{RigidBodyContact, Vec3},
};
use crate::{
    character::{CharacterConfig, CharacterState, RigidBodyInteractionMode},
    controller::CharacterEvent,
    utils::project_on_plane,
};

/// Outcome of [`ContactBuffer::record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactRecord {
    Recorded,
    /// The body already has a contact this tick.
    Duplicate,
    /// The buffer is full; the contact was dropped.
    Overflow,
}

/// Fixed-capacity list of dynamic-body contacts, one per body, valid for one tick.
#[derive(Clone, Debug)]
pub struct ContactBuffer {
    contacts: Vec<RigidBodyContact>,
    capacity: usize,
    dropped: usize,
}

impl ContactBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            contacts: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn record(&mut self, contact: RigidBodyContact) -> ContactRecord {
        if self.contacts.iter().any(|c| c.body == contact.body) {
            return ContactRecord::Duplicate;
        }
        if self.contacts.len() >= self.capacity {
            self.dropped += 1;
            return ContactRecord::Overflow;
        }
        self.contacts.push(contact);
        ContactRecord::Recorded
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
        self.dropped = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &RigidBodyContact> {
        self.contacts.iter()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts rejected because the buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Push every touched dynamic body according to the interaction mode.
///
/// The body the character stands on is skipped so it is not pushed from under
/// the character. Returns the number of contacts handled.
pub fn solve_rigid_body_interactions(
    bodies: &mut dyn PhysicsBodies,
    config: &CharacterConfig,
    state: &mut CharacterState,
) -> usize {
    let mode = config.rigid_body_interaction_mode;
    if mode == RigidBodyInteractionMode::None {
        return 0;
    }

    let mut handled = 0;
    for contact in state.contacts.iter() {
        if Some(contact.body) == state.attached_body {
            continue;
        }
        handled += 1;

        if mode == RigidBodyInteractionMode::Manual {
            state
                .events
                .push(CharacterEvent::RigidBodyInteraction(*contact));
            continue;
        }

        let Some(body) = bodies.body(contact.body) else {
            continue;
        };
        let mass_ratio = match mode {
            RigidBodyInteractionMode::SimulateKinematic => {
                let total = config.simulated_mass + body.mass;
                if total > 0.0 {
                    config.simulated_mass / total
                } else {
                    0.0
                }
            }
            _ => 1.0,
        };
        let force: Vec3 =
            project_on_plane(contact.character_velocity, state.gravity) * config.simulated_mass;
        log::trace!("pushing body {:?} with {:?}", contact.body, force * mass_ratio);
        bodies.apply_impulse_at_point(contact.body, force * mass_ratio, contact.point);
    }
    handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::{
            KinematicTransform,
            testing::TestWorld,
            types::{BodyKind, BodyState},
        },
        handle::BodyId,
    };
    use approx::assert_relative_eq;

    fn contact(body: BodyId, velocity: Vec3) -> RigidBodyContact {
        RigidBodyContact {
            body,
            point: Vec3::new(1.0, 0.0, 0.0),
            normal: -Vec3::x(),
            character_velocity: velocity,
            body_velocity: Vec3::zeros(),
        }
    }

    fn crate_body(mass: f32) -> BodyState {
        BodyState {
            kind: BodyKind::Dynamic,
            mass,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            center_of_mass: Vec3::zeros(),
        }
    }

    #[test]
    fn buffer_dedupes_and_overflows() {
        let mut buffer = ContactBuffer::with_capacity(2);
        let a = BodyId::from_raw_parts(1, 0);
        let b = BodyId::from_raw_parts(2, 0);
        let c = BodyId::from_raw_parts(3, 0);

        assert_eq!(buffer.record(contact(a, Vec3::x())), ContactRecord::Recorded);
        assert_eq!(buffer.record(contact(a, Vec3::y())), ContactRecord::Duplicate);
        assert_eq!(buffer.record(contact(b, Vec3::x())), ContactRecord::Recorded);
        assert_eq!(buffer.record(contact(c, Vec3::x())), ContactRecord::Overflow);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.dropped(), 1);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.dropped(), 0);
    }

    fn state_with(contacts: &[RigidBodyContact]) -> CharacterState {
        let mut state = CharacterState::new(KinematicTransform::default(), 8);
        for c in contacts {
            state.contacts.record(*c);
        }
        state
    }

    #[test]
    fn pure_kinematic_pushes_along_the_ground_plane() {
        let mut world = TestWorld::new();
        let body = world.add_body(crate_body(50.0));
        let mut state = state_with(&[contact(body, Vec3::new(2.0, -1.0, 0.0))]);
        let config = CharacterConfig::default();

        let handled = solve_rigid_body_interactions(&mut world, &config, &mut state);

        assert_eq!(handled, 1);
        assert_eq!(world.impulses.len(), 1);
        let (target, impulse, point) = world.impulses[0];
        assert_eq!(target, body);
        // Vertical part removed, scaled by simulated mass.
        assert_relative_eq!(impulse, Vec3::new(2000.0, 0.0, 0.0), epsilon = 1.0e-3);
        assert_relative_eq!(point, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn simulate_kinematic_scales_by_mass_ratio() {
        let mut world = TestWorld::new();
        let body = world.add_body(crate_body(3000.0));
        let mut state = state_with(&[contact(body, Vec3::x())]);
        let config = CharacterConfig {
            rigid_body_interaction_mode: RigidBodyInteractionMode::SimulateKinematic,
            ..CharacterConfig::default()
        };

        solve_rigid_body_interactions(&mut world, &config, &mut state);

        // 1000 / (1000 + 3000) of the full push.
        assert_relative_eq!(world.impulses[0].1, Vec3::new(250.0, 0.0, 0.0), epsilon = 1.0e-3);
    }

    #[test]
    fn manual_mode_forwards_contacts_as_events() {
        let mut world = TestWorld::new();
        let body = world.add_body(crate_body(10.0));
        let c = contact(body, Vec3::x());
        let mut state = state_with(&[c]);
        let config = CharacterConfig {
            rigid_body_interaction_mode: RigidBodyInteractionMode::Manual,
            ..CharacterConfig::default()
        };

        solve_rigid_body_interactions(&mut world, &config, &mut state);

        assert!(world.impulses.is_empty());
        assert_eq!(state.events, vec![CharacterEvent::RigidBodyInteraction(c)]);
    }

    #[test]
    fn attached_body_and_none_mode_are_skipped() {
        let mut world = TestWorld::new();
        let body = world.add_body(crate_body(10.0));
        let mut state = state_with(&[contact(body, Vec3::x())]);
        state.attached_body = Some(body);

        let handled =
            solve_rigid_body_interactions(&mut world, &CharacterConfig::default(), &mut state);
        assert_eq!(handled, 0);

        state.attached_body = None;
        let none = CharacterConfig {
            rigid_body_interaction_mode: RigidBodyInteractionMode::None,
            ..CharacterConfig::default()
        };
        assert_eq!(solve_rigid_body_interactions(&mut world, &none, &mut state), 0);
        assert!(world.impulses.is_empty());
    }
}
