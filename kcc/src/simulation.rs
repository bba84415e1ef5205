//! Registration-ordered stepping of movers and characters.
//!
//! Movers run first so characters see this tick's platform velocities. Each
//! character then commits its pose before the next one sweeps, so the order of
//! registration decides who wins when two characters walk into each other.

use crate::{
    character::Character,
    collision::CollisionWorld,
    controller::CharacterController,
    error::TickError,
    movement::TickOutcome,
    mover::{KinematicMover, MoverController},
};

/// Key of a registered character. Keys are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterKey(u64);

/// Key of a registered mover. Keys are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoverKey(u64);

struct CharacterEntry {
    key: CharacterKey,
    character: Character,
    controller: Option<Box<dyn CharacterController>>,
}

struct MoverEntry {
    key: MoverKey,
    mover: KinematicMover,
    controller: Box<dyn MoverController>,
}

#[derive(Default)]
pub struct Simulation {
    characters: Vec<CharacterEntry>,
    movers: Vec<MoverEntry>,
    next_key: u64,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Add a character at the end of the tick order.
    pub fn register_character(
        &mut self,
        character: Character,
        controller: Option<Box<dyn CharacterController>>,
    ) -> CharacterKey {
        let key = CharacterKey(self.allocate_key());
        self.characters.push(CharacterEntry {
            key,
            character,
            controller,
        });
        key
    }

    /// Remove a character, keeping the order of the others.
    pub fn unregister_character(&mut self, key: CharacterKey) -> Option<Character> {
        let index = self.characters.iter().position(|e| e.key == key)?;
        Some(self.characters.remove(index).character)
    }

    pub fn set_character_controller(
        &mut self,
        key: CharacterKey,
        controller: Box<dyn CharacterController>,
    ) -> bool {
        match self.characters.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.controller = Some(controller);
                true
            }
            None => false,
        }
    }

    pub fn character(&self, key: CharacterKey) -> Option<&Character> {
        self.characters
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.character)
    }

    pub fn character_mut(&mut self, key: CharacterKey) -> Option<&mut Character> {
        self.characters
            .iter_mut()
            .find(|e| e.key == key)
            .map(|e| &mut e.character)
    }

    /// Characters in tick order.
    pub fn characters(&self) -> impl Iterator<Item = (CharacterKey, &Character)> {
        self.characters.iter().map(|e| (e.key, &e.character))
    }

    pub fn register_mover(
        &mut self,
        mover: KinematicMover,
        controller: Box<dyn MoverController>,
    ) -> MoverKey {
        let key = MoverKey(self.allocate_key());
        self.movers.push(MoverEntry {
            key,
            mover,
            controller,
        });
        key
    }

    pub fn unregister_mover(&mut self, key: MoverKey) -> Option<KinematicMover> {
        let index = self.movers.iter().position(|e| e.key == key)?;
        Some(self.movers.remove(index).mover)
    }

    pub fn mover(&self, key: MoverKey) -> Option<&KinematicMover> {
        self.movers
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.mover)
    }

    pub fn mover_mut(&mut self, key: MoverKey) -> Option<&mut KinematicMover> {
        self.movers
            .iter_mut()
            .find(|e| e.key == key)
            .map(|e| &mut e.mover)
    }

    /// Advance every mover, then every character, by `dt` seconds.
    ///
    /// Returns one result per character in tick order. A character without a
    /// controller yields [`TickError::MissingController`] and is not moved.
    /// A non-positive `dt` steps nothing.
    pub fn step<W: CollisionWorld>(
        &mut self,
        world: &mut W,
        dt: f32,
    ) -> Vec<(CharacterKey, Result<TickOutcome, TickError>)> {
        if dt <= 0.0 {
            log::trace!("skipping step with dt {dt}");
            return Vec::new();
        }

        for entry in &mut self.movers {
            entry.mover.tick(&mut *world, entry.controller.as_mut(), dt);
        }

        let mut results = Vec::with_capacity(self.characters.len());
        for entry in &mut self.characters {
            let result = match entry.controller.as_deref_mut() {
                Some(controller) => entry.character.tick(&mut *world, controller, dt),
                None => {
                    log::warn!("character {:?} has no controller, skipping", entry.key);
                    Err(TickError::MissingController)
                }
            };
            results.push((entry.key, result));
        }
        results
    }
}
