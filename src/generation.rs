//! Double-buffered particle generations.
//!
//! Two full [`ParticleStore`]s alternate between the *read* role (the stable
//! state from the end of the previous step) and the *write* role (the state
//! being produced). Only the write generation is ever mutated during a step,
//! so a consumer holding the read generation never sees a half-updated
//! state, and integration needs no locks.

use crate::error::Result;
use crate::integrator::{self, Backend, IntegrationParams};
use crate::spawn::EmissionSpec;
use crate::store::{EmitOutcome, ParticleStore};

/// Which generation currently holds the stable state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    AIsRead,
    BIsRead,
}

impl Role {
    #[inline]
    fn read_index(self) -> usize {
        match self {
            Role::AIsRead => 0,
            Role::BIsRead => 1,
        }
    }

    #[inline]
    fn flipped(self) -> Self {
        match self {
            Role::AIsRead => Role::BIsRead,
            Role::BIsRead => Role::AIsRead,
        }
    }
}

/// Generations A and B plus the role state machine.
#[derive(Clone, Debug)]
pub struct GenerationPair {
    generations: [ParticleStore; 2],
    role: Role,
}

impl GenerationPair {
    /// Two zeroed generations of `capacity` slots each, A read.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            generations: [ParticleStore::new(capacity)?, ParticleStore::new(capacity)?],
            role: Role::AIsRead,
        })
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.generations[0].capacity()
    }

    /// The stable generation.
    #[inline]
    pub fn read(&self) -> &ParticleStore {
        &self.generations[self.role.read_index()]
    }

    /// The generation being produced.
    #[inline]
    pub fn write(&self) -> &ParticleStore {
        &self.generations[1 - self.role.read_index()]
    }

    /// Borrow the read generation shared and the write generation mutably.
    pub fn split(&mut self) -> (&ParticleStore, &mut ParticleStore) {
        let [a, b] = &mut self.generations;
        match self.role {
            Role::AIsRead => (&*a, b),
            Role::BIsRead => (&*b, a),
        }
    }

    /// Produce the write generation from the read generation.
    pub fn integrate(&mut self, params: &IntegrationParams, seed: u64, backend: Backend) {
        let (read, write) = self.split();
        integrator::integrate(read, write, params, seed, backend);
    }

    /// Emit into the write generation.
    pub fn emit(&mut self, spec: &EmissionSpec) -> EmitOutcome {
        let (_, write) = self.split();
        write.emit(spec)
    }

    /// Hand the freshly produced generation over to readers.
    pub fn swap(&mut self) {
        self.role = self.role.flipped();
    }

    /// Emit straight into the read generation.
    ///
    /// Only valid before the first step, to populate the chamber at startup.
    pub(crate) fn seed(&mut self, spec: &EmissionSpec) -> EmitOutcome {
        let index = self.role.read_index();
        self.generations[index].emit(spec)
    }

    /// Deactivate every slot in both generations and return to A-is-read.
    pub fn reset(&mut self) {
        for generation in &mut self.generations {
            generation.reset();
        }
        self.role = Role::AIsRead;
    }
}
