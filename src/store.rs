//! Fixed-capacity particle store.
//!
//! Slots are recycled with a ring cursor rather than a free-list scan:
//! `emit` always writes the slot under the cursor and advances it, wrapping
//! at capacity. Emission is O(1) and the live count can never exceed the
//! capacity. Under sustained overload the oldest slot is retired to make
//! room, and a particle that was still alive there vanishes without a
//! terminal fade.

use bytemuck::Zeroable;

use crate::error::{ChamberError, Result};
use crate::particle::Particle;
use crate::spawn::EmissionSpec;

/// Where an emission landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmitOutcome {
    /// Slot index that received the particle.
    pub slot: usize,
    /// Whether that slot held a live particle that was discarded.
    pub overwrote_active: bool,
}

/// One generation of particle state: `N` slots plus the emission cursor.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    slots: Vec<Particle>,
    emit_ptr: usize,
}

impl ParticleStore {
    /// Allocate `capacity` inactive slots.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ChamberError::InvalidConfig(
                "particle capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            slots: vec![Particle::zeroed(); capacity],
            emit_ptr: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot the next emission will overwrite.
    #[inline]
    pub fn emit_ptr(&self) -> usize {
        self.emit_ptr
    }

    /// Write a new particle under the cursor and advance it.
    ///
    /// Every field of the slot is replaced, whatever it held before.
    pub fn emit(&mut self, spec: &EmissionSpec) -> EmitOutcome {
        let slot = self.emit_ptr;
        let overwrote_active = self.slots[slot].is_active();
        self.slots[slot] = Particle::from_spec(spec);
        self.emit_ptr = (slot + 1) % self.slots.len();
        EmitOutcome {
            slot,
            overwrote_active,
        }
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&Particle> {
        self.slots.get(slot)
    }

    #[inline]
    pub fn slots(&self) -> &[Particle] {
        &self.slots
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Particle] {
        &mut self.slots
    }

    pub(crate) fn set_emit_ptr(&mut self, emit_ptr: usize) {
        self.emit_ptr = emit_ptr % self.slots.len();
    }

    /// Live particles, in slot order.
    pub fn active(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter(|p| p.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Deactivate every slot and rewind the cursor.
    pub fn reset(&mut self) {
        self.slots.fill(Particle::zeroed());
        self.emit_ptr = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isotope::ParticleKind;
    use glam::Vec3;

    fn spec(x: f32, kind: ParticleKind) -> EmissionSpec {
        EmissionSpec {
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::new(0.0, x, 0.0),
            life: 1.0 + x,
            kind,
            size: 2.0 * x,
            brightness: 0.5 * x,
            charge_scale: x,
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(ParticleStore::new(0), Err(ChamberError::InvalidConfig(_))));
    }

    #[test]
    fn test_emit_advances_cursor() {
        let mut store = ParticleStore::new(3).unwrap();
        assert_eq!(store.emit(&spec(1.0, ParticleKind::Alpha)).slot, 0);
        assert_eq!(store.emit(&spec(2.0, ParticleKind::Alpha)).slot, 1);
        assert_eq!(store.emit_ptr(), 2);
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_ring_overwrite_replaces_every_field() {
        let n = 4;
        let mut store = ParticleStore::new(n).unwrap();
        for i in 0..n {
            let outcome = store.emit(&spec(i as f32 + 1.0, ParticleKind::Alpha));
            assert!(!outcome.overwrote_active);
        }
        assert_eq!(store.emit_ptr(), 0);

        let replacement = spec(100.0, ParticleKind::Beta);
        let outcome = store.emit(&replacement);
        assert_eq!(outcome.slot, 0);
        assert!(outcome.overwrote_active);
        assert_eq!(store.slots()[0], Particle::from_spec(&replacement));
        assert_eq!(store.active_count(), n);
    }

    #[test]
    fn test_reset_clears_slots() {
        let mut store = ParticleStore::new(2).unwrap();
        store.emit(&spec(1.0, ParticleKind::Beta));
        store.reset();
        assert_eq!(store.active_count(), 0);
        assert_eq!(store.emit_ptr(), 0);
    }
}
