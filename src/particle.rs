//! The particle record.
//!
//! One record per store slot. The layout is `#[repr(C)]` and `Pod` so a
//! renderer can upload a generation as raw bytes without conversion.
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `position` | `Vec3` | World-space location |
//! | `velocity` | `Vec3` | World-space velocity |
//! | `life` | `f32` | Remaining lifetime in seconds |
//! | `kind` | `u32` | 0 = beta, 1 = alpha |
//! | `size` | `f32` | Point-sprite radius, recomputed every step |
//! | `brightness` | `f32` | Visual intensity, faded every step |
//! | `base_brightness` | `f32` | Intensity at emission |
//! | `charge_scale` | `f32` | Per-emission deflection multiplier |
//! | `active` | `u32` | 0 = free slot, 1 = live particle |

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::isotope::ParticleKind;
use crate::spawn::EmissionSpec;

/// A single particle slot.
///
/// The zeroed value is an inactive slot.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub life: f32,
    pub kind: u32,
    pub size: f32,
    pub brightness: f32,
    pub base_brightness: f32,
    pub charge_scale: f32,
    pub active: u32,
}

impl Particle {
    /// A freshly emitted particle. Every field is written.
    ///
    /// A spec with no remaining life yields an inactive slot.
    pub fn from_spec(spec: &EmissionSpec) -> Self {
        Self {
            position: spec.position,
            velocity: spec.velocity,
            life: spec.life,
            kind: spec.kind.into(),
            size: spec.size,
            brightness: spec.brightness,
            base_brightness: spec.brightness,
            charge_scale: spec.charge_scale,
            active: u32::from(spec.life > 0.0),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active != 0
    }

    #[inline]
    pub fn kind(&self) -> ParticleKind {
        ParticleKind::from(self.kind)
    }

    /// Effective deflection coefficient `q`.
    #[inline]
    pub fn charge(&self) -> f32 {
        self.kind().charge_base() * self.charge_scale
    }

    /// Whether every axis lies within `[-bounds, bounds]`.
    #[inline]
    pub fn within_bounds(&self, bounds: f32) -> bool {
        self.position.abs().max_element() <= bounds
    }
}
