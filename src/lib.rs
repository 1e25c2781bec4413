//! # cloudchamber - Cloud Chamber Particle Engine
//!
//! A real-time simulation of a diffusion cloud chamber: radioactive sources
//! emit alpha and beta particles that curl through a magnetic field, slow in
//! the vapor, and leave fading condensation trails behind them.
//!
//! The engine is headless. It owns the particle state and a grayscale trail
//! image, and exposes both for a renderer to draw however it likes.
//!
//! ## Quick Start
//!
//! ```
//! use cloudchamber::prelude::*;
//!
//! let config = ChamberConfig {
//!     isotope: "Am-241 (α)".into(),
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let mut sim = Simulation::new(config).unwrap();
//!
//! let mut clock = FrameClock::fixed(1.0 / 60.0);
//! for _ in 0..120 {
//!     sim.step(clock.tick());
//! }
//!
//! let snapshot = sim.snapshot();
//! assert_eq!(snapshot.len(), sim.active_count());
//! ```
//!
//! ## Core Concepts
//!
//! ### Isotopes
//!
//! An [`IsotopeProfile`] is either a weighted mixture of alpha and beta
//! emissions or the cosmic muon source. The [`IsotopeCatalog`] holds the
//! table; unknown names fall back to the ambient background.
//!
//! ### Generations
//!
//! Particles live in two fixed-capacity ring buffers ([`ParticleStore`]).
//! Each step reads one and writes the other, then the roles swap, so an
//! update never observes its own partial output. New emissions recycle the
//! oldest slot once the ring is full.
//!
//! ### Physics
//!
//! Every particle is updated by the same pure function,
//! [`integrator::update_particle`]: magnetic deflection, vapor drag,
//! vertical jitter, lifetime and bounds. It can run sequentially or on a
//! rayon pool; both produce identical results for the same seed.
//!
//! ### Trails
//!
//! The [`TrailBuffer`] fades the previous image and splats every live
//! particle on top, producing the characteristic streaks. It exports to PNG.
//!
//! ## Controls
//!
//! | Control | Effect |
//! |---------|--------|
//! | Field strength | Curvature of tracks, sign follows charge |
//! | Vapor density | Drag, jitter, track width and brightness |
//! | Emission rate | Births per second, remembered per isotope |
//! | Trail decay | How long trails linger |

pub mod config;
pub mod emitter;
pub mod error;
pub mod generation;
pub mod integrator;
pub mod isotope;
pub mod particle;
mod simulation;
pub mod spawn;
pub mod store;
pub mod time;
pub mod trails;

pub use bytemuck;
pub use config::ChamberConfig;
pub use emitter::Emitter;
pub use error::{ChamberError, Result};
pub use generation::{GenerationPair, Role};
pub use glam::Vec3;
pub use integrator::{Backend, IntegrationParams};
pub use isotope::{EmissionComponent, IsotopeCatalog, IsotopeProfile, ParticleKind};
pub use particle::Particle;
pub use simulation::{Controls, FrameSnapshot, Simulation};
pub use spawn::{EmissionSampler, EmissionSpec};
pub use store::ParticleStore;
pub use trails::{Orthographic, Projection, TrailBuffer, View};

/// Convenient re-exports for common usage.
///
/// ```
/// use cloudchamber::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ChamberConfig;
    pub use crate::integrator::Backend;
    pub use crate::isotope::{IsotopeCatalog, ParticleKind, AMBIENT, COSMIC_MUONS};
    pub use crate::particle::Particle;
    pub use crate::simulation::{FrameSnapshot, Simulation};
    pub use crate::time::FrameClock;
    pub use crate::trails::{TrailBuffer, View};
    pub use crate::Vec3;
}
