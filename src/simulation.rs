//! The simulation context.
//!
//! [`Simulation`] owns every piece of mutable state: both particle
//! generations, both trail images, the random source and the user controls.
//! Nothing is global; a host creates one, feeds it control changes and
//! discrete events between frames, and calls [`Simulation::step`] once per
//! frame.
//!
//! # Step
//!
//! 1. Integrate the read generation into the write generation.
//! 2. Emit this step's background births and any queued bursts into the
//!    write generation.
//! 3. Swap generations; the fresh state becomes readable.
//! 4. Decay the trail image and splat the fresh generation onto it.
//!
//! Emission lands after integration so that freshly born particles show up
//! at their exact emission point and are not advanced before anyone has
//! seen them.
//!
//! # Example
//!
//! ```
//! use cloudchamber::{ChamberConfig, Simulation, Vec3};
//!
//! let config = ChamberConfig { seed: Some(1), ..Default::default() };
//! let mut sim = Simulation::new(config).unwrap();
//! sim.set_isotope("Sr-90 (β−)");
//! sim.spawn_burst_at(Vec3::ZERO);
//! for _ in 0..60 {
//!     sim.step(1.0 / 60.0);
//! }
//! assert!(sim.active_count() > 0);
//! ```

use glam::Vec3;

use crate::config::ChamberConfig;
use crate::emitter::{self, Emitter};
use crate::error::Result;
use crate::generation::GenerationPair;
use crate::integrator::{clamp_dt, Backend, IntegrationParams};
use crate::isotope::{IsotopeCatalog, ParticleKind};
use crate::particle::Particle;
use crate::spawn::{EmissionSampler, EmissionSpec, SPAWN_MARGIN};
use crate::store::ParticleStore;
use crate::trails::{Orthographic, Projection, TrailBuffer};

/// Smallest and largest accepted trail decay.
const DECAY_RANGE: (f32, f32) = (1e-3, 0.999);

/// Runtime knobs a UI binds to.
#[derive(Clone, Debug, PartialEq)]
pub struct Controls {
    pub field_strength: f32,
    pub vapor_density: f32,
    pub decay_rate: f32,
    pub isotope: String,
}

/// Render-facing copy of the live particles of one generation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
    pub positions: Vec<[f32; 3]>,
    pub sizes: Vec<f32>,
    pub brightness: Vec<f32>,
    pub kinds: Vec<ParticleKind>,
}

impl FrameSnapshot {
    fn from_store(store: &ParticleStore) -> Self {
        let mut snapshot = Self::default();
        for p in store.active() {
            snapshot.positions.push(p.position.to_array());
            snapshot.sizes.push(p.size);
            snapshot.brightness.push(p.brightness);
            snapshot.kinds.push(p.kind());
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A cloud chamber.
pub struct Simulation {
    bounds: f32,
    controls: Controls,
    backend: Backend,
    generations: GenerationPair,
    sampler: EmissionSampler,
    emitter: Emitter,
    trails: TrailBuffer,
    projection: Box<dyn Projection>,
    pending_bursts: Vec<Vec3>,
    paused: bool,
    steps: u64,
    overwritten: u64,
}

impl Simulation {
    /// Build a chamber from a validated configuration, using the built-in
    /// isotope catalog.
    pub fn new(config: ChamberConfig) -> Result<Self> {
        Self::with_catalog(config, IsotopeCatalog::builtin())
    }

    /// Build a chamber with a custom isotope catalog.
    pub fn with_catalog(config: ChamberConfig, catalog: IsotopeCatalog) -> Result<Self> {
        config.validate()?;

        let sampler = match config.seed {
            Some(seed) => EmissionSampler::seeded(catalog, seed),
            None => EmissionSampler::new(catalog),
        };

        let mut sim = Self {
            bounds: config.bounds,
            controls: Controls {
                field_strength: config.field_strength,
                vapor_density: config.vapor_density,
                decay_rate: config.decay_rate,
                isotope: config.isotope.clone(),
            },
            backend: config.backend,
            generations: GenerationPair::new(config.max_particles)?,
            sampler,
            emitter: Emitter::new(config.emission_rate),
            trails: TrailBuffer::new(config.trail_width, config.trail_height)?,
            projection: Box::new(Orthographic::new(config.view, config.bounds)),
            pending_bursts: Vec::new(),
            paused: false,
            steps: 0,
            overwritten: 0,
        };

        for _ in 0..config.initial_seeds {
            let spec = sim.sample_background();
            let outcome = sim.generations.seed(&spec);
            sim.note_overwrite(outcome.overwrote_active, outcome.slot);
        }

        log::info!(
            "Cloud chamber ready: {} slots, bounds {}, isotope {:?}, {:?} backend, {} seeded",
            config.max_particles,
            config.bounds,
            config.isotope,
            config.backend,
            config.initial_seeds.min(config.max_particles),
        );

        Ok(sim)
    }

    /// Splat through a custom projection instead of the configured view.
    pub fn with_projection(mut self, projection: Box<dyn Projection>) -> Self {
        self.projection = projection;
        self
    }

    /// Advance one frame.
    ///
    /// `dt` is clamped to [`crate::integrator::DT_MAX`]. Returns `false`
    /// without touching any state while paused.
    pub fn step(&mut self, dt: f32) -> bool {
        if self.paused {
            return false;
        }
        let dt = clamp_dt(dt);

        let params = IntegrationParams::from_vapor(
            dt,
            self.controls.field_strength,
            self.controls.vapor_density,
            self.bounds,
        );
        let seed = self.sampler.random_seed();
        self.generations.integrate(&params, seed, self.backend);

        let rate = self.emitter.rate(&self.controls.isotope);
        // More births than slots would only overwrite each other.
        let births = (emitter::births(rate, dt, self.sampler.random()) as usize).min(self.capacity());
        for _ in 0..births {
            let spec = self.sample_background();
            self.emit(&spec);
        }

        for origin in std::mem::take(&mut self.pending_bursts) {
            let spec = self
                .sampler
                .sample(&self.controls.isotope, origin, self.bounds);
            self.emit(&spec);
        }

        self.generations.swap();
        self.trails.update(
            self.controls.decay_rate,
            self.generations.read().slots(),
            self.projection.as_ref(),
        );

        self.steps += 1;
        true
    }

    fn sample_background(&mut self) -> EmissionSpec {
        let (profile, _) = self.sampler.catalog().resolve(&self.controls.isotope);
        let origin = if profile.is_cosmic() {
            Vec3::ZERO
        } else {
            self.sampler
                .random_in_cube((self.bounds - SPAWN_MARGIN).max(0.0))
        };
        self.sampler
            .sample(&self.controls.isotope, origin, self.bounds)
    }

    fn emit(&mut self, spec: &EmissionSpec) {
        let outcome = self.generations.emit(spec);
        self.note_overwrite(outcome.overwrote_active, outcome.slot);
    }

    fn note_overwrite(&mut self, overwrote_active: bool, slot: usize) {
        if overwrote_active {
            self.overwritten += 1;
            log::debug!(
                "Slot {} recycled while still active ({} total)",
                slot,
                self.overwritten
            );
        }
    }

    // ========== Discrete events ==========

    /// Queue one emission of the active isotope at `world_position`.
    ///
    /// It is injected during the next step, like any other emission.
    pub fn spawn_burst_at(&mut self, world_position: Vec3) {
        self.pending_bursts.push(world_position);
    }

    /// Blank both trail images. Particles are unaffected.
    pub fn clear(&mut self) {
        self.trails.clear();
        log::info!("Trail buffer cleared");
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused at step {}", self.steps);
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            log::info!("Simulation resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ========== Controls ==========

    #[inline]
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn set_field_strength(&mut self, field_strength: f32) {
        if field_strength.is_finite() {
            self.controls.field_strength = field_strength;
        }
    }

    /// Set vapor density, clamped to `[0, 1]`.
    pub fn set_vapor_density(&mut self, vapor_density: f32) {
        if vapor_density.is_finite() {
            self.controls.vapor_density = vapor_density.clamp(0.0, 1.0);
        }
    }

    /// Set trail decay, clamped inside `(0, 1)`.
    pub fn set_decay_rate(&mut self, decay_rate: f32) {
        if decay_rate.is_finite() {
            self.controls.decay_rate = decay_rate.clamp(DECAY_RANGE.0, DECAY_RANGE.1);
        }
    }

    /// Births per second of the active isotope.
    pub fn emission_rate(&self) -> f32 {
        self.emitter.rate(&self.controls.isotope)
    }

    /// Set the activity of the active isotope. The rate is remembered per
    /// isotope.
    pub fn set_emission_rate(&mut self, rate: f32) {
        if rate.is_finite() {
            self.emitter.set_rate(&self.controls.isotope, rate);
        }
    }

    /// Select the isotope for subsequent emissions.
    ///
    /// Unknown names are accepted and emit as the ambient profile.
    pub fn set_isotope(&mut self, name: &str) {
        if self.controls.isotope != name {
            log::debug!(
                "Isotope {:?} -> {:?} at {}/s",
                self.controls.isotope,
                name,
                self.emitter.rate(name)
            );
            self.controls.isotope = name.to_string();
        }
    }

    /// Isotope names offered by the catalog, in table order.
    pub fn isotopes(&self) -> impl Iterator<Item = &str> {
        self.sampler.catalog().names()
    }

    // ========== Capability changes ==========

    /// Reallocate both generations with a new capacity. All particles are
    /// dropped; never call this mid-step.
    pub fn resize(&mut self, max_particles: usize) -> Result<()> {
        self.generations = GenerationPair::new(max_particles)?;
        self.pending_bursts.clear();
        log::info!("Particle capacity set to {}", max_particles);
        Ok(())
    }

    /// Reallocate the trail images at a new resolution.
    pub fn resize_trails(&mut self, width: u32, height: u32) -> Result<()> {
        self.trails.resize(width, height)
    }

    // ========== Outputs ==========

    /// Copy of the live particles of the current read generation.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::from_store(self.generations.read())
    }

    /// Every slot of the current read generation.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        self.generations.read().slots()
    }

    /// The read generation as raw bytes, ready for a vertex buffer upload.
    pub fn particle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.particles())
    }

    #[inline]
    pub fn trails(&self) -> &TrailBuffer {
        &self.trails
    }

    #[inline]
    pub fn generations(&self) -> &GenerationPair {
        &self.generations
    }

    pub fn active_count(&self) -> usize {
        self.generations.read().active_count()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.generations.capacity()
    }

    #[inline]
    pub fn bounds(&self) -> f32 {
        self.bounds
    }

    /// Completed steps.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Live particles discarded by ring recycling so far.
    #[inline]
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }
}
