//! Emission sampler.
//!
//! Turns an isotope name into the initial kinematic and visual parameters of
//! one particle. Owns the simulation's random source so that a seeded run is
//! reproducible end to end.

use std::collections::HashSet;
use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::isotope::{Emission, EmissionComponent, IsotopeCatalog, ParticleKind};

/// Relative jitter applied to component speed and lifetime.
pub const KINEMATIC_JITTER: f32 = 0.15;

/// Inset from the chamber walls for spawn positions.
pub const SPAWN_MARGIN: f32 = 2.0;

// Cosmic muon constants.
const COSMIC_TILT: f32 = 0.05;
const COSMIC_SPEED: f32 = 30.0;
const COSMIC_LIFE: f32 = 50.0;
const COSMIC_SIZE: f32 = 8.0;
const COSMIC_BRIGHTNESS: f32 = 0.5;
const COSMIC_CHARGE_SCALE: f32 = 0.05;

/// Everything needed to (re)initialize a particle slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionSpec {
    pub position: Vec3,
    pub velocity: Vec3,
    pub life: f32,
    pub kind: ParticleKind,
    pub size: f32,
    pub brightness: f32,
    pub charge_scale: f32,
}

enum Draw {
    Cosmic,
    Component(EmissionComponent),
    Empty,
}

/// Draws emissions from an [`IsotopeCatalog`].
///
/// ```
/// use cloudchamber::{EmissionSampler, IsotopeCatalog, Vec3};
///
/// let mut sampler = EmissionSampler::seeded(IsotopeCatalog::builtin(), 7);
/// let spec = sampler.sample("Am-241 (α)", Vec3::ZERO, 20.0);
/// assert_eq!(spec.position, Vec3::ZERO);
/// ```
pub struct EmissionSampler {
    catalog: IsotopeCatalog,
    rng: SmallRng,
    warned: HashSet<String>,
}

impl EmissionSampler {
    /// Sampler seeded from OS entropy.
    pub fn new(catalog: IsotopeCatalog) -> Self {
        Self::with_rng(catalog, SmallRng::from_entropy())
    }

    /// Deterministic sampler.
    pub fn seeded(catalog: IsotopeCatalog, seed: u64) -> Self {
        Self::with_rng(catalog, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: IsotopeCatalog, rng: SmallRng) -> Self {
        Self {
            catalog,
            rng,
            warned: HashSet::new(),
        }
    }

    #[inline]
    pub fn catalog(&self) -> &IsotopeCatalog {
        &self.catalog
    }

    /// Sample one emission for `profile_name`.
    ///
    /// Mixture profiles emit from `origin` in an isotropic direction. The
    /// cosmic profile ignores `origin` and enters through the top plane of a
    /// chamber of half-size `bounds`. Unknown names fall back to the ambient
    /// profile.
    pub fn sample(&mut self, profile_name: &str, origin: Vec3, bounds: f32) -> EmissionSpec {
        let (profile, fell_back) = self.catalog.resolve(profile_name);

        if fell_back && self.warned.insert(profile_name.to_string()) {
            log::warn!(
                "Unknown isotope {:?}, falling back to {:?}",
                profile_name,
                profile.name()
            );
        }

        let draw = match profile.emission() {
            Emission::Cosmic => Draw::Cosmic,
            Emission::Mixture(components) => match pick_component(components, self.rng.gen()) {
                Some(component) => Draw::Component(component),
                None => Draw::Empty,
            },
        };

        match draw {
            Draw::Cosmic => self.sample_cosmic(bounds),
            Draw::Component(component) => self.sample_component(component, origin),
            // Nothing sensible to emit from an empty mixture, so the slot
            // comes out already dead.
            Draw::Empty => EmissionSpec {
                position: origin,
                velocity: Vec3::ZERO,
                life: 0.0,
                kind: ParticleKind::Beta,
                size: 0.0,
                brightness: 0.0,
                charge_scale: 1.0,
            },
        }
    }

    fn sample_component(&mut self, c: EmissionComponent, origin: Vec3) -> EmissionSpec {
        let direction = self.random_direction();
        let speed = c.speed * self.jitter_factor();
        let life = c.life * self.jitter_factor();

        EmissionSpec {
            position: origin,
            velocity: direction * speed,
            life,
            kind: c.kind,
            size: c.size,
            brightness: c.brightness,
            charge_scale: c.charge_scale,
        }
    }

    fn sample_cosmic(&mut self, bounds: f32) -> EmissionSpec {
        let range = (bounds - SPAWN_MARGIN).max(0.0);
        let x = self.random_symmetric(range);
        let z = self.random_symmetric(range);
        let direction = Vec3::new(
            self.random_symmetric(COSMIC_TILT),
            -1.0,
            self.random_symmetric(COSMIC_TILT),
        );

        EmissionSpec {
            // On the top wall, not above it: the bounds test is `|p| > bounds`.
            position: Vec3::new(x, bounds, z),
            velocity: direction * COSMIC_SPEED,
            life: COSMIC_LIFE,
            kind: ParticleKind::Beta,
            size: COSMIC_SIZE,
            brightness: COSMIC_BRIGHTNESS,
            charge_scale: COSMIC_CHARGE_SCALE,
        }
    }

    #[inline]
    fn jitter_factor(&mut self) -> f32 {
        1.0 + self.random_symmetric(KINEMATIC_JITTER)
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random u64, used to seed per-step integrator noise.
    #[inline]
    pub fn random_seed(&mut self) -> u64 {
        self.rng.gen()
    }

    /// Random f32 in `[-half_width, half_width)`.
    #[inline]
    pub fn random_symmetric(&mut self, half_width: f32) -> f32 {
        (self.rng.gen::<f32>() * 2.0 - 1.0) * half_width
    }

    /// Random point inside a cube of given half-size, centered at origin.
    pub fn random_in_cube(&mut self, half_size: f32) -> Vec3 {
        Vec3::new(
            self.random_symmetric(half_size),
            self.random_symmetric(half_size),
            self.random_symmetric(half_size),
        )
    }

    /// Random unit vector, uniform on the sphere.
    pub fn random_direction(&mut self) -> Vec3 {
        let z = self.random_symmetric(1.0);
        let theta = self.rng.gen_range(0.0..TAU);
        direction_from(z, theta)
    }
}

/// Map `z` in `[-1, 1]` and azimuth `theta` to a unit vector.
///
/// With both inputs uniform the result is uniform on the sphere (Archimedes'
/// hat-box theorem), with no clustering at the poles.
#[inline]
pub fn direction_from(z: f32, theta: f32) -> Vec3 {
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// Weighted categorical pick in table order.
///
/// Returns the first component whose cumulative fraction reaches `r`, or the
/// last one if rounding leaves the total just short.
pub fn pick_component(components: &[EmissionComponent], r: f32) -> Option<EmissionComponent> {
    let mut cumulative = 0.0;
    for c in components {
        cumulative += c.fraction;
        if cumulative >= r {
            return Some(*c);
        }
    }
    components.last().copied()
}
