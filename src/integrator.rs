//! Per-particle physics integrator.
//!
//! [`update_particle`] is the single source of truth for one slot's step. It
//! only reads that slot's previous state and frame-global scalars, so the
//! slots of a generation can be advanced in any order or concurrently.
//! [`Backend`] chooses how the map over slots is dispatched; every backend
//! calls the same function and produces bit-identical generations.
//!
//! # Step
//!
//! 1. Inactive slots are copied through unchanged.
//! 2. Magnetic deflection with the field along +Y: `a = q (v × B)`.
//! 3. Linear drag, solved exactly over the step: `v *= exp(-drag dt)`.
//! 4. Thermal jitter, uniform in `[-1, 1]` per axis, scaled by `jitter dt`
//!    (half as much vertically).
//! 5. Explicit Euler position update.
//! 6. `life -= dt`, then deactivation on expiry or on leaving the chamber.
//! 7. Presentation: brightness is multiplied by the life fade and the vapor
//!    factor (it compounds from step to step); size is the kind baseline
//!    scaled by vapor.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::particle::Particle;
use crate::store::ParticleStore;

/// Largest time step the integrator is ever asked to take, in seconds.
pub const DT_MAX: f32 = 1.0 / 30.0;

/// Remaining life at or below which a particle counts as expired.
///
/// Absorbs f32 accumulation error so that a lifetime that is an exact
/// multiple of `dt` expires on the step it reaches zero.
pub const LIFE_EPSILON: f32 = 1e-4;

/// Vertical share of the thermal jitter.
const VERTICAL_JITTER: f32 = 0.5;

/// Minimum brightness share while a particle fades out.
const MIN_FADE: f32 = 0.25;

/// Brightness share per second of remaining life.
const FADE_PER_SECOND: f32 = 0.15;

/// Ceiling for the compounded brightness. Long-lived tracks multiply by
/// more than one every step and would otherwise overflow to infinity.
pub const MAX_BRIGHTNESS: f32 = 1.0e6;

/// Slots per rayon task.
const PARALLEL_CHUNK: usize = 1024;

/// Clamp a wall-clock delta to the integrator's stable range.
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, DT_MAX)
    } else {
        0.0
    }
}

/// Frame-global inputs to [`update_particle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationParams {
    /// Time step in seconds.
    pub dt: f32,
    /// Magnitude of the magnetic field along +Y.
    pub field_strength: f32,
    /// Linear drag coefficient per second.
    pub drag_base: f32,
    /// Thermal jitter amplitude.
    pub jitter: f32,
    /// Chamber half-size.
    pub bounds: f32,
    /// Vapor density in `[0, 1]`, cosmetic only.
    pub vapor: f32,
}

impl IntegrationParams {
    /// Parameters with drag and jitter derived from vapor density.
    pub fn from_vapor(dt: f32, field_strength: f32, vapor: f32, bounds: f32) -> Self {
        Self {
            dt,
            field_strength,
            drag_base: 0.3 + vapor * 0.8,
            jitter: 0.3 + vapor * 1.2,
            bounds,
            vapor,
        }
    }

    /// Brightness multiplier contributed by the vapor.
    #[inline]
    pub fn vapor_brightness(&self) -> f32 {
        0.92 + self.vapor * 0.25
    }

    /// Size multiplier contributed by the vapor.
    #[inline]
    pub fn vapor_size(&self) -> f32 {
        0.9 + self.vapor * 0.8
    }
}

/// Lorentz-like acceleration `q (v × B)` with `B = (0, field_strength, 0)`.
#[inline]
pub fn lorentz_acceleration(velocity: Vec3, q: f32, field_strength: f32) -> Vec3 {
    q * velocity.cross(Vec3::new(0.0, field_strength, 0.0))
}

/// Advance one slot by one step.
///
/// `noise` holds the per-axis jitter draws in `[-1, 1]`.
pub fn update_particle(p: &Particle, params: &IntegrationParams, noise: Vec3) -> Particle {
    if !p.is_active() {
        return *p;
    }

    let dt = params.dt;
    let mut next = *p;

    let accel = lorentz_acceleration(p.velocity, p.charge(), params.field_strength);
    let mut velocity = p.velocity + accel * dt;
    velocity *= (-params.drag_base * dt).exp();
    velocity += noise * Vec3::new(1.0, VERTICAL_JITTER, 1.0) * (params.jitter * dt);

    next.velocity = velocity;
    next.position = p.position + velocity * dt;
    next.life = p.life - dt;

    let alive = next.life > LIFE_EPSILON && next.within_bounds(params.bounds);
    next.active = u32::from(alive);

    let kind = next.kind();
    next.brightness = (p.brightness
        * params.vapor_brightness()
        * (next.life * FADE_PER_SECOND).max(MIN_FADE))
    .min(MAX_BRIGHTNESS);
    next.size = kind.base_size() * params.vapor_size();

    next
}

/// Jitter draws for one slot, reproducible from `(seed, index)`.
fn slot_noise(seed: u64, index: usize) -> Vec3 {
    let mut rng = SmallRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    Vec3::new(
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
    )
}

#[inline]
fn step_slot(p: &Particle, params: &IntegrationParams, seed: u64, index: usize) -> Particle {
    let noise = if p.is_active() && params.jitter != 0.0 {
        slot_noise(seed, index)
    } else {
        Vec3::ZERO
    };
    update_particle(p, params, noise)
}

/// How the map over slots is dispatched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Plain loop on the calling thread.
    #[default]
    Sequential,
    /// Rayon work-stealing over chunks of slots.
    Parallel,
}

impl Backend {
    /// Write `update_particle(read[i])` into `write[i]` for every slot.
    pub fn run(self, read: &[Particle], write: &mut [Particle], params: &IntegrationParams, seed: u64) {
        debug_assert_eq!(read.len(), write.len());
        match self {
            Backend::Sequential => {
                for (i, (dst, src)) in write.iter_mut().zip(read).enumerate() {
                    *dst = step_slot(src, params, seed, i);
                }
            }
            Backend::Parallel => {
                write
                    .par_iter_mut()
                    .zip(read.par_iter())
                    .enumerate()
                    .with_min_len(PARALLEL_CHUNK)
                    .for_each(|(i, (dst, src))| *dst = step_slot(src, params, seed, i));
            }
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Backend::Sequential),
            "parallel" => Ok(Backend::Parallel),
            other => Err(format!("unknown backend {:?} (expected sequential or parallel)", other)),
        }
    }
}

/// Produce `write` from `read`.
///
/// The emission cursor is carried forward so the next emission continues the
/// ring where the previous generation left it.
pub fn integrate(
    read: &ParticleStore,
    write: &mut ParticleStore,
    params: &IntegrationParams,
    seed: u64,
    backend: Backend,
) {
    backend.run(read.slots(), write.slots_mut(), params, seed);
    write.set_emit_ptr(read.emit_ptr());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isotope::ParticleKind;
    use crate::spawn::EmissionSpec;

    fn still_params(dt: f32) -> IntegrationParams {
        IntegrationParams {
            dt,
            field_strength: 0.0,
            drag_base: 0.0,
            jitter: 0.0,
            bounds: 20.0,
            vapor: 0.0,
        }
    }

    fn particle(kind: ParticleKind, velocity: Vec3, life: f32) -> Particle {
        Particle::from_spec(&EmissionSpec {
            position: Vec3::ZERO,
            velocity,
            life,
            kind,
            size: 10.0,
            brightness: 1.0,
            charge_scale: 1.0,
        })
    }

    #[test]
    fn test_lorentz_matches_cross_product() {
        let a = lorentz_acceleration(Vec3::new(1.0, 2.0, 3.0), 0.5, 2.0);
        // (-vz B, 0, vx B) * q
        assert_eq!(a, Vec3::new(-3.0, 0.0, 1.0));
    }

    #[test]
    fn test_beta_deflects_toward_positive_z() {
        let p = particle(ParticleKind::Beta, Vec3::X, 5.0);
        let params = IntegrationParams {
            field_strength: 1.5,
            ..still_params(1.0 / 60.0)
        };
        assert!(lorentz_acceleration(p.velocity, p.charge(), params.field_strength).z > 0.0);
        let next = update_particle(&p, &params, Vec3::ZERO);
        assert!(next.velocity.z > 0.0);
        assert_eq!(next.velocity.y, 0.0);
    }

    #[test]
    fn test_alpha_deflects_harder_than_beta() {
        let params = IntegrationParams {
            field_strength: 1.0,
            ..still_params(1.0 / 30.0)
        };
        let alpha = update_particle(&particle(ParticleKind::Alpha, Vec3::X, 5.0), &params, Vec3::ZERO);
        let beta = update_particle(&particle(ParticleKind::Beta, Vec3::X, 5.0), &params, Vec3::ZERO);
        assert!(alpha.velocity.z > beta.velocity.z);
    }

    #[test]
    fn test_drag_is_exact_exponential() {
        let params = IntegrationParams {
            drag_base: 0.8,
            ..still_params(1.0 / 30.0)
        };
        let next = update_particle(&particle(ParticleKind::Alpha, Vec3::X * 2.0, 5.0), &params, Vec3::ZERO);
        let expected = 2.0 * (-0.8f32 / 30.0).exp();
        assert!((next.velocity.x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_jitter_is_damped_vertically() {
        let params = IntegrationParams {
            jitter: 3.0,
            ..still_params(0.1)
        };
        let next = update_particle(&particle(ParticleKind::Beta, Vec3::ZERO, 5.0), &params, Vec3::ONE);
        assert!((next.velocity.x - 0.3).abs() < 1e-6);
        assert!((next.velocity.y - 0.15).abs() < 1e-6);
        assert!((next.velocity.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_life_decreases_by_dt() {
        let params = still_params(1.0 / 30.0);
        let mut p = particle(ParticleKind::Alpha, Vec3::ZERO, 2.0);
        for _ in 0..10 {
            let next = update_particle(&p, &params, Vec3::ZERO);
            assert!((p.life - next.life - params.dt).abs() < 1e-6);
            assert!(next.is_active());
            p = next;
        }
    }

    #[test]
    fn test_leaving_bounds_deactivates_same_step() {
        let params = still_params(1.0 / 30.0);
        let mut p = particle(ParticleKind::Beta, Vec3::new(0.0, 0.0, -30.0), 100.0);
        p.position = Vec3::new(0.0, 0.0, -19.5);
        let next = update_particle(&p, &params, Vec3::ZERO);
        assert!(!next.is_active());
        assert!(next.position.z < -20.0);
    }

    #[test]
    fn test_inactive_slot_copied_through() {
        let mut p = particle(ParticleKind::Alpha, Vec3::X, 1.0);
        p.active = 0;
        let params = IntegrationParams::from_vapor(DT_MAX, 2.0, 0.5, 20.0);
        assert_eq!(update_particle(&p, &params, Vec3::ONE), p);
    }

    #[test]
    fn test_presentation_follows_vapor_and_life() {
        let params = IntegrationParams {
            vapor: 1.0,
            ..still_params(0.0)
        };
        let next = update_particle(&particle(ParticleKind::Alpha, Vec3::ZERO, 10.0), &params, Vec3::ZERO);
        assert!((next.size - 24.0 * 1.7).abs() < 1e-4);
        assert!((next.brightness - 1.17 * 1.5).abs() < 1e-4);

        let fading = update_particle(&particle(ParticleKind::Beta, Vec3::ZERO, 0.5), &params, Vec3::ZERO);
        assert!((fading.brightness - 1.17 * 0.25).abs() < 1e-4);
        assert!((fading.size - 9.0 * 1.7).abs() < 1e-4);
    }

    #[test]
    fn test_brightness_compounds_each_step() {
        let params = still_params(1.0 / 30.0);
        let mut p = particle(ParticleKind::Alpha, Vec3::ZERO, 3.0);
        let mut expected = 1.0f32;
        for step in 1..=3 {
            p = update_particle(&p, &params, Vec3::ZERO);
            expected *= 0.92 * (p.life * 0.15).max(0.25);
            assert!(
                (p.brightness - expected).abs() < 1e-5,
                "step {}: {} != {}",
                step,
                p.brightness,
                expected
            );
        }
        // Third step of a 3 s alpha at zero vapor.
        assert!((p.brightness - 0.0663).abs() < 1e-3);
        assert_eq!(p.base_brightness, 1.0);
    }

    #[test]
    fn test_brightness_stays_finite_for_long_lived_tracks() {
        let params = IntegrationParams {
            vapor: 1.0,
            ..still_params(1.0 / 30.0)
        };
        let mut p = particle(ParticleKind::Beta, Vec3::ZERO, 50.0);
        for _ in 0..200 {
            p = update_particle(&p, &params, Vec3::ZERO);
        }
        assert!(p.is_active());
        assert_eq!(p.brightness, MAX_BRIGHTNESS);
    }

    #[test]
    fn test_backends_agree() {
        let params = IntegrationParams::from_vapor(DT_MAX, 1.2, 0.7, 20.0);
        let read: Vec<Particle> = (0..5000)
            .map(|i| {
                let kind = if i % 3 == 0 { ParticleKind::Alpha } else { ParticleKind::Beta };
                let mut p = particle(kind, Vec3::new(i as f32 * 0.001, 1.0, -0.5), 1.0 + (i % 7) as f32);
                p.active = u32::from(i % 5 != 0);
                p
            })
            .collect();

        let mut sequential = vec![Particle::default(); read.len()];
        let mut parallel = vec![Particle::default(); read.len()];
        Backend::Sequential.run(&read, &mut sequential, &params, 42);
        Backend::Parallel.run(&read, &mut parallel, &params, 42);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(0.5), DT_MAX);
        assert_eq!(clamp_dt(0.01), 0.01);
        assert_eq!(clamp_dt(-1.0), 0.0);
        assert_eq!(clamp_dt(f32::NAN), 0.0);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Parallel".parse::<Backend>(), Ok(Backend::Parallel));
        assert!("gpu".parse::<Backend>().is_err());
    }
}
