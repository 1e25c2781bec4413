//! Chamber configuration.
//!
//! Startup settings for a [`crate::Simulation`], serializable to JSON. Every
//! field is optional in the file; missing ones take the defaults below.
//!
//! ```json
//! {
//!   "max_particles": 20000,
//!   "isotope": "Sr-90 (β−)",
//!   "field_strength": 2.5,
//!   "backend": "parallel"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ChamberError, Result};
use crate::integrator::Backend;
use crate::isotope::AMBIENT;
use crate::trails::View;

/// Complete startup configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChamberConfig {
    /// Slots per generation.
    pub max_particles: usize,
    /// Chamber half-size in world units.
    pub bounds: f32,
    /// Magnetic field magnitude along +Y.
    pub field_strength: f32,
    /// Vapor density in `[0, 1]`.
    pub vapor_density: f32,
    /// Births per second for isotopes that have no remembered rate.
    pub emission_rate: f32,
    /// Trail decay per step, in `(0, 1)`.
    pub decay_rate: f32,
    /// Active isotope name.
    pub isotope: String,
    /// Trail image width in pixels.
    pub trail_width: u32,
    /// Trail image height in pixels.
    pub trail_height: u32,
    /// View used to splat into the trail image.
    pub view: View,
    /// Particles scattered through the chamber at startup.
    pub initial_seeds: usize,
    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Integrator dispatch.
    pub backend: Backend,
}

impl Default for ChamberConfig {
    fn default() -> Self {
        Self {
            max_particles: 5000,
            bounds: 20.0,
            field_strength: 1.0,
            vapor_density: 0.5,
            emission_rate: 40.0,
            decay_rate: 0.96,
            isotope: AMBIENT.to_string(),
            trail_width: 512,
            trail_height: 512,
            view: View::TopDown,
            initial_seeds: 48,
            seed: None,
            backend: Backend::Sequential,
        }
    }
}

impl ChamberConfig {
    /// Check the startup preconditions.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ChamberError::InvalidConfig(msg));

        if self.max_particles == 0 {
            return fail("max_particles must be at least 1".into());
        }
        if !(self.bounds.is_finite() && self.bounds > 0.0) {
            return fail(format!("bounds must be positive, got {}", self.bounds));
        }
        if !self.field_strength.is_finite() {
            return fail(format!("field_strength must be finite, got {}", self.field_strength));
        }
        if !(0.0..=1.0).contains(&self.vapor_density) {
            return fail(format!("vapor_density must be in [0, 1], got {}", self.vapor_density));
        }
        if !(self.emission_rate.is_finite() && self.emission_rate >= 0.0) {
            return fail(format!("emission_rate must be non-negative, got {}", self.emission_rate));
        }
        if !(self.decay_rate > 0.0 && self.decay_rate < 1.0) {
            return fail(format!("decay_rate must be in (0, 1), got {}", self.decay_rate));
        }
        if self.trail_width == 0 || self.trail_height == 0 {
            return fail(format!(
                "trail resolution must be non-zero, got {}x{}",
                self.trail_width, self.trail_height
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ChamberConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = ChamberConfig::from_json(
            r#"{ "max_particles": 100, "backend": "parallel", "view": "front" }"#,
        )
        .unwrap();
        assert_eq!(config.max_particles, 100);
        assert_eq!(config.backend, Backend::Parallel);
        assert_eq!(config.view, View::Front);
        assert_eq!(config.bounds, 20.0);
        assert_eq!(config.isotope, AMBIENT);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            r#"{ "max_particles": 0 }"#,
            r#"{ "bounds": -1.0 }"#,
            r#"{ "vapor_density": 1.5 }"#,
            r#"{ "decay_rate": 1.0 }"#,
            r#"{ "emission_rate": -2.0 }"#,
            r#"{ "trail_width": 0 }"#,
        ];
        for json in cases {
            assert!(
                matches!(ChamberConfig::from_json(json), Err(ChamberError::InvalidConfig(_))),
                "{} should be rejected",
                json
            );
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ChamberConfig::from_json("{ not json"),
            Err(ChamberError::Json(_))
        ));
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chamber.json");
        let config = ChamberConfig {
            seed: Some(9),
            isotope: "Po-210 (α)".into(),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ChamberConfig::load(&path).unwrap(), config);
    }
}
