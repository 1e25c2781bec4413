//! Background emission scheduling.
//!
//! The chamber is fed by a steady activity: an expected number of births per
//! second for the selected isotope. Each step turns `rate * dt` into a whole
//! number of births by stochastic rounding, so fractional expectations are
//! honored on average even at high frame rates.
//!
//! Each isotope remembers the rate it was last run at, so switching sources
//! back and forth restores the activity the user chose for each.

use std::collections::HashMap;

use crate::isotope::COSMIC_MUONS;

/// Default activity of the cosmic muon source, in births per second.
pub const COSMIC_RATE: f32 = 5.0;

/// Whole births for one step.
///
/// `u` is a uniform draw in `[0, 1)`; the fractional part of the expected
/// count becomes one extra birth with matching probability.
pub fn births(rate: f32, dt: f32, u: f32) -> u32 {
    let expected = (rate * dt).max(0.0);
    if !expected.is_finite() {
        return 0;
    }
    let whole = expected.floor();
    let extra = u32::from(u < expected - whole);
    whole as u32 + extra
}

/// Per-isotope activity table.
#[derive(Clone, Debug)]
pub struct Emitter {
    default_rate: f32,
    rates: HashMap<String, f32>,
}

impl Emitter {
    /// Every isotope starts at `default_rate`, except cosmic muons at
    /// [`COSMIC_RATE`].
    pub fn new(default_rate: f32) -> Self {
        let mut rates = HashMap::new();
        rates.insert(COSMIC_MUONS.to_string(), COSMIC_RATE);
        Self {
            default_rate: default_rate.max(0.0),
            rates,
        }
    }

    /// Activity for `isotope` in births per second.
    pub fn rate(&self, isotope: &str) -> f32 {
        self.rates.get(isotope).copied().unwrap_or(self.default_rate)
    }

    /// Remember a new activity for `isotope`. Negative rates clamp to zero.
    pub fn set_rate(&mut self, isotope: &str, rate: f32) {
        self.rates.insert(isotope.to_string(), rate.max(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_births_whole_expectation() {
        assert_eq!(births(120.0, 0.5, 0.99), 60);
        assert_eq!(births(0.0, 1.0 / 30.0, 0.0), 0);
    }

    #[test]
    fn test_births_stochastic_rounding() {
        // 40/s at 1/60 s expects 0.667 births.
        assert_eq!(births(40.0, 1.0 / 60.0, 0.5), 1);
        assert_eq!(births(40.0, 1.0 / 60.0, 0.9), 0);
    }

    #[test]
    fn test_births_average_matches_rate() {
        let steps = 10_000;
        let total: u32 = (0..steps)
            .map(|i| births(40.0, 1.0 / 60.0, (i as f32 + 0.5) / steps as f32))
            .sum();
        let expected = 40.0 / 60.0 * steps as f32;
        assert!((total as f32 - expected).abs() < 2.0);
    }

    #[test]
    fn test_births_rejects_garbage() {
        assert_eq!(births(-5.0, 0.1, 0.0), 0);
        assert_eq!(births(f32::INFINITY, 0.1, 0.0), 0);
    }

    #[test]
    fn test_rate_memory_per_isotope() {
        let mut emitter = Emitter::new(40.0);
        assert_eq!(emitter.rate("Sr-90 (β−)"), 40.0);
        assert_eq!(emitter.rate(COSMIC_MUONS), COSMIC_RATE);

        emitter.set_rate("Sr-90 (β−)", 120.0);
        assert_eq!(emitter.rate("Sr-90 (β−)"), 120.0);
        assert_eq!(emitter.rate("Co-60 (β−)"), 40.0);

        emitter.set_rate("Co-60 (β−)", -3.0);
        assert_eq!(emitter.rate("Co-60 (β−)"), 0.0);
    }
}
