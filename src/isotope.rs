//! Isotope catalog.
//!
//! Each isotope is a phenomenological emission profile: either a weighted
//! mixture of alpha/beta components, or the cosmic-muon pattern that rains
//! down from the top of the chamber.
//!
//! # Built-in Profiles
//!
//! | Name | Emission |
//! |------|----------|
//! | `Ambient (α+β)` | 30% alpha, 70% beta (default) |
//! | `Am-241 (α)` | alpha |
//! | `Po-210 (α)` | alpha |
//! | `Rn-222 (α)` | alpha |
//! | `Sr-90 (β−)` | beta |
//! | `Cs-137 (β−)` | beta |
//! | `Co-60 (β−)` | beta |
//! | `Th-232 chain (α+β)` | 60% alpha, 40% beta |
//! | `Cosmic Muons (μ)` | top-down muon shower |
//!
//! # Example
//!
//! ```
//! use cloudchamber::IsotopeCatalog;
//!
//! let catalog = IsotopeCatalog::builtin();
//! let sr90 = catalog.get("Sr-90 (β−)").unwrap();
//! assert!(!sr90.is_cosmic());
//! ```

/// Name of the profile used when a lookup misses.
pub const AMBIENT: &str = "Ambient (α+β)";

/// Name of the cosmic muon profile.
pub const COSMIC_MUONS: &str = "Cosmic Muons (μ)";

/// Particle species.
///
/// The discriminants match the `kind` field of [`crate::Particle`], so a
/// renderer can read the packed value directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// Light, fast, weakly ionizing. Thin wispy tracks.
    Beta = 0,
    /// Heavy, slow, strongly ionizing. Short fat tracks.
    Alpha = 1,
}

impl ParticleKind {
    /// Charge-to-mass proxy used by the integrator.
    #[inline]
    pub fn charge_base(self) -> f32 {
        match self {
            ParticleKind::Beta => 0.6,
            ParticleKind::Alpha => 1.0,
        }
    }

    /// Point-sprite size before vapor scaling.
    #[inline]
    pub fn base_size(self) -> f32 {
        match self {
            ParticleKind::Beta => 9.0,
            ParticleKind::Alpha => 24.0,
        }
    }
}

impl From<ParticleKind> for u32 {
    fn from(kind: ParticleKind) -> u32 {
        kind as u32
    }
}

impl From<u32> for ParticleKind {
    /// Any non-zero value reads as alpha.
    fn from(value: u32) -> Self {
        if value == 0 {
            ParticleKind::Beta
        } else {
            ParticleKind::Alpha
        }
    }
}

/// One entry of an emission mixture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionComponent {
    /// Species emitted by this component.
    pub kind: ParticleKind,
    /// Share of emissions drawn from this component.
    pub fraction: f32,
    /// Baseline speed in world units per second.
    pub speed: f32,
    /// Baseline lifetime in seconds.
    pub life: f32,
    /// Point-sprite size baseline.
    pub size: f32,
    /// Visual intensity baseline.
    pub brightness: f32,
    /// Multiplier on the deflection coefficient.
    pub charge_scale: f32,
}

impl EmissionComponent {
    const fn alpha(fraction: f32, speed: f32, life: f32, size: f32, brightness: f32, charge_scale: f32) -> Self {
        Self { kind: ParticleKind::Alpha, fraction, speed, life, size, brightness, charge_scale }
    }

    const fn beta(fraction: f32, speed: f32, life: f32, size: f32, brightness: f32, charge_scale: f32) -> Self {
        Self { kind: ParticleKind::Beta, fraction, speed, life, size, brightness, charge_scale }
    }
}

/// How a profile emits.
#[derive(Clone, Debug, PartialEq)]
pub enum Emission {
    /// Weighted categorical mixture, sampled in table order.
    Mixture(Vec<EmissionComponent>),
    /// Near-vertical muons entering through the top of the chamber.
    Cosmic,
}

/// A named emission profile.
#[derive(Clone, Debug, PartialEq)]
pub struct IsotopeProfile {
    name: String,
    emission: Emission,
}

impl IsotopeProfile {
    /// Create a mixture profile.
    pub fn mixture(name: impl Into<String>, components: Vec<EmissionComponent>) -> Self {
        Self {
            name: name.into(),
            emission: Emission::Mixture(components),
        }
    }

    /// Create a cosmic profile.
    pub fn cosmic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emission: Emission::Cosmic,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn emission(&self) -> &Emission {
        &self.emission
    }

    #[inline]
    pub fn is_cosmic(&self) -> bool {
        matches!(self.emission, Emission::Cosmic)
    }
}

/// Immutable table of isotope profiles, kept in insertion order.
#[derive(Clone, Debug)]
pub struct IsotopeCatalog {
    profiles: Vec<IsotopeProfile>,
}

impl IsotopeCatalog {
    /// Build a catalog from explicit profiles.
    ///
    /// The first profile named [`AMBIENT`] serves as the lookup fallback; if
    /// none exists, the first profile does.
    pub fn new(profiles: Vec<IsotopeProfile>) -> Self {
        Self { profiles }
    }

    /// The standard table of laboratory sources.
    pub fn builtin() -> Self {
        use EmissionComponent as C;

        Self::new(vec![
            IsotopeProfile::mixture(
                AMBIENT,
                vec![
                    C::alpha(0.30, 2.2, 3.5, 26.0, 1.05, 1.0),
                    C::beta(0.70, 7.0, 7.0, 10.0, 0.65, 1.0),
                ],
            ),
            IsotopeProfile::mixture("Am-241 (α)", vec![C::alpha(1.0, 2.1, 3.8, 28.0, 1.15, 0.8)]),
            IsotopeProfile::mixture("Po-210 (α)", vec![C::alpha(1.0, 2.0, 3.4, 28.0, 1.20, 0.8)]),
            IsotopeProfile::mixture("Rn-222 (α)", vec![C::alpha(1.0, 2.0, 3.2, 26.0, 1.10, 0.85)]),
            IsotopeProfile::mixture("Sr-90 (β−)", vec![C::beta(1.0, 6.5, 7.5, 9.0, 0.60, 1.2)]),
            IsotopeProfile::mixture("Cs-137 (β−)", vec![C::beta(1.0, 7.5, 8.0, 10.0, 0.62, 1.2)]),
            IsotopeProfile::mixture("Co-60 (β−)", vec![C::beta(1.0, 5.5, 6.8, 9.0, 0.60, 1.1)]),
            IsotopeProfile::mixture(
                "Th-232 chain (α+β)",
                vec![
                    C::alpha(0.60, 2.0, 3.5, 27.0, 1.10, 0.85),
                    C::beta(0.40, 6.8, 7.5, 10.0, 0.62, 1.15),
                ],
            ),
            IsotopeProfile::cosmic(COSMIC_MUONS),
        ])
    }

    /// Look up a profile by exact name.
    pub fn get(&self, name: &str) -> Option<&IsotopeProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Look up a profile, substituting the ambient profile for unknown names.
    ///
    /// Returns the resolved profile and whether the fallback was taken.
    pub fn resolve(&self, name: &str) -> (&IsotopeProfile, bool) {
        match self.get(name) {
            Some(profile) => (profile, false),
            None => (self.fallback(), true),
        }
    }

    fn fallback(&self) -> &IsotopeProfile {
        self.get(AMBIENT)
            .or_else(|| self.profiles.first())
            .unwrap_or(&AMBIENT_PROFILE)
    }

    /// Profile names in table order, as shown by a selector.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for IsotopeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// Backs lookups on an empty catalog.
static AMBIENT_PROFILE: IsotopeProfile = IsotopeProfile {
    name: String::new(),
    emission: Emission::Mixture(Vec::new()),
};
