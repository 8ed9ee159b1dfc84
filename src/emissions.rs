//! Transport emissions model.
//!
//! Maps a hop's distance and the mass moved over it to a transport mode and
//! a kg CO2e figure. Linear per-mode factors, one distance threshold between
//! trucking and air freight. Crude on purpose: no load factors, no return
//! legs, no multi-resource batching.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest hop still trucked: nine hours of driving at 97 km/h.
pub const GROUND_RANGE_KM: f64 = 9.0 * 97.0;

/// Alternative, wider trucking range.
pub const EXTENDED_GROUND_RANGE_KM: f64 = 1843.0;

/// Road freight, kg CO2e per km per gram moved.
pub const GROUND_KG_CO2E_PER_KM_GRAM: f64 = 1.05e-7;

/// Air freight, kg CO2e per km per gram moved.
pub const AIR_KG_CO2E_PER_KM_GRAM: f64 = 2.21e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Ground,
    Air,
}

impl TransportMode {
    /// Emissions factor in kg CO2e per km per gram.
    pub fn factor(&self) -> f64 {
        match self {
            TransportMode::Ground => GROUND_KG_CO2E_PER_KM_GRAM,
            TransportMode::Air => AIR_KG_CO2E_PER_KM_GRAM,
        }
    }

    /// Glyph shown on diagram edges.
    pub fn glyph(&self) -> &'static str {
        match self {
            TransportMode::Ground => "🚛",
            TransportMode::Air => "✈",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Ground => write!(f, "ground"),
            TransportMode::Air => write!(f, "air"),
        }
    }
}

/// Emissions of one transport hop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitEstimate {
    pub emissions_kg: f64,
    pub mode: TransportMode,
}

/// Where the model switches from trucking to air freight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionsPolicy {
    /// Hops at or beyond this distance fly.
    pub air_threshold_km: f64,
}

impl Default for EmissionsPolicy {
    fn default() -> Self {
        Self { air_threshold_km: GROUND_RANGE_KM }
    }
}

impl EmissionsPolicy {
    pub fn with_threshold(air_threshold_km: f64) -> Self {
        Self { air_threshold_km }
    }

    pub fn extended_range() -> Self {
        Self::with_threshold(EXTENDED_GROUND_RANGE_KM)
    }

    /// The threshold must be a finite, non-negative distance.
    pub fn validate(&self) -> Result<()> {
        if !self.air_threshold_km.is_finite() || self.air_threshold_km < 0.0 {
            return Err(Error::InvalidNumericInput {
                field: "emissions.air_threshold_km".into(),
                value: self.air_threshold_km,
            });
        }
        Ok(())
    }

    pub fn mode_for(&self, distance_km: f64) -> TransportMode {
        if distance_km < self.air_threshold_km {
            TransportMode::Ground
        } else {
            TransportMode::Air
        }
    }

    /// Price a hop. Inputs must be non-negative.
    pub fn estimate(&self, distance_km: f64, mass_g: f64) -> TransitEstimate {
        let mode = self.mode_for(distance_km);
        TransitEstimate {
            emissions_kg: distance_km * mass_g * mode.factor(),
            mode,
        }
    }
}

/// Price a hop under the default 873 km policy.
pub fn estimate_transit_emissions(distance_km: f64, mass_g: f64) -> TransitEstimate {
    EmissionsPolicy::default().estimate(distance_km, mass_g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_threshold_is_873_km() {
        assert_eq!(GROUND_RANGE_KM, 873.0);
        assert_eq!(estimate_transit_emissions(872.9, 1.0).mode, TransportMode::Ground);
        assert_eq!(estimate_transit_emissions(873.0, 1.0).mode, TransportMode::Air);
    }

    #[test]
    fn test_ground_hop() {
        let est = estimate_transit_emissions(500.0, 200.0);
        assert_eq!(est.mode, TransportMode::Ground);
        assert!(close(est.emissions_kg, 0.0105));
    }

    #[test]
    fn test_air_hop() {
        let est = estimate_transit_emissions(1000.0, 100.0);
        assert_eq!(est.mode, TransportMode::Air);
        assert!(close(est.emissions_kg, 0.221));
    }

    #[test]
    fn test_zero_inputs() {
        assert_eq!(
            estimate_transit_emissions(0.0, 750.0),
            TransitEstimate { emissions_kg: 0.0, mode: TransportMode::Ground }
        );
        let est = estimate_transit_emissions(5000.0, 0.0);
        assert_eq!(est.emissions_kg, 0.0);
        assert_eq!(est.mode, TransportMode::Air);
    }

    #[test]
    fn test_extended_range_keeps_trucks_longer() {
        let policy = EmissionsPolicy::extended_range();
        assert_eq!(policy.mode_for(1500.0), TransportMode::Ground);
        assert_eq!(policy.mode_for(1843.0), TransportMode::Air);
    }

    #[test]
    fn test_policy_validation() {
        assert!(EmissionsPolicy::default().validate().is_ok());
        assert!(EmissionsPolicy::with_threshold(0.0).validate().is_ok());
        assert!(matches!(
            EmissionsPolicy::with_threshold(f64::NAN).validate(),
            Err(Error::InvalidNumericInput { .. })
        ));
        assert!(EmissionsPolicy::with_threshold(-1.0).validate().is_err());
        assert!(EmissionsPolicy::with_threshold(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(TransportMode::Ground.glyph(), "🚛");
        assert_eq!(TransportMode::Air.glyph(), "✈");
    }

    proptest! {
        #[test]
        fn prop_mode_follows_threshold(d in 0.0f64..20_000.0, m in 0.0f64..1e6) {
            let est = estimate_transit_emissions(d, m);
            let expected = if d < GROUND_RANGE_KM { TransportMode::Ground } else { TransportMode::Air };
            prop_assert_eq!(est.mode, expected);
        }

        #[test]
        fn prop_linear_in_distance_within_mode(d in 0.0f64..400.0, m in 0.0f64..1e6) {
            let single = estimate_transit_emissions(d, m);
            let double = estimate_transit_emissions(2.0 * d, m);
            prop_assert_eq!(single.mode, double.mode);
            prop_assert!(close(double.emissions_kg, 2.0 * single.emissions_kg));
        }

        #[test]
        fn prop_linear_in_distance_air(d in 900.0f64..10_000.0, m in 0.0f64..1e6) {
            let single = estimate_transit_emissions(d, m);
            let double = estimate_transit_emissions(2.0 * d, m);
            prop_assert!(close(double.emissions_kg, 2.0 * single.emissions_kg));
        }

        #[test]
        fn prop_zero_mass_is_free(d in 0.0f64..20_000.0) {
            prop_assert_eq!(estimate_transit_emissions(d, 0.0).emissions_kg, 0.0);
        }
    }
}
