//! Seasonal use profiles: the fraction of an annual water use estimate
//! that falls in each calendar month.

use crate::error::{Result, RightsError};
use serde::{Deserialize, Serialize};

/// Month labels used for the disaggregated demand columns.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const PROFILE_TOLERANCE: f64 = 1e-9;

/// Twelve monthly fractions, January first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UseProfile(pub [f64; 12]);

/// Vineyard irrigation from mid-July through mid-October.
pub const VINEYARD_USE_PROFILE: UseProfile = UseProfile([
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    1.0 / 6.0,
    1.0 / 3.0,
    1.0 / 3.0,
    1.0 / 6.0,
    0.0,
    0.0,
]);

/// Vineyard demand filled from winter storage (Dec-Feb) instead of summer
/// diversion.
pub const VINEYARD_STORAGE_USE_PROFILE: UseProfile = UseProfile([
    1.0 / 3.0,
    1.0 / 3.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    1.0 / 3.0,
]);

/// Orchard irrigation from mid-May through mid-October.
pub const ORCHARD_USE_PROFILE: UseProfile = UseProfile([
    0.0, 0.0, 0.0, 0.0, 0.1, 0.2, 0.2, 0.2, 0.2, 0.1, 0.0, 0.0,
]);

/// Structure use in the summer half of the year (Apr-Sep).
pub const SUMMER_DOMESTIC_USE_PROFILE: UseProfile = UseProfile([
    0.0,
    0.0,
    0.0,
    1.0 / 6.0,
    1.0 / 6.0,
    1.0 / 6.0,
    1.0 / 6.0,
    1.0 / 6.0,
    1.0 / 6.0,
    0.0,
    0.0,
    0.0,
]);

/// Structure use in the winter half of the year (Oct-Mar).
pub const WINTER_DOMESTIC_USE_PROFILE: UseProfile = UseProfile([
    1.0 / 6.0,
    1.0 / 6.0,
    1.0 / 6.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    1.0 / 6.0,
    1.0 / 6.0,
    1.0 / 6.0,
]);

impl UseProfile {
    /// Fraction for a calendar month, 1 = January.
    pub fn fraction(&self, month: u32) -> f64 {
        match month {
            1..=12 => self.0[month as usize - 1],
            _ => 0.0,
        }
    }

    /// Every fraction finite and non-negative, summing to 1.
    pub fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| RightsError::InvalidProfile {
            name: name.to_string(),
            reason,
        };
        if let Some((i, f)) = self
            .0
            .iter()
            .enumerate()
            .find(|(_, f)| !f.is_finite() || **f < 0.0)
        {
            return Err(invalid(format!("{} fraction is {}", MONTH_ABBREVIATIONS[i], f)));
        }
        let total: f64 = self.0.iter().sum();
        if (total - 1.0).abs() > PROFILE_TOLERANCE {
            return Err(invalid(format!("fractions sum to {total}, expected 1")));
        }
        Ok(())
    }
}

/// The four profiles applied during disaggregation, one per demand
/// category. Defaults to the built-in profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UseProfiles {
    pub vineyard: UseProfile,
    pub orchard: UseProfile,
    pub summer_domestic: UseProfile,
    pub winter_domestic: UseProfile,
}

impl Default for UseProfiles {
    fn default() -> Self {
        Self {
            vineyard: VINEYARD_USE_PROFILE,
            orchard: ORCHARD_USE_PROFILE,
            summer_domestic: SUMMER_DOMESTIC_USE_PROFILE,
            winter_domestic: WINTER_DOMESTIC_USE_PROFILE,
        }
    }
}

impl UseProfiles {
    /// Default profiles with vineyards served from winter storage.
    pub fn with_vineyard_storage() -> Self {
        Self {
            vineyard: VINEYARD_STORAGE_USE_PROFILE,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.vineyard.validate("vineyard")?;
        self.orchard.validate("orchard")?;
        self.summer_domestic.validate("summer_domestic")?;
        self.winter_domestic.validate("winter_domestic")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        UseProfiles::default().validate().unwrap();
        UseProfiles::with_vineyard_storage().validate().unwrap();
    }

    #[test]
    fn test_fraction_is_one_based() {
        assert_eq!(VINEYARD_USE_PROFILE.fraction(7), 1.0 / 6.0);
        assert_eq!(VINEYARD_USE_PROFILE.fraction(1), 0.0);
        assert_eq!(VINEYARD_USE_PROFILE.fraction(13), 0.0);
        assert_eq!(ORCHARD_USE_PROFILE.fraction(5), 0.1);
    }

    #[test]
    fn test_profile_must_sum_to_one() {
        let mut profile = ORCHARD_USE_PROFILE;
        profile.0[0] = 0.5;
        let err = profile.validate("orchard").unwrap_err();
        assert!(matches!(err, RightsError::InvalidProfile { ref name, .. } if name == "orchard"));
    }

    #[test]
    fn test_profile_rejects_negative_fraction() {
        let profile = UseProfile([
            -0.5, 1.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ]);
        assert!(profile.validate("custom").is_err());
    }

    #[test]
    fn test_profiles_deserialize_from_json() {
        let json = serde_json::to_string(&UseProfiles::with_vineyard_storage()).unwrap();
        let parsed: UseProfiles = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.vineyard, VINEYARD_STORAGE_USE_PROFILE);
        assert_eq!(parsed.orchard, ORCHARD_USE_PROFILE);
    }
}
