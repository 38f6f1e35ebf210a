//! Record types and domain constants for the tabulation pipeline.

use serde::{Deserialize, Serialize, Serializer};

/// HINCP code the Census assigns to vacant units and group quarters.
/// Records carrying it are not housing units and are excluded outright.
pub const NON_HOUSING_UNIT_INCOME: i64 = -60_000;

/// Area median income for the metro, from the HUD income-limits table.
pub const AREA_MEDIAN_INCOME: i64 = 64_400;

/// Bracket caps at 30%, 60%, 90%, and 120% of [`AREA_MEDIAN_INCOME`].
/// Each cap is inclusive; the bottom bracket is unbounded below.
pub const AMI_30_CAP: i64 = 19_320;
pub const AMI_60_CAP: i64 = 38_640;
pub const AMI_90_CAP: i64 = 57_960;
pub const AMI_120_CAP: i64 = 77_280;

/// VEH is top-coded: 6 means "6 or more vehicles".
pub const VEHICLE_TOP_CODE: u8 = 6;

/// A raw household row as delivered by the microdata source.
///
/// The source repeats household-level fields once per person in the
/// household, so the same SERIALNO appears on multiple rows; deduplication
/// happens in the normalizer, not here. `vehicles` of `-1` encodes a blank
/// VEH cell, which only occurs on non-housing-unit rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdRecord {
    #[serde(rename = "SERIALNO")]
    pub serialno: String,
    #[serde(rename = "WGTP")]
    pub weight: f64,
    #[serde(rename = "PUMA")]
    pub puma: String,
    #[serde(rename = "VEH")]
    pub vehicles: i64,
    #[serde(rename = "TEN")]
    pub tenure_code: i64,
    #[serde(rename = "HINCP")]
    pub income: i64,
}

/// Housing tenure collapsed to the two categories the report uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tenure {
    Renter,
    Homeowner,
}

impl Tenure {
    /// Maps a raw TEN code to a tenure category.
    ///
    /// - `1` owned with mortgage, `2` owned free and clear → [`Tenure::Homeowner`]
    /// - `3` rented for cash, `4` occupied without payment of rent → [`Tenure::Renter`]
    ///
    /// Returns `None` for codes outside the known domain.
    pub fn from_code(code: i64) -> Option<Tenure> {
        match code {
            1 | 2 => Some(Tenure::Homeowner),
            3 | 4 => Some(Tenure::Renter),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tenure::Renter => "Renter",
            Tenure::Homeowner => "Homeowner",
        }
    }
}

impl Serialize for Tenure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Household income bracket as a percent of area median income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncomeBracket {
    UpTo30Ami,
    Ami30To60,
    Ami60To90,
    Ami90To120,
    Above120Ami,
}

impl IncomeBracket {
    /// Classifies a household income into its bracket.
    ///
    /// Caps are inclusive, so an income sitting exactly on a cap belongs to
    /// the bracket below it. Incomes under the bottom cap (including negative
    /// incomes from business losses) all land in the bottom bracket.
    pub fn classify(income: i64) -> IncomeBracket {
        match income {
            i if i <= AMI_30_CAP => IncomeBracket::UpTo30Ami,
            i if i <= AMI_60_CAP => IncomeBracket::Ami30To60,
            i if i <= AMI_90_CAP => IncomeBracket::Ami60To90,
            i if i <= AMI_120_CAP => IncomeBracket::Ami90To120,
            _ => IncomeBracket::Above120Ami,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncomeBracket::UpTo30Ami => "0-30% AMI",
            IncomeBracket::Ami30To60 => "30-60% AMI",
            IncomeBracket::Ami60To90 => "60-90% AMI",
            IncomeBracket::Ami90To120 => "90-120% AMI",
            IncomeBracket::Above120Ami => "Over 120% AMI",
        }
    }
}

impl Serialize for IncomeBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One housing unit after deduplication, filtering, and recoding.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub serialno: String,
    pub weight: f64,
    pub puma: String,
    /// Vehicle category in `0..=6`, where 6 means "6 or more".
    pub vehicles: u8,
    pub tenure: Tenure,
    pub bracket: IncomeBracket,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenure_from_code() {
        assert_eq!(Tenure::from_code(1), Some(Tenure::Homeowner));
        assert_eq!(Tenure::from_code(2), Some(Tenure::Homeowner));
        assert_eq!(Tenure::from_code(3), Some(Tenure::Renter));
        assert_eq!(Tenure::from_code(4), Some(Tenure::Renter));
        assert_eq!(Tenure::from_code(0), None);
        assert_eq!(Tenure::from_code(5), None);
        assert_eq!(Tenure::from_code(-1), None);
    }

    #[test]
    fn test_bracket_caps_are_inclusive() {
        assert_eq!(IncomeBracket::classify(19_320), IncomeBracket::UpTo30Ami);
        assert_eq!(IncomeBracket::classify(19_321), IncomeBracket::Ami30To60);
        assert_eq!(IncomeBracket::classify(38_640), IncomeBracket::Ami30To60);
        assert_eq!(IncomeBracket::classify(38_641), IncomeBracket::Ami60To90);
        assert_eq!(IncomeBracket::classify(57_960), IncomeBracket::Ami60To90);
        assert_eq!(IncomeBracket::classify(57_961), IncomeBracket::Ami90To120);
        assert_eq!(IncomeBracket::classify(77_280), IncomeBracket::Ami90To120);
        assert_eq!(IncomeBracket::classify(77_281), IncomeBracket::Above120Ami);
    }

    #[test]
    fn test_bracket_bottom_is_unbounded() {
        assert_eq!(IncomeBracket::classify(0), IncomeBracket::UpTo30Ami);
        assert_eq!(IncomeBracket::classify(-5_000), IncomeBracket::UpTo30Ami);
    }

    #[test]
    fn test_bracket_ordering_follows_income() {
        assert!(IncomeBracket::UpTo30Ami < IncomeBracket::Ami30To60);
        assert!(IncomeBracket::Ami90To120 < IncomeBracket::Above120Ami);
    }

    #[test]
    fn test_tenure_sorts_renter_first() {
        assert!(Tenure::Renter < Tenure::Homeowner);
    }
}
