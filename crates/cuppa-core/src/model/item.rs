//! Item types: ratings, price levels, categories, coordinates, and the
//! projected aggregate.
//!
//! All field types validate at construction so that malformed values are
//! rejected before any write leaves the process. `Rating` is stored in
//! half-point ticks (0..=10) rather than floating point, which makes the
//! half-point grid an invariant of the type instead of a convention.

use std::collections::BTreeSet;
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// A rating in `[0, 5]` at half-point granularity.
///
/// Stored internally as half-point ticks (`0..=10`), so `Rating(9)` is 4.5.
/// Construction validates the grid; there is no way to hold a 3.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

/// A value outside `[0, 5]` or off the half-point grid.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid rating {value}: ratings run 0 to 5 in half-point steps")]
pub struct InvalidRating {
    /// The rejected value.
    pub value: f64,
}

impl Rating {
    /// The lowest rating (0.0).
    pub const MIN: Self = Self(0);
    /// The highest rating (5.0).
    pub const MAX: Self = Self(10);

    /// Build from half-point ticks (`0..=10`).
    pub const fn from_ticks(ticks: u8) -> Result<Self, InvalidRating> {
        if ticks <= Self::MAX.0 {
            Ok(Self(ticks))
        } else {
            Err(InvalidRating {
                value: ticks as f64 / 2.0,
            })
        }
    }

    /// Build from a numeric value, enforcing the half-point grid.
    ///
    /// # Errors
    ///
    /// [`InvalidRating`] when the value is not finite, outside `[0, 5]`,
    /// or not a multiple of 0.5.
    pub fn from_value(value: f64) -> Result<Self, InvalidRating> {
        let reject = InvalidRating { value };
        if !value.is_finite() || !(0.0..=5.0).contains(&value) {
            return Err(reject);
        }
        let ticks = value * 2.0;
        if ticks.fract() != 0.0 {
            return Err(reject);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self(ticks as u8))
    }

    /// The numeric value (0.0, 0.5, ..., 5.0).
    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Half-point ticks (`0..=10`).
    #[must_use]
    pub const fn ticks(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

impl FromStr for Rating {
    type Err = InvalidRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| InvalidRating {
            value: f64::NAN,
        })?;
        Self::from_value(value)
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// PriceLevel
// ---------------------------------------------------------------------------

/// A price level in `[1, 4]`, displayed as `$` through `$$$$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceLevel(u8);

/// A price level outside `[1, 4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid price level {value}: price levels run 1 to 4")]
pub struct InvalidPriceLevel {
    /// The rejected value.
    pub value: u8,
}

impl PriceLevel {
    /// The cheapest level (`$`).
    pub const MIN: Self = Self(1);
    /// The most expensive level (`$$$$`).
    pub const MAX: Self = Self(4);

    /// Build from an integer level.
    pub const fn new(level: u8) -> Result<Self, InvalidPriceLevel> {
        if level >= Self::MIN.0 && level <= Self::MAX.0 {
            Ok(Self(level))
        } else {
            Err(InvalidPriceLevel { value: level })
        }
    }

    /// The integer level (`1..=4`).
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            write!(f, "$")?;
        }
        Ok(())
    }
}

impl FromStr for PriceLevel {
    type Err = InvalidPriceLevel;

    /// Accepts either an integer (`"3"`) or dollar signs (`"$$$"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.chars().all(|c| c == '$') {
            #[allow(clippy::cast_possible_truncation)]
            return Self::new(s.len().min(u8::MAX as usize) as u8);
        }
        let level: u8 = s.parse().map_err(|_| InvalidPriceLevel { value: 0 })?;
        Self::new(level)
    }
}

impl Serialize for PriceLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for PriceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = u8::deserialize(deserializer)?;
        Self::new(level).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Neighborhood categories — the fixed label set items can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Downtown,
    Rino,
    CapitolHill,
    Highlands,
    FivePoints,
    WashPark,
    Baker,
    Sunnyside,
}

/// A label that is not part of the category set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{label}' (expected one of: {expected})")]
pub struct InvalidCategory {
    /// The rejected label.
    pub label: String,
    /// Comma-separated valid labels.
    pub expected: String,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 8] = [
        Self::Downtown,
        Self::Rino,
        Self::CapitolHill,
        Self::Highlands,
        Self::FivePoints,
        Self::WashPark,
        Self::Baker,
        Self::Sunnyside,
    ];

    /// Stable label used in serialization and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downtown => "downtown",
            Self::Rino => "rino",
            Self::CapitolHill => "capitol-hill",
            Self::Highlands => "highlands",
            Self::FivePoints => "five-points",
            Self::WashPark => "wash-park",
            Self::Baker => "baker",
            Self::Sunnyside => "sunnyside",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .ok_or_else(|| InvalidCategory {
                label,
                expected: Self::ALL.map(Self::as_str).join(", "),
            })
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A latitude/longitude pair. Presence on an item gates map participation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub lng: f64,
}

/// A lat/lng pair outside the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid coordinates ({lat}, {lng})")]
pub struct InvalidCoordinates {
    /// The rejected latitude.
    pub lat: f64,
    /// The rejected longitude.
    pub lng: f64,
}

impl Coordinates {
    /// Build a validated pair.
    ///
    /// # Errors
    ///
    /// [`InvalidCoordinates`] when either component is non-finite or out
    /// of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinates> {
        if lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng)
        {
            Ok(Self { lat, lng })
        } else {
            Err(InvalidCoordinates { lat, lng })
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// One rated point of interest, as mirrored from the remote store.
///
/// `id` is assigned by the store on creation and immutable thereafter.
/// `owner_id` is set once at creation. `created_at`/`updated_at` are
/// store-assigned and monotonically non-decreasing; the client clock is
/// never trusted for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_place_ref: Option<String>,
    pub rating: Rating,
    pub price_level: PriceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default)]
    pub supports_cold_brew: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether this item participates in the map projection.
    #[must_use]
    pub const fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // === Rating ===

    #[test]
    fn rating_accepts_half_points() {
        for ticks in 0..=10 {
            let value = f64::from(ticks) / 2.0;
            let r = Rating::from_value(value).expect("on-grid value");
            assert_eq!(r.ticks(), ticks);
            assert!((r.value() - value).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rating_rejects_off_grid() {
        assert!(Rating::from_value(3.3).is_err());
        assert!(Rating::from_value(4.25).is_err());
        assert!(Rating::from_value(-0.5).is_err());
        assert!(Rating::from_value(5.5).is_err());
        assert!(Rating::from_value(f64::NAN).is_err());
        assert!(Rating::from_value(f64::INFINITY).is_err());
    }

    #[test]
    fn rating_from_ticks_bounds() {
        assert!(Rating::from_ticks(10).is_ok());
        assert!(Rating::from_ticks(11).is_err());
    }

    #[test]
    fn rating_display() {
        assert_eq!(Rating::from_value(4.5).expect("valid").to_string(), "4.5");
        assert_eq!(Rating::from_value(3.0).expect("valid").to_string(), "3");
        assert_eq!(Rating::MIN.to_string(), "0");
    }

    #[test]
    fn rating_parse() {
        assert_eq!(
            "4.5".parse::<Rating>().expect("valid"),
            Rating::from_value(4.5).expect("valid")
        );
        assert!("3.3".parse::<Rating>().is_err());
        assert!("bogus".parse::<Rating>().is_err());
    }

    #[test]
    fn rating_serde_is_a_number() {
        let r = Rating::from_value(4.5).expect("valid");
        let json = serde_json::to_string(&r).expect("serialize");
        assert_eq!(json, "4.5");
        let back: Rating = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, r);
    }

    #[test]
    fn rating_serde_rejects_off_grid() {
        assert!(serde_json::from_str::<Rating>("3.3").is_err());
        assert!(serde_json::from_str::<Rating>("6.0").is_err());
    }

    // === PriceLevel ===

    #[test]
    fn price_level_bounds() {
        assert!(PriceLevel::new(0).is_err());
        assert!(PriceLevel::new(1).is_ok());
        assert!(PriceLevel::new(4).is_ok());
        assert!(PriceLevel::new(5).is_err());
    }

    #[test]
    fn price_level_display_and_parse() {
        let p = PriceLevel::new(3).expect("valid");
        assert_eq!(p.to_string(), "$$$");
        assert_eq!("$$$".parse::<PriceLevel>().expect("valid"), p);
        assert_eq!("3".parse::<PriceLevel>().expect("valid"), p);
        assert!("$$$$$".parse::<PriceLevel>().is_err());
        assert!("0".parse::<PriceLevel>().is_err());
    }

    #[test]
    fn price_level_serde_is_an_integer() {
        let p = PriceLevel::new(2).expect("valid");
        assert_eq!(serde_json::to_string(&p).expect("serialize"), "2");
        assert!(serde_json::from_str::<PriceLevel>("9").is_err());
    }

    // === Category ===

    #[test]
    fn category_labels_round_trip() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().expect("valid"), c);
        }
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(
            "RiNo".parse::<Category>().expect("valid"),
            Category::Rino
        );
        assert_eq!(
            " Capitol-Hill ".parse::<Category>().expect("valid"),
            Category::CapitolHill
        );
    }

    #[test]
    fn category_parse_rejects_unknown() {
        let err = "mars".parse::<Category>().expect_err("unknown");
        assert_eq!(err.label, "mars");
        assert!(err.expected.contains("downtown"));
    }

    #[test]
    fn category_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Category::FivePoints).expect("serialize");
        assert_eq!(json, "\"five-points\"");
    }

    // === Coordinates ===

    #[test]
    fn coordinates_validation() {
        assert!(Coordinates::new(39.7392, -104.9903).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, 181.0).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    // === Item ===

    fn sample_item() -> Item {
        Item {
            id: "srv-1".into(),
            name: "Huckleberry Roasters".into(),
            address: Some("4301 Pecos St".into()),
            external_place_ref: None,
            rating: Rating::from_value(4.5).expect("valid"),
            price_level: PriceLevel::new(2).expect("valid"),
            category: Some(Category::Sunnyside),
            tags: ["cozy".to_string(), "good-wifi".to_string()].into(),
            notes: "Great latte art.".into(),
            supports_cold_brew: true,
            coordinates: Some(Coordinates::new(39.7764, -105.0067).expect("valid")),
            owner_id: "u1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn item_serde_round_trip() {
        let item = sample_item();
        let json = serde_json::to_string(&item).expect("serialize");
        let back: Item = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, item);
    }

    #[test]
    fn item_optional_fields_default_on_deserialize() {
        let json = r#"{
            "id": "srv-2",
            "name": "Corvus",
            "rating": 4.0,
            "price_level": 3,
            "owner_id": "u1",
            "created_at": "2026-01-05T12:00:00Z",
            "updated_at": "2026-01-05T12:00:00Z"
        }"#;
        let item: Item = serde_json::from_str(json).expect("deserialize");
        assert!(item.address.is_none());
        assert!(item.tags.is_empty());
        assert!(item.notes.is_empty());
        assert!(!item.supports_cold_brew);
        assert!(!item.has_coordinates());
    }
}
