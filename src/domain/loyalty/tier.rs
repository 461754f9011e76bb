use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::errors::LoyaltyError;

// ============================================================================
// Status Tiers - Static, Ordered Catalog
// ============================================================================
//
// The catalog is built once as a const array sorted by level. Every `Tier`
// value in the program is a copy of one of its entries: fields are private,
// and deserialization maps back onto the catalog or fails.
//
// ============================================================================

/// A named membership rank with a point threshold and a guest allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "TierRepr")]
pub struct Tier {
    name: &'static str,
    minimum_points: u64,
    guests_allowed: usize,
    level: usize,
}

impl Tier {
    const fn new(name: &'static str, minimum_points: u64, guests_allowed: usize, level: usize) -> Self {
        Self { name, minimum_points, guests_allowed, level }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn minimum_points(&self) -> u64 {
        self.minimum_points
    }

    pub fn guests_allowed(&self) -> usize {
        self.guests_allowed
    }

    pub fn level(&self) -> usize {
        self.level
    }
}

impl Default for Tier {
    fn default() -> Self {
        TierTable::floor()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Wire shape of a tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TierRepr {
    name: String,
    minimum_points: u64,
    guests_allowed: usize,
    level: usize,
}

impl From<Tier> for TierRepr {
    fn from(tier: Tier) -> Self {
        Self {
            name: tier.name.to_string(),
            minimum_points: tier.minimum_points,
            guests_allowed: tier.guests_allowed,
            level: tier.level,
        }
    }
}

// Written by hand: a derived impl would tie 'de to the 'static name
impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = TierRepr::deserialize(deserializer)?;
        Tier::try_from(repr).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<TierRepr> for Tier {
    type Error = LoyaltyError;

    fn try_from(repr: TierRepr) -> Result<Self, Self::Error> {
        match TierTable::by_level(repr.level) {
            Some(tier) if tier.name == repr.name && tier.minimum_points == repr.minimum_points => Ok(tier),
            _ => Err(LoyaltyError::UnknownTier {
                name: repr.name,
                level: repr.level,
            }),
        }
    }
}

const TIERS: [Tier; 5] = [
    Tier::new("Member", 0, 0, 0),
    Tier::new("Bronze", 500, 1, 1),
    Tier::new("Silver", 1_000, 2, 2),
    Tier::new("Gold", 2_000, 5, 3),
    Tier::new("Platinum", 5_000, 10, 4),
];

/// Pure lookups over the tier catalog
pub struct TierTable;

impl TierTable {
    pub fn all() -> &'static [Tier] {
        &TIERS
    }

    /// Level 0, the tier every new customer starts at
    pub fn floor() -> Tier {
        TIERS[0]
    }

    pub fn top() -> Tier {
        TIERS[TIERS.len() - 1]
    }

    pub fn by_level(level: usize) -> Option<Tier> {
        TIERS.get(level).copied()
    }

    pub fn by_name(name: &str) -> Option<Tier> {
        TIERS.iter().find(|tier| tier.name.eq_ignore_ascii_case(name)).copied()
    }

    /// One level up, saturating at the top tier
    pub fn next(tier: Tier) -> Tier {
        Self::by_level(tier.level + 1).unwrap_or_else(Self::top)
    }

    /// One level down, saturating at the floor
    pub fn previous(tier: Tier) -> Tier {
        Self::by_level(tier.level.saturating_sub(1)).unwrap_or_else(Self::floor)
    }

    /// Highest tier whose minimum is covered by `points`
    pub fn max_tier_for(points: u64) -> Tier {
        TIERS
            .iter()
            .rev()
            .find(|tier| tier.minimum_points <= points)
            .copied()
            .unwrap_or_else(Self::floor)
    }

    pub fn guests_allowed(tier: Tier) -> usize {
        tier.guests_allowed
    }
}
