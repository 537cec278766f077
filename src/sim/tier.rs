//! Ball tier catalog
//!
//! Tiers are plain data: radius, score and successor. Images and sounds for a
//! tier are looked up by the presentation layer from [`Tier::index`].

use serde::{Deserialize, Serialize};

/// Number of tiers in the catalog
pub const TIER_COUNT: usize = 11;

/// Static properties of one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierInfo {
    pub radius: f32,
    pub score_value: u32,
}

/// Tier table, smallest first
pub const TIERS: [TierInfo; TIER_COUNT] = [
    TierInfo { radius: 16.0, score_value: 10 },
    TierInfo { radius: 24.0, score_value: 20 },
    TierInfo { radius: 32.0, score_value: 40 },
    TierInfo { radius: 40.0, score_value: 80 },
    TierInfo { radius: 48.0, score_value: 160 },
    TierInfo { radius: 64.0, score_value: 320 },
    TierInfo { radius: 72.0, score_value: 450 },
    TierInfo { radius: 80.0, score_value: 640 },
    TierInfo { radius: 88.0, score_value: 880 },
    TierInfo { radius: 96.0, score_value: 1280 },
    TierInfo { radius: 128.0, score_value: 2500 },
];

/// A ball tier (0 = smallest, 10 = terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const SMALLEST: Tier = Tier(0);
    pub const TERMINAL: Tier = Tier((TIER_COUNT - 1) as u8);

    /// Look up a tier by index
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < TIER_COUNT).then_some(Tier(index))
    }

    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn info(self) -> &'static TierInfo {
        &TIERS[self.0 as usize]
    }

    #[inline]
    pub fn radius(self) -> f32 {
        self.info().radius
    }

    #[inline]
    pub fn score_value(self) -> u32 {
        self.info().score_value
    }

    /// The tier two of these merge into (`None` for the terminal tier)
    pub fn successor(self) -> Option<Tier> {
        Tier::new(self.0 + 1)
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Tier::new(index).ok_or_else(|| format!("tier index {index} out of range"))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_strictly_increasing() {
        for pair in TIERS.windows(2) {
            assert!(pair[1].radius > pair[0].radius);
            assert!(pair[1].score_value > pair[0].score_value);
        }
        assert!(TIERS.iter().all(|t| t.radius > 0.0 && t.score_value > 0));
    }

    #[test]
    fn test_successor_chain() {
        let chain: Vec<Tier> = std::iter::successors(Some(Tier::SMALLEST), |t| t.successor()).collect();
        assert_eq!(chain.len(), TIER_COUNT);
        assert_eq!(chain.last(), Some(&Tier::TERMINAL));
        assert!(Tier::TERMINAL.successor().is_none());
    }

    #[test]
    fn test_lookup() {
        let t = Tier::new(1).unwrap();
        assert_eq!(t.radius(), 24.0);
        assert_eq!(t.score_value(), 20);
        assert!(Tier::new(11).is_none());
    }

    #[test]
    fn test_serde_as_index() {
        let json = serde_json::to_string(&Tier::new(4).unwrap()).unwrap();
        assert_eq!(json, "4");
        let back: Tier = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index(), 4);
        assert!(serde_json::from_str::<Tier>("42").is_err());
    }
}
