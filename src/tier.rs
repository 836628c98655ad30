use std::fmt;

use serde::Serialize;

/// Standing of a referrer, derived from their referral count on every read.
///
/// Variants are declared in ascending order so the derived `Ord` matches
/// `None < Bronze < Silver < Gold < Platinum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum BadgeTier {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl BadgeTier {
    /// Tiers with a threshold, highest first. Thresholds overlap, so the
    /// scan order decides the result.
    const THRESHOLDS: [(BadgeTier, u32); 4] = [
        (BadgeTier::Platinum, 10),
        (BadgeTier::Gold, 5),
        (BadgeTier::Silver, 3),
        (BadgeTier::Bronze, 1),
    ];

    /// Inclusive minimum referral count for this tier.
    pub fn threshold(self) -> u32 {
        Self::THRESHOLDS
            .iter()
            .find(|(tier, _)| *tier == self)
            .map_or(0, |(_, min)| *min)
    }

    /// Label shown on the ranking board.
    pub fn label(self) -> &'static str {
        match self {
            BadgeTier::None => "Einsteiger",
            BadgeTier::Bronze => "Bronze",
            BadgeTier::Silver => "Silber",
            BadgeTier::Gold => "Gold",
            BadgeTier::Platinum => "Platin",
        }
    }
}

impl fmt::Display for BadgeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a referral count to its badge tier.
pub fn resolve_tier(count: u32) -> BadgeTier {
    BadgeTier::THRESHOLDS
        .iter()
        .find(|(_, min)| count >= *min)
        .map_or(BadgeTier::None, |(tier, _)| *tier)
}
