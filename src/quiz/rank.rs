//! XP tiers.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank {
    pub tier_index: usize,
    pub name: &'static str,
}

/// Ascending (minimum XP, name) pairs.
const TIERS: [(u32, &str); 4] = [
    (0, "Novice"),
    (50, "Apprentice"),
    (150, "Scholar"),
    (300, "Grandmaster"),
];

pub fn rank(xp: u32) -> Rank {
    let tier_index = TIERS
        .iter()
        .rposition(|(min_xp, _)| xp >= *min_xp)
        .unwrap_or(0);
    Rank {
        tier_index,
        name: TIERS[tier_index].1,
    }
}

/// XP still missing for the next tier, `None` at the top tier.
pub fn xp_to_next_rank(xp: u32) -> Option<u32> {
    TIERS
        .iter()
        .find(|(min_xp, _)| *min_xp > xp)
        .map(|(min_xp, _)| min_xp - xp)
}
