use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RarityTier {
    Common,
    Uncommon,
    Rare,
    UltraRare,
}

impl RarityTier {
    pub const ALL: [RarityTier; 4] = [
        RarityTier::Common,
        RarityTier::Uncommon,
        RarityTier::Rare,
        RarityTier::UltraRare,
    ];

    /// Order in which the selector walks the tiers. Common comes last so it
    /// absorbs any floating-point remainder of the cumulative mass.
    pub const DRAW_ORDER: [RarityTier; 4] = [
        RarityTier::UltraRare,
        RarityTier::Rare,
        RarityTier::Uncommon,
        RarityTier::Common,
    ];

    pub fn probability(self) -> f64 {
        match self {
            RarityTier::Common => 0.50,
            RarityTier::Uncommon => 0.30,
            RarityTier::Rare => 0.15,
            RarityTier::UltraRare => 0.05,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RarityTier::Common => "◊",
            RarityTier::Uncommon => "◊◊",
            RarityTier::Rare => "◊◊◊",
            RarityTier::UltraRare => "◊◊◊◊",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            "◊" => Some(RarityTier::Common),
            "◊◊" => Some(RarityTier::Uncommon),
            "◊◊◊" => Some(RarityTier::Rare),
            "◊◊◊◊" => Some(RarityTier::UltraRare),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RarityTier::Common => "Common",
            RarityTier::Uncommon => "Uncommon",
            RarityTier::Rare => "Rare",
            RarityTier::UltraRare => "Ultra Rare",
        }
    }

    pub fn index(self) -> usize {
        match self {
            RarityTier::Common => 0,
            RarityTier::Uncommon => 1,
            RarityTier::Rare => 2,
            RarityTier::UltraRare => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub rarity: RarityTier,
    pub element: String,
    pub pack: String,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rarity: RarityTier,
        element: impl Into<String>,
        pack: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rarity,
            element: element.into(),
            pack: pack.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_probabilities_sum_to_one() {
        let total: f64 = RarityTier::ALL.iter().map(|tier| tier.probability()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn symbols_map_back_to_tiers() {
        for tier in RarityTier::ALL {
            assert_eq!(RarityTier::from_symbol(tier.symbol()), Some(tier));
        }
        assert_eq!(RarityTier::from_symbol("★"), None);
        assert_eq!(RarityTier::from_symbol(""), None);
    }

    #[test]
    fn draw_order_starts_at_rarest() {
        assert_eq!(RarityTier::DRAW_ORDER[0], RarityTier::UltraRare);
        assert_eq!(RarityTier::DRAW_ORDER[3], RarityTier::Common);
    }
}
