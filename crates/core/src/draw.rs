use crate::{Card, RandomSource, RarityTier};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("pack unavailable: no eligible cards")]
    InvalidInput,
}

/// Tier for a uniform roll in `[0, 1)`, walking rarest first.
pub fn tier_for_roll(roll: f64) -> RarityTier {
    let mut cumulative = 0.0;
    for tier in RarityTier::DRAW_ORDER {
        cumulative += tier.probability();
        if roll < cumulative {
            return tier;
        }
    }
    RarityTier::Common
}

/// Draws the single reward card for a pack.
///
/// The tier is chosen with the fixed table on `RarityTier::probability`,
/// independent of how many cards each tier holds, then a card is picked
/// uniformly inside that tier. A tier with no cards in this pack falls back
/// to a uniform pick over every eligible card.
pub fn select_card<'a, R: RandomSource + ?Sized>(
    eligible: &'a [Card],
    rng: &mut R,
) -> Result<&'a Card, DrawError> {
    if eligible.is_empty() {
        return Err(DrawError::InvalidInput);
    }
    let tier = tier_for_roll(rng.next_unit());
    let bucket: Vec<&Card> = eligible.iter().filter(|card| card.rarity == tier).collect();
    if bucket.is_empty() {
        return Ok(&eligible[rng.next_index(eligible.len())]);
    }
    Ok(bucket[rng.next_index(bucket.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RngState;

    fn pool(counts: [usize; 4]) -> Vec<Card> {
        let mut cards = Vec::new();
        for tier in RarityTier::ALL {
            for n in 0..counts[tier.index()] {
                cards.push(Card::new(
                    format!("{}-{n}", tier.label()),
                    format!("{} {n}", tier.label()),
                    tier,
                    "Psychic",
                    "Test",
                ));
            }
        }
        cards
    }

    #[test]
    fn roll_boundaries_follow_cumulative_mass() {
        assert_eq!(tier_for_roll(0.0), RarityTier::UltraRare);
        assert_eq!(tier_for_roll(0.049), RarityTier::UltraRare);
        assert_eq!(tier_for_roll(0.05), RarityTier::Rare);
        assert_eq!(tier_for_roll(0.199), RarityTier::Rare);
        assert_eq!(tier_for_roll(0.2), RarityTier::Uncommon);
        assert_eq!(tier_for_roll(0.499), RarityTier::Uncommon);
        assert_eq!(tier_for_roll(0.5), RarityTier::Common);
        assert_eq!(tier_for_roll(0.999_999), RarityTier::Common);
    }

    #[test]
    fn empty_pool_is_invalid_input() {
        let mut rng = RngState::from_seed(1);
        for _ in 0..10 {
            assert_eq!(select_card(&[], &mut rng), Err(DrawError::InvalidInput));
        }
    }

    #[test]
    fn tier_distribution_ignores_bucket_sizes() {
        let cards = pool([10, 5, 3, 2]);
        let mut rng = RngState::from_seed(0xC0FFEE);
        let mut counts = [0usize; 4];
        let draws = 100_000;
        for _ in 0..draws {
            let card = select_card(&cards, &mut rng).expect("draw");
            counts[card.rarity.index()] += 1;
        }
        for tier in RarityTier::ALL {
            let observed = counts[tier.index()] as f64 / draws as f64;
            assert!(
                (observed - tier.probability()).abs() < 0.02,
                "{tier:?}: observed {observed}"
            );
        }
    }

    #[test]
    fn missing_tier_falls_back_to_whole_pool() {
        let cards = pool([4, 3, 2, 0]);
        let mut rng = RngState::from_seed(99);
        for _ in 0..5_000 {
            let card = select_card(&cards, &mut rng).expect("draw");
            assert!(cards.iter().any(|candidate| candidate.id == card.id));
            assert_ne!(card.rarity, RarityTier::UltraRare);
        }
    }

    #[test]
    fn single_card_pool_always_returns_it() {
        let cards = pool([0, 0, 1, 0]);
        let mut rng = RngState::from_seed(3);
        for _ in 0..100 {
            assert_eq!(select_card(&cards, &mut rng).expect("draw").id, cards[0].id);
        }
    }
}
