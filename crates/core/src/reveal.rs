use crate::{Card, RandomSource};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cards in every reveal strip.
pub const REVEAL_LENGTH: usize = 20;
/// Fill slots that prefer ids not shown yet before repeats are allowed.
pub const UNIQUE_FILL_SLOTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevealSequence {
    pub cards: Vec<Card>,
    pub winning_position: usize,
}

impl RevealSequence {
    pub fn winner(&self) -> &Card {
        &self.cards[self.winning_position]
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Builds the strip scrolled past during a pack opening, with `winner`
/// placed at a uniformly random position.
///
/// Filler comes from `eligible` minus the winner's id. The first
/// `UNIQUE_FILL_SLOTS` filler slots draw among ids not yet shown while any
/// remain; later slots draw from the whole filler pool. When the pack holds
/// nothing but the winner, the winner is repeated.
pub fn build_reveal_sequence<R: RandomSource + ?Sized>(
    eligible: &[Card],
    winner: &Card,
    rng: &mut R,
) -> RevealSequence {
    let winning_position = rng.next_index(REVEAL_LENGTH);
    let others: Vec<&Card> = eligible.iter().filter(|card| card.id != winner.id).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut cards = Vec::with_capacity(REVEAL_LENGTH);
    let mut filled = 0usize;
    for position in 0..REVEAL_LENGTH {
        if position == winning_position {
            cards.push(winner.clone());
            continue;
        }
        let card = if others.is_empty() {
            winner
        } else if filled < UNIQUE_FILL_SLOTS {
            let unseen: Vec<&Card> = others
                .iter()
                .copied()
                .filter(|card| !seen.contains(card.id.as_str()))
                .collect();
            if unseen.is_empty() {
                others[rng.next_index(others.len())]
            } else {
                unseen[rng.next_index(unseen.len())]
            }
        } else {
            others[rng.next_index(others.len())]
        };
        seen.insert(card.id.as_str());
        cards.push(card.clone());
        filled += 1;
    }

    RevealSequence {
        cards,
        winning_position,
    }
}
