use crate::{Card, PackDefinition, RarityTier};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate card id {0}")]
    DuplicateId(String),
    #[error("card with empty id at position {0}")]
    EmptyId(usize),
}

/// Read-only card catalog, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: Vec<Card>,
}

impl Catalog {
    pub fn new(cards: Vec<Card>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(cards.len());
        for (idx, card) in cards.iter().enumerate() {
            if card.id.is_empty() {
                return Err(CatalogError::EmptyId(idx));
            }
            if !seen.insert(card.id.as_str()) {
                return Err(CatalogError::DuplicateId(card.id.clone()));
            }
        }
        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card_by_id(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn cards_with_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Card> {
        self.cards
            .iter()
            .filter(|card| tags.iter().any(|tag| tag.as_ref() == card.pack))
            .cloned()
            .collect()
    }

    /// Cards eligible for a pack, in catalog order.
    pub fn eligible_for(&self, pack: &PackDefinition) -> Vec<Card> {
        self.cards_with_tags(&pack.tags)
    }

    pub fn rarity_of(&self, id: &str) -> Option<RarityTier> {
        self.card_by_id(id).map(|card| card.rarity)
    }
}

/// Card counts indexed by `RarityTier::index`.
pub fn count_by_rarity<'a>(cards: impl IntoIterator<Item = &'a Card>) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for card in cards {
        counts[card.rarity.index()] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, pack: &str) -> Card {
        Card::new(id, id, RarityTier::Common, "Grass", pack)
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::new(vec![card("a", "X"), card("a", "Y")]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("a".to_string()));
    }

    #[test]
    fn rejects_empty_ids() {
        let err = Catalog::new(vec![card("a", "X"), card("", "Y")]).unwrap_err();
        assert_eq!(err, CatalogError::EmptyId(1));
    }

    #[test]
    fn eligible_cards_keep_catalog_order_across_tags() {
        let catalog = Catalog::new(vec![
            card("a", "Mewtwo"),
            card("b", "Pikachu"),
            card("c", "Mewtwo"),
            card("d", "Other"),
        ])
        .expect("catalog");
        let pack = PackDefinition {
            id: "p".to_string(),
            name: "P".to_string(),
            tags: vec!["Pikachu".to_string(), "Mewtwo".to_string()],
            price_sol: 0.0,
        };
        let ids: Vec<String> = catalog
            .eligible_for(&pack)
            .into_iter()
            .map(|card| card.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
