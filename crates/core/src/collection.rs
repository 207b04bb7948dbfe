use crate::{
    count_by_rarity, Catalog, CollectionSet, CollectionStore, OpeningRecord, StoreError,
    OBTAINED_FROM_PACK,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetProgress {
    pub set_id: String,
    pub name: String,
    pub obtained: usize,
    pub total: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionProgress {
    pub total_collected: usize,
    pub catalog_size: usize,
    pub percent: u32,
    /// Owned catalog cards per tier, indexed by `RarityTier::index`.
    pub by_rarity: [usize; 4],
    pub sets: Vec<SetProgress>,
}

/// Whole-number completion percent, rounding halves up. Empty sets are 0%.
pub fn completion_percent(obtained: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (obtained as f64 / total as f64 * 100.0).round() as u32
}

impl CollectionProgress {
    pub fn compute(catalog: &Catalog, sets: &[CollectionSet], owned: &HashSet<String>) -> Self {
        let owned_cards: Vec<_> = catalog
            .cards()
            .iter()
            .filter(|card| owned.contains(&card.id))
            .collect();
        let sets = sets
            .iter()
            .map(|set| {
                let members = catalog.cards_with_tags(&set.tags);
                let obtained = members.iter().filter(|card| owned.contains(&card.id)).count();
                SetProgress {
                    set_id: set.id.clone(),
                    name: set.name.clone(),
                    obtained,
                    total: members.len(),
                    percent: completion_percent(obtained, members.len()),
                }
            })
            .collect();
        Self {
            total_collected: owned.len(),
            catalog_size: catalog.len(),
            percent: completion_percent(owned_cards.len(), catalog.len()),
            by_rarity: count_by_rarity(owned_cards.iter().copied()),
            sets,
        }
    }

    pub fn set(&self, set_id: &str) -> Option<&SetProgress> {
        self.sets.iter().find(|set| set.set_id == set_id)
    }
}

pub fn owned_card_ids<S: CollectionStore + ?Sized>(
    store: &S,
    wallet: &str,
) -> Result<HashSet<String>, StoreError> {
    Ok(store
        .collection(wallet)?
        .into_iter()
        .map(|entry| entry.card_id)
        .collect())
}

/// Adds to the collection every card that shows up in the opening history
/// but is missing from the collection. Returns how many cards were added.
pub fn sync_from_openings<S: CollectionStore + ?Sized>(
    store: &mut S,
    wallet: &str,
) -> Result<usize, StoreError> {
    let openings = store.openings(wallet, None, usize::MAX)?;
    if openings.is_empty() {
        return Ok(0);
    }
    let owned = owned_card_ids(&*store, wallet)?;
    let mut latest: HashMap<&str, &OpeningRecord> = HashMap::new();
    for opening in openings.iter().filter(|row| !owned.contains(&row.card_id)) {
        let keep = latest
            .get(opening.card_id.as_str())
            .map_or(true, |current| opening.seq > current.seq);
        if keep {
            latest.insert(opening.card_id.as_str(), opening);
        }
    }
    let mut missing: Vec<&OpeningRecord> = latest.into_values().collect();
    missing.sort_by_key(|row| row.seq);
    for row in &missing {
        store.add_card(
            wallet,
            &row.card_id,
            &row.card_name,
            Some(&row.pack_id),
            OBTAINED_FROM_PACK,
        )?;
    }
    if !missing.is_empty() {
        tracing::info!(wallet, synced = missing.len(), "collection synced from openings");
    }
    Ok(missing.len())
}

/// Opening history grouped by pack id, newest first inside each group.
pub fn openings_by_pack<S: CollectionStore + ?Sized>(
    store: &S,
    wallet: &str,
) -> Result<BTreeMap<String, Vec<OpeningRecord>>, StoreError> {
    let mut grouped: BTreeMap<String, Vec<OpeningRecord>> = BTreeMap::new();
    for row in store.openings(wallet, None, usize::MAX)? {
        grouped.entry(row.pack_id.clone()).or_default().push(row);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, MemoryCollectionStore, NewOpening, RarityTier};

    fn opening<'a>(pack: &'a str, card: &'a Card) -> NewOpening<'a> {
        NewOpening {
            pack_id: pack,
            pack_name: pack,
            card,
            transaction_signature: None,
            obtained_from: OBTAINED_FROM_PACK,
        }
    }

    fn catalog() -> Catalog {
        let mut cards = Vec::new();
        for idx in 0..4 {
            cards.push(Card::new(
                format!("m{idx}"),
                "Mewtwo card",
                RarityTier::Common,
                "Psychic",
                "Mewtwo",
            ));
        }
        for idx in 0..3 {
            cards.push(Card::new(
                format!("p{idx}"),
                "Pikachu card",
                RarityTier::Rare,
                "Lightning",
                "Pikachu",
            ));
        }
        Catalog::new(cards).expect("catalog")
    }

    fn sets() -> Vec<CollectionSet> {
        vec![
            CollectionSet {
                id: "mewtwo".to_string(),
                name: "Mewtwo".to_string(),
                tags: vec!["Mewtwo".to_string()],
            },
            CollectionSet {
                id: "apex".to_string(),
                name: "Apex".to_string(),
                tags: vec!["Mewtwo".to_string(), "Pikachu".to_string()],
            },
            CollectionSet {
                id: "empty".to_string(),
                name: "Empty".to_string(),
                tags: vec!["Nothing".to_string()],
            },
        ]
    }

    #[test]
    fn percent_rounds_like_the_album() {
        assert_eq!(completion_percent(0, 0), 0);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(1, 8), 13);
        assert_eq!(completion_percent(4, 4), 100);
    }

    #[test]
    fn progress_per_set() {
        let owned: HashSet<String> = ["m0", "m1", "p2"].iter().map(|s| s.to_string()).collect();
        let progress = CollectionProgress::compute(&catalog(), &sets(), &owned);
        assert_eq!(progress.total_collected, 3);
        assert_eq!(progress.percent, 43);
        assert_eq!(progress.by_rarity, [2, 0, 1, 0]);
        let mewtwo = progress.set("mewtwo").expect("set");
        assert_eq!((mewtwo.obtained, mewtwo.total, mewtwo.percent), (2, 4, 50));
        let apex = progress.set("apex").expect("set");
        assert_eq!((apex.obtained, apex.total, apex.percent), (3, 7, 43));
        assert_eq!(progress.set("empty").expect("set").percent, 0);
    }

    #[test]
    fn sync_adds_only_missing_cards() {
        let catalog = catalog();
        let mut store = MemoryCollectionStore::new();
        for id in ["m0", "m1", "m0", "p1"] {
            let card = catalog.card_by_id(id).expect("card");
            store
                .collect_opening("w", opening("a1-mewtwo", card))
                .expect("collect");
        }
        assert_eq!(sync_from_openings(&mut store, "w").expect("sync"), 0);
        assert!(store.remove_card("w", "m0").expect("remove"));
        assert!(store.remove_card("w", "p1").expect("remove"));
        assert_eq!(sync_from_openings(&mut store, "w").expect("sync"), 2);
        assert_eq!(sync_from_openings(&mut store, "w").expect("sync"), 0);
        let owned = owned_card_ids(&store, "w").expect("owned");
        assert_eq!(owned.len(), 3);
        assert!(owned.contains("p1"));
    }

    #[test]
    fn history_groups_by_pack() {
        let catalog = catalog();
        let mut store = MemoryCollectionStore::new();
        for (pack, id) in [("a", "m0"), ("b", "p0"), ("a", "m2")] {
            let card = catalog.card_by_id(id).expect("card");
            store.collect_opening("w", opening(pack, card)).expect("collect");
        }
        let grouped = openings_by_pack(&store, "w").expect("grouped");
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["a"][0].card_id, "m2");
        assert_eq!(grouped["b"].len(), 1);
    }
}
