use crate::{Card, RarityTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// `obtained_from` tag for cards that came out of a pack.
pub const OBTAINED_FROM_PACK: &str = "pack_opening";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialize error: {0}")]
    Serialize(String),
    #[error("unsupported store version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub signature: String,
    pub wallet: String,
    pub pack_id: String,
    pub pack_name: String,
    pub lamports: u64,
    pub merchant: String,
    pub network: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRecord {
    /// Monotonic per store; later openings have larger values.
    pub seq: u64,
    pub wallet: String,
    pub pack_id: String,
    pub pack_name: String,
    pub card_id: String,
    pub card_name: String,
    pub rarity: RarityTier,
    #[serde(default)]
    pub transaction_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub card_id: String,
    pub card_name: String,
    #[serde(default)]
    pub pack_id: Option<String>,
    pub obtained_from: String,
    /// Times this card was obtained; the album counts it once.
    pub copies: u32,
}

/// Opening about to be written; the store assigns its sequence number.
#[derive(Debug, Clone)]
pub struct NewOpening<'a> {
    pub pack_id: &'a str,
    pub pack_name: &'a str,
    pub card: &'a Card,
    pub transaction_signature: Option<&'a str>,
    pub obtained_from: &'a str,
}

/// What `collect_opening` wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedOpening {
    pub record: OpeningRecord,
    /// True when the card was not in the collection before.
    pub new_card: bool,
}

/// Persistence capability for album data, keyed by wallet address.
pub trait CollectionStore {
    /// Upserts a card into the wallet's collection. Returns true when the
    /// card was not owned before.
    fn add_card(
        &mut self,
        wallet: &str,
        card_id: &str,
        card_name: &str,
        pack_id: Option<&str>,
        obtained_from: &str,
    ) -> Result<bool, StoreError>;

    fn collection(&self, wallet: &str) -> Result<Vec<CollectionEntry>, StoreError>;

    fn remove_card(&mut self, wallet: &str, card_id: &str) -> Result<bool, StoreError>;

    /// Appends the opening to the history and adds its card to the
    /// collection. Either both rows are written or neither is.
    fn collect_opening(
        &mut self,
        wallet: &str,
        opening: NewOpening<'_>,
    ) -> Result<CollectedOpening, StoreError>;

    /// Most recent first, optionally filtered by pack, capped at `limit`.
    fn openings(
        &self,
        wallet: &str,
        pack_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<OpeningRecord>, StoreError>;

    fn record_transaction(&mut self, record: TransactionRecord) -> Result<(), StoreError>;

    fn transactions(&self, wallet: &str) -> Result<Vec<TransactionRecord>, StoreError>;
}

impl<S: CollectionStore + ?Sized> CollectionStore for Box<S> {
    fn add_card(
        &mut self,
        wallet: &str,
        card_id: &str,
        card_name: &str,
        pack_id: Option<&str>,
        obtained_from: &str,
    ) -> Result<bool, StoreError> {
        (**self).add_card(wallet, card_id, card_name, pack_id, obtained_from)
    }

    fn collection(&self, wallet: &str) -> Result<Vec<CollectionEntry>, StoreError> {
        (**self).collection(wallet)
    }

    fn remove_card(&mut self, wallet: &str, card_id: &str) -> Result<bool, StoreError> {
        (**self).remove_card(wallet, card_id)
    }

    fn collect_opening(
        &mut self,
        wallet: &str,
        opening: NewOpening<'_>,
    ) -> Result<CollectedOpening, StoreError> {
        (**self).collect_opening(wallet, opening)
    }

    fn openings(
        &self,
        wallet: &str,
        pack_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<OpeningRecord>, StoreError> {
        (**self).openings(wallet, pack_id, limit)
    }

    fn record_transaction(&mut self, record: TransactionRecord) -> Result<(), StoreError> {
        (**self).record_transaction(record)
    }

    fn transactions(&self, wallet: &str) -> Result<Vec<TransactionRecord>, StoreError> {
        (**self).transactions(wallet)
    }
}

/// All album rows for every wallet. Also the on-disk shape of file stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlbumTables {
    #[serde(default)]
    pub next_seq: u64,
    #[serde(default)]
    pub collections: HashMap<String, Vec<CollectionEntry>>,
    #[serde(default)]
    pub openings: HashMap<String, Vec<OpeningRecord>>,
    #[serde(default)]
    pub transactions: HashMap<String, Vec<TransactionRecord>>,
}

impl AlbumTables {
    pub fn add_card(
        &mut self,
        wallet: &str,
        card_id: &str,
        card_name: &str,
        pack_id: Option<&str>,
        obtained_from: &str,
    ) -> bool {
        let entries = self.collections.entry(wallet.to_string()).or_default();
        if let Some(entry) = entries.iter_mut().find(|entry| entry.card_id == card_id) {
            entry.copies += 1;
            return false;
        }
        entries.push(CollectionEntry {
            card_id: card_id.to_string(),
            card_name: card_name.to_string(),
            pack_id: pack_id.map(str::to_string),
            obtained_from: obtained_from.to_string(),
            copies: 1,
        });
        true
    }

    pub fn remove_card(&mut self, wallet: &str, card_id: &str) -> bool {
        let Some(entries) = self.collections.get_mut(wallet) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.card_id != card_id);
        entries.len() != before
    }

    fn record_opening(&mut self, wallet: &str, opening: NewOpening<'_>) -> OpeningRecord {
        self.next_seq += 1;
        let record = OpeningRecord {
            seq: self.next_seq,
            wallet: wallet.to_string(),
            pack_id: opening.pack_id.to_string(),
            pack_name: opening.pack_name.to_string(),
            card_id: opening.card.id.clone(),
            card_name: opening.card.name.clone(),
            rarity: opening.card.rarity,
            transaction_signature: opening.transaction_signature.map(str::to_string),
        };
        self.openings
            .entry(wallet.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    pub fn collect_opening(&mut self, wallet: &str, opening: NewOpening<'_>) -> CollectedOpening {
        let new_card = self.add_card(
            wallet,
            &opening.card.id,
            &opening.card.name,
            Some(opening.pack_id),
            opening.obtained_from,
        );
        let record = self.record_opening(wallet, opening);
        CollectedOpening { record, new_card }
    }

    pub fn openings(&self, wallet: &str, pack_id: Option<&str>, limit: usize) -> Vec<OpeningRecord> {
        let Some(rows) = self.openings.get(wallet) else {
            return Vec::new();
        };
        rows.iter()
            .rev()
            .filter(|row| pack_id.map_or(true, |pack| row.pack_id == pack))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn record_transaction(&mut self, record: TransactionRecord) {
        let rows = self.transactions.entry(record.wallet.clone()).or_default();
        if let Some(existing) = rows.iter_mut().find(|row| row.signature == record.signature) {
            *existing = record;
        } else {
            rows.push(record);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCollectionStore {
    tables: AlbumTables,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for MemoryCollectionStore {
    fn add_card(
        &mut self,
        wallet: &str,
        card_id: &str,
        card_name: &str,
        pack_id: Option<&str>,
        obtained_from: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .add_card(wallet, card_id, card_name, pack_id, obtained_from))
    }

    fn collection(&self, wallet: &str) -> Result<Vec<CollectionEntry>, StoreError> {
        Ok(self.tables.collections.get(wallet).cloned().unwrap_or_default())
    }

    fn remove_card(&mut self, wallet: &str, card_id: &str) -> Result<bool, StoreError> {
        Ok(self.tables.remove_card(wallet, card_id))
    }

    fn collect_opening(
        &mut self,
        wallet: &str,
        opening: NewOpening<'_>,
    ) -> Result<CollectedOpening, StoreError> {
        Ok(self.tables.collect_opening(wallet, opening))
    }

    fn openings(
        &self,
        wallet: &str,
        pack_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<OpeningRecord>, StoreError> {
        Ok(self.tables.openings(wallet, pack_id, limit))
    }

    fn record_transaction(&mut self, record: TransactionRecord) -> Result<(), StoreError> {
        self.tables.record_transaction(record);
        Ok(())
    }

    fn transactions(&self, wallet: &str) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self.tables.transactions.get(wallet).cloned().unwrap_or_default())
    }
}
