use packdex_core::{
    AlbumTables, CollectedOpening, CollectionEntry, CollectionStore, NewOpening, OpeningRecord,
    StoreError, TransactionRecord,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(flatten)]
    tables: AlbumTables,
}

pub fn default_store_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("PACKDEX_STORE") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".packdex_album.json"))
}

/// Album store persisted as one versioned JSON file. Every mutation rewrites
/// the file, and the in-memory tables only change once the write succeeds.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tables: AlbumTables,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty album.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = if path.exists() {
            read_tables(&path)?
        } else {
            AlbumTables::default()
        };
        Ok(Self { path, tables })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `tables` to disk, then adopts them.
    fn commit(&mut self, tables: AlbumTables) -> Result<(), StoreError> {
        self.write(&tables)?;
        self.tables = tables;
        Ok(())
    }

    fn write(&self, tables: &AlbumTables) -> Result<(), StoreError> {
        let payload = StoreFile {
            version: STORE_SCHEMA_VERSION,
            tables: tables.clone(),
        };
        let body = serde_json::to_string_pretty(&payload)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn read_tables(path: &Path) -> Result<AlbumTables, StoreError> {
    let body = fs::read_to_string(path)?;
    let payload: StoreFile =
        serde_json::from_str(&body).map_err(|err| StoreError::Serialize(err.to_string()))?;
    if payload.version != STORE_SCHEMA_VERSION {
        return Err(StoreError::Version {
            found: payload.version,
            expected: STORE_SCHEMA_VERSION,
        });
    }
    Ok(payload.tables)
}

impl CollectionStore for JsonFileStore {
    fn add_card(
        &mut self,
        wallet: &str,
        card_id: &str,
        card_name: &str,
        pack_id: Option<&str>,
        obtained_from: &str,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.clone();
        let added = tables.add_card(wallet, card_id, card_name, pack_id, obtained_from);
        self.commit(tables)?;
        Ok(added)
    }

    fn collection(&self, wallet: &str) -> Result<Vec<CollectionEntry>, StoreError> {
        Ok(self.tables.collections.get(wallet).cloned().unwrap_or_default())
    }

    fn remove_card(&mut self, wallet: &str, card_id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.clone();
        let removed = tables.remove_card(wallet, card_id);
        if removed {
            self.commit(tables)?;
        }
        Ok(removed)
    }

    fn collect_opening(
        &mut self,
        wallet: &str,
        opening: NewOpening<'_>,
    ) -> Result<CollectedOpening, StoreError> {
        let mut tables = self.tables.clone();
        let collected = tables.collect_opening(wallet, opening);
        self.commit(tables)?;
        tracing::debug!(
            wallet,
            seq = collected.record.seq,
            path = %self.path.display(),
            "opening saved"
        );
        Ok(collected)
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
        let mut tables = self.tables.clone();
        tables.record_transaction(record);
        self.commit(tables)
    }

    fn transactions(&self, wallet: &str) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self.tables.transactions.get(wallet).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packdex_core::{Card, RarityTier, OBTAINED_FROM_PACK};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn reopened_store_keeps_album() {
        let file = unique_temp_file();
        let card = Card::new("a1-150", "Mewtwo ex", RarityTier::UltraRare, "Psychic", "Mewtwo");
        {
            let mut store = JsonFileStore::open(&file).expect("open");
            store
                .collect_opening("alice", opening(&card))
                .expect("collect");
        }
        let store = JsonFileStore::open(&file).expect("reopen");
        let openings = store.openings("alice", None, 10).expect("openings");
        assert_eq!(openings.len(), 1);
        assert_eq!(openings[0].transaction_signature.as_deref(), Some("sig"));
        assert_eq!(store.collection("alice").expect("collection").len(), 1);
        let _ = fs::remove_file(file);
    }

    #[test]
    fn failed_write_leaves_album_unchanged() {
        let blocker = unique_temp_file();
        fs::write(&blocker, "not a directory").expect("write");
        let card = Card::new("a1-150", "Mewtwo ex", RarityTier::UltraRare, "Psychic", "Mewtwo");
        let mut store = JsonFileStore::open(blocker.join("album.json")).expect("open");
        assert!(store.collect_opening("alice", opening(&card)).is_err());
        assert!(store.openings("alice", None, 10).expect("openings").is_empty());
        assert!(store.collection("alice").expect("collection").is_empty());
        let _ = fs::remove_file(blocker);
    }

    #[test]
    fn missing_file_is_empty_album() {
        let file = unique_temp_file();
        let store = JsonFileStore::open(&file).expect("open");
        assert!(store.collection("alice").expect("collection").is_empty());
        assert!(!file.exists());
    }

    #[test]
    fn rejects_other_schema_versions() {
        let file = unique_temp_file();
        fs::write(&file, r#"{"version":99}"#).expect("write");
        match JsonFileStore::open(&file) {
            Err(StoreError::Version { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, STORE_SCHEMA_VERSION);
            }
            other => panic!("unexpected {other:?}"),
        }
        let _ = fs::remove_file(file);
    }

    fn opening(card: &Card) -> NewOpening<'_> {
        NewOpening {
            pack_id: "a1-mewtwo",
            pack_name: "Genetic Apex Mewtwo",
            card,
            transaction_signature: Some("sig"),
            obtained_from: OBTAINED_FROM_PACK,
        }
    }

    fn unique_temp_file() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "packdex_store_test_{}_{}.json",
            std::process::id(),
            nanos
        ))
    }
}
