use crate::schema::{Assets, CardRecord, PacksFile};
use anyhow::{bail, Context};
use packdex_core::{Card, Catalog, OpeningConfig, PackRegistry, RarityTier};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const CARDS_FILE: &str = "cards.json";
const PACKS_FILE: &str = "packs.json";
const OPENING_FILE: &str = "opening.json";

pub fn default_assets_dir() -> PathBuf {
    std::env::var_os("PACKDEX_ASSETS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"))
}

pub fn load_assets(dir: &Path) -> anyhow::Result<Assets> {
    let catalog = load_catalog(&dir.join(CARDS_FILE))?;
    let registry = load_packs(&dir.join(PACKS_FILE))?;
    let config = load_opening_config(&dir.join(OPENING_FILE))?;
    for pack in &registry.packs {
        if catalog.eligible_for(pack).is_empty() {
            tracing::warn!(pack = %pack.id, "pack has no eligible cards");
        }
    }
    tracing::debug!(
        cards = catalog.len(),
        packs = registry.packs.len(),
        sets = registry.sets.len(),
        "assets loaded"
    );
    Ok(Assets {
        catalog,
        registry,
        config,
    })
}

pub fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let records: Vec<CardRecord> = load_json(path)?;
    let mut cards = Vec::with_capacity(records.len());
    for record in records {
        cards.push(card_from_record(record).with_context(|| format!("parse {}", path.display()))?);
    }
    let catalog = Catalog::new(cards).with_context(|| format!("validate {}", path.display()))?;
    Ok(catalog)
}

fn card_from_record(record: CardRecord) -> anyhow::Result<Card> {
    let Some(rarity) = RarityTier::from_symbol(&record.rarity) else {
        bail!("card {} has unknown rarity {:?}", record.id, record.rarity);
    };
    Ok(Card::new(
        record.id,
        record.name,
        rarity,
        record.element,
        record.pack,
    ))
}

pub fn load_packs(path: &Path) -> anyhow::Result<PackRegistry> {
    let file: PacksFile = load_json(path)?;
    validate_packs(&file).with_context(|| format!("validate {}", path.display()))?;
    Ok(PackRegistry::new(file.packs, file.sets))
}

fn validate_packs(file: &PacksFile) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for pack in &file.packs {
        if pack.id.trim().is_empty() {
            bail!("pack with empty id");
        }
        if !seen.insert(pack.id.as_str()) {
            bail!("duplicate pack id {}", pack.id);
        }
        if pack.tags.is_empty() {
            bail!("pack {} has no tags", pack.id);
        }
        if !pack.price_sol.is_finite() || pack.price_sol < 0.0 {
            bail!("pack {} has invalid price {}", pack.id, pack.price_sol);
        }
    }
    let mut seen = HashSet::new();
    for set in &file.sets {
        if !seen.insert(set.id.as_str()) {
            bail!("duplicate set id {}", set.id);
        }
    }
    Ok(())
}

/// Reads the opening config, falling back to defaults when the file is absent.
pub fn load_opening_config(path: &Path) -> anyhow::Result<OpeningConfig> {
    if !path.exists() {
        return Ok(OpeningConfig::default());
    }
    let config: OpeningConfig = load_json(path)?;
    validate_opening_config(&config).with_context(|| format!("validate {}", path.display()))?;
    Ok(config)
}

fn validate_opening_config(config: &OpeningConfig) -> anyhow::Result<()> {
    let width = config.layout.card_width;
    if !width.is_finite() || width <= 0.0 {
        bail!("card_width must be a positive number, got {width}");
    }
    if config.timing.scroll_ms == 0 {
        bail!("scroll_ms must be greater than zero");
    }
    if config.milestones.iter().any(|total| *total == 0) {
        bail!("milestones must be greater than zero");
    }
    if config.milestones.windows(2).any(|pair| pair[0] >= pair[1]) {
        bail!("milestones must be strictly increasing");
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packdex_core::PackDefinition;

    fn record(rarity: &str) -> CardRecord {
        CardRecord {
            id: "a1-001".to_string(),
            name: "Bulbasaur".to_string(),
            rarity: rarity.to_string(),
            element: "Grass".to_string(),
            pack: "Mewtwo".to_string(),
        }
    }

    fn pack(id: &str, price: f64) -> PackDefinition {
        PackDefinition {
            id: id.to_string(),
            name: id.to_string(),
            tags: vec!["Mewtwo".to_string()],
            price_sol: price,
        }
    }

    #[test]
    fn rarity_symbols_map_to_tiers() {
        let card = card_from_record(record("◊◊◊")).expect("card");
        assert_eq!(card.rarity, RarityTier::Rare);
        assert_eq!(card.element, "Grass");
        assert!(card_from_record(record("★")).is_err());
    }

    #[test]
    fn card_type_field_is_renamed() {
        let raw = r#"{"id":"x","name":"X","rarity":"◊","type":"Water","pack":"Promo"}"#;
        let record: CardRecord = serde_json::from_str(raw).expect("parse");
        assert_eq!(record.element, "Water");
    }

    #[test]
    fn rejects_duplicate_and_negative_packs() {
        let dupes = PacksFile {
            packs: vec![pack("a", 0.1), pack("a", 0.1)],
            sets: Vec::new(),
        };
        assert!(validate_packs(&dupes).is_err());
        let negative = PacksFile {
            packs: vec![pack("a", -0.1)],
            sets: Vec::new(),
        };
        assert!(validate_packs(&negative).is_err());
        let ok = PacksFile {
            packs: vec![pack("a", 0.0), pack("b", 0.05)],
            sets: Vec::new(),
        };
        assert!(validate_packs(&ok).is_ok());
    }

    #[test]
    fn rejects_unusable_opening_config() {
        assert!(validate_opening_config(&OpeningConfig::default()).is_ok());
        for width in [0.0, -280.0, f64::NAN, f64::INFINITY] {
            let mut config = OpeningConfig::default();
            config.layout.card_width = width;
            assert!(validate_opening_config(&config).is_err(), "width {width}");
        }
        let mut config = OpeningConfig::default();
        config.timing.scroll_ms = 0;
        assert!(validate_opening_config(&config).is_err());
        let mut config = OpeningConfig::default();
        config.milestones = vec![25, 10];
        assert!(validate_opening_config(&config).is_err());
    }

    #[test]
    fn missing_opening_config_uses_defaults() {
        let config =
            load_opening_config(Path::new("/nonexistent/packdex/opening.json")).expect("config");
        assert_eq!(config, OpeningConfig::default());
    }
}
