use packdex_core::{
    CollectionProgress, CollectionStore, PackSession, PurchaseOutcome, RarityTier, RngState,
    SimulatedWallet,
};
use packdex_data::{load_assets, JsonFileStore};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

#[test]
fn every_pack_has_eligible_cards() {
    let assets = load_assets(&assets_root()).expect("load assets");
    assert!(!assets.catalog.is_empty());
    for pack in &assets.registry.packs {
        assert!(
            !assets.catalog.eligible_for(pack).is_empty(),
            "pack {} is empty",
            pack.id
        );
    }
}

#[test]
fn genetic_apex_spans_its_packs() {
    let assets = load_assets(&assets_root()).expect("load assets");
    let set = assets.registry.set("genetic-apex").expect("set");
    let members = assets.catalog.cards_with_tags(&set.tags);
    let tags: HashSet<&str> = members.iter().map(|card| card.pack.as_str()).collect();
    for tag in ["Mewtwo", "Pikachu", "Charizard", "GeneticDomination"] {
        assert!(tags.contains(tag), "missing {tag}");
    }
}

#[test]
fn promo_pack_is_free_and_common_only() {
    let assets = load_assets(&assets_root()).expect("load assets");
    let promo = assets.registry.pack("promo-a").expect("promo");
    assert!(promo.is_free());
    assert!(assets
        .catalog
        .eligible_for(promo)
        .iter()
        .all(|card| card.rarity == RarityTier::Common));
}

#[test]
fn shipped_config_has_a_real_merchant() {
    let assets = load_assets(&assets_root()).expect("load assets");
    assert!(!assets.config.merchant.is_placeholder());
    assert_eq!(assets.config.timing.total().as_millis(), 7500);
}

#[test]
fn empty_album_progress() {
    let assets = load_assets(&assets_root()).expect("load assets");
    let progress =
        CollectionProgress::compute(&assets.catalog, &assets.registry.sets, &HashSet::new());
    assert_eq!(progress.percent, 0);
    assert_eq!(progress.sets.len(), assets.registry.sets.len());
}

#[test]
fn openings_survive_a_restart() {
    let assets = load_assets(&assets_root()).expect("load assets");
    let file = std::env::temp_dir().join(format!(
        "packdex_assets_test_{}_{}.json",
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos()
    ));
    let store = JsonFileStore::open(&file).expect("open");
    let mut session = PackSession::new(
        assets.catalog.clone(),
        assets.registry.clone(),
        assets.config.clone(),
        SimulatedWallet::new("misty", 1_000_000_000),
        store,
    );
    let outcome = session.purchase("a1-pikachu").expect("purchase");
    assert!(matches!(outcome, PurchaseOutcome::Purchased(_)));
    let mut rng = RngState::from_seed(2024);
    let started = Instant::now();
    session
        .start_opening("a1-pikachu", &mut rng, started)
        .expect("start");
    let frame = session
        .tick(started + assets.config.timing.total())
        .expect("tick")
        .expect("frame");
    assert!(frame.completed);

    let reopened = JsonFileStore::open(&file).expect("reopen");
    assert_eq!(reopened.openings("misty", None, 10).expect("openings").len(), 1);
    assert_eq!(reopened.transactions("misty").expect("transactions").len(), 1);
    assert_eq!(reopened.collection("misty").expect("collection").len(), 1);
    let _ = std::fs::remove_file(file);
}
