use serde::{Deserialize, Serialize};

pub use packdex_core::{Catalog, CollectionSet, OpeningConfig, PackDefinition, PackRegistry};

/// One row of `cards.json`. Rarity is written with the album's diamond
/// symbols (`◊` through `◊◊◊◊`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub name: String,
    pub rarity: String,
    #[serde(rename = "type")]
    pub element: String,
    pub pack: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacksFile {
    pub packs: Vec<PackDefinition>,
    #[serde(default)]
    pub sets: Vec<CollectionSet>,
}

/// Everything a session needs from the assets directory.
#[derive(Debug, Clone)]
pub struct Assets {
    pub catalog: Catalog,
    pub registry: PackRegistry,
    pub config: OpeningConfig,
}
