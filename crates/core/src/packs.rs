use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackDefinition {
    pub id: String,
    pub name: String,
    /// Catalog pack tags whose cards can drop from this pack.
    pub tags: Vec<String>,
    #[serde(default)]
    pub price_sol: f64,
}

impl PackDefinition {
    pub fn is_free(&self) -> bool {
        self.price_sol == 0.0
    }
}

/// Album grouping used for completion progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionSet {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PackRegistry {
    pub packs: Vec<PackDefinition>,
    pub sets: Vec<CollectionSet>,
}

impl PackRegistry {
    pub fn new(packs: Vec<PackDefinition>, sets: Vec<CollectionSet>) -> Self {
        Self { packs, sets }
    }

    pub fn pack(&self, id: &str) -> Option<&PackDefinition> {
        self.packs.iter().find(|pack| pack.id == id)
    }

    pub fn set(&self, id: &str) -> Option<&CollectionSet> {
        self.sets.iter().find(|set| set.id == id)
    }
}

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Whole lamports for a SOL price, truncated toward zero.
pub fn sol_to_lamports(price_sol: f64) -> u64 {
    (price_sol * LAMPORTS_PER_SOL as f64).floor() as u64
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
