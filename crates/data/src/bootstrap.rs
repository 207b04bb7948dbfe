use crate::{default_assets_dir, default_store_path, load_assets, Assets, JsonFileStore};
use anyhow::Context;
use packdex_core::{SimulatedWallet, LAMPORTS_PER_SOL};
use std::path::PathBuf;

/// Wallet used when neither `--wallet` nor `PACKDEX_WALLET` is given.
pub const DEFAULT_WALLET: &str = "DemoWa11et1111111111111111111111111111111111";
/// Starting balance of the simulated wallet; reset on every launch.
pub const DEFAULT_BALANCE_LAMPORTS: u64 = 5 * LAMPORTS_PER_SOL;
const FALLBACK_STORE_FILE: &str = "packdex_album.json";

/// Paths and wallet a front end starts a session with. `None` falls back to
/// the environment, then to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub wallet: Option<String>,
    pub assets: Option<PathBuf>,
    pub store: Option<PathBuf>,
}

/// Everything a `PackSession` is built from.
#[derive(Debug)]
pub struct SessionParts {
    pub assets: Assets,
    pub wallet: SimulatedWallet,
    pub store: JsonFileStore,
}

pub fn resolve_store_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(default_store_path)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_STORE_FILE))
}

pub fn open_session_parts(options: &SessionOptions) -> anyhow::Result<SessionParts> {
    let assets_dir = options.assets.clone().unwrap_or_else(default_assets_dir);
    let assets = load_assets(&assets_dir)
        .with_context(|| format!("load assets from {}", assets_dir.display()))?;
    let store_path = resolve_store_path(options.store.clone());
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("open album {}", store_path.display()))?;
    let address = options
        .wallet
        .clone()
        .or_else(|| std::env::var("PACKDEX_WALLET").ok())
        .unwrap_or_else(|| DEFAULT_WALLET.to_string());
    tracing::debug!(wallet = %address, store = %store_path.display(), "session parts ready");
    Ok(SessionParts {
        assets,
        wallet: SimulatedWallet::new(address, DEFAULT_BALANCE_LAMPORTS),
        store,
    })
}
