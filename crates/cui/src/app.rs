use crate::LaunchOptions;
use anyhow::{Context, Result};
use packdex_core::{
    lamports_to_sol, CollectionProgress, CollectionStore, Event, OpeningError, PackDefinition,
    PackSession, PurchaseOutcome, RevealFrame, RevealSequence, RngState, SimulatedWallet,
    WalletSession,
};
use packdex_data::{open_session_parts, Assets, SessionOptions};
use std::collections::VecDeque;
use std::time::Instant;

const MAX_EVENT_LOG: usize = 200;

pub type AlbumSession = PackSession<SimulatedWallet, Box<dyn CollectionStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Packs,
    Album,
    Events,
}

#[derive(Debug, Clone)]
pub struct AlbumRow {
    pub label: String,
    pub copies: u32,
}

pub struct App {
    pub session: AlbumSession,
    pub rng: RngState,
    pub focus: FocusPane,
    pub pack_cursor: usize,
    pub album_cursor: usize,
    pub strip: Option<RevealSequence>,
    pub last_frame: Option<RevealFrame>,
    pub event_log: VecDeque<String>,
    pub status_line: String,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn bootstrap(options: &LaunchOptions) -> Result<Self> {
        let parts = open_session_parts(&SessionOptions {
            wallet: options.wallet.clone(),
            assets: options.assets.clone(),
            store: options.store.clone(),
        })
        .context("start album session")?;
        let rng = match options.seed {
            Some(seed) => RngState::from_seed(seed),
            None => RngState::from_entropy(),
        };
        let album = format!("album: {}", parts.store.path().display());
        let mut app = Self::new(parts.assets, parts.wallet, Box::new(parts.store), rng);
        app.push_event_line(album);
        Ok(app)
    }

    pub fn new(
        assets: Assets,
        wallet: SimulatedWallet,
        store: Box<dyn CollectionStore>,
        rng: RngState,
    ) -> Self {
        let seed = rng.seed();
        let session = PackSession::new(
            assets.catalog,
            assets.registry,
            assets.config,
            wallet,
            store,
        );
        let mut app = Self {
            session,
            rng,
            focus: FocusPane::Packs,
            pack_cursor: 0,
            album_cursor: 0,
            strip: None,
            last_frame: None,
            event_log: VecDeque::new(),
            status_line: "ready".to_string(),
            show_help: false,
            should_quit: false,
        };
        app.push_event_line(format!("seed {seed}"));
        app
    }

    pub fn on_tick(&mut self) {
        self.on_tick_at(Instant::now());
    }

    /// Samples the running reveal. Frames stop updating once the slot frees,
    /// so the last frame keeps the winner on screen.
    pub fn on_tick_at(&mut self, now: Instant) {
        if !self.session.is_opening() {
            return;
        }
        match self.session.tick(now) {
            Ok(Some(frame)) => {
                if !self.session.is_opening() {
                    if let Some(result) = self.session.last_opened() {
                        self.status_line = format!(
                            "New Card Received: {} {}",
                            result.card.name,
                            result.card.rarity.symbol()
                        );
                    }
                }
                self.last_frame = Some(frame);
            }
            Ok(None) => {}
            Err(err) => self.push_error(err),
        }
        self.flush_events();
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        self.focus = match (self.focus, forward) {
            (FocusPane::Packs, true) => FocusPane::Album,
            (FocusPane::Album, true) => FocusPane::Events,
            (FocusPane::Events, true) => FocusPane::Packs,
            (FocusPane::Packs, false) => FocusPane::Events,
            (FocusPane::Album, false) => FocusPane::Packs,
            (FocusPane::Events, false) => FocusPane::Album,
        };
    }

    pub fn move_cursor(&mut self, down: bool) {
        match self.focus {
            FocusPane::Packs => {
                let len = self.session.registry().packs.len();
                move_index(&mut self.pack_cursor, len, down);
            }
            FocusPane::Album => {
                let len = self.album_rows().len();
                move_index(&mut self.album_cursor, len, down);
            }
            FocusPane::Events => {}
        }
    }

    pub fn selected_pack(&self) -> Option<&PackDefinition> {
        let packs = &self.session.registry().packs;
        if packs.is_empty() {
            return None;
        }
        packs.get(self.pack_cursor.min(packs.len() - 1))
    }

    /// Buys the selected pack and starts opening it straight away.
    pub fn buy_and_open(&mut self) {
        self.buy_and_open_at(Instant::now());
    }

    pub fn buy_and_open_at(&mut self, now: Instant) {
        if self.session.is_opening() {
            self.status_line = "a pack is already opening".to_string();
            return;
        }
        let Some(pack_id) = self.selected_pack().map(|pack| pack.id.clone()) else {
            self.status_line = "no packs available".to_string();
            return;
        };
        if self.session.unopened(&pack_id) == 0 {
            match self.session.purchase(&pack_id) {
                Ok(PurchaseOutcome::Purchased(_)) => {}
                Ok(PurchaseOutcome::Rejected) => {
                    self.status_line = "Transaction cancelled by user".to_string();
                    self.flush_events();
                    return;
                }
                Err(err) => {
                    self.push_error(err);
                    self.flush_events();
                    return;
                }
            }
        }
        match self.session.start_opening(&pack_id, &mut self.rng, now) {
            Ok(sequence) => {
                self.status_line = format!("opening {pack_id} ({} cards)", sequence.len());
                self.strip = Some(sequence.clone());
                self.last_frame = None;
            }
            Err(err) => self.push_error(err),
        }
        self.flush_events();
    }

    pub fn cancel_opening(&mut self) {
        if self.session.is_opening() {
            self.session.cancel();
            self.strip = None;
            self.last_frame = None;
            self.status_line = "opening cancelled".to_string();
            self.flush_events();
        }
    }

    pub fn reject_next_purchase(&mut self) {
        self.session.wallet_mut().reject_next();
        self.status_line = "next transaction will be declined".to_string();
    }

    pub fn toggle_wallet(&mut self) {
        let wallet = self.session.wallet_mut();
        if wallet.is_connected() {
            wallet.disconnect();
            self.status_line = "wallet disconnected".to_string();
        } else {
            wallet.connect();
            self.status_line = "wallet connected".to_string();
        }
    }

    pub fn sync_album(&mut self) {
        match self.session.sync_collection() {
            Ok(0) => self.status_line = "album already in sync".to_string(),
            Ok(added) => self.status_line = format!("synced {added} cards from history"),
            Err(err) => self.push_error(err),
        }
    }

    /// Strip being revealed, or the one just finished while its frame is shown.
    pub fn reveal_sequence(&self) -> Option<&RevealSequence> {
        self.strip.as_ref()
    }

    pub fn progress(&self) -> Option<CollectionProgress> {
        self.session.progress().ok()
    }

    pub fn album_rows(&self) -> Vec<AlbumRow> {
        let Some(wallet) = self.session.wallet().public_key() else {
            return Vec::new();
        };
        let entries = self.session.store().collection(wallet).unwrap_or_default();
        entries
            .into_iter()
            .map(|entry| {
                let rarity = self
                    .session
                    .catalog()
                    .rarity_of(&entry.card_id)
                    .map(|tier| tier.symbol())
                    .unwrap_or("?");
                AlbumRow {
                    label: format!("{} {:<4} {}", entry.card_id, rarity, entry.card_name),
                    copies: entry.copies,
                }
            })
            .collect()
    }

    pub fn pack_label(&self, pack: &PackDefinition) -> String {
        let price = if pack.is_free() {
            "free".to_string()
        } else {
            format!("{:.2} SOL", pack.price_sol)
        };
        let unopened = self.session.unopened(&pack.id);
        let pool = self.session.catalog().eligible_for(pack).len();
        if unopened > 0 {
            format!("{} [{price}] {pool} cards, {unopened} unopened", pack.name)
        } else {
            format!("{} [{price}] {pool} cards", pack.name)
        }
    }

    pub fn balance_sol(&self) -> f64 {
        lamports_to_sol(self.session.wallet().balance())
    }

    pub fn push_error(&mut self, err: OpeningError) {
        self.status_line = format!("error: {err}");
    }

    fn flush_events(&mut self) {
        let drained: Vec<_> = self.session.events_mut().drain().collect();
        for event in drained {
            self.push_event_line(format_event(&event));
        }
    }

    fn push_event_line(&mut self, line: String) {
        if self.event_log.len() >= MAX_EVENT_LOG {
            let _ = self.event_log.pop_front();
        }
        self.event_log.push_back(line);
    }
}

fn move_index(value: &mut usize, len: usize, down: bool) {
    if len == 0 {
        *value = 0;
        return;
    }
    if down {
        *value = (*value + 1) % len;
    } else if *value == 0 {
        *value = len - 1;
    } else {
        *value -= 1;
    }
}

fn format_event(event: &Event) -> String {
    match event {
        Event::PackPurchased {
            pack_id,
            lamports,
            signature,
        } => format!(
            "purchased {pack_id} for {lamports} lamports ({})",
            signature.as_deref().unwrap_or("free")
        ),
        Event::PurchaseCancelled { pack_id } => format!("purchase of {pack_id} cancelled"),
        Event::PurchaseFailed { pack_id, reason } => {
            format!("purchase of {pack_id} failed: {reason}")
        }
        Event::OpeningStarted {
            pack_id,
            winning_position,
        } => format!("opening {pack_id}, winner at slot {winning_position}"),
        Event::OpeningCancelled { pack_id } => format!("opening {pack_id} cancelled"),
        Event::CardCollected {
            card_id,
            card_name,
            rarity,
            new_card,
            ..
        } => format!(
            "{} {card_name} ({card_id}) {}",
            rarity.symbol(),
            if *new_card { "new" } else { "duplicate" }
        ),
        Event::MilestoneReached { total } => format!("milestone: {total} cards collected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packdex_core::{
        Card, Catalog, CollectionSet, MemoryCollectionStore, MerchantRule, OpeningConfig,
        PackRegistry, RarityTier, RevealPhase,
    };
    use packdex_data::DEFAULT_BALANCE_LAMPORTS;
    use std::time::Duration;

    fn test_app() -> App {
        let cards = (0..6)
            .map(|idx| {
                Card::new(
                    format!("t-{idx}"),
                    format!("Test {idx}"),
                    RarityTier::ALL[idx % 4],
                    "Water",
                    "Test",
                )
            })
            .collect();
        let assets = Assets {
            catalog: Catalog::new(cards).expect("catalog"),
            registry: PackRegistry::new(
                vec![
                    PackDefinition {
                        id: "test".to_string(),
                        name: "Test Pack".to_string(),
                        tags: vec!["Test".to_string()],
                        price_sol: 0.05,
                    },
                    PackDefinition {
                        id: "gift".to_string(),
                        name: "Gift".to_string(),
                        tags: vec!["Test".to_string()],
                        price_sol: 0.0,
                    },
                ],
                vec![CollectionSet {
                    id: "test".to_string(),
                    name: "Test".to_string(),
                    tags: vec!["Test".to_string()],
                }],
            ),
            config: OpeningConfig {
                merchant: MerchantRule {
                    address: "shop".to_string(),
                    network: "devnet".to_string(),
                },
                ..OpeningConfig::default()
            },
        };
        App::new(
            assets,
            SimulatedWallet::new("tester", DEFAULT_BALANCE_LAMPORTS),
            Box::new(MemoryCollectionStore::new()),
            RngState::from_seed(42),
        )
    }

    #[test]
    fn buy_and_open_runs_to_completion() {
        let mut app = test_app();
        let started = Instant::now();
        app.buy_and_open_at(started);
        assert!(app.session.is_opening());
        assert!(app.reveal_sequence().is_some());

        app.buy_and_open_at(started);
        assert_eq!(app.status_line, "a pack is already opening");

        app.on_tick_at(started + Duration::from_millis(5600));
        assert_eq!(
            app.last_frame.as_ref().map(|frame| frame.phase),
            Some(RevealPhase::Revealed)
        );
        app.on_tick_at(started + Duration::from_millis(7600));
        assert!(!app.session.is_opening());
        assert!(app.status_line.starts_with("New Card Received"));
        assert_eq!(app.album_rows().len(), 1);
        assert!(app.balance_sol() < 5.0);
    }

    #[test]
    fn declined_purchase_leaves_album_untouched() {
        let mut app = test_app();
        app.reject_next_purchase();
        app.buy_and_open_at(Instant::now());
        assert!(!app.session.is_opening());
        assert_eq!(app.status_line, "Transaction cancelled by user");
        assert!(app.album_rows().is_empty());
    }

    #[test]
    fn disconnected_wallet_cannot_buy() {
        let mut app = test_app();
        app.toggle_wallet();
        assert_eq!(app.status_line, "wallet disconnected");
        app.buy_and_open_at(Instant::now());
        assert!(!app.session.is_opening());
        assert_eq!(app.status_line, "error: wallet not connected");
        app.toggle_wallet();
        app.buy_and_open_at(Instant::now());
        assert!(app.session.is_opening());
    }

    #[test]
    fn cancel_clears_the_strip() {
        let mut app = test_app();
        let started = Instant::now();
        app.buy_and_open_at(started);
        app.on_tick_at(started + Duration::from_millis(100));
        app.cancel_opening();
        assert!(app.last_frame.is_none());
        assert!(app.reveal_sequence().is_none());
        app.on_tick_at(started + Duration::from_secs(30));
        assert!(app.album_rows().is_empty());
    }

    #[test]
    fn cursor_wraps_through_packs() {
        let mut app = test_app();
        app.move_cursor(false);
        assert_eq!(app.selected_pack().map(|pack| pack.id.as_str()), Some("gift"));
        app.move_cursor(true);
        assert_eq!(app.selected_pack().map(|pack| pack.id.as_str()), Some("test"));
    }
}
