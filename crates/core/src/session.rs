use crate::{
    build_reveal_sequence, crossed_milestone, owned_card_ids, select_card, sol_to_lamports,
    sync_from_openings, Card, Catalog, CollectionProgress, CollectionStore, DrawError, Event,
    EventBus, NewOpening, OpeningConfig, PackRegistry, PaymentRequest, RandomSource, RevealController,
    RevealFrame, RevealSequence, StoreError, TransactionRecord, TransactionStatus, WalletError,
    WalletSession, OBTAINED_FROM_PACK,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Instant;
use thiserror::Error;

/// Signature stored for packs that cost nothing and never hit the chain.
pub const FREE_PACK_SIGNATURE: &str = "free-pack-no-transaction";

/// The card a pack opening awarded, with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpeningResult {
    pub card: Card,
    pub pack_id: String,
    pub transaction_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub pack_id: String,
    pub lamports: u64,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased(PurchaseReceipt),
    /// The user declined the transaction. Nothing was charged or granted.
    Rejected,
}

#[derive(Debug, Error)]
pub enum OpeningError {
    #[error("unknown pack {0}")]
    UnknownPack(String),
    #[error("wallet not connected")]
    WalletNotConnected,
    #[error("another pack is already opening")]
    OpeningInProgress,
    #[error("pack {0} has not been purchased")]
    PackNotPurchased(String),
    #[error("invalid price {price} for pack {pack_id}")]
    InvalidPrice { pack_id: String, price: f64 },
    #[error("merchant wallet address not configured")]
    MerchantNotConfigured,
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type CompletionFn = Box<dyn FnOnce(OpeningResult)>;

#[derive(Debug)]
struct ActiveOpening {
    wallet: String,
    pack_name: String,
    controller: RevealController<CompletionFn>,
    /// Completed but not yet written to the store.
    unsaved: Option<OpeningResult>,
}

/// One wallet session in the album: buys packs, runs at most one opening at
/// a time, and writes finished openings to the collection store.
pub struct PackSession<W, S>
where
    W: WalletSession,
    S: CollectionStore,
{
    catalog: Catalog,
    registry: PackRegistry,
    config: OpeningConfig,
    wallet: W,
    store: S,
    credits: HashMap<String, VecDeque<Option<String>>>,
    active: Option<ActiveOpening>,
    completed_tx: Sender<OpeningResult>,
    completed_rx: Receiver<OpeningResult>,
    last_opened: Option<OpeningResult>,
    events: EventBus,
}

impl<W, S> PackSession<W, S>
where
    W: WalletSession,
    S: CollectionStore,
{
    pub fn new(
        catalog: Catalog,
        registry: PackRegistry,
        config: OpeningConfig,
        wallet: W,
        store: S,
    ) -> Self {
        let (completed_tx, completed_rx) = channel();
        Self {
            catalog,
            registry,
            config,
            wallet,
            store,
            credits: HashMap::new(),
            active: None,
            completed_tx,
            completed_rx,
            last_opened: None,
            events: EventBus::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &PackRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OpeningConfig {
        &self.config
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut W {
        &mut self.wallet
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn is_opening(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_controller(&self) -> Option<&RevealController<CompletionFn>> {
        self.active.as_ref().map(|active| &active.controller)
    }

    pub fn last_opened(&self) -> Option<&OpeningResult> {
        self.last_opened.as_ref()
    }

    pub fn unopened(&self, pack_id: &str) -> usize {
        self.credits.get(pack_id).map_or(0, VecDeque::len)
    }

    fn wallet_address(&self) -> Result<String, OpeningError> {
        if !self.wallet.is_connected() {
            return Err(OpeningError::WalletNotConnected);
        }
        self.wallet
            .public_key()
            .map(str::to_string)
            .ok_or(OpeningError::WalletNotConnected)
    }

    /// Pays for one pack and grants a credit to open it.
    pub fn purchase(&mut self, pack_id: &str) -> Result<PurchaseOutcome, OpeningError> {
        let from = self.wallet_address()?;
        let pack = self
            .registry
            .pack(pack_id)
            .cloned()
            .ok_or_else(|| OpeningError::UnknownPack(pack_id.to_string()))?;
        if !pack.price_sol.is_finite() || pack.price_sol < 0.0 {
            return Err(OpeningError::InvalidPrice {
                pack_id: pack.id,
                price: pack.price_sol,
            });
        }

        if pack.is_free() {
            tracing::info!(pack = %pack.id, "free pack granted");
            self.grant_credit(&pack.id, None);
            self.events.push(Event::PackPurchased {
                pack_id: pack.id.clone(),
                lamports: 0,
                signature: None,
            });
            return Ok(PurchaseOutcome::Purchased(PurchaseReceipt {
                pack_id: pack.id,
                lamports: 0,
                signature: FREE_PACK_SIGNATURE.to_string(),
            }));
        }

        let merchant = self.config.merchant.clone();
        if merchant.is_placeholder() {
            return Err(OpeningError::MerchantNotConfigured);
        }
        if merchant.address == from {
            tracing::warn!(wallet = %from, "paying own wallet; only sensible on devnet");
        }

        let lamports = sol_to_lamports(pack.price_sol);
        let request = PaymentRequest {
            from: from.clone(),
            to: merchant.address.clone(),
            lamports,
            memo: Some(format!("Purchase Pack: {}", pack.id)),
        };
        let receipt = match self.wallet.send_transaction(&request) {
            Ok(receipt) => receipt,
            Err(WalletError::Rejected) => {
                tracing::info!(pack = %pack.id, "purchase cancelled by user");
                self.events.push(Event::PurchaseCancelled {
                    pack_id: pack.id.clone(),
                });
                return Ok(PurchaseOutcome::Rejected);
            }
            Err(err) => {
                tracing::warn!(pack = %pack.id, error = %err, "purchase failed");
                self.events.push(Event::PurchaseFailed {
                    pack_id: pack.id.clone(),
                    reason: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let mut record = TransactionRecord {
            signature: receipt.signature.clone(),
            wallet: from,
            pack_id: pack.id.clone(),
            pack_name: pack.name.clone(),
            lamports,
            merchant: merchant.address,
            network: merchant.network,
            status: TransactionStatus::Confirmed,
            error: None,
        };

        if let Some(reason) = receipt.error {
            record.status = TransactionStatus::Failed;
            record.error = Some(reason.clone());
            if let Err(err) = self.store.record_transaction(record) {
                tracing::error!(error = %err, "could not record failed transaction");
            }
            self.events.push(Event::PurchaseFailed {
                pack_id: pack.id.clone(),
                reason: reason.clone(),
            });
            return Err(OpeningError::TransactionFailed(reason));
        }

        // The payment went through; a bookkeeping failure must not undo it.
        if let Err(err) = self.store.record_transaction(record) {
            tracing::error!(error = %err, "could not record confirmed transaction");
        }
        tracing::info!(pack = %pack.id, lamports, signature = %receipt.signature, "pack purchased");
        self.grant_credit(&pack.id, Some(receipt.signature.clone()));
        self.events.push(Event::PackPurchased {
            pack_id: pack.id.clone(),
            lamports,
            signature: Some(receipt.signature.clone()),
        });
        Ok(PurchaseOutcome::Purchased(PurchaseReceipt {
            pack_id: pack.id,
            lamports,
            signature: receipt.signature,
        }))
    }

    fn grant_credit(&mut self, pack_id: &str, signature: Option<String>) {
        self.credits
            .entry(pack_id.to_string())
            .or_default()
            .push_back(signature);
    }

    /// Draws the reward for a purchased pack and starts its reveal.
    ///
    /// The credit is spent once the reveal starts; a pack with no eligible
    /// cards fails with `DrawError::InvalidInput` and keeps its credit.
    pub fn start_opening<R: RandomSource + ?Sized>(
        &mut self,
        pack_id: &str,
        rng: &mut R,
        now: Instant,
    ) -> Result<&RevealSequence, OpeningError> {
        if self.active.is_some() {
            return Err(OpeningError::OpeningInProgress);
        }
        let wallet = self.wallet_address()?;
        let pack = self
            .registry
            .pack(pack_id)
            .cloned()
            .ok_or_else(|| OpeningError::UnknownPack(pack_id.to_string()))?;
        if self.unopened(&pack.id) == 0 {
            return Err(OpeningError::PackNotPurchased(pack.id));
        }

        let eligible = self.catalog.eligible_for(&pack);
        let card = select_card(&eligible, rng)?.clone();
        let sequence = build_reveal_sequence(&eligible, &card, rng);

        let signature = self
            .credits
            .get_mut(&pack.id)
            .and_then(VecDeque::pop_front)
            .flatten();
        let result = OpeningResult {
            card,
            pack_id: pack.id.clone(),
            transaction_signature: signature,
        };

        tracing::info!(
            pack = %pack.id,
            winning_position = sequence.winning_position,
            "opening started"
        );
        self.events.push(Event::OpeningStarted {
            pack_id: pack.id.clone(),
            winning_position: sequence.winning_position,
        });

        let tx = self.completed_tx.clone();
        let on_complete: CompletionFn = Box::new(move |result| {
            let _ = tx.send(result);
        });
        let controller = RevealController::start(
            sequence,
            result,
            self.config.timing.clone(),
            self.config.layout.clone(),
            now,
            on_complete,
        );
        let active = self.active.insert(ActiveOpening {
            wallet,
            pack_name: pack.name,
            controller,
            unsaved: None,
        });
        Ok(active.controller.sequence())
    }

    /// Samples the active reveal. When it completes, the opening is written
    /// to the store and the slot is freed for the next pack.
    ///
    /// If the store write fails the error is returned and the opening stays
    /// active; the next `tick` retries the write.
    pub fn tick(&mut self, now: Instant) -> Result<Option<RevealFrame>, OpeningError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        let frame = active.controller.sample(now);
        if let Ok(result) = self.completed_rx.try_recv() {
            self.last_opened = Some(result.clone());
            active.unsaved = Some(result);
        }
        let Some(result) = active.unsaved.clone() else {
            return Ok(Some(frame));
        };
        let wallet = active.wallet.clone();
        let pack_name = active.pack_name.clone();
        if let Err(err) = self.persist(&wallet, &pack_name, &result) {
            tracing::warn!(pack = %result.pack_id, error = %err, "opening not saved, will retry");
            return Err(err);
        }
        self.active = None;
        Ok(Some(frame))
    }

    /// Abandons the active reveal. Nothing is persisted and the completion
    /// never fires. A completed opening still waiting on a store retry is
    /// dropped as well. Does nothing when no pack is opening.
    pub fn cancel(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.controller.cancel();
            let pack_id = active.controller.result().pack_id.clone();
            tracing::info!(pack = %pack_id, "opening cancelled");
            self.events.push(Event::OpeningCancelled { pack_id });
        }
    }

    fn persist(
        &mut self,
        wallet: &str,
        pack_name: &str,
        result: &OpeningResult,
    ) -> Result<(), OpeningError> {
        let before = owned_card_ids(&self.store, wallet)?.len() as u32;
        let new_card = self
            .store
            .collect_opening(
                wallet,
                NewOpening {
                    pack_id: &result.pack_id,
                    pack_name,
                    card: &result.card,
                    transaction_signature: result.transaction_signature.as_deref(),
                    obtained_from: OBTAINED_FROM_PACK,
                },
            )?
            .new_card;
        tracing::info!(
            pack = %result.pack_id,
            card = %result.card.id,
            new_card,
            "card collected"
        );
        self.events.push(Event::CardCollected {
            pack_id: result.pack_id.clone(),
            card_id: result.card.id.clone(),
            card_name: result.card.name.clone(),
            rarity: result.card.rarity,
            new_card,
        });
        let after = if new_card { before + 1 } else { before };
        if let Some(total) = crossed_milestone(&self.config.milestones, before, after) {
            self.events.push(Event::MilestoneReached { total });
        }
        Ok(())
    }

    pub fn progress(&self) -> Result<CollectionProgress, OpeningError> {
        let wallet = self.wallet_address()?;
        let owned = owned_card_ids(&self.store, &wallet)?;
        Ok(CollectionProgress::compute(
            &self.catalog,
            &self.registry.sets,
            &owned,
        ))
    }

    pub fn sync_collection(&mut self) -> Result<usize, OpeningError> {
        let wallet = self.wallet_address()?;
        Ok(sync_from_openings(&mut self.store, &wallet)?)
    }
}

impl<W, S> std::fmt::Debug for PackSession<W, S>
where
    W: WalletSession,
    S: CollectionStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackSession")
            .field("cards", &self.catalog.len())
            .field("packs", &self.registry.packs.len())
            .field("credits", &self.credits)
            .field("active", &self.active)
            .finish()
    }
}
