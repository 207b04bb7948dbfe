use crate::RarityTier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    PackPurchased {
        pack_id: String,
        lamports: u64,
        signature: Option<String>,
    },
    PurchaseCancelled { pack_id: String },
    PurchaseFailed { pack_id: String, reason: String },
    OpeningStarted {
        pack_id: String,
        winning_position: usize,
    },
    OpeningCancelled { pack_id: String },
    CardCollected {
        pack_id: String,
        card_id: String,
        card_name: String,
        rarity: RarityTier,
        new_card: bool,
    },
    MilestoneReached { total: u32 },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// First milestone crossed when the distinct-card count moves from
/// `before` to `after`.
pub fn crossed_milestone(milestones: &[u32], before: u32, after: u32) -> Option<u32> {
    milestones
        .iter()
        .copied()
        .find(|&milestone| before < milestone && after >= milestone)
}
