use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder merchant address shipped in sample configs. Paid packs refuse
/// to transfer to it.
pub const PLACEHOLDER_MERCHANT: &str = "11111111111111111111111111111111";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingRule {
    pub scroll_ms: u64,
    pub settle_ms: u64,
    pub hold_ms: u64,
}

impl TimingRule {
    pub fn scroll(&self) -> Duration {
        Duration::from_millis(self.scroll_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    /// Time from start until the completion callback fires.
    pub fn total(&self) -> Duration {
        self.scroll() + self.settle() + self.hold()
    }
}

impl Default for TimingRule {
    fn default() -> Self {
        Self {
            scroll_ms: 5000,
            settle_ms: 500,
            hold_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutRule {
    /// Horizontal pitch of one card in the reveal strip, gap included.
    /// Renderers must draw cards at this pitch for the offsets to line up.
    pub card_width: f64,
}

impl Default for LayoutRule {
    fn default() -> Self {
        Self { card_width: 280.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerchantRule {
    pub address: String,
    pub network: String,
}

impl Default for MerchantRule {
    fn default() -> Self {
        Self {
            address: PLACEHOLDER_MERCHANT.to_string(),
            network: "devnet".to_string(),
        }
    }
}

impl MerchantRule {
    pub fn is_placeholder(&self) -> bool {
        self.address.trim().is_empty() || self.address == PLACEHOLDER_MERCHANT
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpeningConfig {
    #[serde(default)]
    pub timing: TimingRule,
    #[serde(default)]
    pub layout: LayoutRule,
    #[serde(default)]
    pub merchant: MerchantRule,
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,
}

impl Default for OpeningConfig {
    fn default() -> Self {
        Self {
            timing: TimingRule::default(),
            layout: LayoutRule::default(),
            merchant: MerchantRule::default(),
            milestones: default_milestones(),
        }
    }
}

fn default_milestones() -> Vec<u32> {
    vec![10, 25, 50, 100, 200, 300, 500]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_totals_seven_and_a_half_seconds() {
        let timing = TimingRule::default();
        assert_eq!(timing.total(), Duration::from_millis(7500));
    }

    #[test]
    fn default_merchant_is_placeholder() {
        assert!(MerchantRule::default().is_placeholder());
    }
}
