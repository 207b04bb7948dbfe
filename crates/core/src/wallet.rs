use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub from: String,
    pub to: String,
    pub lamports: u64,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub signature: String,
    /// Confirmation error reported by the chain, if the transfer landed but failed.
    pub error: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("transaction cancelled by user")]
    Rejected,
    #[error("insufficient balance: need {needed} lamports, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("transaction failed: {0}")]
    Failed(String),
}

/// Wallet connection capability handed to a pack session.
pub trait WalletSession {
    fn is_connected(&self) -> bool;

    fn public_key(&self) -> Option<&str>;

    fn send_transaction(&mut self, request: &PaymentRequest) -> Result<PaymentReceipt, WalletError>;
}

/// In-memory wallet used by the terminal frontends and tests.
#[derive(Debug, Clone)]
pub struct SimulatedWallet {
    address: String,
    connected: bool,
    balance: u64,
    reject_next: bool,
    sent: u64,
}

impl SimulatedWallet {
    pub fn new(address: impl Into<String>, balance: u64) -> Self {
        Self {
            address: address.into(),
            connected: true,
            balance,
            reject_next: false,
            sent: 0,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn connect(&mut self) {
        self.connected = true;
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Makes the next `send_transaction` behave as if the user declined it.
    pub fn reject_next(&mut self) {
        self.reject_next = true;
    }
}

impl WalletSession for SimulatedWallet {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn public_key(&self) -> Option<&str> {
        if self.connected {
            Some(&self.address)
        } else {
            None
        }
    }

    fn send_transaction(&mut self, request: &PaymentRequest) -> Result<PaymentReceipt, WalletError> {
        if !self.connected {
            return Err(WalletError::Failed("wallet not connected".to_string()));
        }
        if std::mem::take(&mut self.reject_next) {
            return Err(WalletError::Rejected);
        }
        if request.to.is_empty() {
            return Err(WalletError::InvalidAddress(request.to.clone()));
        }
        if request.lamports > self.balance {
            return Err(WalletError::InsufficientFunds {
                needed: request.lamports,
                available: self.balance,
            });
        }
        self.balance -= request.lamports;
        self.sent += 1;
        Ok(PaymentReceipt {
            signature: format!("sim-{}-{:04}", self.address, self.sent),
            error: None,
        })
    }
}
