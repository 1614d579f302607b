//! Error type shared by reads, writes and configuration.

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::token::SettlementCurrency;

pub type Result<T> = std::result::Result<T, GatherFiError>;

#[derive(Error, Debug)]
pub enum GatherFiError {
    #[error("Account not found: {0}")]
    NotFound(Pubkey),

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Signature required: open your wallet and approve the transaction")]
    SignatureRequired,

    #[error("Rate limited (429): {0}")]
    RateLimited(String),

    #[error("RPC error: {message}")]
    Rpc { status: Option<u16>, message: String },

    #[error("Failed to decode {account} account {address}: {reason}")]
    Decode {
        account: &'static str,
        address: Pubkey,
        reason: String,
    },

    #[error("{field} {value} does not fit in {width} bytes")]
    IdOutOfRange {
        field: &'static str,
        value: u64,
        width: usize,
    },

    #[error("{0} is not accepted by this event")]
    UnsupportedCurrency(SettlementCurrency),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),
}

impl GatherFiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatherFiError::NotFound(_))
    }

    /// HTTP 429 by status code or anywhere in the message
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GatherFiError::RateLimited(_) => true,
            GatherFiError::Rpc { status, message } => {
                *status == Some(429) || message.contains("429")
            }
            GatherFiError::Transaction(message) => message.contains("429"),
            _ => false,
        }
    }
}

impl From<ClientError> for GatherFiError {
    fn from(err: ClientError) -> Self {
        let status = match err.kind() {
            ClientErrorKind::Reqwest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        };
        let message = err.to_string();
        if status == Some(429) {
            return GatherFiError::RateLimited(message);
        }
        GatherFiError::Rpc { status, message }
    }
}

/// Turns a `NotFound` outcome into `Ok(None)`, keeping every other error.
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for Result<T> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(GatherFiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// User-facing buckets for write failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    WalletNotConnected,
    SignaturePending,
    Network,
    Generic,
}

const SIGNATURE_HINTS: &[&str] = &[
    "user rejected",
    "rejected the request",
    "not been authorized",
    "signature required",
    "approve the transaction",
    "waiting for approval",
];

const NETWORK_HINTS: &[&str] = &[
    "429",
    "timed out",
    "timeout",
    "connection",
    "network",
    "fetch failed",
];

impl ErrorCategory {
    pub fn classify(err: &GatherFiError) -> Self {
        match err {
            GatherFiError::WalletNotConnected => ErrorCategory::WalletNotConnected,
            GatherFiError::SignatureRequired => ErrorCategory::SignaturePending,
            GatherFiError::RateLimited(_) | GatherFiError::Rpc { .. } => {
                if contains_any(&err.to_string(), SIGNATURE_HINTS) {
                    ErrorCategory::SignaturePending
                } else {
                    ErrorCategory::Network
                }
            }
            GatherFiError::Transaction(message) => {
                if contains_any(message, SIGNATURE_HINTS) {
                    ErrorCategory::SignaturePending
                } else if contains_any(message, NETWORK_HINTS) {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Generic
                }
            }
            _ => ErrorCategory::Generic,
        }
    }

    /// Message shown for `err` in this category
    pub fn user_message(&self, err: &GatherFiError, fallback: &str) -> String {
        match self {
            ErrorCategory::WalletNotConnected => "Connect your wallet first".to_string(),
            ErrorCategory::SignaturePending => {
                "Open your wallet and approve the transaction".to_string()
            }
            ErrorCategory::Network => {
                format!("Network error, please try again shortly ({})", err)
            }
            ErrorCategory::Generic => match err {
                GatherFiError::Transaction(raw) if raw.trim().is_empty() => fallback.to_string(),
                _ => err.to_string(),
            },
        }
    }
}

fn contains_any(message: &str, needles: &[&str]) -> bool {
    let lower = message.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}
