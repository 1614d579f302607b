//! # gatherfi-sdk
//!
//! Rust client for the **GatherFi** event crowdfunding program on Solana.
//!
//! The program owns every account: events, contributor stakes, tickets,
//! milestones, budget votes and profit distributions. This crate only reads
//! and writes them through the program's interface.
//!
//! # Features
//!
//! - PDA derivation with a single canonical seed encoding
//! - Account decoding and byte-offset filtered scans
//! - A bounded, expiring read cache shared by reads and writes
//! - Rate-limit aware retry for reads
//! - Instruction builders and a mutation layer with notifications
//!
//! # Example
//!
//! ```no_run
//! use gatherfi_sdk::Pda;
//! use solana_sdk::pubkey::Pubkey;
//!
//! let pda = Pda::new(gatherfi_sdk::ID);
//! let organizer = Pubkey::new_unique();
//! let (event, _bump) = pda.event(&organizer, 1);
//! let (escrow, _bump) = pda.escrow(&event);
//! ```

anchor_lang::declare_id!("9eEhkngNxm4yc69dNan9L1Arc1YHCDcomQqguw5N8SbE");

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod layout;
pub mod liveness;
pub mod mutation;
pub mod notify;
pub mod pda;
pub mod retry;
pub mod rpc;
pub mod source;
pub mod state;
pub mod token;

pub use cache::{CacheKey, ReadCache};
pub use client::{AccountClient, ProgramAccount};
pub use config::ClientConfig;
pub use error::{ErrorCategory, GatherFiError, OptionalExt, Result};
pub use instructions::{AddMilestoneArgs, CreateEventArgs, InstructionBuilder, UpdateEventArgs};
pub use liveness::{Liveness, LivenessToken};
pub use mutation::{Mutations, TransactionSubmitter};
pub use notify::{Notifier, TracingNotifier};
pub use pda::Pda;
pub use retry::{with_retry, RateLimitSignal, RetryPolicy};
pub use rpc::{RpcAccountSource, RpcTransactionSubmitter};
pub use source::{AccountSource, MemcmpFilter, MemoryAccountSource};
pub use state::*;
pub use token::{SettlementCurrency, TokenAmount, TokenMints};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_id() {
        assert_eq!(ID.to_string(), "9eEhkngNxm4yc69dNan9L1Arc1YHCDcomQqguw5N8SbE");
    }
}
