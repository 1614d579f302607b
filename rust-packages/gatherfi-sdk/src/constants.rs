//! Protocol and client constants.

use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

// =============================================================================
// PDA SEEDS
// =============================================================================

pub const PLATFORM_SEED: &[u8] = b"platform";
pub const EVENT_SEED: &[u8] = b"event";
pub const ESCROW_SEED: &[u8] = b"escrow";
pub const CONTRIBUTOR_SEED: &[u8] = b"contributor";
pub const TICKET_SEED: &[u8] = b"ticket";
pub const BUDGET_SEED: &[u8] = b"budget";
pub const MILESTONE_SEED: &[u8] = b"milestone";
pub const PROFIT_SEED: &[u8] = b"profit";
pub const VOTE_SEED: &[u8] = b"vote";

// =============================================================================
// EXTERNAL PROGRAMS
// =============================================================================

pub const SYSTEM_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("11111111111111111111111111111111");

/// Classic SPL token program (stablecoin settlement)
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

// =============================================================================
// NETWORK DEFAULTS (devnet)
// =============================================================================

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

pub const DEVNET_USDC_MINT: Pubkey =
    solana_sdk::pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

pub const DEVNET_USDT_MINT: Pubkey =
    solana_sdk::pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB");

// =============================================================================
// TOKEN DECIMALS
// =============================================================================

pub const SOL_DECIMALS: u8 = 9;
pub const USDC_DECIMALS: u8 = 6;
pub const USDT_DECIMALS: u8 = 6;

// =============================================================================
// READ CACHE
// =============================================================================

/// Entries older than this are treated as absent
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(45_000);

/// Maximum retained entries before FIFO eviction
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

// =============================================================================
// RETRY
// =============================================================================

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1_000);

// =============================================================================
// MISC
// =============================================================================

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Progress is reported in basis points, 10_000 = fully funded
pub const BPS_DENOMINATOR: u64 = 10_000;
