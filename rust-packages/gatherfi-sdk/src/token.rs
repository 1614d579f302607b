//! Settlement currencies and fixed-precision amounts.

use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEVNET_USDC_MINT, DEVNET_USDT_MINT, SOL_DECIMALS, USDC_DECIMALS, USDT_DECIMALS,
};
use crate::error::{GatherFiError, Result};

/// Currency a contribution, ticket or milestone is denominated in.
///
/// Serialized as the program's `TokenType` enum (one byte variant index).
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettlementCurrency {
    Sol,
    Usdc,
    Usdt,
}

impl SettlementCurrency {
    pub const ALL: [SettlementCurrency; 3] = [
        SettlementCurrency::Sol,
        SettlementCurrency::Usdc,
        SettlementCurrency::Usdt,
    ];

    pub fn decimals(&self) -> u8 {
        match self {
            SettlementCurrency::Sol => SOL_DECIMALS,
            SettlementCurrency::Usdc => USDC_DECIMALS,
            SettlementCurrency::Usdt => USDT_DECIMALS,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, SettlementCurrency::Sol)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            SettlementCurrency::Sol => "SOL",
            SettlementCurrency::Usdc => "USDC",
            SettlementCurrency::Usdt => "USDT",
        }
    }

    /// Wrap a raw base-unit amount in this currency's precision
    pub fn amount(&self, raw: u64) -> TokenAmount {
        TokenAmount::new(raw, self.decimals())
    }
}

impl fmt::Display for SettlementCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for SettlementCurrency {
    type Err = GatherFiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SOL" => Ok(SettlementCurrency::Sol),
            "USDC" => Ok(SettlementCurrency::Usdc),
            "USDT" => Ok(SettlementCurrency::Usdt),
            other => Err(GatherFiError::Config(format!("unknown currency '{}'", other))),
        }
    }
}

/// Stablecoin mints the deployment settles in. Native SOL has no mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMints {
    pub usdc: Pubkey,
    pub usdt: Pubkey,
}

impl TokenMints {
    pub fn new(usdc: Pubkey, usdt: Pubkey) -> Self {
        Self { usdc, usdt }
    }

    pub fn mint(&self, currency: SettlementCurrency) -> Option<Pubkey> {
        match currency {
            SettlementCurrency::Sol => None,
            SettlementCurrency::Usdc => Some(self.usdc),
            SettlementCurrency::Usdt => Some(self.usdt),
        }
    }
}

impl Default for TokenMints {
    fn default() -> Self {
        Self::new(DEVNET_USDC_MINT, DEVNET_USDT_MINT)
    }
}

/// A raw on-chain amount together with its decimal precision.
///
/// Comparisons use `raw` only; `Display` renders the exact decimal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount {
    pub raw: u64,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: u64, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Parse a user-entered decimal string ("1.25") into base units.
    pub fn parse(input: &str, currency: SettlementCurrency) -> Result<Self> {
        let decimals = currency.decimals();
        let trimmed = input.trim();
        let invalid = || GatherFiError::InvalidAmount(input.to_string());

        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !digits_only(whole) || !digits_only(frac) {
            return Err(invalid());
        }
        if frac.len() > decimals as usize {
            return Err(GatherFiError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                input, decimals
            )));
        }

        let scale = 10u64.checked_pow(decimals as u32).ok_or_else(invalid)?;
        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let frac_units: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = decimals as usize);
            padded.parse().map_err(|_| invalid())?
        };

        let raw = whole
            .checked_mul(scale)
            .and_then(|w| w.checked_add(frac_units))
            .ok_or_else(invalid)?;
        Ok(Self::new(raw, decimals))
    }

    /// Lossy conversion for display purposes only
    pub fn to_f64(&self) -> f64 {
        self.raw as f64 / 10f64.powi(self.decimals as i32)
    }

    pub fn checked_add(&self, other: TokenAmount) -> Option<TokenAmount> {
        if self.decimals != other.decimals {
            return None;
        }
        self.raw.checked_add(other.raw).map(|raw| TokenAmount::new(raw, self.decimals))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = self.decimals as usize;
        if decimals == 0 {
            return write!(f, "{}", self.raw);
        }
        // work on digits so any precision renders without a power-of-ten scale
        let digits = format!("{:0>width$}", self.raw, width = decimals + 1);
        let (whole, frac) = digits.split_at(digits.len() - decimals);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{}", whole)
        } else {
            write!(f, "{}.{}", whole, frac)
        }
    }
}
