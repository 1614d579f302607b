//! Account layouts owned by the GatherFi program.
//!
//! Field order mirrors the on-chain structs; see `layout` for the offsets
//! the client filters on.

use anchor_lang::prelude::*;
use std::fmt;

use crate::constants::{BPS_DENOMINATOR, SECONDS_PER_DAY};
use crate::token::{SettlementCurrency, TokenAmount};

/// Event lifecycle
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Draft,
    Funding,
    BudgetVoting,
    Active,
    Completed,
    Cancelled,
    Refunding,
    Failed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 8] = [
        EventStatus::Draft,
        EventStatus::Funding,
        EventStatus::BudgetVoting,
        EventStatus::Active,
        EventStatus::Completed,
        EventStatus::Cancelled,
        EventStatus::Refunding,
        EventStatus::Failed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Draft => "Draft",
            EventStatus::Funding => "Funding",
            EventStatus::BudgetVoting => "Budget Voting",
            EventStatus::Active => "Active",
            EventStatus::Completed => "Completed",
            EventStatus::Cancelled => "Cancelled",
            EventStatus::Refunding => "Refunding",
            EventStatus::Failed => "Failed",
        }
    }

    /// Next step on the happy path, if any
    pub fn next(&self) -> Option<EventStatus> {
        match self {
            EventStatus::Funding => Some(EventStatus::BudgetVoting),
            EventStatus::BudgetVoting => Some(EventStatus::Active),
            EventStatus::Active => Some(EventStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventStatus::Completed | EventStatus::Cancelled | EventStatus::Failed
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = crate::error::GatherFiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        EventStatus::ALL
            .into_iter()
            .find(|status| format!("{:?}", status).eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| crate::error::GatherFiError::Config(format!("unknown status '{}'", s)))
    }
}

/// Global admin, fee and pause state (singleton)
#[account]
#[derive(Debug, PartialEq)]
pub struct PlatformConfig {
    pub admin: Pubkey,
    pub treasury: Pubkey,
    /// Platform fee on contributions, percent
    pub fee_percentage: u8,
    /// Royalty on ticket sales, percent
    pub royalty_percentage: u8,
    pub total_fees_collected: u64,
    pub total_volume: u64,
    /// Emergency pause flag
    pub paused: bool,
    pub usdc_mint: Pubkey,
    pub usdt_mint: Pubkey,
    pub bump: u8,
}

/// A fundraising / ticketing campaign
#[account]
#[derive(Debug, PartialEq)]
pub struct Event {
    pub organizer: Pubkey,
    pub event_id: u64,
    pub name: String,
    pub description: String,
    pub target_amount: u64,
    pub amount_raised: u64,
    pub ticket_price: u64,
    pub tickets_sold: u32,
    pub max_tickets: u32,
    pub location: String,
    /// Unix seconds
    pub event_date: i64,
    pub status: EventStatus,
    pub accepted_tokens: Vec<SettlementCurrency>,
    pub budget_approved: bool,
    pub funding_deadline: i64,
    pub total_votes: u64,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub platform_fee_amount: u64,
    pub ticket_mint: Option<Pubkey>,
    pub escrow_bump: u8,
    pub event_bump: u8,
}

impl Event {
    /// Currency amounts are displayed in (first accepted, SOL if none)
    pub fn primary_currency(&self) -> SettlementCurrency {
        self.accepted_tokens.first().copied().unwrap_or(SettlementCurrency::Sol)
    }

    pub fn accepts(&self, currency: SettlementCurrency) -> bool {
        self.accepted_tokens.contains(&currency)
    }

    pub fn target(&self) -> TokenAmount {
        self.primary_currency().amount(self.target_amount)
    }

    pub fn raised(&self) -> TokenAmount {
        self.primary_currency().amount(self.amount_raised)
    }

    pub fn ticket_price(&self) -> TokenAmount {
        self.primary_currency().amount(self.ticket_price)
    }

    /// Integer comparison on raw units
    pub fn is_funding_target_met(&self) -> bool {
        self.amount_raised >= self.target_amount
    }

    /// Funding progress in basis points, capped at 100%
    pub fn funding_progress_bps(&self) -> u64 {
        if self.target_amount == 0 {
            return 0;
        }
        let bps =
            (self.amount_raised as u128 * BPS_DENOMINATOR as u128) / self.target_amount as u128;
        bps.min(BPS_DENOMINATOR as u128) as u64
    }

    pub fn tickets_remaining(&self) -> u32 {
        self.max_tickets.saturating_sub(self.tickets_sold)
    }

    /// Ticket number the next purchase will mint
    pub fn next_ticket_number(&self) -> u32 {
        self.tickets_sold.saturating_add(1)
    }
}

/// A backer's stake in one event
#[account]
#[derive(Debug, PartialEq)]
pub struct Contributor {
    pub event: Pubkey,
    pub contributor: Pubkey,
    pub amount: u64,
    pub voting_power: u64,
    pub token_type: SettlementCurrency,
    pub profits_claimed: u64,
    pub refund_claimed: bool,
    pub bump: u8,
}

impl Contributor {
    pub fn contributed(&self) -> TokenAmount {
        self.token_type.amount(self.amount)
    }

    pub fn profits(&self) -> TokenAmount {
        self.token_type.amount(self.profits_claimed)
    }
}

/// A purchased admission unit
#[account]
#[derive(Debug, PartialEq)]
pub struct Ticket {
    pub mint: Pubkey,
    pub event: Pubkey,
    pub owner: Pubkey,
    pub ticket_number: u32,
    pub checked_in: bool,
    pub price_paid: u64,
    pub token_type: SettlementCurrency,
    pub refunded: bool,
    pub bump: u8,
}

impl Ticket {
    pub fn price(&self) -> TokenAmount {
        self.token_type.amount(self.price_paid)
    }
}

/// Organizer's submitted budget
#[account]
#[derive(Debug, PartialEq)]
pub struct Budget {
    pub event: Pubkey,
    pub total_amount: u64,
    pub approved: bool,
    pub submitted_at: i64,
    pub bump: u8,
}

/// Budget line item gating fund release
#[account]
#[derive(Debug, PartialEq)]
pub struct Milestone {
    pub event: Pubkey,
    pub index: u8,
    pub description: String,
    pub amount: u64,
    pub due_date: i64,
    pub token_type: SettlementCurrency,
    pub released: bool,
    pub release_date: Option<i64>,
    pub bump: u8,
}

impl Milestone {
    pub fn value(&self) -> TokenAmount {
        self.token_type.amount(self.amount)
    }

    /// Releasable once due and not yet released
    pub fn is_releasable(&self, now: i64) -> bool {
        !self.released && now >= self.due_date
    }
}

/// Funds held for an event, per currency
#[account]
#[derive(Debug, PartialEq)]
pub struct Escrow {
    pub event: Pubkey,
    pub sol_balance: u64,
    pub usdc_balance: u64,
    pub usdt_balance: u64,
    pub total_balance: u64,
    pub is_initialized: bool,
    pub bump: u8,
}

impl Escrow {
    pub fn balance(&self, currency: SettlementCurrency) -> TokenAmount {
        let raw = match currency {
            SettlementCurrency::Sol => self.sol_balance,
            SettlementCurrency::Usdc => self.usdc_balance,
            SettlementCurrency::Usdt => self.usdt_balance,
        };
        currency.amount(raw)
    }
}

/// One contributor's budget ballot
#[account]
#[derive(Debug, PartialEq)]
pub struct Vote {
    pub event: Pubkey,
    pub voter: Pubkey,
    /// Voting weight
    pub amount: u64,
    pub approve: bool,
    pub voted_at: i64,
    pub bump: u8,
}

/// Post-event revenue split
#[account]
#[derive(Debug, PartialEq)]
pub struct ProfitDistribution {
    pub event: Pubkey,
    pub total_revenue: u64,
    pub expenses: u64,
    pub net_profit: u64,
    pub backers_share: u64,
    pub organizer_share: u64,
    pub platform_share: u64,
    pub distributed: bool,
    pub distribution_date: i64,
    pub bump: u8,
}

/// Whole days from `now` until `timestamp`, rounded up; zero once passed
pub fn days_remaining(timestamp: i64, now: i64) -> i64 {
    if now >= timestamp {
        return 0;
    }
    (timestamp - now + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}
