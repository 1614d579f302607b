//! Account client: domain queries over the program's accounts.
//!
//! Single-account reads return `GatherFiError::NotFound` when nothing lives
//! at the derived address, so callers can tell "not created yet" apart from a
//! broken query (`.optional()` converts it). List reads never fail: errors
//! are logged and an empty list is returned.

use anchor_lang::{AccountDeserialize, Discriminator};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::cache::{CacheKey, ReadCache};
use crate::error::{GatherFiError, Result};
use crate::layout;
use crate::pda::Pda;
use crate::retry::{with_retry, RetryPolicy};
use crate::source::{AccountSource, MemcmpFilter};
use crate::state::{
    Budget, Contributor, Escrow, Event, EventStatus, Milestone, PlatformConfig,
    ProfitDistribution, Ticket, Vote,
};

/// A decoded account and the address it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramAccount<T> {
    pub address: Pubkey,
    pub account: T,
}

/// Decode a program-owned account, checking its discriminator
pub fn decode_account<T: AccountDeserialize>(
    kind: &'static str,
    address: &Pubkey,
    data: &[u8],
) -> Result<T> {
    let mut slice = data;
    T::try_deserialize(&mut slice).map_err(|e| GatherFiError::Decode {
        account: kind,
        address: *address,
        reason: e.to_string(),
    })
}

pub struct AccountClient<S> {
    source: Arc<S>,
    cache: Arc<ReadCache>,
    pda: Pda,
    retry: RetryPolicy,
}

impl<S> Clone for AccountClient<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            cache: self.cache.clone(),
            pda: self.pda,
            retry: self.retry,
        }
    }
}

impl<S: AccountSource> AccountClient<S> {
    pub fn new(
        source: Arc<S>,
        cache: Arc<ReadCache>,
        program_id: Pubkey,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            cache,
            pda: Pda::new(program_id),
            retry,
        }
    }

    pub fn pda(&self) -> &Pda {
        &self.pda
    }

    pub fn program_id(&self) -> &Pubkey {
        self.pda.program_id()
    }

    pub fn cache(&self) -> &Arc<ReadCache> {
        &self.cache
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    async fn fetch_one<T>(
        &self,
        kind: &'static str,
        key: CacheKey,
        address: Pubkey,
    ) -> Result<ProgramAccount<T>>
    where
        T: AccountDeserialize + Clone + Send + Sync + 'static,
    {
        if let Some(hit) = self.cache.get::<ProgramAccount<T>>(&key) {
            return Ok(hit);
        }
        self.load_one(kind, key, address).await
    }

    /// Network read that skips the cache lookup but still populates it
    async fn load_one<T>(
        &self,
        kind: &'static str,
        key: CacheKey,
        address: Pubkey,
    ) -> Result<ProgramAccount<T>>
    where
        T: AccountDeserialize + Clone + Send + Sync + 'static,
    {
        let fetched = self.read_one::<T>(kind, address).await?;
        self.cache.set(key, fetched.clone());
        Ok(fetched)
    }

    /// Network read that leaves the cache untouched
    async fn read_one<T>(&self, kind: &'static str, address: Pubkey) -> Result<ProgramAccount<T>>
    where
        T: AccountDeserialize,
    {
        let data = with_retry(&self.retry, || self.source.account_data(&address))
            .await?
            .ok_or(GatherFiError::NotFound(address))?;

        Ok(ProgramAccount {
            address,
            account: decode_account::<T>(kind, &address, &data)?,
        })
    }

    /// List query that degrades to an empty list on failure
    async fn fetch_all<T, F>(
        &self,
        kind: &'static str,
        key: CacheKey,
        filters: Vec<MemcmpFilter>,
        order: F,
    ) -> Vec<ProgramAccount<T>>
    where
        T: AccountDeserialize + Discriminator + Clone + Send + Sync + 'static,
        F: FnOnce(&mut Vec<ProgramAccount<T>>),
    {
        self.try_fetch_all(kind, key, filters, order)
            .await
            .unwrap_or_default()
    }

    /// List query. `None` when the scan failed; nothing is cached then.
    async fn try_fetch_all<T, F>(
        &self,
        kind: &'static str,
        key: CacheKey,
        filters: Vec<MemcmpFilter>,
        order: F,
    ) -> Option<Vec<ProgramAccount<T>>>
    where
        T: AccountDeserialize + Discriminator + Clone + Send + Sync + 'static,
        F: FnOnce(&mut Vec<ProgramAccount<T>>),
    {
        if let Some(hit) = self.cache.get::<Vec<ProgramAccount<T>>>(&key) {
            return Some(hit);
        }

        let mut all_filters = Vec::with_capacity(filters.len() + 1);
        all_filters.push(MemcmpFilter::new(0, T::DISCRIMINATOR.to_vec()));
        all_filters.extend(filters);

        let program_id = *self.program_id();
        let raw = match with_retry(&self.retry, || {
            self.source.program_accounts(&program_id, &all_filters)
        })
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Error fetching {} accounts ({}): {}", kind, key, e);
                return None;
            }
        };

        let mut accounts: Vec<ProgramAccount<T>> = raw
            .into_iter()
            .filter_map(|(address, data)| match decode_account::<T>(kind, &address, &data) {
                Ok(account) => Some(ProgramAccount { address, account }),
                Err(e) => {
                    tracing::warn!("Skipping undecodable account: {}", e);
                    None
                }
            })
            .collect();
        order(&mut accounts);

        tracing::debug!("Fetched {} {} accounts for {}", accounts.len(), kind, key);
        self.cache.set(key, accounts.clone());
        Some(accounts)
    }

    // ===== EVENTS =====

    pub async fn fetch_event(&self, address: &Pubkey) -> Result<ProgramAccount<Event>> {
        self.fetch_one("event", CacheKey::Event(*address), *address).await
    }

    /// Bypass any cached copy and store the fresh one
    pub async fn refresh_event(&self, address: &Pubkey) -> Result<ProgramAccount<Event>> {
        self.load_one("event", CacheKey::Event(*address), *address).await
    }

    /// Read straight from the source without touching the cache, e.g. before
    /// picking the next ticket number
    pub async fn read_event_uncached(&self, address: &Pubkey) -> Result<ProgramAccount<Event>> {
        self.read_one("event", *address).await
    }

    pub async fn fetch_event_by_id(
        &self,
        organizer: &Pubkey,
        event_id: u64,
    ) -> Result<ProgramAccount<Event>> {
        let (address, _) = self.pda.event(organizer, event_id);
        self.fetch_event(&address).await
    }

    /// Every event, newest (highest id) first
    pub async fn fetch_all_events(&self) -> Vec<ProgramAccount<Event>> {
        self.fetch_all("event", CacheKey::AllEvents, Vec::new(), sort_events_newest_first)
            .await
    }

    pub async fn fetch_events_by_organizer(
        &self,
        organizer: &Pubkey,
    ) -> Vec<ProgramAccount<Event>> {
        self.fetch_all(
            "event",
            CacheKey::EventsByOrganizer(*organizer),
            vec![MemcmpFilter::pubkey(layout::event::ORGANIZER, organizer)],
            sort_events_newest_first,
        )
        .await
    }

    /// Status sits behind variable-length fields, so this filters client-side
    pub async fn fetch_events_by_status(&self, status: EventStatus) -> Vec<ProgramAccount<Event>> {
        let key = CacheKey::EventsByStatus(status);
        if let Some(hit) = self.cache.get::<Vec<ProgramAccount<Event>>>(&key) {
            return hit;
        }
        let all = self
            .try_fetch_all("event", CacheKey::AllEvents, Vec::new(), sort_events_newest_first)
            .await;
        let Some(all) = all else {
            return Vec::new();
        };
        let events: Vec<ProgramAccount<Event>> = all
            .into_iter()
            .filter(|e| e.account.status == status)
            .collect();
        self.cache.set(key, events.clone());
        events
    }

    // ===== CONTRIBUTORS =====

    pub async fn fetch_contributor(
        &self,
        event: &Pubkey,
        contributor: &Pubkey,
    ) -> Result<ProgramAccount<Contributor>> {
        let (address, _) = self.pda.contributor(event, contributor);
        let key = CacheKey::Contributor {
            event: *event,
            contributor: *contributor,
        };
        self.fetch_one("contributor", key, address).await
    }

    /// Every stake held by `contributor`, across events
    pub async fn fetch_contributions_by(
        &self,
        contributor: &Pubkey,
    ) -> Vec<ProgramAccount<Contributor>> {
        self.fetch_all::<Contributor, _>(
            "contributor",
            CacheKey::ContributionsBy(*contributor),
            vec![MemcmpFilter::pubkey(layout::contributor::CONTRIBUTOR, contributor)],
            |list| list.sort_by_key(|c| c.account.event),
        )
        .await
    }

    // ===== MILESTONES =====

    pub async fn fetch_milestone(
        &self,
        event: &Pubkey,
        index: u8,
    ) -> Result<ProgramAccount<Milestone>> {
        let (address, _) = self.pda.milestone(event, index);
        self.fetch_one("milestone", CacheKey::Milestone { event: *event, index }, address)
            .await
    }

    /// Milestones of `event`, ascending index
    pub async fn fetch_milestones(&self, event: &Pubkey) -> Vec<ProgramAccount<Milestone>> {
        self.fetch_all::<Milestone, _>(
            "milestone",
            CacheKey::Milestones(*event),
            vec![MemcmpFilter::pubkey(layout::milestone::EVENT, event)],
            |list| list.sort_by_key(|m| m.account.index),
        )
        .await
    }

    // ===== TICKETS =====

    pub async fn fetch_ticket(
        &self,
        event: &Pubkey,
        ticket_number: u32,
    ) -> Result<ProgramAccount<Ticket>> {
        let (address, _) = self.pda.ticket(event, ticket_number);
        let key = CacheKey::Ticket {
            event: *event,
            ticket_number,
        };
        self.fetch_one("ticket", key, address).await
    }

    /// Tickets sold for `event`, ascending ticket number
    pub async fn fetch_tickets_by_event(&self, event: &Pubkey) -> Vec<ProgramAccount<Ticket>> {
        self.fetch_all::<Ticket, _>(
            "ticket",
            CacheKey::TicketsByEvent(*event),
            vec![MemcmpFilter::pubkey(layout::ticket::EVENT, event)],
            |list| list.sort_by_key(|t| t.account.ticket_number),
        )
        .await
    }

    /// Tickets held by `owner`, grouped by event
    pub async fn fetch_tickets_by_owner(&self, owner: &Pubkey) -> Vec<ProgramAccount<Ticket>> {
        self.fetch_all::<Ticket, _>(
            "ticket",
            CacheKey::TicketsByOwner(*owner),
            vec![MemcmpFilter::pubkey(layout::ticket::OWNER, owner)],
            |list| list.sort_by_key(|t| (t.account.event, t.account.ticket_number)),
        )
        .await
    }

    /// The ticket minted as `mint`
    pub async fn fetch_ticket_by_mint(&self, mint: &Pubkey) -> Result<ProgramAccount<Ticket>> {
        let tickets = self
            .try_fetch_all::<Ticket, _>(
                "ticket",
                CacheKey::TicketByMint(*mint),
                vec![MemcmpFilter::pubkey(layout::ticket::MINT, mint)],
                |_| {},
            )
            .await
            .ok_or_else(|| GatherFiError::Rpc {
                status: None,
                message: format!("ticket scan for mint {} failed", mint),
            })?;
        tickets
            .into_iter()
            .next()
            .ok_or(GatherFiError::NotFound(*mint))
    }

    // ===== BUDGET & VOTES =====

    pub async fn fetch_budget(&self, event: &Pubkey) -> Result<ProgramAccount<Budget>> {
        let (address, _) = self.pda.budget(event);
        self.fetch_one("budget", CacheKey::Budget(*event), address).await
    }

    pub async fn fetch_vote(&self, event: &Pubkey, voter: &Pubkey) -> Result<ProgramAccount<Vote>> {
        let (address, _) = self.pda.vote(event, voter);
        let key = CacheKey::Vote {
            event: *event,
            voter: *voter,
        };
        self.fetch_one("vote", key, address).await
    }

    /// Ballots cast on `event`, heaviest first
    pub async fn fetch_votes(&self, event: &Pubkey) -> Vec<ProgramAccount<Vote>> {
        self.fetch_all::<Vote, _>(
            "vote",
            CacheKey::Votes(*event),
            vec![MemcmpFilter::pubkey(layout::vote::EVENT, event)],
            |list| list.sort_by(|a, b| b.account.amount.cmp(&a.account.amount)),
        )
        .await
    }

    // ===== FUNDS =====

    pub async fn fetch_escrow(&self, event: &Pubkey) -> Result<ProgramAccount<Escrow>> {
        let (address, _) = self.pda.escrow(event);
        self.fetch_one("escrow", CacheKey::Escrow(*event), address).await
    }

    pub async fn fetch_profit_distribution(
        &self,
        event: &Pubkey,
    ) -> Result<ProgramAccount<ProfitDistribution>> {
        let (address, _) = self.pda.profit_distribution(event);
        self.fetch_one("profit distribution", CacheKey::ProfitDistribution(*event), address)
            .await
    }

    // ===== PLATFORM =====

    pub async fn fetch_platform_config(&self) -> Result<ProgramAccount<PlatformConfig>> {
        let (address, _) = self.pda.platform_config();
        self.fetch_one("platform config", CacheKey::PlatformConfig, address)
            .await
    }

    /// False when the config cannot be read
    pub async fn is_admin(&self, identity: &Pubkey) -> bool {
        match self.fetch_platform_config().await {
            Ok(config) => config.account.admin == *identity,
            Err(e) => {
                tracing::debug!("Admin check failed: {}", e);
                false
            }
        }
    }
}

fn sort_events_newest_first(events: &mut Vec<ProgramAccount<Event>>) {
    events.sort_by(|a, b| b.account.event_id.cmp(&a.account.event_id));
}
