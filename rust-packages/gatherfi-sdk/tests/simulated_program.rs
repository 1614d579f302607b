//! End-to-end flows against an in-process stand-in for the on-chain program.
//!
//! `SimulatedProgram` serves reads like an RPC node (memcmp filters included)
//! and applies the handful of instructions these flows need.

use anchor_lang::{AccountDeserialize, AccountSerialize, AnchorDeserialize};
use async_trait::async_trait;
use gatherfi_sdk::instructions::{sighash, ContributeArgs, CreateEventArgs, PurchaseTicketArgs};
use gatherfi_sdk::layout;
use gatherfi_sdk::{
    AccountClient, AccountSource, CacheKey, Contributor, ErrorCategory, Escrow, Event, EventStatus,
    GatherFiError, MemcmpFilter, Mutations, Notifier, OptionalExt, Pda, PlatformConfig, ReadCache,
    Result, RetryPolicy, SettlementCurrency, Ticket, TokenMints, TransactionSubmitter,
};
use parking_lot::Mutex;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

// =============================================================================
// SIMULATED PROGRAM
// =============================================================================

struct SimulatedProgram {
    pda: Pda,
    signer: Mutex<Option<Pubkey>>,
    accounts: Mutex<BTreeMap<Pubkey, Vec<u8>>>,
    reads: Mutex<u32>,
    sequence: AtomicU8,
}

impl SimulatedProgram {
    fn new(admin: Pubkey) -> Arc<Self> {
        let program = Arc::new(Self {
            pda: Pda::new(gatherfi_sdk::ID),
            signer: Mutex::new(None),
            accounts: Mutex::new(BTreeMap::new()),
            reads: Mutex::new(0),
            sequence: AtomicU8::new(1),
        });
        let (config, bump) = program.pda.platform_config();
        let mints = TokenMints::default();
        program.store(
            config,
            &PlatformConfig {
                admin,
                treasury: Pubkey::new_unique(),
                fee_percentage: 2,
                royalty_percentage: 5,
                total_fees_collected: 0,
                total_volume: 0,
                paused: false,
                usdc_mint: mints.usdc,
                usdt_mint: mints.usdt,
                bump,
            },
        );
        program
    }

    fn connect(&self, wallet: Pubkey) {
        *self.signer.lock() = Some(wallet);
    }

    fn store<T: AccountSerialize>(&self, address: Pubkey, account: &T) {
        let mut data = Vec::new();
        account.try_serialize(&mut data).unwrap();
        self.accounts.lock().insert(address, data);
    }

    fn load<T: AccountDeserialize>(&self, address: &Pubkey) -> Option<T> {
        let accounts = self.accounts.lock();
        let data = accounts.get(address)?;
        T::try_deserialize(&mut data.as_slice()).ok()
    }

    fn read_count(&self) -> u32 {
        *self.reads.lock()
    }

    fn create_event(&self, ix: &Instruction, args: CreateEventArgs) {
        let organizer = ix.accounts[0].pubkey;
        let event_address = ix.accounts[1].pubkey;
        let escrow_address = ix.accounts[2].pubkey;
        let (_, event_bump) = self.pda.event(&organizer, args.event_id);
        let (_, escrow_bump) = self.pda.escrow(&event_address);

        self.store(
            event_address,
            &Event {
                organizer,
                event_id: args.event_id,
                name: args.name,
                description: args.description,
                target_amount: args.target_amount,
                amount_raised: 0,
                ticket_price: args.ticket_price,
                tickets_sold: 0,
                max_tickets: args.max_tickets,
                location: args.location,
                event_date: args.event_date,
                status: EventStatus::Funding,
                accepted_tokens: args.accepted_tokens,
                budget_approved: false,
                funding_deadline: args.event_date,
                total_votes: 0,
                yes_votes: 0,
                no_votes: 0,
                platform_fee_amount: 0,
                ticket_mint: None,
                escrow_bump,
                event_bump,
            },
        );
        self.store(
            escrow_address,
            &Escrow {
                event: event_address,
                sol_balance: 0,
                usdc_balance: 0,
                usdt_balance: 0,
                total_balance: 0,
                is_initialized: true,
                bump: escrow_bump,
            },
        );
    }

    fn contribute(&self, ix: &Instruction, args: ContributeArgs) -> Result<()> {
        let contributor = ix.accounts[0].pubkey;
        let event_address = ix.accounts[1].pubkey;
        let stake_address = ix.accounts[3].pubkey;

        let mut event: Event = self
            .load(&event_address)
            .ok_or(GatherFiError::NotFound(event_address))?;
        if !event.accepts(args.token_type) {
            return Err(GatherFiError::Transaction("custom program error: 0x1772".into()));
        }
        event.amount_raised += args.amount;
        self.store(event_address, &event);

        let mut stake = self.load::<Contributor>(&stake_address).unwrap_or(Contributor {
            event: event_address,
            contributor,
            amount: 0,
            voting_power: 0,
            token_type: args.token_type,
            profits_claimed: 0,
            refund_claimed: false,
            bump: self.pda.contributor(&event_address, &contributor).1,
        });
        stake.amount += args.amount;
        stake.voting_power += args.amount;
        self.store(stake_address, &stake);
        Ok(())
    }

    fn purchase_ticket(&self, ix: &Instruction, args: PurchaseTicketArgs) -> Result<()> {
        let buyer = ix.accounts[0].pubkey;
        let event_address = ix.accounts[1].pubkey;
        let ticket_address = ix.accounts[3].pubkey;

        let mut event: Event = self
            .load(&event_address)
            .ok_or(GatherFiError::NotFound(event_address))?;
        event.tickets_sold += 1;
        let ticket_number = event.tickets_sold;
        if self.pda.ticket(&event_address, ticket_number).0 != ticket_address {
            return Err(GatherFiError::Transaction("ConstraintSeeds: ticket".into()));
        }
        self.store(event_address, &event);
        self.store(
            ticket_address,
            &Ticket {
                mint: Pubkey::new_unique(),
                event: event_address,
                owner: buyer,
                ticket_number,
                checked_in: false,
                price_paid: event.ticket_price,
                token_type: args.token_type,
                refunded: false,
                bump: 0,
            },
        );
        Ok(())
    }

    fn emergency_pause(&self, ix: &Instruction) -> Result<()> {
        let admin = ix.accounts[0].pubkey;
        let address = ix.accounts[1].pubkey;
        let mut config: PlatformConfig =
            self.load(&address).ok_or(GatherFiError::NotFound(address))?;
        if config.admin != admin {
            return Err(GatherFiError::Transaction("custom program error: 0x1770".into()));
        }
        config.paused = !config.paused;
        self.store(address, &config);
        Ok(())
    }
}

#[async_trait]
impl AccountSource for SimulatedProgram {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        *self.reads.lock() += 1;
        Ok(self.accounts.lock().get(address).cloned())
    }

    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        *self.reads.lock() += 1;
        if program_id != self.pda.program_id() {
            return Ok(Vec::new());
        }
        Ok(self
            .accounts
            .lock()
            .iter()
            .filter(|(_, data)| filters.iter().all(|f| f.matches(data)))
            .map(|(address, data)| (*address, data.clone()))
            .collect())
    }
}

#[async_trait]
impl TransactionSubmitter for SimulatedProgram {
    fn signer(&self) -> Option<Pubkey> {
        *self.signer.lock()
    }

    async fn submit(&self, ix: Instruction) -> Result<Signature> {
        assert_eq!(ix.program_id, gatherfi_sdk::ID);
        let (disc, args) = ix.data.split_at(8);

        if disc == sighash("create_event") {
            self.create_event(&ix, CreateEventArgs::try_from_slice(args).unwrap());
        } else if disc == sighash("contribute") {
            self.contribute(&ix, ContributeArgs::try_from_slice(args).unwrap())?;
        } else if disc == sighash("purchase_ticket") {
            self.purchase_ticket(&ix, PurchaseTicketArgs::try_from_slice(args).unwrap())?;
        } else if disc == sighash("emergency_pause") {
            self.emergency_pause(&ix)?;
        } else {
            return Err(GatherFiError::Transaction("unsupported instruction".into()));
        }

        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        Ok(Signature::from([n; 64]))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<(ErrorCategory, String)>>,
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().push(message.to_string());
    }

    fn error(&self, category: ErrorCategory, message: &str) {
        self.errors.lock().push((category, message.to_string()));
    }
}

// =============================================================================
// HELPERS
// =============================================================================

type SimMutations = Mutations<SimulatedProgram, SimulatedProgram, RecordingNotifier>;

struct Harness {
    program: Arc<SimulatedProgram>,
    mutations: SimMutations,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new(admin: Pubkey) -> Self {
        let program = SimulatedProgram::new(admin);
        let client = AccountClient::new(
            program.clone(),
            Arc::new(ReadCache::default()),
            gatherfi_sdk::ID,
            RetryPolicy::default(),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let mints = TokenMints::default();
        let mutations = Mutations::new(client, program.clone(), notifier.clone(), mints);
        Self {
            program,
            mutations,
            notifier,
        }
    }

    fn client(&self) -> &AccountClient<SimulatedProgram> {
        self.mutations.client()
    }
}

fn event_args(event_id: u64, accepted: Vec<SettlementCurrency>) -> CreateEventArgs {
    CreateEventArgs {
        event_id,
        name: format!("Community Meetup #{}", event_id),
        description: "Monthly builders meetup".to_string(),
        target_amount: 10_000_000,
        ticket_price: 2_000_000,
        max_tickets: 100,
        location: "Accra".to_string(),
        event_date: 1_900_000_000,
        accepted_tokens: accepted,
    }
}

// =============================================================================
// FLOWS
// =============================================================================

#[tokio::test]
async fn test_created_event_is_listed_for_its_organizer_only() {
    let h = Harness::new(Pubkey::new_unique());
    let alice = Pubkey::new_unique();
    let bob = Pubkey::new_unique();

    h.program.connect(alice);
    let (_, event_address) = h
        .mutations
        .create_event(&event_args(1, vec![SettlementCurrency::Sol]))
        .await
        .unwrap();

    h.program.connect(bob);
    h.mutations
        .create_event(&event_args(2, vec![SettlementCurrency::Sol]))
        .await
        .unwrap();

    let alice_events = h.client().fetch_events_by_organizer(&alice).await;
    assert_eq!(alice_events.len(), 1);
    assert_eq!(alice_events[0].account.event_id, 1);
    assert_eq!(alice_events[0].address, event_address);
    assert_eq!(event_address, Pda::new(gatherfi_sdk::ID).event(&alice, 1).0);

    // escrow is not an Event even though it shares the program
    let all = h.client().fetch_all_events().await;
    let ids: Vec<u64> = all.iter().map(|e| e.account.event_id).collect();
    assert_eq!(ids, vec![2, 1]);

    assert_eq!(h.notifier.successes.lock().len(), 2);
}

#[tokio::test]
async fn test_pause_invalidates_cached_platform_config() {
    let admin = Pubkey::new_unique();
    let h = Harness::new(admin);
    h.program.connect(admin);

    let before = h.client().fetch_platform_config().await.unwrap();
    assert!(!before.account.paused);
    assert!(h.client().cache().contains(&CacheKey::PlatformConfig));
    assert!(h.client().is_admin(&admin).await);

    h.mutations.emergency_pause().await.unwrap();
    assert!(!h.client().cache().contains(&CacheKey::PlatformConfig));

    let after = h.client().fetch_platform_config().await.unwrap();
    assert!(after.account.paused);
    assert_eq!(
        *h.notifier.successes.lock(),
        vec!["Platform pause toggled successfully".to_string()]
    );
}

#[tokio::test]
async fn test_non_admin_pause_leaves_cache_alone() {
    let admin = Pubkey::new_unique();
    let h = Harness::new(admin);
    h.program.connect(Pubkey::new_unique());

    h.client().fetch_platform_config().await.unwrap();
    assert!(h.mutations.emergency_pause().await.is_err());

    assert!(h.client().cache().contains(&CacheKey::PlatformConfig));
    let errors = h.notifier.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorCategory::Generic);
}

#[tokio::test]
async fn test_stablecoin_contributions_accumulate_exactly() {
    let h = Harness::new(Pubkey::new_unique());
    let organizer = Pubkey::new_unique();
    let backer = Pubkey::new_unique();

    h.program.connect(organizer);
    let (_, event) = h
        .mutations
        .create_event(&event_args(1, vec![SettlementCurrency::Usdc]))
        .await
        .unwrap();

    h.program.connect(backer);
    h.mutations.contribute(&event, 500, SettlementCurrency::Usdc).await.unwrap();
    h.mutations.contribute(&event, 300, SettlementCurrency::Usdc).await.unwrap();

    let stake = h.client().fetch_contributor(&event, &backer).await.unwrap();
    assert_eq!(stake.account.amount, 800);
    assert_eq!(stake.account.contributed().to_string(), "0.0008");

    let raised = h.client().fetch_event(&event).await.unwrap();
    assert_eq!(raised.account.raised().raw, 800);

    let mine = h.client().fetch_contributions_by(&backer).await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].account.event, event);
}

#[tokio::test]
async fn test_absent_contributor_is_none_not_error() {
    let h = Harness::new(Pubkey::new_unique());
    let stake = h
        .client()
        .fetch_contributor(&Pubkey::new_unique(), &Pubkey::new_unique())
        .await
        .optional()
        .unwrap();
    assert!(stake.is_none());
}

#[tokio::test]
async fn test_ticket_numbers_follow_sales() {
    let h = Harness::new(Pubkey::new_unique());
    let organizer = Pubkey::new_unique();
    let buyer = Pubkey::new_unique();

    h.program.connect(organizer);
    let (_, event) = h
        .mutations
        .create_event(&event_args(7, vec![SettlementCurrency::Sol]))
        .await
        .unwrap();

    // prime the cache with tickets_sold = 0
    h.client().fetch_event(&event).await.unwrap();

    h.program.connect(buyer);
    let (_, first) = h.mutations.purchase_ticket(&event, SettlementCurrency::Sol).await.unwrap();
    let (_, second) = h.mutations.purchase_ticket(&event, SettlementCurrency::Sol).await.unwrap();
    assert_eq!((first, second), (1, 2));

    let numbers: Vec<u32> = h
        .client()
        .fetch_tickets_by_event(&event)
        .await
        .iter()
        .map(|t| t.account.ticket_number)
        .collect();
    assert_eq!(numbers, vec![1, 2]);

    let owned = h.client().fetch_tickets_by_owner(&buyer).await;
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().all(|t| t.account.owner == buyer));
    assert_eq!(
        h.notifier.successes.lock().last().cloned(),
        Some("Ticket #2 purchased successfully!".to_string())
    );
}

#[tokio::test]
async fn test_ticket_in_unaccepted_currency_is_refused_client_side() {
    let h = Harness::new(Pubkey::new_unique());
    h.program.connect(Pubkey::new_unique());
    let (_, event) = h
        .mutations
        .create_event(&event_args(3, vec![SettlementCurrency::Sol]))
        .await
        .unwrap();

    let err = h
        .mutations
        .purchase_ticket(&event, SettlementCurrency::Usdt)
        .await
        .unwrap_err();
    assert!(matches!(err, GatherFiError::UnsupportedCurrency(SettlementCurrency::Usdt)));
    assert!(h.client().fetch_tickets_by_event(&event).await.is_empty());
}

#[tokio::test]
async fn test_repeat_reads_hit_cache() {
    let admin = Pubkey::new_unique();
    let h = Harness::new(admin);

    h.client().fetch_platform_config().await.unwrap();
    h.client().fetch_all_events().await;
    let reads = h.program.read_count();

    h.client().fetch_platform_config().await.unwrap();
    h.client().fetch_all_events().await;
    assert_eq!(h.program.read_count(), reads);
}

#[tokio::test]
async fn test_filter_offsets_line_up_with_serialized_accounts() {
    let h = Harness::new(Pubkey::new_unique());
    let organizer = Pubkey::new_unique();
    let backer = Pubkey::new_unique();

    h.program.connect(organizer);
    let (_, event) = h
        .mutations
        .create_event(&event_args(9, vec![SettlementCurrency::Sol]))
        .await
        .unwrap();
    h.program.connect(backer);
    h.mutations.contribute(&event, 1, SettlementCurrency::Sol).await.unwrap();

    let (stake_address, _) = Pda::new(gatherfi_sdk::ID).contributor(&event, &backer);
    let data = h.program.accounts.lock().get(&stake_address).cloned().unwrap();
    assert!(MemcmpFilter::pubkey(layout::contributor::EVENT, &event).matches(&data));
    assert!(MemcmpFilter::pubkey(layout::contributor::CONTRIBUTOR, &backer).matches(&data));
    assert!(!MemcmpFilter::pubkey(layout::contributor::EVENT, &backer).matches(&data));
}
