//! Instruction builders for every write the program exposes.
//!
//! Data is `sha256("global:<name>")[..8]` followed by the Borsh-encoded
//! arguments. Account order matches the program's `Accounts` structs; SPL
//! accounts (mint, the two token accounts, token program) trail the fixed
//! accounts when the settlement currency is not native SOL.

use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use sha2::{Digest, Sha256};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::constants::{SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::error::{GatherFiError, Result};
use crate::pda::{associated_token_address, Pda};
use crate::token::{SettlementCurrency, TokenMints};

/// Anchor instruction discriminator
pub fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", name);
    let hash = Sha256::digest(preimage.as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

fn instruction_data<A: AnchorSerialize>(name: &str, args: &A) -> Result<Vec<u8>> {
    let mut data = sighash(name).to_vec();
    args.serialize(&mut data)
        .map_err(|e| GatherFiError::Transaction(format!("failed to encode {} args: {}", name, e)))?;
    Ok(data)
}

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct CreateEventArgs {
    pub event_id: u64,
    pub name: String,
    pub description: String,
    pub target_amount: u64,
    pub ticket_price: u64,
    pub max_tickets: u32,
    pub location: String,
    /// Unix seconds
    pub event_date: i64,
    pub accepted_tokens: Vec<SettlementCurrency>,
}

/// Fields left `None` are not touched
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Default, PartialEq)]
pub struct UpdateEventArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<i64>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct ContributeArgs {
    pub amount: u64,
    pub token_type: SettlementCurrency,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct VoteOnBudgetArgs {
    pub approve: bool,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct SubmitBudgetArgs {
    pub total_amount: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct AddMilestoneArgs {
    pub index: u8,
    pub description: String,
    pub amount: u64,
    pub due_date: i64,
    pub token_type: SettlementCurrency,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct ReleaseMilestoneArgs {
    pub index: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct PurchaseTicketArgs {
    pub token_type: SettlementCurrency,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct FinalizeEventArgs {
    pub total_revenue: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct UpdateTokenMintsArgs {
    pub usdc_mint: Option<Pubkey>,
    pub usdt_mint: Option<Pubkey>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq)]
pub struct WithdrawFeesArgs {
    pub amount: u64,
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Builds program instructions for a given deployment.
#[derive(Debug, Clone, Copy)]
pub struct InstructionBuilder {
    pda: Pda,
    mints: TokenMints,
}

impl InstructionBuilder {
    pub fn new(program_id: Pubkey, mints: TokenMints) -> Self {
        Self {
            pda: Pda::new(program_id),
            mints,
        }
    }

    pub fn pda(&self) -> &Pda {
        &self.pda
    }

    pub fn mints(&self) -> &TokenMints {
        &self.mints
    }

    fn instruction(&self, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Instruction {
        Instruction {
            program_id: *self.pda.program_id(),
            accounts,
            data,
        }
    }

    /// Mint, one token account per owner in `owners` order, token program.
    /// Empty for SOL.
    fn token_accounts(
        &self,
        currency: SettlementCurrency,
        owners: [&Pubkey; 2],
    ) -> Vec<AccountMeta> {
        let Some(mint) = self.mints.mint(currency) else {
            return Vec::new();
        };
        let mut metas = vec![AccountMeta::new_readonly(mint, false)];
        for owner in owners {
            metas.push(AccountMeta::new(associated_token_address(owner, &mint), false));
        }
        metas.push(AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false));
        metas
    }

    // ----- events -----

    pub fn create_event(&self, organizer: &Pubkey, args: &CreateEventArgs) -> Result<Instruction> {
        let (event, _) = self.pda.event(organizer, args.event_id);
        let (escrow, _) = self.pda.escrow(&event);
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(event, false),
            AccountMeta::new(escrow, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        Ok(self.instruction(accounts, instruction_data("create_event", args)?))
    }

    pub fn update_event(
        &self,
        organizer: &Pubkey,
        event: &Pubkey,
        args: &UpdateEventArgs,
    ) -> Result<Instruction> {
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
        ];
        Ok(self.instruction(accounts, instruction_data("update_event", args)?))
    }

    pub fn cancel_event(&self, organizer: &Pubkey, event: &Pubkey) -> Instruction {
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
        ];
        self.instruction(accounts, sighash("cancel_event").to_vec())
    }

    pub fn finalize_funding(&self, organizer: &Pubkey, event: &Pubkey) -> Instruction {
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        self.instruction(accounts, sighash("finalize_funding").to_vec())
    }

    /// Anyone may mark an event past its deadline as failed
    pub fn finalize_funding_failure(&self, caller: &Pubkey, event: &Pubkey) -> Instruction {
        let accounts = vec![
            AccountMeta::new(*caller, true),
            AccountMeta::new(*event, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        self.instruction(accounts, sighash("finalize_funding_failure").to_vec())
    }

    // ----- contributions -----

    pub fn contribute(
        &self,
        contributor: &Pubkey,
        event: &Pubkey,
        amount: u64,
        currency: SettlementCurrency,
    ) -> Result<Instruction> {
        let (escrow, _) = self.pda.escrow(event);
        let mut accounts = self.contributor_accounts(contributor, event, &escrow);
        accounts.extend(self.token_accounts(currency, [contributor, &escrow]));

        let args = ContributeArgs {
            amount,
            token_type: currency,
        };
        Ok(self.instruction(accounts, instruction_data("contribute", &args)?))
    }

    pub fn claim_refund(
        &self,
        contributor: &Pubkey,
        event: &Pubkey,
        currency: SettlementCurrency,
    ) -> Instruction {
        let (escrow, _) = self.pda.escrow(event);
        let mut accounts = self.contributor_accounts(contributor, event, &escrow);
        accounts.extend(self.token_accounts(currency, [contributor, &escrow]));
        self.instruction(accounts, sighash("claim_refund").to_vec())
    }

    fn contributor_accounts(
        &self,
        contributor: &Pubkey,
        event: &Pubkey,
        escrow: &Pubkey,
    ) -> Vec<AccountMeta> {
        let (contributor_account, _) = self.pda.contributor(event, contributor);
        let (platform_config, _) = self.pda.platform_config();
        vec![
            AccountMeta::new(*contributor, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(*escrow, false),
            AccountMeta::new(contributor_account, false),
            AccountMeta::new(platform_config, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ]
    }

    // ----- budget -----

    pub fn submit_budget(
        &self,
        organizer: &Pubkey,
        event: &Pubkey,
        total_amount: u64,
    ) -> Result<Instruction> {
        let (budget, _) = self.pda.budget(event);
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(budget, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        let args = SubmitBudgetArgs { total_amount };
        Ok(self.instruction(accounts, instruction_data("submit_budget", &args)?))
    }

    pub fn vote_on_budget(
        &self,
        voter: &Pubkey,
        event: &Pubkey,
        approve: bool,
    ) -> Result<Instruction> {
        let (budget, _) = self.pda.budget(event);
        let (contributor, _) = self.pda.contributor(event, voter);
        let (vote, _) = self.pda.vote(event, voter);
        let accounts = vec![
            AccountMeta::new(*voter, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(budget, false),
            AccountMeta::new_readonly(contributor, false),
            AccountMeta::new(vote, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        let args = VoteOnBudgetArgs { approve };
        Ok(self.instruction(accounts, instruction_data("vote_on_budget", &args)?))
    }

    // ----- milestones -----

    pub fn add_milestone(
        &self,
        organizer: &Pubkey,
        event: &Pubkey,
        args: &AddMilestoneArgs,
    ) -> Result<Instruction> {
        let (milestone, _) = self.pda.milestone(event, args.index);
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(milestone, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        Ok(self.instruction(accounts, instruction_data("add_milestone", args)?))
    }

    pub fn release_milestone(
        &self,
        organizer: &Pubkey,
        event: &Pubkey,
        index: u8,
        currency: SettlementCurrency,
    ) -> Result<Instruction> {
        let (escrow, _) = self.pda.escrow(event);
        let (milestone, _) = self.pda.milestone(event, index);
        let (platform_config, _) = self.pda.platform_config();
        let mut accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(escrow, false),
            AccountMeta::new(milestone, false),
            AccountMeta::new(platform_config, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        // funds leave the escrow, so its token account comes first
        accounts.extend(self.token_accounts(currency, [&escrow, organizer]));

        let args = ReleaseMilestoneArgs { index };
        Ok(self.instruction(accounts, instruction_data("release_milestone", &args)?))
    }

    // ----- tickets -----

    pub fn purchase_ticket(
        &self,
        buyer: &Pubkey,
        event: &Pubkey,
        ticket_number: u32,
        currency: SettlementCurrency,
    ) -> Result<Instruction> {
        let (escrow, _) = self.pda.escrow(event);
        let (ticket, _) = self.pda.ticket(event, ticket_number);
        let (platform_config, _) = self.pda.platform_config();
        let mut accounts = vec![
            AccountMeta::new(*buyer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(escrow, false),
            AccountMeta::new(ticket, false),
            AccountMeta::new(platform_config, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        accounts.extend(self.token_accounts(currency, [buyer, &escrow]));

        let args = PurchaseTicketArgs { token_type: currency };
        Ok(self.instruction(accounts, instruction_data("purchase_ticket", &args)?))
    }

    pub fn check_in_ticket(
        &self,
        organizer: &Pubkey,
        event: &Pubkey,
        ticket_number: u32,
    ) -> Instruction {
        let (ticket, _) = self.pda.ticket(event, ticket_number);
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new_readonly(*event, false),
            AccountMeta::new(ticket, false),
        ];
        self.instruction(accounts, sighash("check_in_ticket").to_vec())
    }

    // ----- profit -----

    pub fn finalize_event(
        &self,
        organizer: &Pubkey,
        event: &Pubkey,
        total_revenue: u64,
    ) -> Result<Instruction> {
        let (escrow, _) = self.pda.escrow(event);
        let (profit, _) = self.pda.profit_distribution(event);
        let (platform_config, _) = self.pda.platform_config();
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(escrow, false),
            AccountMeta::new(profit, false),
            AccountMeta::new(platform_config, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        let args = FinalizeEventArgs { total_revenue };
        Ok(self.instruction(accounts, instruction_data("finalize_event", &args)?))
    }

    pub fn claim_profit(
        &self,
        backer: &Pubkey,
        event: &Pubkey,
        currency: SettlementCurrency,
    ) -> Instruction {
        let (profit, _) = self.pda.profit_distribution(event);
        let (contributor_account, _) = self.pda.contributor(event, backer);
        let (escrow, _) = self.pda.escrow(event);
        let (platform_config, _) = self.pda.platform_config();
        let mut accounts = vec![
            AccountMeta::new(*backer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(profit, false),
            AccountMeta::new(contributor_account, false),
            AccountMeta::new(escrow, false),
            AccountMeta::new(platform_config, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        accounts.extend(self.token_accounts(currency, [backer, &escrow]));
        self.instruction(accounts, sighash("claim_profit").to_vec())
    }

    pub fn claim_organizer_profit(&self, organizer: &Pubkey, event: &Pubkey) -> Instruction {
        let (profit, _) = self.pda.profit_distribution(event);
        let (escrow, _) = self.pda.escrow(event);
        let (platform_config, _) = self.pda.platform_config();
        let accounts = vec![
            AccountMeta::new(*organizer, true),
            AccountMeta::new(*event, false),
            AccountMeta::new(profit, false),
            AccountMeta::new(escrow, false),
            AccountMeta::new(platform_config, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        self.instruction(accounts, sighash("claim_organizer_profit").to_vec())
    }

    // ----- platform admin -----

    /// Toggles the pause flag
    pub fn emergency_pause(&self, admin: &Pubkey) -> Instruction {
        let (platform_config, _) = self.pda.platform_config();
        let accounts = vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(platform_config, false),
        ];
        self.instruction(accounts, sighash("emergency_pause").to_vec())
    }

    pub fn update_token_mints(
        &self,
        admin: &Pubkey,
        usdc_mint: Option<Pubkey>,
        usdt_mint: Option<Pubkey>,
    ) -> Result<Instruction> {
        let (platform_config, _) = self.pda.platform_config();
        let accounts = vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(platform_config, false),
        ];
        let args = UpdateTokenMintsArgs { usdc_mint, usdt_mint };
        Ok(self.instruction(accounts, instruction_data("update_token_mints", &args)?))
    }

    pub fn withdraw_fees(
        &self,
        admin: &Pubkey,
        treasury: &Pubkey,
        amount: u64,
    ) -> Result<Instruction> {
        let (platform_config, _) = self.pda.platform_config();
        let accounts = vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(platform_config, false),
            AccountMeta::new(*treasury, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        let args = WithdrawFeesArgs { amount };
        Ok(self.instruction(accounts, instruction_data("withdraw_fees", &args)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Event;
    use anchor_lang::Discriminator;

    fn builder() -> InstructionBuilder {
        InstructionBuilder::new(crate::ID, TokenMints::default())
    }

    #[test]
    fn test_sighash_vectors() {
        assert_eq!(sighash("contribute"), [0x52, 0x21, 0x44, 0x83, 0x20, 0x00, 0xcd, 0x5f]);
        assert_eq!(sighash("create_event"), [0x31, 0xdb, 0x1d, 0xcb, 0x16, 0x62, 0x64, 0x57]);
        assert_eq!(sighash("emergency_pause"), [0x15, 0x8f, 0x1b, 0x8e, 0xc8, 0xb5, 0xd2, 0xff]);
    }

    #[test]
    fn test_account_discriminator_uses_same_hash() {
        let hash = Sha256::digest(b"account:Event");
        assert_eq!(Event::DISCRIMINATOR, &hash[..8]);
    }

    #[test]
    fn test_create_event_layout() {
        let organizer = Pubkey::new_unique();
        let args = CreateEventArgs {
            event_id: 1,
            name: "Hackathon".into(),
            description: "48h build".into(),
            target_amount: 5_000_000,
            ticket_price: 100,
            max_tickets: 200,
            location: "Nairobi".into(),
            event_date: 1_900_000_000,
            accepted_tokens: vec![SettlementCurrency::Usdc],
        };
        let ix = builder().create_event(&organizer, &args).unwrap();

        let (event, _) = builder().pda().event(&organizer, 1);
        assert_eq!(ix.program_id, crate::ID);
        assert_eq!(ix.accounts[0], AccountMeta::new(organizer, true));
        assert_eq!(ix.accounts[1].pubkey, event);
        assert_eq!(ix.accounts[2].pubkey, builder().pda().escrow(&event).0);
        assert_eq!(ix.accounts[3].pubkey, SYSTEM_PROGRAM_ID);

        assert_eq!(&ix.data[..8], &sighash("create_event"));
        let decoded = CreateEventArgs::try_from_slice(&ix.data[8..]).unwrap();
        assert_eq!(decoded, args);
    }

    #[test]
    fn test_sol_contribution_has_no_token_accounts() {
        let contributor = Pubkey::new_unique();
        let event = Pubkey::new_unique();
        let ix = builder()
            .contribute(&contributor, &event, 500, SettlementCurrency::Sol)
            .unwrap();

        assert_eq!(ix.accounts.len(), 6);
        assert!(ix.accounts.iter().all(|m| m.pubkey != TOKEN_PROGRAM_ID));
    }

    #[test]
    fn test_stablecoin_contribution_appends_token_accounts() {
        let b = builder();
        let contributor = Pubkey::new_unique();
        let event = Pubkey::new_unique();
        let ix = b.contribute(&contributor, &event, 500, SettlementCurrency::Usdc).unwrap();

        let mint = b.mints().usdc;
        let (escrow, _) = b.pda().escrow(&event);
        assert_eq!(ix.accounts.len(), 10);
        assert_eq!(ix.accounts[6], AccountMeta::new_readonly(mint, false));
        assert_eq!(ix.accounts[7].pubkey, associated_token_address(&contributor, &mint));
        assert_eq!(ix.accounts[8].pubkey, associated_token_address(&escrow, &mint));
        assert_eq!(ix.accounts[9], AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false));

        let args = ContributeArgs::try_from_slice(&ix.data[8..]).unwrap();
        assert_eq!(args.amount, 500);
        assert_eq!(args.token_type, SettlementCurrency::Usdc);
    }

    #[test]
    fn test_release_milestone_pays_out_of_escrow() {
        let b = builder();
        let organizer = Pubkey::new_unique();
        let event = Pubkey::new_unique();
        let ix = b
            .release_milestone(&organizer, &event, 2, SettlementCurrency::Usdt)
            .unwrap();

        let mint = b.mints().usdt;
        let (escrow, _) = b.pda().escrow(&event);
        assert_eq!(ix.accounts[3].pubkey, b.pda().milestone(&event, 2).0);
        assert_eq!(ix.accounts[7].pubkey, associated_token_address(&escrow, &mint));
        assert_eq!(ix.accounts[8].pubkey, associated_token_address(&organizer, &mint));
        assert_eq!(ix.data[8], 2);
    }

    #[test]
    fn test_purchase_ticket_targets_numbered_ticket() {
        let b = builder();
        let buyer = Pubkey::new_unique();
        let event = Pubkey::new_unique();
        let ix = b.purchase_ticket(&buyer, &event, 5, SettlementCurrency::Sol).unwrap();

        assert_eq!(ix.accounts[3].pubkey, b.pda().ticket(&event, 5).0);
        // SettlementCurrency::Sol is variant 0
        assert_eq!(&ix.data[8..], &[0u8]);
    }

    #[test]
    fn test_update_event_encodes_options() {
        let args = UpdateEventArgs {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        let ix = builder()
            .update_event(&Pubkey::new_unique(), &Pubkey::new_unique(), &args)
            .unwrap();
        assert_eq!(UpdateEventArgs::try_from_slice(&ix.data[8..]).unwrap(), args);
    }

    #[test]
    fn test_no_arg_instructions_are_bare_discriminators() {
        let admin = Pubkey::new_unique();
        let ix = builder().emergency_pause(&admin);
        assert_eq!(ix.data, sighash("emergency_pause").to_vec());
        assert_eq!(ix.accounts[1].pubkey, builder().pda().platform_config().0);
    }
}
