//! Program-derived addresses.
//!
//! Every address the client touches is derived here and nowhere else. Numeric
//! seeds use one fixed-width little-endian encoding:
//!
//! | seed            | type | bytes |
//! |-----------------|------|-------|
//! | event id        | u64  | 8     |
//! | ticket number   | u32  | 4     |
//! | milestone index | u8   | 1     |

use solana_sdk::pubkey::Pubkey;

use crate::constants::{
    ASSOCIATED_TOKEN_PROGRAM_ID, BUDGET_SEED, CONTRIBUTOR_SEED, ESCROW_SEED, EVENT_SEED,
    MILESTONE_SEED, PLATFORM_SEED, PROFIT_SEED, TICKET_SEED, TOKEN_PROGRAM_ID, VOTE_SEED,
};
use crate::error::{GatherFiError, Result};

/// Event id seed bytes
pub fn event_id_seed(event_id: u64) -> [u8; 8] {
    event_id.to_le_bytes()
}

/// Ticket number seed bytes
pub fn ticket_number_seed(ticket_number: u32) -> [u8; 4] {
    ticket_number.to_le_bytes()
}

/// Milestone index seed bytes
pub fn milestone_index_seed(index: u8) -> [u8; 1] {
    index.to_le_bytes()
}

/// Narrow a caller-supplied ticket number to its seed width
pub fn checked_ticket_number(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| GatherFiError::IdOutOfRange {
        field: "ticket number",
        value,
        width: 4,
    })
}

/// Narrow a caller-supplied milestone index to its seed width
pub fn checked_milestone_index(value: u64) -> Result<u8> {
    u8::try_from(value).map_err(|_| GatherFiError::IdOutOfRange {
        field: "milestone index",
        value,
        width: 1,
    })
}

/// PDA finder bound to one program id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pda {
    program_id: Pubkey,
}

impl Pda {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    fn find(&self, seeds: &[&[u8]]) -> (Pubkey, u8) {
        Pubkey::find_program_address(seeds, &self.program_id)
    }

    /// Derive platform config PDA (singleton)
    pub fn platform_config(&self) -> (Pubkey, u8) {
        self.find(&[PLATFORM_SEED])
    }

    /// Derive event PDA from organizer and sequential id
    pub fn event(&self, organizer: &Pubkey, event_id: u64) -> (Pubkey, u8) {
        self.find(&[EVENT_SEED, organizer.as_ref(), &event_id_seed(event_id)])
    }

    /// Derive escrow PDA
    pub fn escrow(&self, event: &Pubkey) -> (Pubkey, u8) {
        self.find(&[ESCROW_SEED, event.as_ref()])
    }

    /// Derive contributor PDA
    pub fn contributor(&self, event: &Pubkey, contributor: &Pubkey) -> (Pubkey, u8) {
        self.find(&[CONTRIBUTOR_SEED, event.as_ref(), contributor.as_ref()])
    }

    /// Derive ticket PDA
    pub fn ticket(&self, event: &Pubkey, ticket_number: u32) -> (Pubkey, u8) {
        self.find(&[TICKET_SEED, event.as_ref(), &ticket_number_seed(ticket_number)])
    }

    /// Derive budget PDA
    pub fn budget(&self, event: &Pubkey) -> (Pubkey, u8) {
        self.find(&[BUDGET_SEED, event.as_ref()])
    }

    /// Derive milestone PDA
    pub fn milestone(&self, event: &Pubkey, index: u8) -> (Pubkey, u8) {
        self.find(&[MILESTONE_SEED, event.as_ref(), &milestone_index_seed(index)])
    }

    /// Derive vote PDA
    pub fn vote(&self, event: &Pubkey, voter: &Pubkey) -> (Pubkey, u8) {
        self.find(&[VOTE_SEED, event.as_ref(), voter.as_ref()])
    }

    /// Derive profit distribution PDA
    pub fn profit_distribution(&self, event: &Pubkey) -> (Pubkey, u8) {
        self.find(&[PROFIT_SEED, event.as_ref()])
    }
}

/// Associated token account of `owner` for `mint` under the classic token program.
///
/// Owners may themselves be PDAs (the escrow holds stablecoins this way).
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEVNET_USDC_MINT;

    #[test]
    fn test_event_id_seed_vectors() {
        assert_eq!(event_id_seed(1), [0x01, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(event_id_seed(0), [0u8; 8]);
        assert_eq!(event_id_seed(256), [0x00, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(event_id_seed(u64::MAX), [0xff; 8]);
        assert_eq!(ticket_number_seed(1), [0x01, 0, 0, 0]);
        assert_eq!(milestone_index_seed(3), [0x03]);
    }

    #[test]
    fn test_id_not_ascii_encoded() {
        // "1" as text would be [0x31]
        assert_ne!(event_id_seed(1).as_slice(), b"1".as_slice());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let pda = Pda::new(crate::ID);
        let organizer = Pubkey::new_unique();

        let first = pda.event(&organizer, 7);
        let second = pda.event(&organizer, 7);
        assert_eq!(first, second);

        let (event, _) = first;
        assert_eq!(pda.escrow(&event), pda.escrow(&event));
        assert_eq!(pda.milestone(&event, 2), pda.milestone(&event, 2));
        assert_eq!(pda.ticket(&event, 9), pda.ticket(&event, 9));
    }

    #[test]
    fn test_event_matches_manual_seeds() {
        let pda = Pda::new(crate::ID);
        let organizer = Pubkey::new_unique();
        let expected = Pubkey::find_program_address(
            &[b"event", organizer.as_ref(), &[1, 0, 0, 0, 0, 0, 0, 0]],
            &crate::ID,
        );
        assert_eq!(pda.event(&organizer, 1), expected);
    }

    #[test]
    fn test_distinct_keys_give_distinct_addresses() {
        let pda = Pda::new(crate::ID);
        let organizer = Pubkey::new_unique();
        let (a, _) = pda.event(&organizer, 1);
        let (b, _) = pda.event(&organizer, 2);
        assert_ne!(a, b);

        let user = Pubkey::new_unique();
        assert_ne!(pda.contributor(&a, &user).0, pda.vote(&a, &user).0);
        assert_ne!(pda.budget(&a).0, pda.profit_distribution(&a).0);
    }

    #[test]
    fn test_program_id_scopes_addresses() {
        let organizer = Pubkey::new_unique();
        let ours = Pda::new(crate::ID).event(&organizer, 1);
        let other = Pda::new(Pubkey::new_unique()).event(&organizer, 1);
        assert_ne!(ours.0, other.0);
    }

    #[test]
    fn test_checked_narrowing() {
        assert_eq!(checked_ticket_number(42).unwrap(), 42);
        assert!(checked_ticket_number(u32::MAX as u64 + 1).is_err());
        assert_eq!(checked_milestone_index(255).unwrap(), 255);
        assert!(matches!(
            checked_milestone_index(256),
            Err(GatherFiError::IdOutOfRange { width: 1, .. })
        ));
    }

    #[test]
    fn test_associated_token_address() {
        let owner = Pubkey::new_unique();
        let ata = associated_token_address(&owner, &DEVNET_USDC_MINT);
        assert_eq!(ata, associated_token_address(&owner, &DEVNET_USDC_MINT));
        assert_ne!(ata, associated_token_address(&owner, &crate::constants::DEVNET_USDT_MINT));
    }
}
