//! Serialized account layout schema.
//!
//! Byte offsets of the fixed-position fields used for `memcmp` filtering.
//! Each account starts with an 8-byte discriminator followed by Borsh fields,
//! so only fields ahead of the first variable-length field have stable
//! offsets. Bump `LAYOUT_VERSION` whenever the program's layouts change.

pub const LAYOUT_VERSION: u8 = 1;

pub const DISCRIMINATOR_LEN: usize = 8;
pub const PUBKEY_LEN: usize = 32;

/// Event: organizer | event_id | name ...
pub mod event {
    use super::*;

    pub const ORGANIZER: usize = DISCRIMINATOR_LEN;
}

/// Contributor: event | contributor | amount ...
pub mod contributor {
    use super::*;

    pub const EVENT: usize = DISCRIMINATOR_LEN;
    pub const CONTRIBUTOR: usize = EVENT + PUBKEY_LEN;
}

/// Ticket: mint | event | owner | ticket_number ...
pub mod ticket {
    use super::*;

    pub const MINT: usize = DISCRIMINATOR_LEN;
    pub const EVENT: usize = MINT + PUBKEY_LEN;
    pub const OWNER: usize = EVENT + PUBKEY_LEN;
}

/// Milestone: event | index ...
pub mod milestone {
    use super::*;

    pub const EVENT: usize = DISCRIMINATOR_LEN;
}

/// Vote: event | voter ...
pub mod vote {
    use super::*;

    pub const EVENT: usize = DISCRIMINATOR_LEN;
}
