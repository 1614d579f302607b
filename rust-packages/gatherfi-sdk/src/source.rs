//! Raw account reads: the seam between the account client and the network.

use async_trait::async_trait;
use parking_lot::RwLock;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;

use crate::error::Result;

/// Exact byte match at a fixed offset of an account's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    /// Match a 32-byte identity at `offset`
    pub fn pubkey(offset: usize, key: &Pubkey) -> Self {
        Self::new(offset, key.to_bytes().to_vec())
    }

    /// Same comparison the RPC node performs
    pub fn matches(&self, data: &[u8]) -> bool {
        let Some(end) = self.offset.checked_add(self.bytes.len()) else {
            return false;
        };
        data.get(self.offset..end)
            .map(|window| window == self.bytes.as_slice())
            .unwrap_or(false)
    }
}

/// Read access to program-owned accounts.
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Data of one account, `None` if nothing lives at `address`
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// All accounts owned by `program_id` whose data passes every filter
    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>>;
}

/// In-process account store, useful for local simulation and tests.
#[derive(Debug, Default)]
pub struct MemoryAccountSource {
    accounts: RwLock<BTreeMap<Pubkey, (Pubkey, Vec<u8>)>>,
}

impl MemoryAccountSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `address`, owned by `owner`
    pub fn insert(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.accounts.write().insert(address, (owner, data));
    }

    pub fn remove(&self, address: &Pubkey) -> Option<Vec<u8>> {
        self.accounts.write().remove(address).map(|(_, data)| data)
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[async_trait]
impl AccountSource for MemoryAccountSource {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self.accounts.read().get(address).map(|(_, data)| data.clone()))
    }

    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        Ok(self
            .accounts
            .read()
            .iter()
            .filter(|(_, (owner, data))| {
                owner == program_id && filters.iter().all(|f| f.matches(data))
            })
            .map(|(address, (_, data))| (*address, data.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memcmp_matches_window() {
        let key = Pubkey::new_unique();
        let mut data = vec![0u8; 8];
        data.extend_from_slice(key.as_ref());

        assert!(MemcmpFilter::pubkey(8, &key).matches(&data));
        assert!(!MemcmpFilter::pubkey(0, &key).matches(&data));
        // window past the end never matches
        assert!(!MemcmpFilter::pubkey(16, &key).matches(&data));
        // an offset near usize::MAX cannot wrap around to the start
        assert!(!MemcmpFilter::pubkey(usize::MAX - 8, &key).matches(&data));
        assert!(!MemcmpFilter::new(usize::MAX, vec![0u8]).matches(&data));
    }

    #[tokio::test]
    async fn test_memory_source_scopes_by_owner() {
        let source = MemoryAccountSource::new();
        let program = Pubkey::new_unique();
        let stranger = Pubkey::new_unique();

        source.insert(Pubkey::new_unique(), program, vec![1, 2, 3]);
        source.insert(Pubkey::new_unique(), stranger, vec![1, 2, 3]);

        let found = source.program_accounts(&program, &[]).await.unwrap();
        assert_eq!(found.len(), 1);

        let filtered = source
            .program_accounts(&program, &[MemcmpFilter::new(1, vec![9])])
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }
}
