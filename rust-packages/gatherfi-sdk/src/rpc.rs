//! JSON-RPC backed account source and transaction submitter.

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::path::Path;
use std::sync::Arc;

use crate::cache::ReadCache;
use crate::client::AccountClient;
use crate::config::ClientConfig;
use crate::error::{GatherFiError, Result};
use crate::mutation::TransactionSubmitter;
use crate::source::{AccountSource, MemcmpFilter};

pub fn rpc_client(rpc_url: &str) -> Arc<RpcClient> {
    Arc::new(RpcClient::new_with_commitment(
        rpc_url.to_string(),
        CommitmentConfig::confirmed(),
    ))
}

pub struct RpcAccountSource {
    rpc: Arc<RpcClient>,
}

impl RpcAccountSource {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }
}

#[async_trait]
impl AccountSource for RpcAccountSource {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let filters = filters
            .iter()
            .map(|f| RpcFilterType::Memcmp(Memcmp::new_raw_bytes(f.offset, f.bytes.clone())))
            .collect();
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.rpc.commitment()),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(program_id, config)
            .await?;
        Ok(accounts
            .into_iter()
            .map(|(address, account)| (address, account.data))
            .collect())
    }
}

impl AccountClient<RpcAccountSource> {
    /// Client over a fresh RPC connection with its own read cache
    pub fn from_config(config: &ClientConfig) -> Self {
        let source = Arc::new(RpcAccountSource::new(rpc_client(&config.rpc_url)));
        AccountClient::new(
            source,
            Arc::new(ReadCache::new(config.cache)),
            config.program_id,
            config.retry,
        )
    }
}

/// Signs with a local keypair. Without one every write fails with
/// `WalletNotConnected` before touching the network.
pub struct RpcTransactionSubmitter {
    rpc: Arc<RpcClient>,
    payer: Option<Keypair>,
}

impl RpcTransactionSubmitter {
    pub fn new(rpc: Arc<RpcClient>, payer: Option<Keypair>) -> Self {
        Self { rpc, payer }
    }

    pub fn from_keypair_file(rpc: Arc<RpcClient>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let payer = read_keypair_file(path).map_err(|e| {
            GatherFiError::Config(format!("failed to read keypair {}: {}", path.display(), e))
        })?;
        Ok(Self::new(rpc, Some(payer)))
    }
}

#[async_trait]
impl TransactionSubmitter for RpcTransactionSubmitter {
    fn signer(&self) -> Option<Pubkey> {
        self.payer.as_ref().map(|kp| kp.pubkey())
    }

    async fn submit(&self, instruction: Instruction) -> Result<Signature> {
        let payer = self.payer.as_ref().ok_or(GatherFiError::WalletNotConnected)?;
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&payer.pubkey()),
            &[payer],
            blockhash,
        );
        tracing::debug!("Sending transaction with {} signature(s)", tx.signatures.len());
        self.rpc
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(transaction_error)
    }
}

/// Transport failures stay RPC errors; anything the node or program rejected
/// becomes a transaction failure carrying the raw message.
fn transaction_error(err: ClientError) -> GatherFiError {
    match err.kind() {
        ClientErrorKind::Reqwest(_) | ClientErrorKind::Io(_) => GatherFiError::from(err),
        _ => GatherFiError::Transaction(err.to_string()),
    }
}
