//! Write path: build, submit, then refresh reads and notify.
//!
//! Every mutation is a single transaction. On confirmation the shared read
//! cache is cleared and one success notification goes out. On failure the
//! error is classified, one error notification goes out, the cache is left
//! alone and the error is returned. Submissions are never retried.

use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::future::Future;
use std::sync::Arc;

use crate::client::AccountClient;
use crate::error::{ErrorCategory, GatherFiError, Result};
use crate::instructions::{AddMilestoneArgs, CreateEventArgs, InstructionBuilder, UpdateEventArgs};
use crate::notify::Notifier;
use crate::source::AccountSource;
use crate::token::{SettlementCurrency, TokenMints};

/// Signs and lands transactions on behalf of the connected wallet.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Connected wallet, `None` when no wallet is available
    fn signer(&self) -> Option<Pubkey>;

    /// Sign, send and wait for confirmation of a single-instruction transaction
    async fn submit(&self, instruction: Instruction) -> Result<Signature>;
}

pub struct Mutations<S, T, N> {
    client: AccountClient<S>,
    submitter: Arc<T>,
    notifier: Arc<N>,
    builder: InstructionBuilder,
}

impl<S, T, N> Mutations<S, T, N>
where
    S: AccountSource,
    T: TransactionSubmitter,
    N: Notifier,
{
    pub fn new(
        client: AccountClient<S>,
        submitter: Arc<T>,
        notifier: Arc<N>,
        mints: TokenMints,
    ) -> Self {
        let builder = InstructionBuilder::new(*client.program_id(), mints);
        Self {
            client,
            submitter,
            notifier,
            builder,
        }
    }

    pub fn client(&self) -> &AccountClient<S> {
        &self.client
    }

    pub fn builder(&self) -> &InstructionBuilder {
        &self.builder
    }

    fn wallet(&self) -> Result<Pubkey> {
        self.submitter.signer().ok_or(GatherFiError::WalletNotConnected)
    }

    /// Drive one mutation to completion and report its outcome exactly once.
    /// `body` yields the value to return plus the success message.
    async fn run<R, F>(&self, fallback: &str, body: F) -> Result<R>
    where
        F: Future<Output = Result<(R, String)>>,
    {
        match body.await {
            Ok((value, message)) => {
                self.client.cache().clear();
                self.notifier.success(&message);
                Ok(value)
            }
            Err(err) => {
                let category = ErrorCategory::classify(&err);
                tracing::error!("{}: {}", fallback, err);
                self.notifier.error(category, &category.user_message(&err, fallback));
                Err(err)
            }
        }
    }

    async fn submit(&self, instruction: Instruction) -> Result<Signature> {
        let signature = self.submitter.submit(instruction).await?;
        tracing::info!("Transaction confirmed: {}", signature);
        Ok(signature)
    }

    // ===== EVENTS =====

    /// Returns the signature and the new event's address
    pub async fn create_event(&self, args: &CreateEventArgs) -> Result<(Signature, Pubkey)> {
        self.run("Failed to create event", async {
            let organizer = self.wallet()?;
            let (event, _) = self.builder.pda().event(&organizer, args.event_id);
            let signature = self.submit(self.builder.create_event(&organizer, args)?).await?;
            Ok::<_, GatherFiError>(((signature, event), "Event created successfully!".to_string()))
        })
        .await
    }

    pub async fn update_event(&self, event: &Pubkey, args: &UpdateEventArgs) -> Result<Signature> {
        self.run("Failed to update event", async {
            let organizer = self.wallet()?;
            let signature = self.submit(self.builder.update_event(&organizer, event, args)?).await?;
            Ok::<_, GatherFiError>((signature, "Event updated successfully!".to_string()))
        })
        .await
    }

    pub async fn cancel_event(&self, event: &Pubkey) -> Result<Signature> {
        self.run("Failed to cancel event", async {
            let organizer = self.wallet()?;
            let signature = self.submit(self.builder.cancel_event(&organizer, event)).await?;
            Ok::<_, GatherFiError>((signature, "Event cancelled".to_string()))
        })
        .await
    }

    pub async fn finalize_funding(&self, event: &Pubkey) -> Result<Signature> {
        self.run("Failed to finalize funding", async {
            let organizer = self.wallet()?;
            let signature = self.submit(self.builder.finalize_funding(&organizer, event)).await?;
            Ok::<_, GatherFiError>((signature, "Funding finalized!".to_string()))
        })
        .await
    }

    pub async fn finalize_funding_failure(&self, event: &Pubkey) -> Result<Signature> {
        self.run("Failed to mark funding as failed", async {
            let caller = self.wallet()?;
            let signature = self
                .submit(self.builder.finalize_funding_failure(&caller, event))
                .await?;
            let message = "Event marked as failed, refunds are open".to_string();
            Ok::<_, GatherFiError>((signature, message))
        })
        .await
    }

    // ===== CONTRIBUTIONS =====

    pub async fn contribute(
        &self,
        event: &Pubkey,
        amount: u64,
        currency: SettlementCurrency,
    ) -> Result<Signature> {
        self.run("Failed to contribute", async {
            let contributor = self.wallet()?;
            let ix = self.builder.contribute(&contributor, event, amount, currency)?;
            let signature = self.submit(ix).await?;
            Ok::<_, GatherFiError>((signature, "Contributed successfully!".to_string()))
        })
        .await
    }

    pub async fn claim_refund(
        &self,
        event: &Pubkey,
        currency: SettlementCurrency,
    ) -> Result<Signature> {
        self.run("Failed to claim refund", async {
            let contributor = self.wallet()?;
            let signature = self
                .submit(self.builder.claim_refund(&contributor, event, currency))
                .await?;
            Ok::<_, GatherFiError>((signature, "Refund claimed successfully!".to_string()))
        })
        .await
    }

    // ===== BUDGET =====

    pub async fn submit_budget(&self, event: &Pubkey, total_amount: u64) -> Result<Signature> {
        self.run("Failed to submit budget", async {
            let organizer = self.wallet()?;
            let ix = self.builder.submit_budget(&organizer, event, total_amount)?;
            let signature = self.submit(ix).await?;
            Ok::<_, GatherFiError>((signature, "Budget submitted successfully!".to_string()))
        })
        .await
    }

    pub async fn vote_on_budget(&self, event: &Pubkey, approve: bool) -> Result<Signature> {
        self.run("Failed to vote", async {
            let voter = self.wallet()?;
            let ix = self.builder.vote_on_budget(&voter, event, approve)?;
            let signature = self.submit(ix).await?;
            let ballot = if approve { "YES" } else { "NO" };
            Ok::<_, GatherFiError>((signature, format!("Voted {} on budget!", ballot)))
        })
        .await
    }

    // ===== MILESTONES =====

    pub async fn add_milestone(
        &self,
        event: &Pubkey,
        args: &AddMilestoneArgs,
    ) -> Result<Signature> {
        self.run("Failed to add milestone", async {
            let organizer = self.wallet()?;
            let ix = self.builder.add_milestone(&organizer, event, args)?;
            let signature = self.submit(ix).await?;
            Ok::<_, GatherFiError>((signature, "Milestone added successfully!".to_string()))
        })
        .await
    }

    pub async fn release_milestone(
        &self,
        event: &Pubkey,
        index: u8,
        currency: SettlementCurrency,
    ) -> Result<Signature> {
        self.run("Failed to release milestone", async {
            let organizer = self.wallet()?;
            let ix = self.builder.release_milestone(&organizer, event, index, currency)?;
            let signature = self.submit(ix).await?;
            Ok::<_, GatherFiError>((signature, "Milestone released successfully!".to_string()))
        })
        .await
    }

    // ===== TICKETS =====

    /// Buys the next ticket (`tickets_sold + 1`, read fresh). Returns the
    /// signature and the ticket number.
    pub async fn purchase_ticket(
        &self,
        event: &Pubkey,
        currency: SettlementCurrency,
    ) -> Result<(Signature, u32)> {
        self.run("Failed to purchase ticket", async {
            let buyer = self.wallet()?;
            let current = self.client.read_event_uncached(event).await?;
            if !current.account.accepts(currency) {
                return Err(GatherFiError::UnsupportedCurrency(currency));
            }
            let ticket_number = current.account.next_ticket_number();

            let ix = self.builder.purchase_ticket(&buyer, event, ticket_number, currency)?;
            let signature = self.submit(ix).await?;
            Ok::<_, GatherFiError>((
                (signature, ticket_number),
                format!("Ticket #{} purchased successfully!", ticket_number),
            ))
        })
        .await
    }

    pub async fn check_in_ticket(&self, event: &Pubkey, ticket_number: u32) -> Result<Signature> {
        self.run("Failed to check in ticket", async {
            let organizer = self.wallet()?;
            let signature = self
                .submit(self.builder.check_in_ticket(&organizer, event, ticket_number))
                .await?;
            let message = format!("Ticket #{} checked in successfully!", ticket_number);
            Ok::<_, GatherFiError>((signature, message))
        })
        .await
    }

    // ===== PROFIT =====

    pub async fn finalize_event(&self, event: &Pubkey, total_revenue: u64) -> Result<Signature> {
        self.run("Failed to finalize event", async {
            let organizer = self.wallet()?;
            let signature = self
                .submit(self.builder.finalize_event(&organizer, event, total_revenue)?)
                .await?;
            Ok::<_, GatherFiError>((signature, "Event finalized! Profits calculated.".to_string()))
        })
        .await
    }

    pub async fn claim_profit(
        &self,
        event: &Pubkey,
        currency: SettlementCurrency,
    ) -> Result<Signature> {
        self.run("Failed to claim profit", async {
            let backer = self.wallet()?;
            let signature = self.submit(self.builder.claim_profit(&backer, event, currency)).await?;
            Ok::<_, GatherFiError>((signature, "Profit claimed successfully!".to_string()))
        })
        .await
    }

    pub async fn claim_organizer_profit(&self, event: &Pubkey) -> Result<Signature> {
        self.run("Failed to claim organizer profit", async {
            let organizer = self.wallet()?;
            let signature = self
                .submit(self.builder.claim_organizer_profit(&organizer, event))
                .await?;
            let message = "Organizer profit claimed successfully!".to_string();
            Ok::<_, GatherFiError>((signature, message))
        })
        .await
    }

    // ===== PLATFORM =====

    /// Toggles the platform pause flag
    pub async fn emergency_pause(&self) -> Result<Signature> {
        self.run("Failed to toggle pause", async {
            let admin = self.wallet()?;
            let signature = self.submit(self.builder.emergency_pause(&admin)).await?;
            Ok::<_, GatherFiError>((signature, "Platform pause toggled successfully".to_string()))
        })
        .await
    }

    pub async fn update_token_mints(
        &self,
        usdc: Option<Pubkey>,
        usdt: Option<Pubkey>,
    ) -> Result<Signature> {
        self.run("Failed to update token mints", async {
            let admin = self.wallet()?;
            let signature = self
                .submit(self.builder.update_token_mints(&admin, usdc, usdt)?)
                .await?;
            Ok::<_, GatherFiError>((signature, "Token mints updated successfully".to_string()))
        })
        .await
    }

    /// Sends `amount` lamports of collected fees to the configured treasury
    pub async fn withdraw_fees(&self, amount: u64) -> Result<Signature> {
        self.run("Failed to withdraw fees", async {
            let admin = self.wallet()?;
            let config = self.client.fetch_platform_config().await?;
            let ix = self.builder.withdraw_fees(&admin, &config.account.treasury, amount)?;
            let signature = self.submit(ix).await?;
            Ok::<_, GatherFiError>((signature, "Fees withdrawn successfully".to_string()))
        })
        .await
    }
}
