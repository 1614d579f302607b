//! GatherFi CLI - Command-line interface for GatherFi event crowdfunding
//!
//! Reads print JSON to stdout; writes report through notifications on stderr.

mod render;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gatherfi_sdk::pda::{checked_milestone_index, checked_ticket_number};
use gatherfi_sdk::{
    AccountClient, AddMilestoneArgs, ClientConfig, CreateEventArgs, ErrorCategory, EventStatus,
    Liveness, Mutations, Notifier, OptionalExt, RpcAccountSource, RpcTransactionSubmitter,
    SettlementCurrency, TokenAmount, TransactionSubmitter, UpdateEventArgs,
};
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gatherfi")]
#[command(about = "GatherFi event crowdfunding CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// RPC URL (overrides GATHERFI_RPC_URL)
    #[arg(short, long, global = true)]
    rpc_url: Option<String>,

    /// Program ID (overrides GATHERFI_PROGRAM_ID)
    #[arg(long, global = true)]
    program_id: Option<Pubkey>,

    /// Keypair file used to sign writes
    #[arg(short, long, global = true)]
    keypair: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show program information
    Info,
    /// Derive a program address
    Pda {
        #[command(subcommand)]
        target: PdaTarget,
    },
    /// Show one event, by address or by organizer and id
    Event {
        address: Option<Pubkey>,
        #[arg(long, requires = "id")]
        organizer: Option<Pubkey>,
        #[arg(long)]
        id: Option<u64>,
    },
    /// List events, newest first
    Events {
        #[arg(long, conflicts_with = "status")]
        organizer: Option<Pubkey>,
        /// e.g. funding, budget-voting, active
        #[arg(long)]
        status: Option<EventStatus>,
    },
    /// Show a contributor's stake in an event
    Contributor {
        event: Pubkey,
        /// Defaults to the keypair's identity
        contributor: Option<Pubkey>,
    },
    /// List every stake held by a contributor
    Contributions { contributor: Option<Pubkey> },
    /// List an event's milestones
    Milestones { event: Pubkey },
    /// List tickets for an event or an owner (defaults to the keypair's identity)
    Tickets {
        #[arg(long, conflicts_with = "owner")]
        event: Option<Pubkey>,
        #[arg(long)]
        owner: Option<Pubkey>,
    },
    /// Show the ticket minted as `mint`
    Ticket { mint: Pubkey },
    /// Show an event's budget
    Budget { event: Pubkey },
    /// Show a voter's budget ballot
    Vote { event: Pubkey, voter: Option<Pubkey> },
    /// List budget ballots cast on an event
    Votes { event: Pubkey },
    /// Show an event's escrow balances
    Escrow { event: Pubkey },
    /// Show an event's profit distribution
    Profit { event: Pubkey },
    /// Show platform configuration
    Platform,
    /// Refresh an event periodically until Ctrl-C
    Watch {
        event: Pubkey,
        #[arg(long, default_value_t = 15)]
        interval_secs: u64,
    },

    /// Create an event
    CreateEvent {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Decimal amount in the first accepted currency
        #[arg(long)]
        target: String,
        #[arg(long)]
        ticket_price: String,
        #[arg(long)]
        max_tickets: u32,
        #[arg(long)]
        location: String,
        /// Unix seconds
        #[arg(long)]
        date: i64,
        #[arg(long, value_delimiter = ',', default_value = "sol")]
        currencies: Vec<SettlementCurrency>,
    },
    /// Edit an event's details
    UpdateEvent {
        event: Pubkey,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        date: Option<i64>,
    },
    CancelEvent { event: Pubkey },
    FinalizeFunding { event: Pubkey },
    FinalizeFundingFailure { event: Pubkey },
    /// Contribute a decimal amount
    Contribute {
        event: Pubkey,
        amount: String,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    ClaimRefund {
        event: Pubkey,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    SubmitBudget {
        event: Pubkey,
        amount: String,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    /// Vote on an event's budget
    CastVote {
        event: Pubkey,
        /// Vote against instead of for
        #[arg(long)]
        reject: bool,
    },
    AddMilestone {
        event: Pubkey,
        index: u64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        amount: String,
        /// Unix seconds
        #[arg(long)]
        due_date: i64,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    ReleaseMilestone {
        event: Pubkey,
        index: u64,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    /// Buy the next ticket
    BuyTicket {
        event: Pubkey,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    CheckIn { event: Pubkey, ticket_number: u64 },
    FinalizeEvent {
        event: Pubkey,
        revenue: String,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    ClaimProfit {
        event: Pubkey,
        #[arg(long, default_value = "sol")]
        currency: SettlementCurrency,
    },
    ClaimOrganizerProfit { event: Pubkey },
    /// Toggle the platform pause flag (admin)
    Pause,
    /// Replace stablecoin mints (admin)
    UpdateMints {
        #[arg(long)]
        usdc: Option<Pubkey>,
        #[arg(long)]
        usdt: Option<Pubkey>,
    },
    /// Withdraw collected fees in SOL (admin)
    WithdrawFees { amount: String },
}

#[derive(Subcommand)]
enum PdaTarget {
    Platform,
    Event { organizer: Pubkey, id: u64 },
    Escrow { event: Pubkey },
    Contributor { event: Pubkey, contributor: Pubkey },
    Ticket { event: Pubkey, number: u64 },
    Budget { event: Pubkey },
    Milestone { event: Pubkey, index: u64 },
    Vote { event: Pubkey, voter: Pubkey },
    Profit { event: Pubkey },
}

/// Prints outcomes to stderr so stdout stays machine-readable
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        eprintln!("✅ {}", message);
    }

    fn error(&self, category: ErrorCategory, message: &str) {
        match category {
            ErrorCategory::WalletNotConnected => eprintln!("🔑 {} (pass --keypair)", message),
            ErrorCategory::SignaturePending => eprintln!("✍️  {}", message),
            _ => eprintln!("❌ {}", message),
        }
    }
}

type CliMutations = Mutations<RpcAccountSource, RpcTransactionSubmitter, ConsoleNotifier>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.rpc_url {
        config = config.with_rpc_url(url);
    }
    if let Some(program_id) = cli.program_id {
        config = config.with_program_id(program_id);
    }
    tracing::debug!("Using {} against {}", config.program_id, config.rpc_url);

    let client = AccountClient::from_config(&config);
    let rpc = client.source().rpc().clone();
    let submitter = match &cli.keypair {
        Some(path) => RpcTransactionSubmitter::from_keypair_file(rpc, path)?,
        None => RpcTransactionSubmitter::new(rpc, None),
    };
    let wallet = submitter.signer();
    let mutations = Mutations::new(
        client,
        Arc::new(submitter),
        Arc::new(ConsoleNotifier),
        config.mints,
    );

    run(cli.command, &config, &mutations, wallet).await
}

fn identity(explicit: Option<Pubkey>, wallet: Option<Pubkey>) -> anyhow::Result<Pubkey> {
    explicit
        .or(wallet)
        .context("no identity given and no --keypair to default to")
}

fn amount(input: &str, currency: SettlementCurrency) -> anyhow::Result<u64> {
    Ok(TokenAmount::parse(input, currency)?.raw)
}

fn print_signature(signature: impl std::fmt::Display) -> anyhow::Result<()> {
    render::print(&json!({ "signature": signature.to_string() }))
}

async fn run(
    command: Commands,
    config: &ClientConfig,
    mutations: &CliMutations,
    wallet: Option<Pubkey>,
) -> anyhow::Result<()> {
    let client = mutations.client();
    let pda = client.pda();

    match command {
        Commands::Info => {
            let (platform, _) = pda.platform_config();
            render::print(&json!({
                "name": "GatherFi",
                "version": env!("CARGO_PKG_VERSION"),
                "programId": config.program_id.to_string(),
                "rpcUrl": config.rpc_url,
                "platformConfig": platform.to_string(),
                "usdcMint": config.mints.usdc.to_string(),
                "usdtMint": config.mints.usdt.to_string(),
                "wallet": wallet.map(|w| w.to_string()),
            }))?;
        }
        Commands::Pda { target } => {
            let (address, bump) = match target {
                PdaTarget::Platform => pda.platform_config(),
                PdaTarget::Event { organizer, id } => pda.event(&organizer, id),
                PdaTarget::Escrow { event } => pda.escrow(&event),
                PdaTarget::Contributor { event, contributor } => {
                    pda.contributor(&event, &contributor)
                }
                PdaTarget::Ticket { event, number } => {
                    pda.ticket(&event, checked_ticket_number(number)?)
                }
                PdaTarget::Budget { event } => pda.budget(&event),
                PdaTarget::Milestone { event, index } => {
                    pda.milestone(&event, checked_milestone_index(index)?)
                }
                PdaTarget::Vote { event, voter } => pda.vote(&event, &voter),
                PdaTarget::Profit { event } => pda.profit_distribution(&event),
            };
            render::print(&json!({ "address": address.to_string(), "bump": bump }))?;
        }
        Commands::Event { address, organizer, id } => {
            let event = match (address, organizer, id) {
                (Some(address), _, _) => client.fetch_event(&address).await,
                (None, Some(organizer), Some(id)) => client.fetch_event_by_id(&organizer, id).await,
                (None, None, Some(id)) => {
                    let organizer = identity(None, wallet)?;
                    client.fetch_event_by_id(&organizer, id).await
                }
                _ => bail!("pass an event address or --id (with --organizer)"),
            };
            match event.optional()? {
                Some(event) => render::print(&render::event(&event))?,
                None => bail!("event not found"),
            }
        }
        Commands::Events { organizer, status } => {
            let list = match (organizer, status) {
                (Some(organizer), _) => client.fetch_events_by_organizer(&organizer).await,
                (None, Some(status)) => client.fetch_events_by_status(status).await,
                (None, None) => client.fetch_all_events().await,
            };
            render::print(&render::events(&list))?;
        }
        Commands::Contributor { event, contributor } => {
            let contributor = identity(contributor, wallet)?;
            match client.fetch_contributor(&event, &contributor).await.optional()? {
                Some(stake) => render::print(&render::contributor(&stake))?,
                None => render::print(&serde_json::Value::Null)?,
            }
        }
        Commands::Contributions { contributor } => {
            let contributor = identity(contributor, wallet)?;
            let stakes = client.fetch_contributions_by(&contributor).await;
            render::print(&render::contributors(&stakes))?;
        }
        Commands::Milestones { event } => {
            render::print(&render::milestones(&client.fetch_milestones(&event).await))?;
        }
        Commands::Tickets { event, owner } => {
            let list = match (event, owner) {
                (Some(event), _) => client.fetch_tickets_by_event(&event).await,
                (None, owner) => client.fetch_tickets_by_owner(&identity(owner, wallet)?).await,
            };
            render::print(&render::tickets(&list))?;
        }
        Commands::Ticket { mint } => match client.fetch_ticket_by_mint(&mint).await.optional()? {
            Some(ticket) => render::print(&render::ticket(&ticket))?,
            None => render::print(&serde_json::Value::Null)?,
        },
        Commands::Budget { event } => match client.fetch_budget(&event).await.optional()? {
            Some(budget) => render::print(&render::budget(&budget))?,
            None => render::print(&serde_json::Value::Null)?,
        },
        Commands::Vote { event, voter } => {
            let voter = identity(voter, wallet)?;
            match client.fetch_vote(&event, &voter).await.optional()? {
                Some(vote) => render::print(&render::vote(&vote))?,
                None => render::print(&serde_json::Value::Null)?,
            }
        }
        Commands::Votes { event } => {
            render::print(&render::votes(&client.fetch_votes(&event).await))?;
        }
        Commands::Escrow { event } => {
            render::print(&render::escrow(&client.fetch_escrow(&event).await?))?;
        }
        Commands::Profit { event } => {
            match client.fetch_profit_distribution(&event).await.optional()? {
                Some(profit) => render::print(&render::profit(&profit))?,
                None => render::print(&serde_json::Value::Null)?,
            }
        }
        Commands::Platform => {
            let platform = client.fetch_platform_config().await?;
            let mut view = render::platform(&platform);
            if let Some(wallet) = wallet {
                view["walletIsAdmin"] = json!(client.is_admin(&wallet).await);
            }
            render::print(&view)?;
        }
        Commands::Watch { event, interval_secs } => {
            watch(client.clone(), event, Duration::from_secs(interval_secs.max(1))).await?;
        }

        Commands::CreateEvent {
            id,
            name,
            description,
            target,
            ticket_price,
            max_tickets,
            location,
            date,
            currencies,
        } => {
            let primary = currencies.first().copied().unwrap_or(SettlementCurrency::Sol);
            let args = CreateEventArgs {
                event_id: id,
                name,
                description,
                target_amount: amount(&target, primary)?,
                ticket_price: amount(&ticket_price, primary)?,
                max_tickets,
                location,
                event_date: date,
                accepted_tokens: currencies,
            };
            let (signature, event) = mutations.create_event(&args).await?;
            render::print(&json!({
                "signature": signature.to_string(),
                "event": event.to_string(),
            }))?;
        }
        Commands::UpdateEvent {
            event,
            name,
            description,
            location,
            date,
        } => {
            let args = UpdateEventArgs {
                name,
                description,
                location,
                event_date: date,
            };
            print_signature(mutations.update_event(&event, &args).await?)?;
        }
        Commands::CancelEvent { event } => print_signature(mutations.cancel_event(&event).await?)?,
        Commands::FinalizeFunding { event } => {
            print_signature(mutations.finalize_funding(&event).await?)?
        }
        Commands::FinalizeFundingFailure { event } => {
            print_signature(mutations.finalize_funding_failure(&event).await?)?
        }
        Commands::Contribute { event, amount: value, currency } => {
            let raw = amount(&value, currency)?;
            print_signature(mutations.contribute(&event, raw, currency).await?)?;
        }
        Commands::ClaimRefund { event, currency } => {
            print_signature(mutations.claim_refund(&event, currency).await?)?
        }
        Commands::SubmitBudget { event, amount: value, currency } => {
            let raw = amount(&value, currency)?;
            print_signature(mutations.submit_budget(&event, raw).await?)?;
        }
        Commands::CastVote { event, reject } => {
            print_signature(mutations.vote_on_budget(&event, !reject).await?)?
        }
        Commands::AddMilestone {
            event,
            index,
            description,
            amount: value,
            due_date,
            currency,
        } => {
            let args = AddMilestoneArgs {
                index: checked_milestone_index(index)?,
                description,
                amount: amount(&value, currency)?,
                due_date,
                token_type: currency,
            };
            print_signature(mutations.add_milestone(&event, &args).await?)?;
        }
        Commands::ReleaseMilestone { event, index, currency } => {
            let index = checked_milestone_index(index)?;
            print_signature(mutations.release_milestone(&event, index, currency).await?)?;
        }
        Commands::BuyTicket { event, currency } => {
            let (signature, ticket_number) = mutations.purchase_ticket(&event, currency).await?;
            render::print(&json!({
                "signature": signature.to_string(),
                "ticketNumber": ticket_number,
            }))?;
        }
        Commands::CheckIn { event, ticket_number } => {
            let ticket_number = checked_ticket_number(ticket_number)?;
            print_signature(mutations.check_in_ticket(&event, ticket_number).await?)?;
        }
        Commands::FinalizeEvent { event, revenue, currency } => {
            let raw = amount(&revenue, currency)?;
            print_signature(mutations.finalize_event(&event, raw).await?)?;
        }
        Commands::ClaimProfit { event, currency } => {
            print_signature(mutations.claim_profit(&event, currency).await?)?
        }
        Commands::ClaimOrganizerProfit { event } => {
            print_signature(mutations.claim_organizer_profit(&event).await?)?
        }
        Commands::Pause => print_signature(mutations.emergency_pause().await?)?,
        Commands::UpdateMints { usdc, usdt } => {
            if usdc.is_none() && usdt.is_none() {
                bail!("nothing to update: pass --usdc and/or --usdt");
            }
            print_signature(mutations.update_token_mints(usdc, usdt).await?)?;
        }
        Commands::WithdrawFees { amount: value } => {
            let raw = amount(&value, SettlementCurrency::Sol)?;
            print_signature(mutations.withdraw_fees(raw).await?)?;
        }
    }

    Ok(())
}

/// Print the event every `interval`. A refresh still in flight when Ctrl-C
/// arrives is left to finish, and its result is dropped.
async fn watch(
    client: AccountClient<RpcAccountSource>,
    event: Pubkey,
    interval: Duration,
) -> anyhow::Result<()> {
    let liveness = Liveness::new();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                break;
            }
            _ = ticker.tick() => {
                let client = client.clone();
                let token = liveness.token();
                tokio::spawn(async move {
                    match token.deliver(client.refresh_event(&event)).await {
                        Some(Ok(current)) => {
                            if let Err(e) = render::print(&render::event(&current)) {
                                tracing::warn!("Failed to print event: {}", e);
                            }
                        }
                        Some(Err(e)) => tracing::warn!("Refresh failed: {}", e),
                        None => {}
                    }
                });
            }
        }
    }

    liveness.retire();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_reads() {
        let organizer = Pubkey::new_unique().to_string();
        let args = ["gatherfi", "events", "--organizer", organizer.as_str()];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Commands::Events { organizer: Some(_), status: None }));

        let cli = Cli::try_parse_from(["gatherfi", "events", "--status", "budget-voting"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Events { status: Some(EventStatus::BudgetVoting), .. }
        ));
    }

    #[test]
    fn test_cli_parses_writes() {
        let event = Pubkey::new_unique().to_string();
        let cli = Cli::try_parse_from([
            "gatherfi",
            "contribute",
            event.as_str(),
            "0.0005",
            "--currency",
            "usdc",
            "--keypair",
            "/tmp/id.json",
        ])
        .unwrap();
        assert!(cli.keypair.is_some());
        match cli.command {
            Commands::Contribute { amount: value, currency, .. } => {
                assert_eq!(currency, SettlementCurrency::Usdc);
                assert_eq!(amount(&value, currency).unwrap(), 500);
            }
            _ => panic!("expected contribute"),
        }
    }

    #[test]
    fn test_cli_parses_currency_list() {
        let cli = Cli::try_parse_from([
            "gatherfi",
            "create-event",
            "--id",
            "1",
            "--name",
            "Demo Day",
            "--target",
            "100",
            "--ticket-price",
            "2.5",
            "--max-tickets",
            "50",
            "--location",
            "Kigali",
            "--date",
            "1900000000",
            "--currencies",
            "usdc,sol",
        ])
        .unwrap();
        match cli.command {
            Commands::CreateEvent { currencies, .. } => {
                assert_eq!(currencies, vec![SettlementCurrency::Usdc, SettlementCurrency::Sol]);
            }
            _ => panic!("expected create-event"),
        }
    }

    #[test]
    fn test_tickets_defaults_to_wallet() {
        let args = ["gatherfi", "tickets", "--keypair", "/tmp/id.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Commands::Tickets { event: None, owner: None }));

        let event = Pubkey::new_unique().to_string();
        let owner = Pubkey::new_unique().to_string();
        let both = ["gatherfi", "tickets", "--event", event.as_str(), "--owner", owner.as_str()];
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn test_identity_falls_back_to_wallet() {
        let wallet = Pubkey::new_unique();
        assert_eq!(identity(None, Some(wallet)).unwrap(), wallet);
        assert!(identity(None, None).is_err());
    }
}
