//! JSON views of program accounts for terminal output.

use gatherfi_sdk::state::days_remaining;
use gatherfi_sdk::{
    Budget, Contributor, Escrow, Event, Milestone, PlatformConfig, ProfitDistribution,
    ProgramAccount, SettlementCurrency, Ticket, Vote,
};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub fn print(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn event(e: &ProgramAccount<Event>) -> Value {
    let a = &e.account;
    let now = now_unix();
    let accepted: Vec<&str> = a.accepted_tokens.iter().map(SettlementCurrency::symbol).collect();
    json!({
        "address": e.address.to_string(),
        "organizer": a.organizer.to_string(),
        "eventId": a.event_id,
        "name": a.name,
        "description": a.description,
        "status": a.status.label(),
        "currency": a.primary_currency().symbol(),
        "acceptedTokens": accepted,
        "target": a.target().to_string(),
        "raised": a.raised().to_string(),
        "progressPercent": a.funding_progress_bps() as f64 / 100.0,
        "targetMet": a.is_funding_target_met(),
        "ticketPrice": a.ticket_price().to_string(),
        "ticketsSold": a.tickets_sold,
        "maxTickets": a.max_tickets,
        "ticketsRemaining": a.tickets_remaining(),
        "location": a.location,
        "eventDate": a.event_date,
        "daysUntilEvent": days_remaining(a.event_date, now),
        "fundingDeadline": a.funding_deadline,
        "daysUntilDeadline": days_remaining(a.funding_deadline, now),
        "budgetApproved": a.budget_approved,
        "votes": { "total": a.total_votes, "yes": a.yes_votes, "no": a.no_votes },
        "platformFee": a.platform_fee_amount,
        "ticketMint": a.ticket_mint.map(|m| m.to_string()),
    })
}

pub fn events(list: &[ProgramAccount<Event>]) -> Value {
    Value::Array(list.iter().map(event).collect())
}

pub fn contributor(c: &ProgramAccount<Contributor>) -> Value {
    let a = &c.account;
    json!({
        "address": c.address.to_string(),
        "event": a.event.to_string(),
        "contributor": a.contributor.to_string(),
        "currency": a.token_type.symbol(),
        "amount": a.contributed().to_string(),
        "votingPower": a.voting_power,
        "profitsClaimed": a.profits().to_string(),
        "refundClaimed": a.refund_claimed,
    })
}

pub fn contributors(list: &[ProgramAccount<Contributor>]) -> Value {
    Value::Array(list.iter().map(contributor).collect())
}

pub fn ticket(t: &ProgramAccount<Ticket>) -> Value {
    let a = &t.account;
    json!({
        "address": t.address.to_string(),
        "event": a.event.to_string(),
        "owner": a.owner.to_string(),
        "mint": a.mint.to_string(),
        "ticketNumber": a.ticket_number,
        "currency": a.token_type.symbol(),
        "pricePaid": a.price().to_string(),
        "checkedIn": a.checked_in,
        "refunded": a.refunded,
    })
}

pub fn tickets(list: &[ProgramAccount<Ticket>]) -> Value {
    Value::Array(list.iter().map(ticket).collect())
}

pub fn milestone(m: &ProgramAccount<Milestone>) -> Value {
    let a = &m.account;
    json!({
        "address": m.address.to_string(),
        "index": a.index,
        "description": a.description,
        "currency": a.token_type.symbol(),
        "amount": a.value().to_string(),
        "dueDate": a.due_date,
        "released": a.released,
        "releasable": a.is_releasable(now_unix()),
        "releaseDate": a.release_date,
    })
}

pub fn milestones(list: &[ProgramAccount<Milestone>]) -> Value {
    Value::Array(list.iter().map(milestone).collect())
}

pub fn budget(b: &ProgramAccount<Budget>) -> Value {
    let a = &b.account;
    json!({
        "address": b.address.to_string(),
        "event": a.event.to_string(),
        "totalAmount": a.total_amount,
        "approved": a.approved,
        "submittedAt": a.submitted_at,
    })
}

pub fn vote(v: &ProgramAccount<Vote>) -> Value {
    let a = &v.account;
    json!({
        "address": v.address.to_string(),
        "event": a.event.to_string(),
        "voter": a.voter.to_string(),
        "weight": a.amount,
        "approve": a.approve,
        "votedAt": a.voted_at,
    })
}

pub fn votes(list: &[ProgramAccount<Vote>]) -> Value {
    Value::Array(list.iter().map(vote).collect())
}

pub fn escrow(e: &ProgramAccount<Escrow>) -> Value {
    let a = &e.account;
    json!({
        "address": e.address.to_string(),
        "event": a.event.to_string(),
        "sol": a.balance(SettlementCurrency::Sol).to_string(),
        "usdc": a.balance(SettlementCurrency::Usdc).to_string(),
        "usdt": a.balance(SettlementCurrency::Usdt).to_string(),
        "totalBalance": a.total_balance,
        "initialized": a.is_initialized,
    })
}

pub fn profit(p: &ProgramAccount<ProfitDistribution>) -> Value {
    let a = &p.account;
    json!({
        "address": p.address.to_string(),
        "event": a.event.to_string(),
        "totalRevenue": a.total_revenue,
        "expenses": a.expenses,
        "netProfit": a.net_profit,
        "backersShare": a.backers_share,
        "organizerShare": a.organizer_share,
        "platformShare": a.platform_share,
        "distributed": a.distributed,
        "distributionDate": a.distribution_date,
    })
}

pub fn platform(p: &ProgramAccount<PlatformConfig>) -> Value {
    let a = &p.account;
    json!({
        "address": p.address.to_string(),
        "admin": a.admin.to_string(),
        "treasury": a.treasury.to_string(),
        "feePercentage": a.fee_percentage,
        "royaltyPercentage": a.royalty_percentage,
        "totalFeesCollected": a.total_fees_collected,
        "totalVolume": a.total_volume,
        "paused": a.paused,
        "usdcMint": a.usdc_mint.to_string(),
        "usdtMint": a.usdt_mint.to_string(),
    })
}
