//! Handlers for the `balance` and `audit` commands.

use std::path::Path;

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::ledger::{Buckets, Transaction};
use crate::domain::money::format_money;
use crate::error::Result;
use crate::port::inbound::operator::port::OperatorPort;

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "When")]
    created_at: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Bucket")]
    bucket: &'static str,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "After")]
    after: String,
    #[tabled(rename = "Reference")]
    reference: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            created_at: tx.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: tx.kind.as_str(),
            bucket: tx.sub_balance.as_str(),
            amount: format_money(tx.amount),
            after: format_money(tx.after_balance),
            reference: tx.reference.clone(),
        }
    }
}

fn buckets_json(buckets: &Buckets) -> serde_json::Value {
    json!({
        "available": buckets.available.to_string(),
        "escrow": buckets.escrow.to_string(),
        "pending_withdrawals": buckets.pending_withdrawals.to_string(),
    })
}

/// Execute `balance`.
pub fn execute_balance(
    operator: &dyn OperatorPort,
    config_path: &Path,
    user: &str,
    limit: usize,
) -> Result<()> {
    let view = operator.balance(config_path, user, limit)?;
    let (balance, transactions) = (view.balance, view.recent);

    if output::is_json() {
        let entries: Vec<_> = transactions
            .iter()
            .map(|tx| {
                json!({
                    "kind": tx.kind.as_str(),
                    "sub_balance": tx.sub_balance.as_str(),
                    "amount": tx.amount.to_string(),
                    "after_balance": tx.after_balance.to_string(),
                    "reference": tx.reference,
                    "created_at": tx.created_at.to_rfc3339(),
                })
            })
            .collect();
        output::json_output(json!({
            "command": "balance",
            "user_id": user,
            "kind": balance.kind.as_str(),
            "balance": buckets_json(&balance.buckets),
            "transactions": entries,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section(&format!("Balance for {user}"));
    output::field("Kind", balance.kind);
    output::field("Available", format_money(balance.buckets.available));
    output::field("Escrow", format_money(balance.buckets.escrow));
    output::field("Pending", format_money(balance.buckets.pending_withdrawals));
    output::field("Total", format_money(balance.total()));

    output::section("Recent transactions");
    if transactions.is_empty() {
        output::note("(none)");
    } else {
        let rows: Vec<TransactionRow> = transactions.iter().map(TransactionRow::from).collect();
        output::lines(&Table::new(rows).to_string());
    }
    Ok(())
}

/// Execute `audit`. A divergence is returned as an error.
pub fn execute_audit(operator: &dyn OperatorPort, config_path: &Path, user: &str) -> Result<()> {
    let buckets = operator.audit(config_path, user)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "audit",
            "user_id": user,
            "status": "ok",
            "balance": buckets_json(&buckets),
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Transactions for {user} replay to the live balance"));
    output::field("Available", format_money(buckets.available));
    output::field("Escrow", format_money(buckets.escrow));
    output::field("Pending", format_money(buckets.pending_withdrawals));
    Ok(())
}
