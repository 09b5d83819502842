// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The aggregation engine: pure functions over in-memory snapshots of
//! accounts, transactions, categories, and budgets. No SQL and no
//! mutation of inputs happens here; callers load the working set and
//! hand it over.

use crate::models::{Account, Budget, Category, Transaction, TxKind};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Signed effect of a transaction on one specific account's balance.
///
/// income/loan_received credit the source account; expense/loan_given
/// debit it; a transfer debits its source and credits its destination.
/// Any other combination leaves the account untouched.
pub fn signed_delta(tx: &Transaction, account_id: i64) -> Decimal {
    match tx.kind {
        TxKind::Income | TxKind::LoanReceived if tx.account_id == account_id => tx.amount,
        TxKind::Expense | TxKind::LoanGiven if tx.account_id == account_id => -tx.amount,
        TxKind::Transfer if tx.account_id == account_id => -tx.amount,
        TxKind::Transfer if tx.to_account_id == Some(account_id) => tx.amount,
        _ => Decimal::ZERO,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub tx: Transaction,
    pub delta: Decimal,
    pub balance_after: Decimal,
}

/// Reconstruct the per-transaction running balance of an account.
///
/// The account's current balance is the one authoritative figure, so the
/// trajectory is anchored at the present: subtracting the sum of all
/// signed deltas recovers the implied opening balance, and replaying the
/// deltas forward from there necessarily lands back on the current
/// balance. Drift introduced outside the visible transaction set (manual
/// balance edits) is absorbed into the opening balance rather than
/// corrupting the tail of the history.
///
/// Event order is ascending (date, created_at); exact ties keep input
/// order (stable sort). The returned entries are newest-first.
pub fn reconstruct(account: &Account, txs: &[Transaction]) -> Vec<LedgerEntry> {
    let mut mine: Vec<&Transaction> = txs
        .iter()
        .filter(|t| t.account_id == account.id || t.to_account_id == Some(account.id))
        .collect();
    if mine.is_empty() {
        return Vec::new();
    }
    mine.sort_by(|a, b| (a.date, &a.created_at).cmp(&(b.date, &b.created_at)));

    let total_delta: Decimal = mine.iter().map(|t| signed_delta(t, account.id)).sum();
    let mut running = account.balance - total_delta;

    let mut entries = Vec::with_capacity(mine.len());
    for tx in mine {
        let delta = signed_delta(tx, account.id);
        running += delta;
        entries.push(LedgerEntry {
            tx: tx.clone(),
            delta,
            balance_after: running,
        });
    }
    entries.reverse();
    entries
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountFlow {
    pub account_id: i64,
    pub account: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net: Decimal,
    pub category_spending: Vec<CategorySpend>,
    pub account_flows: Vec<AccountFlow>,
}

/// Roll one calendar month of transactions up into totals.
///
/// Transfers are excluded from `total_income`/`total_expenses` (they net
/// to zero across the user's own accounts) but show up on both sides of
/// the per-account breakdown: an outflow for the source and an inflow
/// for the destination. Category grouping keeps first-occurrence order;
/// uncategorized expenses count toward the total but not the grouping.
pub fn monthly_summary(
    month: &str,
    txs: &[Transaction],
    accounts: &[Account],
    categories: &[Category],
) -> MonthlySummary {
    let category_names: HashMap<i64, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut category_spending: Vec<CategorySpend> = Vec::new();

    let in_month: Vec<&Transaction> = txs
        .iter()
        .filter(|t| t.date.format("%Y-%m").to_string() == month)
        .collect();

    for tx in &in_month {
        match tx.kind {
            TxKind::Income | TxKind::LoanReceived => total_income += tx.amount,
            TxKind::Expense | TxKind::LoanGiven => total_expenses += tx.amount,
            TxKind::Transfer => {}
        }
        if tx.kind == TxKind::Expense {
            if let Some(name) = tx.category_id.and_then(|id| category_names.get(&id)) {
                match category_spending.iter_mut().find(|c| c.category == *name) {
                    Some(slot) => slot.amount += tx.amount,
                    None => category_spending.push(CategorySpend {
                        category: (*name).to_string(),
                        amount: tx.amount,
                    }),
                }
            }
        }
    }

    let account_flows = accounts
        .iter()
        .map(|acct| {
            let mut income = Decimal::ZERO;
            let mut expenses = Decimal::ZERO;
            for tx in &in_month {
                let delta = signed_delta(tx, acct.id);
                if delta > Decimal::ZERO {
                    income += delta;
                } else {
                    expenses += -delta;
                }
            }
            AccountFlow {
                account_id: acct.id,
                account: acct.name.clone(),
                income,
                expenses,
            }
        })
        .collect();

    MonthlySummary {
        month: month.to_string(),
        total_income,
        total_expenses,
        net: total_income - total_expenses,
        category_spending,
        account_flows,
    }
}

/// Warning kicks in at 80% utilization; both thresholds are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Safe,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Safe => "safe",
            BudgetStatus::Warning => "warning",
            BudgetStatus::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetUsage {
    pub budget: Budget,
    pub spent: Decimal,
    pub remaining: Decimal,
    /// Percentage in [0, 100]; 0 when the target is not positive.
    pub utilization: Decimal,
    pub status: BudgetStatus,
}

const WARNING_PERCENT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Compute spend and utilization for each budget.
///
/// Spend buckets are keyed by (month, category, account-or-all); every
/// categorized expense feeds both its specific-account bucket and the
/// all-accounts bucket, so a general and an account-scoped budget on the
/// same category are fed independently by the same transaction.
pub fn budget_usage(budgets: &[Budget], txs: &[Transaction]) -> Vec<BudgetUsage> {
    let mut buckets: HashMap<(String, i64, Option<i64>), Decimal> = HashMap::new();
    for tx in txs {
        if tx.kind != TxKind::Expense {
            continue;
        }
        let Some(category_id) = tx.category_id else {
            continue;
        };
        let month = tx.date.format("%Y-%m").to_string();
        *buckets
            .entry((month.clone(), category_id, Some(tx.account_id)))
            .or_default() += tx.amount;
        *buckets.entry((month, category_id, None)).or_default() += tx.amount;
    }

    budgets
        .iter()
        .map(|b| {
            let spent = buckets
                .get(&(b.month.clone(), b.category_id, b.account_id))
                .copied()
                .unwrap_or(Decimal::ZERO);
            let remaining = (b.target - spent).max(Decimal::ZERO);
            let utilization = if b.target > Decimal::ZERO {
                (spent / b.target * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED)
            } else {
                Decimal::ZERO
            };
            let status = if spent >= b.target {
                BudgetStatus::Exceeded
            } else if utilization >= WARNING_PERCENT {
                BudgetStatus::Warning
            } else {
                BudgetStatus::Safe
            };
            BudgetUsage {
                budget: b.clone(),
                spent,
                remaining,
                utilization,
                status,
            }
        })
        .collect()
}
