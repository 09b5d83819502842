// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{
    fmt_money, id_for_account, id_for_category, load_budgets, load_transactions,
    maybe_print_json, parse_amount, parse_month, pretty_table,
};
use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("report", sub)) => report(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Upsert on the (month, category, account-or-all) tuple; the unique
/// index on the IFNULL expression backs this, so the update is matched
/// manually with `account_id IS ?`.
pub fn upsert(
    conn: &Connection,
    month: &str,
    category_id: i64,
    account_id: Option<i64>,
    target: Decimal,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE budgets SET target=?1 WHERE month=?2 AND category_id=?3 AND account_id IS ?4",
        params![target.to_string(), month, category_id, account_id],
    )?;
    if updated == 0 {
        conn.execute(
            "INSERT INTO budgets(month, category_id, account_id, target) VALUES (?1, ?2, ?3, ?4)",
            params![month, category_id, account_id, target.to_string()],
        )?;
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let cat = sub.get_one::<String>("category").unwrap();
    let target = parse_amount(sub.get_one::<String>("target").unwrap())?;
    let cat_id = id_for_category(conn, cat)?;
    let account_id = sub
        .get_one::<String>("account")
        .map(|name| id_for_account(conn, name))
        .transpose()?;
    upsert(conn, &month, cat_id, account_id, target)?;
    println!("Budget set for {} / {} = {}", month, cat, fmt_money(&target));
    Ok(())
}

fn name_maps(conn: &Connection) -> Result<(HashMap<i64, String>, HashMap<i64, String>)> {
    let cats = crate::utils::load_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let accts = crate::utils::load_accounts(conn)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    Ok((cats, accts))
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month").map(|s| s.as_str());
    let budgets = load_budgets(conn, month)?;
    let (cats, accts) = name_maps(conn)?;
    let data: Vec<Vec<String>> = budgets
        .iter()
        .map(|b| {
            vec![
                b.month.clone(),
                cats.get(&b.category_id).cloned().unwrap_or_default(),
                b.account_id
                    .and_then(|id| accts.get(&id).cloned())
                    .unwrap_or_else(|| "(all)".into()),
                fmt_money(&b.target),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Category", "Account", "Target"], data)
    );
    Ok(())
}

#[derive(Serialize)]
pub struct BudgetReportRow {
    pub month: String,
    pub category: String,
    pub account: Option<String>,
    pub target: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub utilization: Decimal,
    pub status: String,
}

pub fn report_rows(conn: &Connection, month: &str) -> Result<Vec<BudgetReportRow>> {
    let budgets = load_budgets(conn, Some(month))?;
    let txs = load_transactions(conn)?;
    let usage = ledger::budget_usage(&budgets, &txs);
    let (cats, accts) = name_maps(conn)?;

    Ok(usage
        .into_iter()
        .map(|u| BudgetReportRow {
            month: u.budget.month.clone(),
            category: cats.get(&u.budget.category_id).cloned().unwrap_or_default(),
            account: u.budget.account_id.and_then(|id| accts.get(&id).cloned()),
            target: u.budget.target,
            spent: u.spent,
            remaining: u.remaining,
            utilization: u.utilization,
            status: u.status.to_string(),
        })
        .collect())
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;

    let rows = report_rows(conn, &month)?;
    if !maybe_print_json(json_flag, jsonl_flag, &rows)? {
        let data: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                vec![
                    r.category.clone(),
                    r.account.clone().unwrap_or_else(|| "(all)".into()),
                    fmt_money(&r.target),
                    fmt_money(&r.spent),
                    fmt_money(&r.remaining),
                    format!("{:.0}%", r.utilization),
                    r.status.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Category", "Account", "Target", "Spent", "Remaining", "Used", "Status"],
                data
            )
        );
    }
    Ok(())
}
