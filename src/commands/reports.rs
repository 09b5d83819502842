// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{
    fmt_money, load_accounts, load_categories, load_transactions, maybe_print_json, parse_month,
    pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => monthly(conn, sub)?,
        Some(("net-worth", sub)) => net_worth(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn monthly(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;

    let txs = load_transactions(conn)?;
    let accounts = load_accounts(conn)?;
    let categories = load_categories(conn)?;
    let summary = ledger::monthly_summary(&month, &txs, &accounts, &categories);

    if maybe_print_json(json_flag, jsonl_flag, &summary)? {
        return Ok(());
    }

    println!(
        "{}",
        pretty_table(
            &["Month", "Income", "Expenses", "Net"],
            vec![vec![
                summary.month.clone(),
                fmt_money(&summary.total_income),
                fmt_money(&summary.total_expenses),
                fmt_money(&summary.net),
            ]]
        )
    );

    if !summary.category_spending.is_empty() {
        let rows = summary
            .category_spending
            .iter()
            .map(|c| vec![c.category.clone(), fmt_money(&c.amount)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], rows));
    }

    let rows = summary
        .account_flows
        .iter()
        .map(|f| {
            vec![
                f.account.clone(),
                fmt_money(&f.income),
                fmt_money(&f.expenses),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Account", "In", "Out"], rows));
    Ok(())
}

#[derive(Serialize)]
struct NetWorth {
    net_worth: Decimal,
    accounts: usize,
}

fn net_worth(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let accounts = load_accounts(conn)?;
    let total: Decimal = accounts.iter().map(|a| a.balance).sum();

    let out = NetWorth {
        net_worth: total,
        accounts: accounts.len(),
    };
    if !maybe_print_json(json_flag, jsonl_flag, &out)? {
        println!(
            "Net worth across {} account(s): {}",
            out.accounts,
            fmt_money(&out.net_worth)
        );
    }
    Ok(())
}
