// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{id_for_account, load_accounts, load_categories, load_transactions};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

/// CSV of the filtered transaction view, oldest first. `signed_impact`
/// is the delta relative to the source account (so transfers export as
/// an outflow).
fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let out = sub.get_one::<String>("out").unwrap();
    let month = sub.get_one::<String>("month");
    let account_id = sub
        .get_one::<String>("account")
        .map(|name| id_for_account(conn, name))
        .transpose()?;

    let account_names: HashMap<i64, String> = load_accounts(conn)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let category_names: HashMap<i64, String> = load_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let txs = load_transactions(conn)?;
    let mut wtr = csv::Writer::from_path(out)?;
    wtr.write_record([
        "date",
        "description",
        "category",
        "account",
        "to_account",
        "kind",
        "amount",
        "signed_impact",
    ])?;
    for tx in &txs {
        if let Some(m) = month {
            if tx.date.format("%Y-%m").to_string() != *m {
                continue;
            }
        }
        if let Some(id) = account_id {
            if tx.account_id != id && tx.to_account_id != Some(id) {
                continue;
            }
        }
        let impact = ledger::signed_delta(tx, tx.account_id);
        wtr.write_record([
            tx.date.to_string(),
            tx.description.clone(),
            tx.category_id
                .and_then(|id| category_names.get(&id).cloned())
                .unwrap_or_default(),
            account_names
                .get(&tx.account_id)
                .cloned()
                .unwrap_or_default(),
            tx.to_account_id
                .and_then(|id| account_names.get(&id).cloned())
                .unwrap_or_default(),
            tx.kind.to_string(),
            tx.amount.to_string(),
            impact.to_string(),
        ])?;
    }
    wtr.flush()?;
    println!("Exported transactions to {}", out);
    Ok(())
}
