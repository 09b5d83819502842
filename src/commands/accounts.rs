// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ValidationError;
use crate::utils::{fmt_money, load_accounts, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let color = sub.get_one::<String>("color").map(|s| s.to_string());
            create(conn, name, balance, color.as_deref())?;
            println!("Added account '{}' (balance {})", name, fmt_money(&balance));
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let accounts = load_accounts(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &accounts)? {
                let rows = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.name.clone(),
                            fmt_money(&a.balance),
                            a.color.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Name", "Balance", "Color"], rows));
            }
        }
        Some(("set-balance", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let n = conn.execute(
                "UPDATE accounts SET balance=?1 WHERE name=?2",
                params![amount.to_string(), name],
            )?;
            if n == 0 {
                bail!("Account '{}' not found", name);
            }
            println!("Balance of '{}' set to {}", name, fmt_money(&amount));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let force = sub.get_flag("force");
            remove(conn, name, force)?;
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

/// Rejects a duplicate name (case-insensitively) before any row is written.
pub fn create(conn: &Connection, name: &str, balance: Decimal, color: Option<&str>) -> Result<i64> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE name=?1 COLLATE NOCASE",
        params![name],
        |r| r.get(0),
    )?;
    if exists > 0 {
        return Err(ValidationError::DuplicateAccountName(name.to_string()).into());
    }
    conn.execute(
        "INSERT INTO accounts(name, balance, color) VALUES (?1, ?2, ?3)",
        params![name, balance.to_string(), color],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Count of transactions and loans still referencing the account.
pub fn dependent_count(conn: &Connection, account_id: i64) -> Result<i64> {
    let txs: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id=?1 OR to_account_id=?1",
        params![account_id],
        |r| r.get(0),
    )?;
    let loans: i64 = conn.query_row(
        "SELECT COUNT(*) FROM loans WHERE account_id=?1",
        params![account_id],
        |r| r.get(0),
    )?;
    Ok(txs + loans)
}

/// Deletion with dependents is a warning, not a block: the caller must
/// pass `force` to proceed and accept orphaned references.
pub fn remove(conn: &Connection, name: &str, force: bool) -> Result<()> {
    let id = crate::utils::id_for_account(conn, name)?;
    let deps = dependent_count(conn, id)?;
    if deps > 0 && !force {
        bail!(
            "Account '{}' is referenced by {} transaction(s)/loan(s); pass --force to delete anyway",
            name,
            deps
        );
    }
    conn.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    Ok(())
}
