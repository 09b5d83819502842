// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Account, Budget, Category, Transaction, TxKind, ValidationError};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    chrono::NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Monetary entry amounts must be strictly positive; sign comes from the
/// transaction kind, never from the input.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(d).into());
    }
    Ok(d)
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

fn account_from_parts(id: i64, name: String, balance: String, color: Option<String>) -> Result<Account> {
    let balance = balance
        .parse::<Decimal>()
        .with_context(|| format!("Invalid balance '{}' for account '{}'", balance, name))?;
    Ok(Account {
        id,
        name,
        balance,
        color,
    })
}

pub fn load_account(conn: &Connection, name: &str) -> Result<Account> {
    let (id, name, balance, color): (i64, String, String, Option<String>) = conn
        .query_row(
            "SELECT id, name, balance, color FROM accounts WHERE name=?1",
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .with_context(|| format!("Account '{}' not found", name))?;
    account_from_parts(id, name, balance, color)
}

pub fn load_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare("SELECT id, name, balance, color FROM accounts ORDER BY id")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(account_from_parts(r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)?);
    }
    Ok(out)
}

pub fn load_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, icon FROM categories ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
            icon: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Full transaction snapshot in authoritative event order
/// (date, created_at, then id for exact ties).
pub fn load_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, date, account_id, to_account_id, category_id, amount, description, created_at
         FROM transactions ORDER BY date, created_at, id",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let kind: String = r.get(1)?;
        let amount: String = r.get(6)?;
        out.push(Transaction {
            id: r.get(0)?,
            kind: kind.parse::<TxKind>()?,
            date: r.get(2)?,
            account_id: r.get(3)?,
            to_account_id: r.get(4)?,
            category_id: r.get(5)?,
            amount: amount
                .parse::<Decimal>()
                .with_context(|| format!("Invalid amount '{}' in transactions", amount))?,
            description: r.get(7)?,
            created_at: r.get(8)?,
        });
    }
    Ok(out)
}

pub fn load_budgets(conn: &Connection, month: Option<&str>) -> Result<Vec<Budget>> {
    let mut sql =
        String::from("SELECT id, month, category_id, account_id, target FROM budgets");
    if month.is_some() {
        sql.push_str(" WHERE month=?1");
    }
    sql.push_str(" ORDER BY month DESC, category_id, account_id");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match month {
        Some(m) => stmt.query(params![m])?,
        None => stmt.query([])?,
    };
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let target: String = r.get(4)?;
        out.push(Budget {
            id: r.get(0)?,
            month: r.get(1)?,
            category_id: r.get(2)?,
            account_id: r.get(3)?,
            target: target
                .parse::<Decimal>()
                .with_context(|| format!("Invalid target '{}' in budgets", target))?,
        });
    }
    Ok(out)
}

pub fn account_exists(conn: &Connection, account_id: i64) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE id=?1",
        params![account_id],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

/// Shift an account's balance by a signed delta. Only meaningful inside
/// an open `rusqlite` transaction together with the rows that justify
/// the shift; SQLite's single-writer isolation makes the read and the
/// write one atomic unit there.
pub fn apply_balance_delta(conn: &Connection, account_id: i64, delta: Decimal) -> Result<()> {
    let bal: Option<String> = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .optional()?;
    let bal = bal.with_context(|| format!("Account id {} not found", account_id))?;
    let bal = bal
        .parse::<Decimal>()
        .with_context(|| format!("Invalid balance '{}' for account id {}", bal, account_id))?;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![(bal + delta).to_string(), account_id],
    )?;
    Ok(())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
