// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::{Transaction, TxKind};
use crate::utils::{
    account_exists, apply_balance_delta, fmt_money, id_for_account, id_for_category,
    load_account, load_transactions, maybe_print_json, parse_amount, parse_date, pretty_table,
};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            remove(conn, id)?;
            println!("Deleted transaction {} and reversed its balance effect", id);
        }
        Some(("history", sub)) => history(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub struct NewTransaction {
    pub kind: TxKind,
    pub date: NaiveDate,
    pub account_id: i64,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub description: String,
}

impl NewTransaction {
    fn draft(&self) -> Transaction {
        Transaction {
            id: 0,
            kind: self.kind,
            date: self.date,
            account_id: self.account_id,
            to_account_id: self.to_account_id,
            category_id: self.category_id,
            amount: self.amount,
            description: self.description.clone(),
            created_at: String::new(),
        }
    }
}

/// Insert the row and apply its signed effect to the affected account
/// balance(s) as one SQLite transaction; on any failure nothing commits.
pub fn insert(conn: &mut Connection, new: &NewTransaction) -> Result<i64> {
    let draft = new.draft();
    draft.validate()?;

    let dbtx = conn.transaction()?;
    dbtx.execute(
        "INSERT INTO transactions(kind, date, account_id, to_account_id, category_id, amount, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.kind.as_str(),
            new.date.to_string(),
            new.account_id,
            new.to_account_id,
            new.category_id,
            new.amount.to_string(),
            new.description,
        ],
    )?;
    let id = dbtx.last_insert_rowid();

    apply_balance_delta(&dbtx, new.account_id, ledger::signed_delta(&draft, new.account_id))?;
    if let Some(to) = new.to_account_id {
        apply_balance_delta(&dbtx, to, ledger::signed_delta(&draft, to))?;
    }
    dbtx.commit()?;
    Ok(id)
}

fn load_by_id(conn: &Connection, id: i64) -> Result<Transaction> {
    let row = conn
        .query_row(
            "SELECT id, kind, date, account_id, to_account_id, category_id, amount, description, created_at
             FROM transactions WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, NaiveDate>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    r.get::<_, Option<i64>>(5)?,
                    r.get::<_, String>(6)?,
                    r.get::<_, String>(7)?,
                    r.get::<_, String>(8)?,
                ))
            },
        )
        .optional()?;
    let (id, kind, date, account_id, to_account_id, category_id, amount, description, created_at) =
        row.with_context(|| format!("Transaction {} not found", id))?;
    Ok(Transaction {
        id,
        kind: kind.parse::<TxKind>()?,
        date,
        account_id,
        to_account_id,
        category_id,
        amount: amount
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transactions", amount))?,
        description,
        created_at,
    })
}

/// Delete a transaction and reverse its effect on every account it
/// touched, atomically. Audit rows (principal or repayment) belong to
/// their loan and must be removed through `loan toggle`/`loan rm`.
/// Accounts that were force-deleted no longer have a balance to fix, so
/// their side of the reversal is skipped.
pub fn remove(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = load_by_id(conn, id)?;

    let loan: Option<i64> = conn
        .query_row(
            "SELECT id FROM loans WHERE principal_tx_id=?1 OR repayment_tx_id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(loan_id) = loan {
        bail!(
            "Transaction {} is the audit record of loan {}; use loan toggle or loan rm instead",
            id,
            loan_id
        );
    }

    let dbtx = conn.transaction()?;
    dbtx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    if account_exists(&dbtx, tx.account_id)? {
        apply_balance_delta(&dbtx, tx.account_id, -ledger::signed_delta(&tx, tx.account_id))?;
    }
    if let Some(to) = tx.to_account_id {
        if account_exists(&dbtx, to)? {
            apply_balance_delta(&dbtx, to, -ledger::signed_delta(&tx, to))?;
        }
    }
    dbtx.commit()?;
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TxKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let account_name = sub.get_one::<String>("account").unwrap();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let description = sub.get_one::<String>("description").unwrap().to_string();

    let account_id = id_for_account(conn, account_name)?;
    let to_account_id = sub
        .get_one::<String>("to")
        .map(|name| id_for_account(conn, name))
        .transpose()?;
    let category_id = sub
        .get_one::<String>("category")
        .map(|name| id_for_category(conn, name))
        .transpose()?;

    insert(
        conn,
        &NewTransaction {
            kind,
            date,
            account_id,
            to_account_id,
            category_id,
            amount,
            description,
        },
    )?;
    println!("Recorded {} {} on {} (acct: {})", kind, amount, date, account_name);
    Ok(())
}

#[derive(Default)]
pub struct ListFilter {
    pub month: Option<String>,
    pub account: Option<String>,
    pub category: Option<String>,
    pub kind: Option<TxKind>,
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn from_matches(sub: &clap::ArgMatches) -> Result<Self> {
        Ok(ListFilter {
            month: sub.get_one::<String>("month").cloned(),
            account: sub.get_one::<String>("account").cloned(),
            category: sub.get_one::<String>("category").cloned(),
            kind: sub
                .get_one::<String>("kind")
                .map(|s| s.parse::<TxKind>())
                .transpose()?,
            limit: sub.get_one::<usize>("limit").copied(),
        })
    }
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub account: String,
    pub to_account: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

pub fn query_rows(conn: &Connection, filter: &ListFilter) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.kind, a.name, b.name, c.name, t.amount, t.description
         FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN accounts b ON t.to_account_id=b.id
         LEFT JOIN categories c ON t.category_id=c.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(ref month) = filter.month {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.clone());
    }
    if let Some(ref acct) = filter.account {
        sql.push_str(" AND (a.name=? OR b.name=?)");
        params_vec.push(acct.clone());
        params_vec.push(acct.clone());
    }
    if let Some(ref cat) = filter.category {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat.clone());
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND t.kind=?");
        params_vec.push(kind.as_str().to_string());
    }
    sql.push_str(" ORDER BY t.date DESC, t.created_at DESC, t.id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let account: Option<String> = r.get(3)?;
        let to_account: Option<String> = r.get(4)?;
        let category: Option<String> = r.get(5)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            kind: r.get(2)?,
            account: account.unwrap_or_default(),
            to_account: to_account.unwrap_or_default(),
            category: category.unwrap_or_default(),
            amount: r.get(6)?,
            description: r.get(7)?,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let filter = ListFilter::from_matches(sub)?;
    let data = query_rows(conn, &filter)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.account.clone(),
                    r.to_account.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Kind", "Account", "To", "Category", "Amount", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let name = sub.get_one::<String>("account").unwrap();

    let account = load_account(conn, name)?;
    let txs = load_transactions(conn)?;
    let entries = ledger::reconstruct(&account, &txs);

    if !maybe_print_json(json_flag, jsonl_flag, &entries)? {
        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|e| {
                vec![
                    e.tx.date.to_string(),
                    e.tx.kind.to_string(),
                    e.tx.description.clone(),
                    fmt_money(&e.delta),
                    fmt_money(&e.balance_after),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Kind", "Description", "Change", "Balance"], rows)
        );
        println!("Current balance: {}", fmt_money(&account.balance));
    }
    Ok(())
}
