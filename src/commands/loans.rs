// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Loan flows are the triple writes of the system: the loan row, the
//! account balance, and the audit transaction always land in one SQLite
//! transaction, so there is no partial state to compensate for.

use crate::models::{Loan, LoanDirection};
use crate::utils::{
    apply_balance_delta, fmt_money, id_for_account, load_accounts, maybe_print_json,
    parse_amount, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("toggle", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let returned = toggle(conn, id)?;
            println!(
                "Loan {} is now {}",
                id,
                if returned { "returned" } else { "outstanding" }
            );
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute("DELETE FROM loans WHERE id=?1", params![id])?;
            if n == 0 {
                anyhow::bail!("Loan {} not found", id);
            }
            println!("Removed loan {} (balances untouched)", id);
        }
        _ => {}
    }
    Ok(())
}

pub struct NewLoan {
    pub person: String,
    pub amount: Decimal,
    pub direction: LoanDirection,
    pub account_id: i64,
    pub description: Option<String>,
}

/// Record a loan: insert the loan row, move the account balance by the
/// principal, and leave an audit transaction, all in one unit.
pub fn create(conn: &mut Connection, new: &NewLoan) -> Result<i64> {
    let delta = match new.direction {
        LoanDirection::Given => -new.amount,
        LoanDirection::Received => new.amount,
    };
    let audit_kind = match new.direction {
        LoanDirection::Given => "loan_given",
        LoanDirection::Received => "loan_received",
    };
    let audit_desc = match new.direction {
        LoanDirection::Given => format!("Loan given to {}", new.person),
        LoanDirection::Received => format!("Loan received from {}", new.person),
    };
    let today = chrono::Utc::now().date_naive();

    let dbtx = conn.transaction()?;
    dbtx.execute(
        "INSERT INTO loans(person, amount, direction, description, account_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.person,
            new.amount.to_string(),
            new.direction.as_str(),
            new.description,
            new.account_id,
        ],
    )?;
    let id = dbtx.last_insert_rowid();
    apply_balance_delta(&dbtx, new.account_id, delta)?;
    dbtx.execute(
        "INSERT INTO transactions(kind, date, account_id, amount, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            audit_kind,
            today.to_string(),
            new.account_id,
            new.amount.to_string(),
            audit_desc,
        ],
    )?;
    let principal_tx_id = dbtx.last_insert_rowid();
    dbtx.execute(
        "UPDATE loans SET principal_tx_id=?1 WHERE id=?2",
        params![principal_tx_id, id],
    )?;
    dbtx.commit()?;
    Ok(id)
}

fn load_loan(conn: &Connection, id: i64) -> Result<Loan> {
    let row = conn
        .query_row(
            "SELECT id, person, amount, direction, description, account_id, returned, returned_at, principal_tx_id, repayment_tx_id
             FROM loans WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, i64>(5)?,
                    r.get::<_, bool>(6)?,
                    r.get::<_, Option<String>>(7)?,
                    r.get::<_, Option<i64>>(8)?,
                    r.get::<_, Option<i64>>(9)?,
                ))
            },
        )
        .optional()?;
    let (id, person, amount, direction, description, account_id, returned, returned_at, principal_tx_id, repayment_tx_id) =
        row.with_context(|| format!("Loan {} not found", id))?;
    Ok(Loan {
        id,
        person,
        amount: amount
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in loans", amount))?,
        direction: direction.parse::<LoanDirection>()?,
        description,
        account_id,
        returned,
        returned_at,
        principal_tx_id,
        repayment_tx_id,
    })
}

/// Flip a loan's returned flag. Marking it returned applies the exact
/// inverse of the principal and records a repayment transaction; marking
/// it outstanding again deletes that repayment record and re-applies the
/// principal. Either way the whole flip is one SQLite transaction.
pub fn toggle(conn: &mut Connection, id: i64) -> Result<bool> {
    let loan = load_loan(conn, id)?;
    let dbtx = conn.transaction()?;
    let now_returned = if !loan.returned {
        apply_balance_delta(&dbtx, loan.account_id, loan.repayment_delta())?;
        // Repayment is plain money movement, not a new loan: income when
        // a given loan comes back, expense when a received one is repaid.
        let (kind, desc) = match loan.direction {
            LoanDirection::Given => ("income", format!("Loan repayment from {}", loan.person)),
            LoanDirection::Received => ("expense", format!("Loan repayment to {}", loan.person)),
        };
        let today = chrono::Utc::now().date_naive();
        dbtx.execute(
            "INSERT INTO transactions(kind, date, account_id, amount, description)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![kind, today.to_string(), loan.account_id, loan.amount.to_string(), desc],
        )?;
        let repayment_tx_id = dbtx.last_insert_rowid();
        dbtx.execute(
            "UPDATE loans SET returned=1, returned_at=datetime('now'), repayment_tx_id=?1 WHERE id=?2",
            params![repayment_tx_id, loan.id],
        )?;
        true
    } else {
        apply_balance_delta(&dbtx, loan.account_id, loan.principal_delta())?;
        if let Some(tx_id) = loan.repayment_tx_id {
            dbtx.execute("DELETE FROM transactions WHERE id=?1", params![tx_id])?;
        }
        dbtx.execute(
            "UPDATE loans SET returned=0, returned_at=NULL, repayment_tx_id=NULL WHERE id=?1",
            params![loan.id],
        )?;
        false
    };
    dbtx.commit()?;
    Ok(now_returned)
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let person = sub.get_one::<String>("person").unwrap().to_string();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let direction: LoanDirection = sub.get_one::<String>("direction").unwrap().parse()?;
    let account_name = sub.get_one::<String>("account").unwrap();
    let description = sub.get_one::<String>("description").map(|s| s.to_string());

    let account_id = id_for_account(conn, account_name)?;
    create(
        conn,
        &NewLoan {
            person: person.clone(),
            amount,
            direction,
            account_id,
            description,
        },
    )?;
    println!(
        "Recorded loan {} {} {} (acct: {})",
        direction,
        fmt_money(&amount),
        person,
        account_name
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let account_names: HashMap<i64, String> = load_accounts(conn)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    let mut stmt = conn.prepare(
        "SELECT id, person, amount, direction, description, account_id, returned, returned_at, principal_tx_id, repayment_tx_id
         FROM loans ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut loans: Vec<Loan> = Vec::new();
    while let Some(r) = rows.next()? {
        let amount: String = r.get(2)?;
        let direction: String = r.get(3)?;
        loans.push(Loan {
            id: r.get(0)?,
            person: r.get(1)?,
            amount: amount
                .parse::<Decimal>()
                .with_context(|| format!("Invalid amount '{}' in loans", amount))?,
            direction: direction.parse::<LoanDirection>()?,
            description: r.get(4)?,
            account_id: r.get(5)?,
            returned: r.get(6)?,
            returned_at: r.get(7)?,
            principal_tx_id: r.get(8)?,
            repayment_tx_id: r.get(9)?,
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &loans)? {
        let data: Vec<Vec<String>> = loans
            .iter()
            .map(|l| {
                vec![
                    l.id.to_string(),
                    l.person.clone(),
                    l.direction.to_string(),
                    fmt_money(&l.amount),
                    account_names.get(&l.account_id).cloned().unwrap_or_default(),
                    if l.returned { "returned" } else { "outstanding" }.to_string(),
                    l.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Person", "Direction", "Amount", "Account", "Status", "Description"],
                data
            )
        );
    }
    Ok(())
}
