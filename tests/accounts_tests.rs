// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::commands::{accounts, transactions};
use tallybook::models::TxKind;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    tallybook::db::init_schema(&mut conn).unwrap();
    conn
}

#[test]
fn duplicate_name_rejected_case_insensitively() {
    let conn = setup();
    accounts::create(&conn, "Checking", Decimal::ZERO, None).unwrap();
    assert!(accounts::create(&conn, "checking", Decimal::ZERO, None).is_err());
    assert!(accounts::create(&conn, "CHECKING", Decimal::ZERO, None).is_err());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn remove_with_history_requires_force() {
    let mut conn = setup();
    accounts::create(&conn, "Main", "100".parse().unwrap(), None).unwrap();
    transactions::insert(
        &mut conn,
        &transactions::NewTransaction {
            kind: TxKind::Income,
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            account_id: 1,
            to_account_id: None,
            category_id: None,
            amount: "10".parse().unwrap(),
            description: String::new(),
        },
    )
    .unwrap();

    assert!(accounts::remove(&conn, "Main", false).is_err());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);

    // Forced deletion proceeds and leaves the history orphaned.
    accounts::remove(&conn, "Main", true).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
    let orphans: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(orphans, 1);
}

#[test]
fn remove_without_history_needs_no_force() {
    let conn = setup();
    accounts::create(&conn, "Empty", Decimal::ZERO, None).unwrap();
    accounts::remove(&conn, "Empty", false).unwrap();
}

#[test]
fn dependent_count_sees_transfers_and_loans() {
    let mut conn = setup();
    accounts::create(&conn, "A", "100".parse().unwrap(), None).unwrap();
    accounts::create(&conn, "B", "100".parse().unwrap(), None).unwrap();
    transactions::insert(
        &mut conn,
        &transactions::NewTransaction {
            kind: TxKind::Transfer,
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            account_id: 1,
            to_account_id: Some(2),
            category_id: None,
            amount: "10".parse().unwrap(),
            description: String::new(),
        },
    )
    .unwrap();
    conn.execute(
        "INSERT INTO loans(person, amount, direction, account_id) VALUES('Alex','5','given',2)",
        [],
    )
    .unwrap();

    assert_eq!(accounts::dependent_count(&conn, 1).unwrap(), 1);
    assert_eq!(accounts::dependent_count(&conn, 2).unwrap(), 2);
}
