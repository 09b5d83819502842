// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::commands::{loans, transactions};
use tallybook::models::LoanDirection;
use tallybook::utils::load_account;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    tallybook::db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO accounts(name, balance) VALUES('Main', '1000')", [])
        .unwrap();
    conn
}

fn new_loan(direction: LoanDirection, amount: &str) -> loans::NewLoan {
    loans::NewLoan {
        person: "Alex".into(),
        amount: dec(amount),
        direction,
        account_id: 1,
        description: None,
    }
}

fn balance(conn: &Connection) -> Decimal {
    load_account(conn, "Main").unwrap().balance
}

fn tx_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn given_loan_debits_and_leaves_audit_row() {
    let mut conn = setup();
    loans::create(&mut conn, &new_loan(LoanDirection::Given, "200")).unwrap();
    assert_eq!(balance(&conn), dec("800"));
    let (kind, amount): (String, String) = conn
        .query_row("SELECT kind, amount FROM transactions", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(kind, "loan_given");
    assert_eq!(amount, "200");
}

#[test]
fn received_loan_credits() {
    let mut conn = setup();
    loans::create(&mut conn, &new_loan(LoanDirection::Received, "300")).unwrap();
    assert_eq!(balance(&conn), dec("1300"));
    let kind: String = conn
        .query_row("SELECT kind FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(kind, "loan_received");
}

#[test]
fn toggle_round_trip_restores_balance_and_audit_trail() {
    let mut conn = setup();
    let id = loans::create(&mut conn, &new_loan(LoanDirection::Given, "200")).unwrap();
    assert_eq!(balance(&conn), dec("800"));
    assert_eq!(tx_count(&conn), 1);

    // Returned: principal comes back, repayment row recorded.
    assert!(loans::toggle(&mut conn, id).unwrap());
    assert_eq!(balance(&conn), dec("1000"));
    assert_eq!(tx_count(&conn), 2);
    let repayment: Option<i64> = conn
        .query_row("SELECT repayment_tx_id FROM loans WHERE id=?1", [id], |r| {
            r.get(0)
        })
        .unwrap();
    assert!(repayment.is_some());
    let repay_kind: String = conn
        .query_row(
            "SELECT kind FROM transactions WHERE id=?1",
            [repayment.unwrap()],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(repay_kind, "income");

    // Back to outstanding: repayment row deleted, effect reversed.
    assert!(!loans::toggle(&mut conn, id).unwrap());
    assert_eq!(balance(&conn), dec("800"));
    assert_eq!(tx_count(&conn), 1);
    let repayment: Option<i64> = conn
        .query_row("SELECT repayment_tx_id FROM loans WHERE id=?1", [id], |r| {
            r.get(0)
        })
        .unwrap();
    assert!(repayment.is_none());
}

#[test]
fn received_loan_repayment_is_an_expense() {
    let mut conn = setup();
    let id = loans::create(&mut conn, &new_loan(LoanDirection::Received, "300")).unwrap();
    assert!(loans::toggle(&mut conn, id).unwrap());
    assert_eq!(balance(&conn), dec("1000"));
    let kinds: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE kind='expense'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(kinds, 1);
}

#[test]
fn repayment_transaction_cannot_be_deleted_directly() {
    let mut conn = setup();
    let id = loans::create(&mut conn, &new_loan(LoanDirection::Given, "200")).unwrap();
    loans::toggle(&mut conn, id).unwrap();
    let repayment: i64 = conn
        .query_row("SELECT repayment_tx_id FROM loans WHERE id=?1", [id], |r| {
            r.get(0)
        })
        .unwrap();
    assert!(transactions::remove(&mut conn, repayment).is_err());
    // Nothing changed.
    assert_eq!(balance(&conn), dec("1000"));
    assert_eq!(tx_count(&conn), 2);
}

#[test]
fn principal_transaction_cannot_be_deleted_directly() {
    let mut conn = setup();
    let id = loans::create(&mut conn, &new_loan(LoanDirection::Given, "200")).unwrap();
    let principal: i64 = conn
        .query_row("SELECT principal_tx_id FROM loans WHERE id=?1", [id], |r| {
            r.get(0)
        })
        .unwrap();

    assert!(transactions::remove(&mut conn, principal).is_err());
    assert_eq!(balance(&conn), dec("800"));
    assert_eq!(tx_count(&conn), 1);

    // With the principal intact, a later toggle lands exactly back on
    // the pre-loan balance instead of double-crediting it.
    assert!(loans::toggle(&mut conn, id).unwrap());
    assert_eq!(balance(&conn), dec("1000"));
}

#[test]
fn audit_rows_are_deletable_once_the_loan_is_gone() {
    let mut conn = setup();
    let id = loans::create(&mut conn, &new_loan(LoanDirection::Given, "200")).unwrap();
    let principal: i64 = conn
        .query_row("SELECT principal_tx_id FROM loans WHERE id=?1", [id], |r| {
            r.get(0)
        })
        .unwrap();
    conn.execute("DELETE FROM loans WHERE id=?1", [id]).unwrap();

    transactions::remove(&mut conn, principal).unwrap();
    assert_eq!(balance(&conn), dec("1000"));
    assert_eq!(tx_count(&conn), 0);
}

#[test]
fn deleting_a_loan_leaves_balances_alone() {
    let mut conn = setup();
    let id = loans::create(&mut conn, &new_loan(LoanDirection::Given, "200")).unwrap();
    conn.execute("DELETE FROM loans WHERE id=?1", [id]).unwrap();
    assert_eq!(balance(&conn), dec("800"));
    assert_eq!(tx_count(&conn), 1);
}
