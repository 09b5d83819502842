// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::commands::accounts;
use tallybook::commands::transactions::{self, ListFilter, NewTransaction};
use tallybook::models::TxKind;
use tallybook::utils::load_account;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    tallybook::db::init_schema(&mut conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO accounts(name, balance) VALUES('Main', '1000');
        INSERT INTO accounts(name, balance) VALUES('Savings', '500');
        INSERT INTO categories(name) VALUES('food');
        "#,
    )
    .unwrap();
    conn
}

fn new_tx(kind: TxKind, date: &str, amount: &str) -> NewTransaction {
    NewTransaction {
        kind,
        date: d(date),
        account_id: 1,
        to_account_id: None,
        category_id: None,
        amount: dec(amount),
        description: String::new(),
    }
}

fn balance(conn: &Connection, name: &str) -> Decimal {
    load_account(conn, name).unwrap().balance
}

#[test]
fn insert_moves_the_account_balance() {
    let mut conn = setup();
    transactions::insert(&mut conn, &new_tx(TxKind::Income, "2024-03-01", "250")).unwrap();
    assert_eq!(balance(&conn, "Main"), dec("1250"));

    transactions::insert(&mut conn, &new_tx(TxKind::Expense, "2024-03-02", "50")).unwrap();
    assert_eq!(balance(&conn, "Main"), dec("1200"));
}

#[test]
fn transfer_moves_both_balances() {
    let mut conn = setup();
    let mut t = new_tx(TxKind::Transfer, "2024-03-03", "200");
    t.to_account_id = Some(2);
    transactions::insert(&mut conn, &t).unwrap();
    assert_eq!(balance(&conn, "Main"), dec("800"));
    assert_eq!(balance(&conn, "Savings"), dec("700"));
}

#[test]
fn invalid_shapes_are_rejected_before_any_write() {
    let mut conn = setup();

    let no_dest = new_tx(TxKind::Transfer, "2024-03-03", "200");
    assert!(transactions::insert(&mut conn, &no_dest).is_err());

    let mut categorized_income = new_tx(TxKind::Income, "2024-03-03", "200");
    categorized_income.category_id = Some(1);
    assert!(transactions::insert(&mut conn, &categorized_income).is_err());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(balance(&conn, "Main"), dec("1000"));
}

#[test]
fn failed_balance_update_rolls_back_the_row() {
    let mut conn = setup();
    // Destination account does not exist: the balance step fails and the
    // already-inserted row must not survive the transaction.
    let mut t = new_tx(TxKind::Transfer, "2024-03-03", "200");
    t.to_account_id = Some(99);
    assert!(transactions::insert(&mut conn, &t).is_err());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(balance(&conn, "Main"), dec("1000"));
}

#[test]
fn remove_reverses_the_balance_effect() {
    let mut conn = setup();
    let mut t = new_tx(TxKind::Transfer, "2024-03-03", "200");
    t.to_account_id = Some(2);
    let id = transactions::insert(&mut conn, &t).unwrap();

    transactions::remove(&mut conn, id).unwrap();
    assert_eq!(balance(&conn, "Main"), dec("1000"));
    assert_eq!(balance(&conn, "Savings"), dec("500"));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn orphaned_history_is_still_deletable() {
    let mut conn = setup();
    let id = transactions::insert(&mut conn, &new_tx(TxKind::Income, "2024-03-01", "250")).unwrap();
    accounts::remove(&conn, "Main", true).unwrap();

    // The account is gone; deletion skips its reversal instead of failing.
    transactions::remove(&mut conn, id).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn orphaned_transfer_still_reverses_the_surviving_side() {
    let mut conn = setup();
    let mut t = new_tx(TxKind::Transfer, "2024-03-03", "200");
    t.to_account_id = Some(2);
    let id = transactions::insert(&mut conn, &t).unwrap();
    assert_eq!(balance(&conn, "Savings"), dec("700"));

    accounts::remove(&conn, "Main", true).unwrap();
    transactions::remove(&mut conn, id).unwrap();
    assert_eq!(balance(&conn, "Savings"), dec("500"));
}

#[test]
fn list_filters_and_limit() {
    let mut conn = setup();
    for i in 1..=3 {
        transactions::insert(
            &mut conn,
            &new_tx(TxKind::Income, &format!("2024-03-0{}", i), "10"),
        )
        .unwrap();
    }
    let mut e = new_tx(TxKind::Expense, "2024-04-01", "5");
    e.category_id = Some(1);
    transactions::insert(&mut conn, &e).unwrap();

    let rows = transactions::query_rows(
        &conn,
        &ListFilter {
            limit: Some(2),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2024-04-01"); // newest first

    let march = transactions::query_rows(
        &conn,
        &ListFilter {
            month: Some("2024-03".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(march.len(), 3);

    let food = transactions::query_rows(
        &conn,
        &ListFilter {
            category: Some("food".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].kind, "expense");

    let by_kind = transactions::query_rows(
        &conn,
        &ListFilter {
            kind: Some(TxKind::Income),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(by_kind.len(), 3);
}

#[test]
fn list_filter_parses_from_cli_matches() {
    let cli = tallybook::cli::build_cli();
    let matches = cli.get_matches_from([
        "tallybook", "tx", "list", "--month", "2024-03", "--limit", "2",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    let filter = ListFilter::from_matches(list_m).unwrap();
    assert_eq!(filter.month.as_deref(), Some("2024-03"));
    assert_eq!(filter.limit, Some(2));
}
