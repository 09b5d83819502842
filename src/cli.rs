// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("tallybook")
        .about("Local-first personal finance ledger: accounts, loans, monthly budgets")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database if missing and print its path"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .about("Add an account")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .default_value("0")
                                .help("Opening balance"),
                        )
                        .arg(Arg::new("color").long("color").help("Display color")),
                )
                .subcommand(json_flags(Command::new("list").about("List accounts")))
                .subcommand(
                    Command::new("set-balance")
                        .about("Manually overwrite an account balance")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("amount").required(true)),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Remove an account (warns when history references it)")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .action(ArgAction::SetTrue)
                                .help("Proceed even if transactions or loans reference it"),
                        ),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage expense categories")
                .subcommand(
                    Command::new("add")
                        .about("Add a category")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("icon").long("icon")),
                )
                .subcommand(Command::new("list").about("List categories"))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a category")
                        .arg(Arg::new("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and inspect transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction and update balances atomically")
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .help("income|expense|transfer|loan_given|loan_received"),
                        )
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("to").long("to").help("Destination account (transfer only)"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Expense category (expense only)"),
                        )
                        .arg(Arg::new("description").long("description").default_value("")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions, newest first")
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction and reverse its balance effect")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                )
                .subcommand(json_flags(
                    Command::new("history")
                        .about("Per-transaction running balance for one account")
                        .arg(Arg::new("account").required(true)),
                )),
        )
        .subcommand(
            Command::new("loan")
                .about("Track money lent and borrowed")
                .subcommand(
                    Command::new("add")
                        .about("Record a loan; moves the account balance and leaves an audit transaction")
                        .arg(Arg::new("person").long("person").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("direction")
                                .long("direction")
                                .required(true)
                                .help("given|received"),
                        )
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(json_flags(Command::new("list").about("List loans")))
                .subcommand(
                    Command::new("toggle")
                        .about("Flip a loan between outstanding and returned")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a loan record (balances untouched)")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly spending targets per category")
                .subcommand(
                    Command::new("set")
                        .about("Create or replace a budget")
                        .arg(Arg::new("month").long("month").required(true).help("YYYY-MM"))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("account")
                                .long("account")
                                .help("Scope to one account (default: all accounts)"),
                        )
                        .arg(Arg::new("target").long("target").required(true)),
                )
                .subcommand(
                    Command::new("list")
                        .about("List budgets")
                        .arg(Arg::new("month").long("month")),
                )
                .subcommand(json_flags(
                    Command::new("report")
                        .about("Spent, remaining, and utilization per budget")
                        .arg(Arg::new("month").long("month").required(true)),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Derived summaries")
                .subcommand(json_flags(
                    Command::new("monthly")
                        .about("Income, expenses, net, category and account breakdown")
                        .arg(Arg::new("month").long("month").required(true).help("YYYY-MM")),
                ))
                .subcommand(json_flags(
                    Command::new("net-worth").about("Sum of all account balances"),
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .about("Write the filtered transaction view as CSV")
                        .arg(Arg::new("out").long("out").required(true))
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(Arg::new("account").long("account")),
                ),
        )
}
