// Copyright (c) 2025 Tallybook contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rejection reasons checked before any row is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("unknown transaction kind '{0}' (expected income|expense|transfer|loan_given|loan_received)")]
    UnknownKind(String),
    #[error("unknown loan direction '{0}' (expected given|received)")]
    UnknownDirection(String),
    #[error("transfer requires a destination account")]
    TransferWithoutDestination,
    #[error("destination account is only valid for transfers")]
    DestinationOnNonTransfer,
    #[error("category is only valid for expenses")]
    CategoryOnNonExpense,
    #[error("cannot transfer from an account to itself")]
    SelfTransfer,
    #[error("account '{0}' already exists")]
    DuplicateAccountName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    /// Authoritative current balance; mutated atomically with every
    /// balance-affecting write.
    pub balance: Decimal,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Income,
    Expense,
    Transfer,
    LoanGiven,
    LoanReceived,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
            TxKind::Transfer => "transfer",
            TxKind::LoanGiven => "loan_given",
            TxKind::LoanReceived => "loan_received",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            "transfer" => Ok(TxKind::Transfer),
            "loan_given" => Ok(TxKind::LoanGiven),
            "loan_received" => Ok(TxKind::LoanReceived),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// A single dated monetary event. Immutable once written, except deletion.
/// `to_account_id` is populated only for transfers, `category_id` only for
/// expenses; `validate` enforces both before insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TxKind,
    pub date: NaiveDate,
    pub account_id: i64,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub description: String,
    /// Same-day ordering tie-breaker ("YYYY-MM-DD HH:MM:SS", sorts lexically).
    pub created_at: String,
}

impl Transaction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        match self.kind {
            TxKind::Transfer => {
                let to = self
                    .to_account_id
                    .ok_or(ValidationError::TransferWithoutDestination)?;
                if to == self.account_id {
                    return Err(ValidationError::SelfTransfer);
                }
                if self.category_id.is_some() {
                    return Err(ValidationError::CategoryOnNonExpense);
                }
            }
            TxKind::Expense => {
                if self.to_account_id.is_some() {
                    return Err(ValidationError::DestinationOnNonTransfer);
                }
            }
            _ => {
                if self.to_account_id.is_some() {
                    return Err(ValidationError::DestinationOnNonTransfer);
                }
                if self.category_id.is_some() {
                    return Err(ValidationError::CategoryOnNonExpense);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanDirection {
    Given,
    Received,
}

impl LoanDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanDirection::Given => "given",
            LoanDirection::Received => "received",
        }
    }
}

impl fmt::Display for LoanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "given" => Ok(LoanDirection::Given),
            "received" => Ok(LoanDirection::Received),
            other => Err(ValidationError::UnknownDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub person: String,
    pub amount: Decimal,
    pub direction: LoanDirection,
    pub description: Option<String>,
    pub account_id: i64,
    pub returned: bool,
    pub returned_at: Option<String>,
    /// Audit transaction inserted at creation for the principal. Owned
    /// by the loan: deleting it through `tx rm` is refused.
    pub principal_tx_id: Option<i64>,
    /// Audit transaction inserted when the loan was marked returned;
    /// deleted (and its effect reversed) when toggled back.
    pub repayment_tx_id: Option<i64>,
}

impl Loan {
    /// Effect of the loan's creation on the linked account balance.
    pub fn principal_delta(&self) -> Decimal {
        match self.direction {
            LoanDirection::Given => -self.amount,
            LoanDirection::Received => self.amount,
        }
    }

    /// Effect of marking the loan returned; the exact inverse of creation.
    pub fn repayment_delta(&self) -> Decimal {
        -self.principal_delta()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub month: String, // YYYY-MM
    pub category_id: i64,
    /// None means the budget covers every account.
    pub account_id: Option<i64>,
    pub target: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(kind: TxKind, to: Option<i64>, cat: Option<i64>) -> Transaction {
        Transaction {
            id: 1,
            kind,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            account_id: 1,
            to_account_id: to,
            category_id: cat,
            amount: Decimal::new(100, 0),
            description: String::new(),
            created_at: "2024-03-01 10:00:00".into(),
        }
    }

    #[test]
    fn transfer_requires_destination() {
        let t = tx(TxKind::Transfer, None, None);
        assert_eq!(
            t.validate(),
            Err(ValidationError::TransferWithoutDestination)
        );
        assert!(tx(TxKind::Transfer, Some(2), None).validate().is_ok());
    }

    #[test]
    fn self_transfer_rejected() {
        assert_eq!(
            tx(TxKind::Transfer, Some(1), None).validate(),
            Err(ValidationError::SelfTransfer)
        );
    }

    #[test]
    fn category_only_on_expense() {
        assert!(tx(TxKind::Expense, None, Some(3)).validate().is_ok());
        assert_eq!(
            tx(TxKind::Income, None, Some(3)).validate(),
            Err(ValidationError::CategoryOnNonExpense)
        );
    }

    #[test]
    fn non_positive_amount_rejected() {
        let mut t = tx(TxKind::Income, None, None);
        t.amount = Decimal::ZERO;
        assert!(matches!(
            t.validate(),
            Err(ValidationError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for k in [
            TxKind::Income,
            TxKind::Expense,
            TxKind::Transfer,
            TxKind::LoanGiven,
            TxKind::LoanReceived,
        ] {
            assert_eq!(k.as_str().parse::<TxKind>().unwrap(), k);
        }
        assert!("debit".parse::<TxKind>().is_err());
    }
}
