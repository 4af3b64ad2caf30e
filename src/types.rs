//! Canonical statement model shared by every format.

use crate::category::Category;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single spend record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Day and month as a `DD/MM` label. Statements do not carry a year per line.
    pub date: String,

    /// Cleaned merchant text.
    pub description: String,

    /// Category drawn from the fixed taxonomy.
    pub category: Category,

    /// Spend magnitude, never negative. Debit direction is implicit.
    pub amount: Decimal,

    /// Title-cased merchant city, empty when unknown.
    pub city: String,

    /// `current/total` installment label (e.g. `03/03`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment: Option<String>,
}

/// Normalized statement produced by any of the parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Issuer or institution name.
    pub bank_name: String,

    /// Card holder name, empty when the format does not carry it.
    pub card_holder: String,

    /// Masked card number or account id.
    pub card_number: String,

    /// Due date as printed by the issuer (`DD/MM/YYYY`).
    pub due_date: String,

    /// Statement total, read from the source when available.
    pub total_amount: Decimal,

    /// Transactions in document order.
    pub transactions: Vec<Transaction>,
}

impl Statement {
    /// Create an empty statement for the given institution.
    pub fn new(bank_name: impl Into<String>) -> Self {
        Self {
            bank_name: bank_name.into(),
            card_holder: String::new(),
            card_number: String::new(),
            due_date: String::new(),
            total_amount: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }

    /// Sum of all transaction amounts.
    pub fn transactions_total(&self) -> Decimal {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Whether the parse produced anything to show.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
