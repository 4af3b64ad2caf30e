//! Itaú credit card statement parser.
//!
//! Works on the plain text extracted from the issuer's PDF statement. The
//! layout is line oriented:
//!
//! ```text
//! Cartão XXXX XXXX XXXX 1234
//! Vencimento: 15/12/2024
//! Lançamentos: compras e saques
//! DATA ESTABELECIMENTO VALOR EM R$
//! 01/11 FARMACIA PANVEL 04/06 125,50
//! SAUDE  PORTO ALEGRE
//! Total dos lançamentos atuais
//! ```
//!
//! A transaction line may be followed by a line holding the issuer's
//! category and the merchant city, separated by two or more spaces.

use crate::category::{detect_category, infer_category, Category};
use crate::error::Result;
use crate::normalize::{clean_description, format_city, parse_amount};
use crate::types::{Statement, Transaction};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::io::Read;
use tracing::debug;

/// Institution name reported for statements in this layout.
pub const BANK_NAME: &str = "Itaú";

const CARD_PREFIX: &str = "Cartão";
const CARD_MASK: &str = "XXXX";
const DUE_DATE_PREFIX: &str = "Vencimento:";
const CARD_HOLDER_PREFIX: &str = "Titular";
const TOTAL_LABEL: &str = "Total desta fatura";
const TOTAL_LABEL_ALT: &str = "O total da sua fatura é:";

const SECTION_START: [&str; 2] = ["Lançamentos:", "Lançamentos no cartão"];
const SECTION_END: [&str; 2] = ["Total dos lançamentos", "Caso você pague"];
const TABLE_HEADERS: [&str; 2] = ["DATA ESTABELECIMENTO VALOR EM R$", "DATA VALOR EM R$"];
// A line starting with one of these is never a category/city line.
const BOUNDARY_PREFIXES: [&str; 3] = ["Lançamentos", "Total", "Caso"];

static RE_TRANSACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}/\d{2})\s+(.+?)\s+([\d.,]+)$").unwrap());
static RE_INSTALLMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(\d{2}/\d{2})$").unwrap());
static RE_DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}\s").unwrap());
static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Represents an Itaú card statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ItauStatement {
    /// The underlying statement data.
    pub statement: Statement,
}

/// Category and city read from the line following a transaction.
#[derive(Debug, Clone, PartialEq)]
struct Lookahead {
    category: Category,
    city: String,
    consumed: usize,
}

/// Forward cursor over the non-blank lines of a document.
struct LineCursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self { lines, pos: 0 }
    }

    /// Return the line under the cursor and move past it.
    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.pos).copied()?;
        self.pos += 1;
        Some(line)
    }

    /// The line the next call to `next_line` would return.
    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn skip(&mut self, n: usize) {
        self.pos += n;
    }
}

impl ItauStatement {
    /// Parse a statement from any source implementing `Read`.
    ///
    /// Only fails when the source cannot be read as UTF-8 text.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use fatura::itau_format::ItauStatement;
    ///
    /// let mut file = File::open("fatura.txt")?;
    /// let itau = ItauStatement::from_read(&mut file)?;
    /// println!("{} transactions", itau.statement.transactions.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::parse(&text))
    }

    /// Parse the extracted text of a statement.
    ///
    /// Lines that do not fit the layout are skipped; a document with nothing
    /// recognisable yields a statement without transactions.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let mut statement = Statement::new(BANK_NAME);
        let total = Self::scan_metadata(&lines, &mut statement);
        statement.transactions = Self::scan_transactions(&lines);
        statement.total_amount = total.unwrap_or_else(|| statement.transactions_total());

        debug!(
            transactions = statement.transactions.len(),
            card = %statement.card_number,
            "parsed Itaú statement"
        );

        ItauStatement { statement }
    }

    /// Fill card metadata and return the printed total, if any.
    fn scan_metadata(lines: &[&str], statement: &mut Statement) -> Option<Decimal> {
        let mut total = None;

        for (i, line) in lines.iter().enumerate() {
            if line.starts_with(CARD_PREFIX) && line.contains(CARD_MASK) {
                statement.card_number = line.replacen(CARD_PREFIX, "", 1).trim().to_string();
            }
            if line.starts_with(DUE_DATE_PREFIX) {
                statement.due_date = line.replacen(DUE_DATE_PREFIX, "", 1).trim().to_string();
            }
            if line.starts_with(CARD_HOLDER_PREFIX) {
                statement.card_holder = line.replacen(CARD_HOLDER_PREFIX, "", 1).trim().to_string();
            }
            if *line == TOTAL_LABEL || line.starts_with(TOTAL_LABEL_ALT) {
                if let Some(value) = lines.get(i + 1).and_then(|next| parse_amount(next).ok()) {
                    total = Some(value);
                }
            }
        }

        total
    }

    fn scan_transactions(lines: &[&str]) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        let mut in_section = false;
        let mut cursor = LineCursor::new(lines);

        while let Some(line) = cursor.next_line() {
            if SECTION_START.iter().any(|m| line.starts_with(m)) {
                in_section = true;
                continue;
            }
            if SECTION_END.iter().any(|m| line.starts_with(m)) {
                in_section = false;
                continue;
            }
            if !in_section || TABLE_HEADERS.contains(&line) {
                continue;
            }

            let Some(caps) = RE_TRANSACTION.captures(line) else {
                continue;
            };

            let amount = match parse_amount(&caps[3]) {
                Ok(amount) => amount,
                Err(e) => {
                    debug!(line, error = %e, "skipping transaction line");
                    continue;
                }
            };

            let (description, installment) = split_installment(caps[2].trim());

            let (category, city) = match read_lookahead(cursor.peek(), &description) {
                Some(lookahead) => {
                    cursor.skip(lookahead.consumed);
                    (lookahead.category, lookahead.city)
                }
                None => (detect_category(&description), String::new()),
            };

            transactions.push(Transaction {
                date: caps[1].to_string(),
                description: clean_description(&description),
                category,
                amount,
                city: format_city(&city),
                installment,
            });
        }

        transactions
    }
}

/// Split a trailing `NN/NN` installment marker off a description.
fn split_installment(description: &str) -> (String, Option<String>) {
    match RE_INSTALLMENT.captures(description) {
        Some(caps) => {
            let installment = caps[1].to_string();
            let rest = RE_INSTALLMENT.replace(description, "").trim().to_string();
            (rest, Some(installment))
        }
        None => (description.to_string(), None),
    }
}

/// Interpret the line after a transaction as `CATEGORY  CITY`.
///
/// Returns `None` when the line is missing or starts another record, in
/// which case nothing is consumed.
fn read_lookahead(next: Option<&str>, description: &str) -> Option<Lookahead> {
    let next = next?;
    if RE_DATE_PREFIX.is_match(next) || BOUNDARY_PREFIXES.iter().any(|p| next.starts_with(p)) {
        return None;
    }

    let parts: Vec<&str> = RE_COLUMN_GAP.split(next).collect();
    let hint = parts.first().copied().unwrap_or_default();
    let city = parts.last().copied().unwrap_or(hint);

    Some(Lookahead {
        category: infer_category(hint, description),
        city: city.to_string(),
        consumed: 1,
    })
}
