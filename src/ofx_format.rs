//! OFX 1.0.2 (SGML) statement parser and serializer.
//!
//! Parsing extracts `<STMTTRN>` blocks with plain tag scanning rather than
//! a full SGML parser: issuers emit both closed (`<MEMO>x</MEMO>`) and
//! unclosed (`<MEMO>x`) elements, and only a handful of tags matter.
//!
//! Serialization produces a fixed credit card statement envelope that
//! desktop finance software imports.

use crate::category::detect_category;
use crate::error::{Error, Result};
use crate::normalize::{clean_description, parse_amount_flexible};
use crate::types::{Statement, Transaction};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::{Read, Write};
use tracing::debug;

/// Institution name used when the file carries no `<ORG>`.
pub const FALLBACK_BANK_NAME: &str = "Nubank";

/// Suggested file name for exported statements.
pub const DEFAULT_FILENAME: &str = "fatura.ofx";

/// Memos for account-level adjustments rather than purchases.
const IGNORED_MEMOS: [&str; 6] = [
    "Pagamento recebido",
    "Crédito de atraso",
    "Saldo em atraso",
    "Ajuste a crédito",
    "Encerramento de dívida",
    "Encargos",
];

const HEADER: [&str; 9] = [
    "OFXHEADER:100",
    "DATA:OFXSGML",
    "VERSION:102",
    "SECURITY:NONE",
    "ENCODING:UTF-8",
    "CHARSET:1252",
    "COMPRESSION:NONE",
    "OLDFILEUID:NONE",
    "NEWFILEUID:NONE",
];

static RE_STMTTRN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<STMTTRN>(.*?)</STMTTRN>").unwrap());
static RE_POSTED_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})").unwrap());

/// Represents an OFX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct OfxStatement {
    /// The underlying statement data.
    pub statement: Statement,
}

impl OfxStatement {
    /// Parse an OFX statement from any source implementing `Read`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use fatura::ofx_format::OfxStatement;
    ///
    /// let mut file = File::open("extrato.ofx")?;
    /// let ofx = OfxStatement::from_read(&mut file)?;
    /// println!("{}", ofx.statement.bank_name);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::parse(&text))
    }

    /// Parse OFX text. Blocks missing a required tag are dropped.
    pub fn parse(text: &str) -> Self {
        let mut transactions = Vec::new();

        for caps in RE_STMTTRN.captures_iter(text) {
            match parse_block(&caps[1]) {
                Ok(Some(transaction)) => transactions.push(transaction),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "skipping STMTTRN block"),
            }
        }

        let mut statement = Statement::new(tag_value(text, "ORG").unwrap_or(FALLBACK_BANK_NAME));
        statement.card_number = tag_value(text, "ACCTID").unwrap_or_default().to_string();
        statement.transactions = transactions;
        statement.total_amount = tag_value(text, "BALAMT")
            .and_then(|v| parse_amount_flexible(v).ok())
            .map(|v| v.abs())
            .unwrap_or_else(|| statement.transactions_total());

        debug!(transactions = statement.transactions.len(), "parsed OFX statement");

        OfxStatement { statement }
    }

    /// Write the statement as OFX to any destination implementing `Write`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use fatura::ofx_format::OfxStatement;
    /// use fatura::types::Statement;
    ///
    /// let ofx = OfxStatement { statement: Statement::new("Itaú") };
    /// let mut file = File::create("fatura.ofx")?;
    /// ofx.write_to(&mut file)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.to_ofx_string().as_bytes())?;
        Ok(())
    }

    /// Render the statement as OFX text.
    pub fn to_ofx_string(&self) -> String {
        render(&self.statement)
    }
}

/// Serialize any statement to OFX text.
pub fn export_ofx(statement: &Statement) -> String {
    render(statement)
}

/// Read the value of `<TAG>`: everything up to the next tag or line break.
fn tag_value<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let start = text.find(&open)? + open.len();
    let rest = &text[start..];
    let end = rest.find(|c: char| matches!(c, '<' | '\n' | '\r')).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Parse a single `<STMTTRN>` body.
///
/// `Ok(None)` means the block is a known non-purchase adjustment.
fn parse_block(block: &str) -> Result<Option<Transaction>> {
    let raw_amount =
        tag_value(block, "TRNAMT").ok_or_else(|| Error::MissingField("TRNAMT".to_string()))?;
    let posted =
        tag_value(block, "DTPOSTED").ok_or_else(|| Error::MissingField("DTPOSTED".to_string()))?;
    let memo = tag_value(block, "MEMO").ok_or_else(|| Error::MissingField("MEMO".to_string()))?;

    let date = posted_date(posted)
        .map(|d| d.format("%d/%m").to_string())
        .ok_or_else(|| Error::InvalidDate(posted.to_string()))?;

    if IGNORED_MEMOS.iter().any(|m| memo.contains(m)) {
        debug!(memo, "ignoring adjustment");
        return Ok(None);
    }

    let amount = parse_amount_flexible(raw_amount)?;

    Ok(Some(Transaction {
        date,
        description: clean_description(memo),
        category: detect_category(memo),
        amount: amount.abs(),
        city: String::new(),
        installment: None,
    }))
}

/// Calendar date at the start of a `YYYYMMDD[hhmmss][tz]` timestamp.
fn posted_date(posted: &str) -> Option<NaiveDate> {
    let caps = RE_POSTED_DATE.captures(posted)?;
    NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

/// Year printed in a `DD/MM/YYYY` due date, or the current year.
fn infer_year(due_date: &str) -> i32 {
    let parts: Vec<&str> = due_date.split('/').collect();
    if parts.len() == 3 {
        if let Ok(year) = parts[2].trim().parse::<i32>() {
            return year;
        }
    }
    chrono::Local::now().year()
}

/// `DD/MM` plus year into `YYYYMMDD`.
fn to_ofx_date(date: &str, year: i32) -> String {
    let mut parts = date.split('/');
    let day = parts.next().unwrap_or_default();
    let month = parts.next().unwrap_or_default();
    format!("{}{}{}", year, month, day)
}

fn fit_id(posted: &str, index: usize) -> String {
    format!("{}{:04}", posted, index)
}

/// Two-decimal debit figure (`-125.50`).
fn debit_amount(amount: Decimal) -> String {
    let rounded = amount.abs().round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return "0.00".to_string();
    }
    format!("{:.2}", -rounded)
}

fn render(statement: &Statement) -> String {
    let year = infer_year(&statement.due_date);

    let mut transactions = Vec::with_capacity(statement.transactions.len() * 7);
    for (i, tx) in statement.transactions.iter().enumerate() {
        let posted = to_ofx_date(&tx.date, year);
        transactions.push("<STMTTRN>".to_string());
        transactions.push("<TRNTYPE>DEBIT</TRNTYPE>".to_string());
        transactions.push(format!("<DTPOSTED>{}</DTPOSTED>", posted));
        transactions.push(format!("<TRNAMT>{}</TRNAMT>", debit_amount(tx.amount)));
        transactions.push(format!("<FITID>{}</FITID>", fit_id(&posted, i)));
        transactions.push(format!("<MEMO>{}</MEMO>", tx.description));
        transactions.push("</STMTTRN>".to_string());
    }

    let body = [
        "<OFX>".to_string(),
        "<SIGNONMSGSRSV1>".to_string(),
        "<SONRS>".to_string(),
        "<STATUS><CODE>0</CODE><SEVERITY>INFO</SEVERITY></STATUS>".to_string(),
        "<LANGUAGE>POR</LANGUAGE>".to_string(),
        "</SONRS>".to_string(),
        "</SIGNONMSGSRSV1>".to_string(),
        "<CREDITCARDMSGSRSV1>".to_string(),
        "<CCSTMTTRNRS>".to_string(),
        "<TRNUID>1</TRNUID>".to_string(),
        "<STATUS><CODE>0</CODE><SEVERITY>INFO</SEVERITY></STATUS>".to_string(),
        "<CCSTMTRS>".to_string(),
        "<CURDEF>BRL</CURDEF>".to_string(),
        "<CCACCTFROM>".to_string(),
        format!("<ACCTID>{}</ACCTID>", statement.card_number),
        "</CCACCTFROM>".to_string(),
        "<BANKTRANLIST>".to_string(),
        // An empty list still occupies one (blank) line.
        transactions.join("\n"),
        "</BANKTRANLIST>".to_string(),
        "<LEDGERBAL>".to_string(),
        format!("<BALAMT>{}</BALAMT>", debit_amount(statement.total_amount)),
        "</LEDGERBAL>".to_string(),
        "</CCSTMTRS>".to_string(),
        "</CCSTMTTRNRS>".to_string(),
        "</CREDITCARDMSGSRSV1>".to_string(),
        format!("<FI><ORG>{}</ORG></FI>", statement.bank_name),
        "</OFX>".to_string(),
    ];

    format!("{}\n\n{}\n", HEADER.join("\n"), body.join("\n"))
}
