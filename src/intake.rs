//! Input checks applied before and after parsing an uploaded statement.
//!
//! The parsers accept anything; these helpers turn the situations a user
//! should hear about (oversized file, nothing to read, nothing found) into
//! errors.

use crate::error::{Error, Result};
use crate::types::Statement;
use std::io::Read;

/// Largest accepted input, in bytes.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a whole text document, refusing inputs above [`MAX_FILE_SIZE`] and
/// inputs with no visible content.
pub fn read_text<R: Read>(reader: R) -> Result<String> {
    let mut text = String::new();
    reader.take(MAX_FILE_SIZE + 1).read_to_string(&mut text)?;

    let size = text.len() as u64;
    if size > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge { size, limit: MAX_FILE_SIZE });
    }
    if text.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(text)
}

/// Reject a statement in which no transaction was recognised.
pub fn require_transactions(statement: Statement) -> Result<Statement> {
    if statement.is_empty() {
        return Err(Error::NoTransactions);
    }
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_statement;

    #[test]
    fn test_read_text() {
        let text = read_text("data,lancamento,valor\n".as_bytes()).unwrap();
        assert_eq!(text, "data,lancamento,valor\n");
    }

    #[test]
    fn test_read_text_rejects_blank() {
        assert!(matches!(read_text(" \n\t\n".as_bytes()), Err(Error::EmptyContent)));
    }

    #[test]
    fn test_read_text_rejects_oversized() {
        let big = vec![b'a'; MAX_FILE_SIZE as usize + 10];
        match read_text(big.as_slice()) {
            Err(Error::FileTooLarge { size, limit }) => {
                assert_eq!(limit, MAX_FILE_SIZE);
                assert!(size > limit);
            }
            other => panic!("expected FileTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_read_text_rejects_binary() {
        assert!(matches!(read_text(&[0xff, 0xfe, 0x00][..]), Err(Error::Io(_))));
    }

    #[test]
    fn test_require_transactions() {
        let empty = parse_statement("nothing to see here");
        assert!(matches!(require_transactions(empty), Err(Error::NoTransactions)));

        let found = parse_statement("Lançamentos: compras\n01/11 UBER 25,30\n");
        assert_eq!(require_transactions(found).unwrap().transactions.len(), 1);
    }
}
