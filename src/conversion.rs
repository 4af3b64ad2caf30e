//! Format conversion traits.
//!
//! Every parser produces the same [`Statement`], so converting to OFX only
//! rewraps it. The export step supplies what the source lacks (year, sign,
//! transaction ids).

use crate::csv_format::CsvStatement;
use crate::itau_format::ItauStatement;
use crate::ofx_format::OfxStatement;
use crate::types::Statement;

/// Convert an Itaú statement to OFX.
impl From<ItauStatement> for OfxStatement {
    fn from(itau: ItauStatement) -> Self {
        OfxStatement { statement: itau.statement }
    }
}

/// Convert a CSV statement to OFX.
impl From<CsvStatement> for OfxStatement {
    fn from(csv: CsvStatement) -> Self {
        OfxStatement { statement: csv.statement }
    }
}

impl From<Statement> for OfxStatement {
    fn from(statement: Statement) -> Self {
        OfxStatement { statement }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_itau_to_ofx() {
        let text = "Cartão XXXX XXXX XXXX 1234\n\
                    Vencimento: 15/12/2024\n\
                    Lançamentos: compras e saques\n\
                    01/11 FARMACIA PANVEL 04/06 125,50\n\
                    SAÚDE  PORTO ALEGRE\n\
                    Total dos lançamentos atuais\n";
        let ofx: OfxStatement = ItauStatement::parse(text).into();
        let output = ofx.to_ofx_string();

        assert!(output.contains("<ACCTID>XXXX XXXX XXXX 1234</ACCTID>"));
        assert!(output.contains("<DTPOSTED>20241101</DTPOSTED>"));
        assert!(output.contains("<TRNAMT>-125.50</TRNAMT>"));
        assert!(output.contains("<BALAMT>-125.50</BALAMT>"));
        assert!(output.contains("<ORG>Itaú</ORG>"));
    }

    #[test]
    fn test_csv_to_ofx() {
        let csv = CsvStatement::parse("data;lancamento;valor\n2024-03-05;PADARIA;8,50\n");
        let ofx: OfxStatement = csv.into();

        assert_eq!(ofx.statement.bank_name, "CSV");
        assert_eq!(ofx.statement.transactions.len(), 1);
        assert!(ofx.to_ofx_string().contains("<MEMO>PADARIA</MEMO>"));
    }
}
