use crate::error::VoucherError;
use crate::models::VoucherImportRow;

/// Parses an import body: CSV with a header row `operator,denomination,voucher`
/// (case-insensitive). Column order in the header is not significant;
/// `csv`'s header-based deserialization handles reordering.
pub fn parse_csv(body: &[u8]) -> Result<Vec<VoucherImportRow>, VoucherError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body);

    let lowered: csv::StringRecord = reader
        .headers()
        .map_err(|e| VoucherError::BadRequest(format!("Invalid CSV header: {e}")))?
        .iter()
        .map(str::to_lowercase)
        .collect();
    reader.set_headers(lowered);

    let mut rows = Vec::new();
    for record in reader.deserialize::<VoucherImportRow>() {
        let row = record.map_err(|e| VoucherError::BadRequest(format!("Invalid CSV row: {e}")))?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_csv() {
        let csv = "operator,denomination,voucher\nTank,red,Tr0\nTank,red,Tr1\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].voucher, "Tr0");
        assert_eq!(rows[1].voucher, "Tr1");
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let csv = "Operator,Denomination,Voucher\nTank,red,Tr0\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].operator, "Tank");
    }

    #[test]
    fn rejects_missing_column() {
        let csv = "operator,voucher\nTank,Tr0\n";
        assert!(parse_csv(csv.as_bytes()).is_err());
    }
}
