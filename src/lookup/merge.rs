//! Record Merger: joins lookup results back onto the input rows

use crate::records::{InputRow, OutputRow};

use super::table::LookupTable;

/// Produce one output row per input row, in input order.
///
/// Rows whose registration number is malformed, or whose corporate number is
/// not in `table`, come out unregistered with empty name and address.
pub fn merge(rows: &[InputRow], table: &LookupTable) -> Vec<OutputRow> {
    rows.iter()
        .map(|row| {
            let corporate_number = row.corporate_number().ok();
            let record = corporate_number.as_ref().and_then(|n| table.get(n));

            OutputRow {
                input: row.clone(),
                registered_name: record.map(|r| r.registered_name.clone()).unwrap_or_default(),
                address: record.map(|r| r.address.clone()).unwrap_or_default(),
                is_registered: record.is_some(),
                corporate_number,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::houjin::CorporateRecord;

    fn table() -> LookupTable {
        std::iter::once(CorporateRecord {
            corporate_number: "1234567890123".parse().unwrap(),
            registered_name: "株式会社エー".to_string(),
            address: "東京都千代田区丸の内１丁目".to_string(),
        })
        .collect()
    }

    #[test]
    fn test_found_and_missing_rows() {
        let rows = vec![
            InputRow::new("T1234567890123", "A"),
            InputRow::new("T9876543210987", "B"),
        ];
        let output = merge(&rows, &table());

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].input.display_name, "A");
        assert!(output[0].is_registered);
        assert_eq!(output[0].registered_name, "株式会社エー");
        assert_eq!(output[0].address, "東京都千代田区丸の内１丁目");

        assert_eq!(output[1].input.display_name, "B");
        assert!(!output[1].is_registered);
        assert_eq!(output[1].registered_name, "");
        assert_eq!(output[1].address, "");
        assert_eq!(
            output[1].corporate_number.as_ref().map(|n| n.as_str()),
            Some("9876543210987")
        );
    }

    #[test]
    fn test_malformed_row_is_kept_unregistered() {
        let rows = vec![
            InputRow::new("not-a-number", "broken"),
            InputRow::new("T1-2345-6789-0123", "A"),
        ];
        let output = merge(&rows, &table());

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].input.display_name, "broken");
        assert!(output[0].corporate_number.is_none());
        assert!(!output[0].is_registered);
        assert!(output[1].is_registered);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let rows = vec![
            InputRow::new("T1234567890123", "A"),
            InputRow::new("", "blank"),
            InputRow::new("T1234567890123", "A again"),
        ];
        let table = table();
        assert_eq!(merge(&rows, &table), merge(&rows, &table));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(&[], &table()).is_empty());
        assert!(merge(&[], &LookupTable::new()).is_empty());
    }
}
