//! Workbook record store
//!
//! Reads business name (column A) and registration number (column B) from a
//! worksheet and writes the lookup result into columns C-F of the same rows.
//! Every other cell value of the workbook is carried over; formatting is not.

use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use crate::error::StoreError;

use super::{lock, InputRow, OutputRow, RecordStore};

pub const DEFAULT_WORKBOOK: &str = "csv/sample_excel_copy.xlsx";
pub const DEFAULT_SHEET: &str = "登録番号";

const REGISTERED_MARK: &str = "有";

const HEADER: [&str; 6] = [
    "事業者名",
    "登録番号",
    "法人番号",
    "国税庁登録名",
    "住所",
    "登録有無",
];

mod column {
    pub const NAME: u16 = 0;
    pub const REGISTRATION_NUMBER: u16 = 1;
    pub const CORPORATE_NUMBER: u16 = 2;
    pub const REGISTERED_NAME: u16 = 3;
    pub const ADDRESS: u16 = 4;
    pub const REGISTERED: u16 = 5;
}

#[derive(Debug, Clone)]
pub struct XlsxRecordStore {
    path: PathBuf,
    sheet: String,
}

impl XlsxRecordStore {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    fn open(&self) -> Result<Xlsx<std::io::BufReader<std::fs::File>>, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::SourceNotFound(self.path.clone()));
        }
        Ok(open_workbook(&self.path)?)
    }

    /// Cell values of every sheet in the workbook
    fn snapshot_sheets(&self) -> Result<Vec<SheetSnapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut workbook = self.open()?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names().to_owned() {
            let range = workbook.worksheet_range(&name)?;
            let is_target = name == self.sheet;
            sheets.push(SheetSnapshot::capture(name, &range, is_target));
        }
        Ok(sheets)
    }
}

impl Default for XlsxRecordStore {
    fn default() -> Self {
        Self::new(DEFAULT_WORKBOOK, DEFAULT_SHEET)
    }
}

impl RecordStore for XlsxRecordStore {
    fn read_rows(&self) -> Result<Vec<InputRow>, StoreError> {
        let mut workbook = self.open()?;
        if !workbook.sheet_names().iter().any(|name| *name == self.sheet) {
            return Err(StoreError::SheetNotFound {
                path: self.path.clone(),
                sheet: self.sheet.clone(),
            });
        }

        let range = workbook.worksheet_range(&self.sheet)?;
        let rows: Vec<InputRow> = data_rows(&range).into_iter().map(|(_, row)| row).collect();

        tracing::info!(
            path = %self.path.display(),
            sheet = %self.sheet,
            rows = rows.len(),
            "Read workbook rows"
        );
        Ok(rows)
    }

    fn write_rows(&self, rows: &[OutputRow]) -> Result<(), StoreError> {
        self.ensure_writable()?;
        let snapshot = self.snapshot_sheets()?;

        let mut workbook = Workbook::new();
        let mut wrote_target = false;
        for sheet in &snapshot {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            if sheet.is_target {
                sheet.restore_except(worksheet, |row, col| {
                    is_result_column(col) && (row == 0 || sheet.data_rows.contains(&row))
                })?;
                write_results(worksheet, &sheet.data_rows, rows)?;
                wrote_target = true;
            } else {
                sheet.restore_except(worksheet, |_, _| false)?;
            }
        }
        if !wrote_target {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&self.sheet)?;
            for (col, title) in (0u16..).zip(HEADER) {
                worksheet.write_string(0, col, title)?;
            }
            write_results(worksheet, &[], rows)?;
        }
        workbook.save(&self.path)?;

        tracing::info!(
            path = %self.path.display(),
            sheet = %self.sheet,
            rows = rows.len(),
            "Wrote workbook result"
        );
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if lock::is_locked(&self.path) {
            return Err(StoreError::OutputLocked(self.path.clone()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} [{}]", self.path.display(), self.sheet)
    }
}

/// Input rows of a sheet with their sheet row; the header and blank rows are skipped
fn data_rows(range: &Range<Data>) -> Vec<(u32, InputRow)> {
    let last_row = range.end().map_or(0, |(row, _)| row);
    (1..=last_row)
        .filter_map(|row| {
            let display_name = cell_text(range.get_value((row, column::NAME.into())));
            let registration_number =
                cell_text(range.get_value((row, column::REGISTRATION_NUMBER.into())));
            if display_name.is_empty() && registration_number.is_empty() {
                return None;
            }
            Some((row, InputRow::new(registration_number, display_name)))
        })
        .collect()
}

fn is_result_column(col: u16) -> bool {
    (column::CORPORATE_NUMBER..=column::REGISTERED).contains(&col)
}

/// Write result columns C-F into the rows the inputs were read from.
///
/// Rows without a recorded position are appended below the last one together
/// with their input columns.
fn write_results(
    worksheet: &mut Worksheet,
    positions: &[u32],
    rows: &[OutputRow],
) -> Result<(), XlsxError> {
    let result_titles = &HEADER[usize::from(column::CORPORATE_NUMBER)..];
    for (col, title) in (column::CORPORATE_NUMBER..).zip(result_titles) {
        worksheet.write_string(0, col, *title)?;
    }
    if positions.len() != rows.len() && !positions.is_empty() {
        tracing::warn!(
            sheet_rows = positions.len(),
            results = rows.len(),
            "Worksheet rows do not match the result rows"
        );
    }

    let mut next_free = positions.last().map_or(1, |row| row + 1);
    for (index, output) in rows.iter().enumerate() {
        let row = match positions.get(index) {
            Some(row) => *row,
            None => {
                let row = next_free;
                next_free += 1;
                write_text(worksheet, row, column::NAME, &output.input.display_name)?;
                write_text(
                    worksheet,
                    row,
                    column::REGISTRATION_NUMBER,
                    &output.input.registration_number,
                )?;
                row
            }
        };

        let corporate_number = output.corporate_number.as_ref().map_or("", |n| n.as_str());
        write_text(worksheet, row, column::CORPORATE_NUMBER, corporate_number)?;
        write_text(worksheet, row, column::REGISTERED_NAME, &output.registered_name)?;
        write_text(worksheet, row, column::ADDRESS, &output.address)?;
        if output.is_registered {
            worksheet.write_string(row, column::REGISTERED, REGISTERED_MARK)?;
        }
    }
    Ok(())
}

/// Empty text leaves the cell blank
fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), XlsxError> {
    if !text.is_empty() {
        worksheet.write_string(row, col, text)?;
    }
    Ok(())
}

/// Cell text as it would be typed; integral numbers lose their `.0`
fn cell_text(value: Option<&Data>) -> String {
    match value {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(Data::Int(i)) => i.to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

#[derive(Debug)]
struct SheetSnapshot {
    name: String,
    is_target: bool,
    cells: Vec<(u32, u16, CellValue)>,
    /// Sheet rows holding input rows, in read order
    data_rows: Vec<u32>,
}

impl SheetSnapshot {
    fn capture(name: String, range: &Range<Data>, is_target: bool) -> Self {
        // used_cells() coordinates are relative to range.start()
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let cells = range
            .used_cells()
            .filter_map(|(row, col, value)| {
                let row = start_row.checked_add(u32::try_from(row).ok()?)?;
                let col = u16::try_from(start_col.checked_add(u32::try_from(col).ok()?)?).ok()?;
                let value = match value {
                    Data::Empty => return None,
                    Data::String(s) => CellValue::Text(s.clone()),
                    Data::Float(f) => CellValue::Number(*f),
                    Data::Int(i) => CellValue::Number(*i as f64),
                    Data::Bool(b) => CellValue::Bool(*b),
                    other => CellValue::Text(other.to_string()),
                };
                Some((row, col, value))
            })
            .collect();

        let input_rows = if is_target {
            data_rows(range).into_iter().map(|(row, _)| row).collect()
        } else {
            Vec::new()
        };

        Self {
            name,
            is_target,
            cells,
            data_rows: input_rows,
        }
    }

    /// Write the captured cells back, leaving out those selected by `skip`
    fn restore_except(
        &self,
        worksheet: &mut Worksheet,
        skip: impl Fn(u32, u16) -> bool,
    ) -> Result<(), XlsxError> {
        for (row, col, value) in &self.cells {
            if skip(*row, *col) {
                continue;
            }
            match value {
                CellValue::Text(text) => worksheet.write_string(*row, *col, text)?,
                CellValue::Number(number) => worksheet.write_number(*row, *col, *number)?,
                CellValue::Bool(flag) => worksheet.write_boolean(*row, *col, *flag)?,
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_source(path: &Path) {
        let mut workbook = Workbook::new();
        let notes = workbook.add_worksheet();
        notes.set_name("メモ").unwrap();
        notes.write_string(0, 0, "keep me").unwrap();
        notes.write_number(2, 1, 42.0).unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name(DEFAULT_SHEET).unwrap();
        sheet.write_string(0, 0, "事業者名").unwrap();
        sheet.write_string(0, 1, "登録番号").unwrap();
        sheet.write_string(1, 0, "株式会社エー").unwrap();
        sheet.write_string(1, 1, "T1234567890123").unwrap();
        sheet.write_string(3, 0, "ビー商店").unwrap();
        sheet.write_string(3, 1, "T9-8765-4321-0987").unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_read_rows_skips_header_and_blank_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        build_source(&path);

        let rows = XlsxRecordStore::new(&path, DEFAULT_SHEET).read_rows().unwrap();
        assert_eq!(
            rows,
            vec![
                InputRow::new("T1234567890123", "株式会社エー"),
                InputRow::new("T9-8765-4321-0987", "ビー商店"),
            ]
        );
    }

    #[test]
    fn test_missing_workbook_and_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        assert!(matches!(
            XlsxRecordStore::new(&path, DEFAULT_SHEET).read_rows(),
            Err(StoreError::SourceNotFound(_))
        ));

        build_source(&path);
        assert!(matches!(
            XlsxRecordStore::new(&path, "存在しない").read_rows(),
            Err(StoreError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_write_rows_updates_target_and_keeps_other_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        build_source(&path);
        let store = XlsxRecordStore::new(&path, DEFAULT_SHEET);

        let output = vec![OutputRow {
            input: InputRow::new("T1234567890123", "株式会社エー"),
            corporate_number: Some("1234567890123".parse().unwrap()),
            registered_name: "株式会社エー本社".into(),
            address: "東京都千代田区".into(),
            is_registered: true,
        }];
        store.write_rows(&output).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["メモ".to_string(), DEFAULT_SHEET.to_string()]);

        let result = workbook.worksheet_range(DEFAULT_SHEET).unwrap();
        assert_eq!(cell_text(result.get_value((0, 3))), "国税庁登録名");
        assert_eq!(cell_text(result.get_value((1, 2))), "1234567890123");
        assert_eq!(cell_text(result.get_value((1, 3))), "株式会社エー本社");
        assert_eq!(cell_text(result.get_value((1, 4))), "東京都千代田区");
        assert_eq!(cell_text(result.get_value((1, 5))), "有");

        let notes = workbook.worksheet_range("メモ").unwrap();
        assert_eq!(cell_text(notes.get_value((0, 0))), "keep me");
        assert_eq!(cell_text(notes.get_value((2, 1))), "42");
    }

    #[test]
    fn test_numeric_cells_read_without_fraction() {
        assert_eq!(cell_text(Some(&Data::Float(1234.0))), "1234");
        assert_eq!(cell_text(Some(&Data::Float(12.5))), "12.5");
        assert_eq!(cell_text(Some(&Data::Int(7))), "7");
        assert_eq!(cell_text(None), "");
    }

    #[test]
    fn test_write_rows_keeps_extra_columns_and_row_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        {
            let mut workbook = Workbook::new();
            let sheet = workbook.add_worksheet();
            sheet.set_name(DEFAULT_SHEET).unwrap();
            sheet.write_string(0, 0, "事業者名").unwrap();
            sheet.write_string(0, 1, "登録番号").unwrap();
            sheet.write_string(0, 6, "備考").unwrap();
            sheet.write_string(1, 0, "A").unwrap();
            sheet.write_string(1, 1, "T1234567890123").unwrap();
            sheet.write_string(1, 6, "note for A").unwrap();
            sheet.write_string(3, 0, "B").unwrap();
            sheet.write_string(3, 1, "T9876543210987").unwrap();
            sheet.write_string(3, 3, "stale name").unwrap();
            sheet.write_string(3, 6, "note for B").unwrap();
            workbook.save(&path).unwrap();
        }
        let store = XlsxRecordStore::new(&path, DEFAULT_SHEET);
        let inputs = store.read_rows().unwrap();

        let output = vec![
            OutputRow {
                input: inputs[0].clone(),
                corporate_number: Some("1234567890123".parse().unwrap()),
                registered_name: "株式会社エー".into(),
                address: "東京都千代田区".into(),
                is_registered: true,
            },
            OutputRow {
                input: inputs[1].clone(),
                corporate_number: Some("9876543210987".parse().unwrap()),
                registered_name: String::new(),
                address: String::new(),
                is_registered: false,
            },
        ];
        store.write_rows(&output).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let result = workbook.worksheet_range(DEFAULT_SHEET).unwrap();
        let text = |row: u32, col: u32| cell_text(result.get_value((row, col)));

        assert_eq!(text(0, 6), "備考");
        assert_eq!(text(0, 2), "法人番号");
        assert_eq!(text(1, 3), "株式会社エー");
        assert_eq!(text(1, 5), "有");
        assert_eq!(text(1, 6), "note for A");

        // The blank row stays blank and B keeps its row
        assert!((0..7).all(|col| text(2, col).is_empty()));
        assert_eq!(text(3, 0), "B");
        assert_eq!(text(3, 2), "9876543210987");
        assert_eq!(text(3, 3), "");
        assert_eq!(text(3, 5), "");
        assert_eq!(text(3, 6), "note for B");

        assert_eq!(store.read_rows().unwrap(), inputs);
    }
}
