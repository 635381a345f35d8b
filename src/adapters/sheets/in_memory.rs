use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use error_stack::{report, ResultExt};

use crate::{
    domain::sheets::{
        a1_notation::{A1Notation, FromA1Notation},
        cell_position::CellPosition,
        cell_range::CellRange,
    },
    ports::spreadsheet::{CellWrite, SpreadsheetError, SpreadsheetGateway, StringGrid},
};

type Cells = BTreeMap<(u32, u32), String>;

/// Spreadsheets kept in memory, keyed by spreadsheet id and sheet title.
/// Mirrors the API in trimming trailing empty rows and cells on reads.
#[derive(Debug, Default)]
pub struct InMemorySpreadsheets {
    sheets: Mutex<HashMap<(String, String), Cells>>,
    pub fail_writes: bool,
    writes: Mutex<Vec<CellWrite>>,
}

impl InMemorySpreadsheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `rows` into `sheet`, with the first value at `top_left`.
    pub fn with_rows(self, spreadsheet_id: &str, sheet: &str, top_left: &str, rows: &[&[&str]]) -> Self {
        let start = CellPosition::from_a1_notation(&A1Notation::from(top_left))
            .expect("valid top-left cell");
        {
            let mut sheets = self.sheets.lock().unwrap();
            let cells = sheets
                .entry((spreadsheet_id.to_owned(), sheet.to_owned()))
                .or_default();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if !value.is_empty() {
                        cells.insert(
                            (start.row.index() + r as u32, start.col.index() + c as u32),
                            value.to_string(),
                        );
                    }
                }
            }
        }
        self
    }

    pub fn cell(&self, spreadsheet_id: &str, sheet: &str, cell: &str) -> Option<String> {
        let pos = CellPosition::from_a1_notation(&A1Notation::from(cell)).ok()?;
        self.sheets
            .lock()
            .unwrap()
            .get(&(spreadsheet_id.to_owned(), sheet.to_owned()))?
            .get(&(pos.row.index(), pos.col.index()))
            .cloned()
    }

    pub fn writes(&self) -> Vec<CellWrite> {
        self.writes.lock().unwrap().clone()
    }

    fn read(&self, spreadsheet_id: &str, range: &A1Notation) -> error_stack::Result<StringGrid, SpreadsheetError> {
        let range = CellRange::from_a1_notation(range)
            .change_context(SpreadsheetError::FailedToFetchRange)?;
        let sheet = range.sheet_title.clone().unwrap_or_else(|| "Sheet1".to_string());

        let sheets = self.sheets.lock().unwrap();
        let cells = sheets
            .get(&(spreadsheet_id.to_owned(), sheet.clone()))
            .ok_or_else(|| report!(SpreadsheetError::FailedToFetchRange))
            .attach_printable_lazy(|| format!("No sheet {} in {}", sheet, spreadsheet_id))?;

        let first_row = range.start.row.index();
        let last_row = match range.end_row {
            Some(end) => end.index(),
            None => cells.keys().map(|(row, _)| *row).max().unwrap_or(0),
        };

        let mut grid: StringGrid = (first_row..=last_row)
            .map(|row| {
                let mut values: Vec<String> = (range.start.col.index()..=range.end_col.index())
                    .map(|col| cells.get(&(row, col)).cloned().unwrap_or_default())
                    .collect();
                while values.last().is_some_and(String::is_empty) {
                    values.pop();
                }
                values
            })
            .collect();
        while grid.last().is_some_and(Vec::is_empty) {
            grid.pop();
        }
        Ok(grid)
    }
}

#[async_trait::async_trait]
impl SpreadsheetGateway for InMemorySpreadsheets {
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &A1Notation,
    ) -> error_stack::Result<StringGrid, SpreadsheetError> {
        self.read(spreadsheet_id, range)
    }

    async fn read_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[A1Notation],
    ) -> error_stack::Result<Vec<StringGrid>, SpreadsheetError> {
        ranges
            .iter()
            .map(|range| self.read(spreadsheet_id, range))
            .collect()
    }

    async fn write_cells(
        &self,
        spreadsheet_id: &str,
        cells: &[CellWrite],
    ) -> error_stack::Result<usize, SpreadsheetError> {
        if self.fail_writes {
            return Err(report!(SpreadsheetError::FailedToWriteRange));
        }

        let mut sheets = self.sheets.lock().unwrap();
        for cell in cells {
            let range = CellRange::from_a1_notation(&cell.position)
                .change_context(SpreadsheetError::FailedToWriteRange)?;
            let sheet = range.sheet_title.unwrap_or_else(|| "Sheet1".to_string());
            sheets
                .entry((spreadsheet_id.to_owned(), sheet))
                .or_default()
                .insert(
                    (range.start.row.index(), range.start.col.index()),
                    cell.value.clone(),
                );
        }
        self.writes.lock().unwrap().extend_from_slice(cells);
        Ok(cells.len())
    }
}
