use thiserror::Error;

use crate::domain::sheets::a1_notation::A1Notation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetError {
    #[error("Failed to authenticate against the spreadsheet service")]
    FailedToAuthenticate,
    #[error("Failed to fetch range")]
    FailedToFetchRange,
    #[error("Failed to write range")]
    FailedToWriteRange,
}

/// A single cell to be written, addressed with its sheet title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub position: A1Notation,
    pub value: String,
}

/// Rows of cells rendered as strings. Trailing empty rows and cells may be
/// missing, as in the Sheets API.
pub type StringGrid = Vec<Vec<String>>;

#[async_trait::async_trait]
pub trait SpreadsheetGateway: Send + Sync {
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &A1Notation,
    ) -> error_stack::Result<StringGrid, SpreadsheetError>;

    /// Reads several ranges in one request. The result has one grid per
    /// requested range, in order.
    async fn read_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[A1Notation],
    ) -> error_stack::Result<Vec<StringGrid>, SpreadsheetError>;

    /// Writes all cells in one request and returns the number of cells the
    /// service reports as updated.
    async fn write_cells(
        &self,
        spreadsheet_id: &str,
        cells: &[CellWrite],
    ) -> error_stack::Result<usize, SpreadsheetError>;
}
