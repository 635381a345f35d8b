use error_stack::ResultExt;

use super::{
    a1_notation::{
        generic_a1_notation_split, split_cell_reference, with_sheet_prefix, A1Notation,
        A1NotationParseError, FromA1Notation, ToA1Notation,
    },
    cell_position::CellPosition,
    column::{parse_col, Column},
    row::Row,
};

/// A rectangular range. `end_row` is `None` for open ranges such as `C8:C`,
/// which extend to the last row of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellPosition,
    pub end_col: Column,
    pub end_row: Option<Row>,
    pub sheet_title: Option<String>,
}

impl CellRange {
    pub fn column_count(&self) -> u32 {
        self.end_col.value().saturating_sub(self.start.col.value()) + 1
    }

    pub fn is_single_column(&self) -> bool {
        self.column_count() == 1
    }

    /// Position of the `offset`-th cell below the top-left corner.
    pub fn cell_below_start(&self, offset: u32) -> CellPosition {
        CellPosition::new(self.start.col, self.start.row.offset(offset))
    }
}

impl ToA1Notation for CellRange {
    fn to_a1_notation(&self, sheet_name: Option<&str>) -> A1Notation {
        let end = match self.end_row {
            Some(row) => format!("{}{}", self.end_col, row),
            None => self.end_col.to_string(),
        };
        let local = format!("{}{}:{}", self.start.col, self.start.row, end);
        with_sheet_prefix(sheet_name.or(self.sheet_title.as_deref()), &local)
    }
}

impl FromA1Notation for CellRange {
    type Err = A1NotationParseError;

    fn from_a1_notation(a1_notation: &A1Notation) -> error_stack::Result<Self, Self::Err> {
        let parts = generic_a1_notation_split(a1_notation)?;

        let (start_letters, start_digits) = split_cell_reference(&parts.start);
        let start_col = parse_col(start_letters)
            .change_context(A1NotationParseError::ColumnParseError)
            .attach_printable_lazy(|| format!("Invalid start column in {}", a1_notation))?;
        // `C:C` starts at the first row.
        let start_row = if start_digits.is_empty() {
            Row::from_index(0)
        } else {
            start_digits
                .parse::<Row>()
                .change_context(A1NotationParseError::RowParseError)
                .attach_printable_lazy(|| format!("Invalid start row in {}", a1_notation))?
        };

        let (end_col, end_row) = match parts.end.as_deref() {
            None => (start_col, Some(start_row)),
            Some(end) => {
                let (end_letters, end_digits) = split_cell_reference(end);
                let end_col = parse_col(end_letters)
                    .change_context(A1NotationParseError::ColumnParseError)
                    .attach_printable_lazy(|| format!("Invalid end column in {}", a1_notation))?;
                let end_row = if end_digits.is_empty() {
                    None
                } else {
                    Some(
                        end_digits
                            .parse::<Row>()
                            .change_context(A1NotationParseError::RowParseError)
                            .attach_printable_lazy(|| {
                                format!("Invalid end row in {}", a1_notation)
                            })?,
                    )
                };
                (end_col, end_row)
            }
        };

        if end_col < start_col || end_row.is_some_and(|end| end < start_row) {
            return Err(error_stack::report!(A1NotationParseError::RowParseError))
                .attach_printable_lazy(|| format!("Range {} ends before it starts", a1_notation));
        }

        Ok(CellRange {
            start: CellPosition::new(start_col, start_row),
            end_col,
            end_row,
            sheet_title: parts.sheet_title,
        })
    }
}
