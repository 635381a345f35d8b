use error_stack::{report, ResultExt};

use super::{
    a1_notation::{
        generic_a1_notation_split, split_cell_reference, with_sheet_prefix, A1Notation,
        A1NotationParseError, FromA1Notation, ToA1Notation,
    },
    column::{parse_col, Column},
    row::Row,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPosition {
    pub col: Column,
    pub row: Row,
}

impl CellPosition {
    pub fn new(col: Column, row: Row) -> Self {
        CellPosition { col, row }
    }
}

impl ToA1Notation for CellPosition {
    fn to_a1_notation(&self, sheet_name: Option<&str>) -> A1Notation {
        with_sheet_prefix(sheet_name, &format!("{}{}", self.col, self.row))
    }
}

/// Parses a single cell such as `H12` or `'CA'!H12`. The sheet title, if any,
/// is discarded.
impl FromA1Notation for CellPosition {
    type Err = A1NotationParseError;

    fn from_a1_notation(a1_notation: &A1Notation) -> error_stack::Result<Self, Self::Err> {
        let parts = generic_a1_notation_split(a1_notation)?;
        if parts.end.is_some() {
            return Err(report!(A1NotationParseError::RowParseError))
                .attach_printable_lazy(|| format!("{} is a range, not a cell", a1_notation));
        }

        let (letters, digits) = split_cell_reference(&parts.start);
        let col = parse_col(letters)
            .change_context(A1NotationParseError::ColumnParseError)
            .attach_printable_lazy(|| format!("Invalid column in {}", a1_notation))?;
        let row = digits
            .parse::<Row>()
            .change_context(A1NotationParseError::RowParseError)
            .attach_printable_lazy(|| format!("Invalid row in {}", a1_notation))?;

        Ok(CellPosition { col, row })
    }
}
