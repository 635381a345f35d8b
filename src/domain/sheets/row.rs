use std::{fmt::Formatter, num::ParseIntError, str::FromStr};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Row {
    index: u32,
}

impl Row {
    pub fn from_index(index: u32) -> Self {
        Row { index }
    }

    pub fn from_row(row: u32) -> Self {
        Row {
            index: row.saturating_sub(1), // Convert to zero-based index
        }
    }

    /// Returns the row number as shown by the spreadsheet, starting from 1.
    /// # Examples
    /// ```
    /// use lab_grading::domain::sheets::row::Row;
    /// assert_eq!(Row::from_index(0).number(), 1);
    /// assert_eq!(Row::from_index(7).number(), 8);
    /// ```
    pub fn number(&self) -> u32 {
        self.index.saturating_add(1)
    }

    /// Returns the zero-based row index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Moves the row down by `offset` rows.
    /// # Examples
    /// ```
    /// use lab_grading::domain::sheets::row::Row;
    /// assert_eq!(Row::from_row(8).offset(3), Row::from_row(11));
    /// ```
    pub fn offset(&self, offset: u32) -> Row {
        Row::from_index(self.index.saturating_add(offset))
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row(index: {}, row: {})", self.index(), self.number())
    }
}

impl FromStr for Row {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Row::from_row(s.parse::<u32>()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_offset() {
        assert_eq!(Row::from_row(22).offset(4), Row::from_row(26));
        assert_eq!(Row::from_index(u32::MAX).offset(1), Row::from_index(u32::MAX));
    }

    #[test]
    fn test_row_display() {
        assert_eq!(Row::from_index(0).to_string(), "1");
    }

    #[test]
    fn test_row_debug() {
        assert_eq!(format!("{:?}", Row::from_index(4)), "Row(index: 4, row: 5)");
    }

    #[test]
    fn test_zero_row_saturates() {
        let row = Row::from_row(0);
        assert_eq!(row.index(), 0);
        assert_eq!(row.number(), 1);
    }

    #[test]
    fn test_row_from_str() {
        let row: Row = "5".parse().unwrap();
        assert_eq!(row, Row::from_row(5));
        assert!("abc".parse::<Row>().is_err());
    }
}
