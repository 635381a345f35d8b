use std::{fmt::Formatter, str::FromStr};

use thiserror::Error;

/// A spreadsheet column, stored as its 1-based number (`A` is 1).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column(u32);

impl Column {
    /// Builds a column from its zero-based index (`0` is `A`).
    pub fn from_index(index: u32) -> Self {
        Column(index.saturating_add(1))
    }

    /// Returns the 1-based column number.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns the zero-based column index.
    pub fn index(&self) -> u32 {
        self.0 - 1
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", number_to_letters(self.0))
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Show both the numeric and letter representation
        write!(f, "Column(u32: {}, letters: {})", self.0, self)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColumnParseError {
    #[error("Empty column")]
    Empty,
    #[error("Non-alphabetic character in column")]
    NonAlphabeticCharacter,
    #[error("Column out of range")]
    Overflow,
}

impl FromStr for Column {
    type Err = ColumnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_col(s)
    }
}

impl From<Column> for String {
    fn from(col: Column) -> Self {
        number_to_letters(col.0)
    }
}

pub fn parse_col<T: AsRef<str>>(col_str: T) -> Result<Column, ColumnParseError> {
    let col_str = col_str.as_ref();
    if col_str.is_empty() {
        return Err(ColumnParseError::Empty);
    }
    if col_str.chars().any(|c| !c.is_ascii_alphabetic()) {
        return Err(ColumnParseError::NonAlphabeticCharacter);
    }

    let col_num = col_str
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .try_fold(0u32, |acc, c| {
            acc.checked_mul(26)?
                .checked_add(c as u32 - 'A' as u32 + 1)
        })
        .ok_or(ColumnParseError::Overflow)?;

    Ok(Column(col_num))
}

fn number_to_letters(number: u32) -> String {
    let mut number = number;
    let mut result = String::new();
    while number > 0 {
        let remainder = (number - 1) % 26;
        let letter = (remainder as u8 + b'A') as char;
        result.push(letter);
        number = (number - remainder) / 26;
    }
    result.chars().rev().collect()
}
