use std::fmt::Formatter;
use thiserror::Error;

/// A range or cell address in A1 notation, e.g. `'Sheet 1'!C8:C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct A1Notation(pub String);

impl std::fmt::Display for A1Notation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<A1Notation> for String {
    fn from(a1_notation: A1Notation) -> Self {
        a1_notation.0
    }
}

impl From<String> for A1Notation {
    fn from(s: String) -> Self {
        A1Notation(s)
    }
}

impl From<&str> for A1Notation {
    fn from(s: &str) -> Self {
        A1Notation(s.to_owned())
    }
}

impl AsRef<str> for A1Notation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub trait ToA1Notation {
    fn to_a1_notation(&self, sheet_name: Option<&str>) -> A1Notation;
}

pub trait FromA1Notation: Sized {
    type Err;

    fn from_a1_notation(a1_notation: &A1Notation) -> error_stack::Result<Self, Self::Err>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum A1NotationParseError {
    #[error("Error parsing column")]
    ColumnParseError,
    #[error("Error parsing row")]
    RowParseError,
    #[error("Malformed sheet title")]
    SheetTitleParseError,
}

/// Prefixes `local` with a sheet title, quoting the title the way the Sheets
/// API expects (`'` doubled inside quotes).
pub fn with_sheet_prefix(sheet_name: Option<&str>, local: &str) -> A1Notation {
    match sheet_name {
        Some(sheet_name) => {
            A1Notation(format!("'{}'!{}", sheet_name.replace('\'', "''"), local))
        }
        None => A1Notation(local.to_owned()),
    }
}

pub struct A1NotationParts {
    pub start: String,
    pub end: Option<String>,
    pub sheet_title: Option<String>,
}

pub fn generic_a1_notation_split(
    a1_notation: &A1Notation,
) -> Result<A1NotationParts, A1NotationParseError> {
    let (sheet_title, local_a1_notation) = match a1_notation.0.rfind('!') {
        Some(index) => {
            let (sheet_title, local_a1_notation) = a1_notation.0.split_at(index);
            (
                Some(unquote_sheet_title(sheet_title)?),
                local_a1_notation.trim_start_matches('!'),
            )
        }
        None => (None, a1_notation.0.as_str()),
    };

    let (start, end) = match local_a1_notation.split_once(':') {
        Some((start, end)) => (start.to_owned(), Some(end.to_owned())),
        None => (local_a1_notation.to_owned(), None),
    };

    Ok(A1NotationParts {
        sheet_title,
        start,
        end,
    })
}

fn unquote_sheet_title(raw: &str) -> Result<String, A1NotationParseError> {
    match raw.strip_prefix('\'') {
        Some(rest) => rest
            .strip_suffix('\'')
            .map(|title| title.replace("''", "'"))
            .ok_or(A1NotationParseError::SheetTitleParseError),
        None if raw.is_empty() => Err(A1NotationParseError::SheetTitleParseError),
        None => Ok(raw.to_owned()),
    }
}

/// Splits a cell reference like `C8` into its letters and digits.
pub(crate) fn split_cell_reference(reference: &str) -> (&str, &str) {
    let reference = reference.trim().trim_start_matches('$');
    let boundary = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(reference.len());
    let (letters, digits) = reference.split_at(boundary);
    (letters, digits.trim_start_matches('$'))
}
