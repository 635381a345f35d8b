use google_sheets4::api::ValueRange;
use serde_json::Value;
use std::borrow::Cow;

use crate::ports::spreadsheet::CellWrite;

pub trait ValueRangeFactory {
    fn from_single_cell<'a, T: Into<Cow<'a, str>>>(range: Option<String>, cell_value: T) -> Self;
}

fn wrap_value<'a, T: Into<Cow<'a, str>>>(value: T) -> Value {
    Value::String(value.into().into_owned())
}

impl ValueRangeFactory for ValueRange {
    fn from_single_cell<'a, T: Into<Cow<'a, str>>>(range: Option<String>, cell_value: T) -> Self {
        ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range,
            values: Some(vec![vec![wrap_value(cell_value)]]),
        }
    }
}

impl From<&CellWrite> for ValueRange {
    fn from(cell: &CellWrite) -> Self {
        ValueRange::from_single_cell(Some(cell.position.to_string()), cell.value.as_str())
    }
}
