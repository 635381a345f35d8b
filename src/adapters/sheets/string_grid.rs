use serde_json::Value;

use crate::ports::spreadsheet::StringGrid;

pub trait IntoStringGrid {
    fn into_string_grid(self) -> StringGrid;
}

impl IntoStringGrid for Vec<Vec<Value>> {
    fn into_string_grid(self) -> StringGrid {
        self.into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_into_string_grid() {
        let grid = vec![
            vec![json!("ana.pop"), json!(10), json!(null)],
            vec![json!("say \"hi\""), json!(true)],
        ]
        .into_string_grid();

        assert_eq!(
            grid,
            vec![
                vec!["ana.pop".to_string(), "10".to_string(), String::new()],
                vec!["say \"hi\"".to_string(), "true".to_string()],
            ]
        );
    }
}
