use serde::Deserialize;

use crate::domain::grading::LabNumber;

/// Layout of the attendance sheet. Columns are found by their header text in
/// the first row of `range`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AttendanceConfig {
    pub range: String,
    pub student_header: String,
    pub ta_header: String,
    /// Header of the presence column; `{lab}` is replaced by the lab number.
    /// Empty when every listed student counts as present.
    pub presence_header: String,
    /// Header of a column holding a score per student, if any.
    pub score_header: Option<String>,
    /// Student cell value of rows that must be ignored.
    pub missing_marker: String,
    pub present_markers: Vec<String>,
}

impl AttendanceConfig {
    pub fn presence_header_for(&self, lab: LabNumber) -> Option<String> {
        let template = self.presence_header.trim();
        if template.is_empty() {
            None
        } else {
            Some(template.replace("{lab}", &lab.to_string()))
        }
    }

    pub fn is_present_marker(&self, cell: &str) -> bool {
        let cell = cell.trim();
        !cell.is_empty()
            && self
                .present_markers
                .iter()
                .any(|marker| marker.trim().eq_ignore_ascii_case(cell))
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            range: "'Lista de prezenta'!A1:Z".to_string(),
            student_header: "ID".to_string(),
            ta_header: "TA".to_string(),
            presence_header: "Lab {lab}".to_string(),
            score_header: None,
            missing_marker: "#N/A".to_string(),
            present_markers: ["1", "x", "p", "da", "yes", "true", "present", "prezent"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
