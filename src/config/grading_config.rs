use std::collections::BTreeMap;

use serde::Deserialize;

/// How a present student's grade is computed.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradePolicy {
    /// Same grade for every present student.
    Fixed { points: f64 },
    /// Grade per lab number. Keys are lab numbers written as strings.
    PerLab {
        points: BTreeMap<String, f64>,
        #[serde(default)]
        default: Option<f64>,
    },
    /// Grade taken from the attendance sheet's score column.
    AttendanceScore,
}

impl Default for GradePolicy {
    fn default() -> Self {
        GradePolicy::Fixed { points: 10.0 }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GradingConfig {
    /// Labs are numbered `1..=lab_count`.
    pub lab_count: u32,
    pub policy: GradePolicy,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            lab_count: 14,
            policy: GradePolicy::default(),
        }
    }
}
