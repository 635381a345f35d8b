use std::collections::BTreeMap;

use error_stack::report;

use crate::{
    config::grading_config::{GradePolicy, GradingConfig},
    domain::grading::{AttendanceRecord, Grade, GradeEntry, LabNumber},
    error::{GradingError, Result},
};

#[derive(Debug, Clone, PartialEq)]
enum Policy {
    Fixed(f64),
    PerLab {
        points: BTreeMap<LabNumber, f64>,
        default: Option<f64>,
    },
    AttendanceScore,
}

/// Turns attendance into grades. Holds no state besides its configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeComputer {
    lab_count: u32,
    policy: Policy,
}

impl GradeComputer {
    pub fn new(config: &GradingConfig) -> Result<Self> {
        let policy = match &config.policy {
            GradePolicy::Fixed { points } => Policy::Fixed(*points),
            GradePolicy::PerLab { points, default } => Policy::PerLab {
                points: points
                    .iter()
                    .map(|(lab, value)| {
                        lab.trim()
                            .parse::<LabNumber>()
                            .map(|lab| (lab, *value))
                            .map_err(|_| {
                                report!(GradingError::config(format!(
                                    "grading policy lab \"{}\" is not a number",
                                    lab
                                )))
                            })
                    })
                    .collect::<Result<_>>()?,
                default: *default,
            },
            GradePolicy::AttendanceScore => Policy::AttendanceScore,
        };

        Ok(Self {
            lab_count: config.lab_count,
            policy,
        })
    }

    pub fn validate_lab(&self, lab: LabNumber) -> Result<()> {
        if lab == 0 || lab > self.lab_count {
            return Err(report!(GradingError::validation(format!(
                "lab number {} is outside 1..={}",
                lab, self.lab_count
            ))));
        }
        Ok(())
    }

    pub fn compute(&self, record: &AttendanceRecord, lab: LabNumber) -> Result<GradeEntry> {
        self.validate_lab(lab)?;
        if !record.present {
            return Err(report!(GradingError::validation(format!(
                "student {} did not attend lab {}",
                record.student, lab
            ))));
        }

        let points = match &self.policy {
            Policy::Fixed(points) => *points,
            Policy::PerLab { points, default } => {
                points.get(&lab).copied().or(*default).ok_or_else(|| {
                    report!(GradingError::validation(format!(
                        "no grade configured for lab {}",
                        lab
                    )))
                })?
            }
            Policy::AttendanceScore => record.score.ok_or_else(|| {
                report!(GradingError::validation(format!(
                    "student {} has no numeric score on the attendance sheet",
                    record.student
                )))
            })?,
        };

        Ok(GradeEntry {
            student: record.student.clone(),
            lab,
            grade: Grade::new(points),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grading::StudentId;

    fn record(student: &str, present: bool, score: Option<f64>) -> AttendanceRecord {
        AttendanceRecord {
            student: StudentId::new(student),
            ta: "TA1".to_string(),
            present,
            score,
        }
    }

    fn computer(policy: GradePolicy) -> GradeComputer {
        GradeComputer::new(&GradingConfig {
            lab_count: 12,
            policy,
        })
        .unwrap()
    }

    #[test]
    fn test_fixed_policy() {
        let computer = computer(GradePolicy::Fixed { points: 10.0 });
        let entry = computer.compute(&record("S1", true, None), 3).unwrap();
        assert_eq!(
            entry,
            GradeEntry {
                student: StudentId::new("S1"),
                lab: 3,
                grade: Grade::new(10.0),
            }
        );
    }

    #[test]
    fn test_compute_is_deterministic() {
        let computer = computer(GradePolicy::Fixed { points: 0.5 });
        let record = record("S1", true, None);
        assert_eq!(
            computer.compute(&record, 1).unwrap(),
            computer.compute(&record, 1).unwrap()
        );
    }

    #[test]
    fn test_per_lab_policy_with_default() {
        let computer = computer(GradePolicy::PerLab {
            points: BTreeMap::from([("1".to_string(), 1.0), ("12".to_string(), 2.5)]),
            default: Some(0.5),
        });
        let present = record("S1", true, None);
        assert_eq!(computer.compute(&present, 12).unwrap().grade, Grade::new(2.5));
        assert_eq!(computer.compute(&present, 4).unwrap().grade, Grade::new(0.5));
    }

    #[test]
    fn test_per_lab_policy_without_default() {
        let computer = computer(GradePolicy::PerLab {
            points: BTreeMap::from([("1".to_string(), 1.0)]),
            default: None,
        });
        let err = computer.compute(&record("S1", true, None), 2).unwrap_err();
        assert!(matches!(err.current_context(), GradingError::Validation { .. }));
    }

    #[test]
    fn test_per_lab_policy_rejects_bad_keys() {
        let err = GradeComputer::new(&GradingConfig {
            lab_count: 12,
            policy: GradePolicy::PerLab {
                points: BTreeMap::from([("first".to_string(), 1.0)]),
                default: None,
            },
        })
        .unwrap_err();
        assert!(matches!(err.current_context(), GradingError::Config { .. }));
    }

    #[test]
    fn test_attendance_score_policy() {
        let computer = computer(GradePolicy::AttendanceScore);
        assert_eq!(
            computer.compute(&record("S1", true, Some(9.5)), 2).unwrap().grade,
            Grade::new(9.5)
        );
        let err = computer.compute(&record("S2", true, None), 2).unwrap_err();
        assert!(matches!(err.current_context(), GradingError::Validation { .. }));
    }

    #[test]
    fn test_invalid_lab_numbers() {
        let computer = computer(GradePolicy::default());
        for lab in [0, 13] {
            let err = computer.compute(&record("S1", true, None), lab).unwrap_err();
            assert!(matches!(err.current_context(), GradingError::Validation { .. }));
        }
        assert!(computer.validate_lab(12).is_ok());
    }

    #[test]
    fn test_absent_record_yields_no_entry() {
        let computer = computer(GradePolicy::default());
        assert!(computer.compute(&record("S1", false, None), 1).is_err());
    }
}
