use std::sync::Arc;

use error_stack::ResultExt;
use tracing::{instrument, Instrument};

use super::{
    attendance_reader::AttendanceReader,
    grade_computer::GradeComputer,
    grade_writer::{GradeWriter, WriteOptions},
};
use crate::{
    config::{
        app_config::AppConfig,
        course_registry::{CourseRegistry, RegisterLayout},
    },
    domain::grading::{EntryFailure, LabNumber, RunReport},
    error::Result,
    ports::spreadsheet::SpreadsheetGateway,
};

/// Stages of one grading run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RunStage {
    Idle,
    Authenticating,
    Reading,
    Computing,
    Writing,
    Done,
    Failed,
}

/// One grading request, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingRequest {
    pub lab: LabNumber,
    pub course: String,
    pub attendance_sheet_id: String,
    pub ta_filter: Option<String>,
}

pub struct Orchestrator {
    registry: CourseRegistry,
    register_defaults: RegisterLayout,
    reader: AttendanceReader,
    computer: GradeComputer,
    writer: GradeWriter,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("courses", &self.registry.courses().collect::<Vec<_>>())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        registry: CourseRegistry,
        register_defaults: RegisterLayout,
        reader: AttendanceReader,
        computer: GradeComputer,
        writer: GradeWriter,
    ) -> Self {
        Self {
            registry,
            register_defaults,
            reader,
            computer,
            writer,
        }
    }

    /// Builds every component from `config` around an authenticated gateway.
    pub fn from_config(
        config: &AppConfig,
        registry: CourseRegistry,
        gateway: Arc<dyn SpreadsheetGateway>,
        options: WriteOptions,
    ) -> Result<Self> {
        Ok(Self::new(
            registry,
            config.register_defaults.clone(),
            AttendanceReader::new(Arc::clone(&gateway), config.attendance.clone()),
            GradeComputer::new(&config.grading)?,
            GradeWriter::new(gateway, options),
        ))
    }

    /// Grades every present student of `request.lab` into the course register.
    /// Students that cannot be graded or located end up in the report;
    /// anything else aborts.
    #[instrument(skip(self), name = "Orchestrator::run")]
    pub async fn run(&self, request: &GradingRequest) -> Result<RunReport> {
        let mut stage = RunStage::Idle;
        let result = self.run_stages(request, &mut stage).await;
        match &result {
            Ok(report) => tracing::info!(
                "✅ {}: {} written, {} skipped, {} failed",
                RunStage::Done,
                report.written,
                report.skipped.len(),
                report.errors.len()
            ),
            Err(report) => tracing::error!(
                "❌ {} while {}: {}",
                RunStage::Failed,
                stage,
                report.current_context()
            ),
        }
        result
    }

    async fn run_stages(&self, request: &GradingRequest, stage: &mut RunStage) -> Result<RunReport> {
        self.computer.validate_lab(request.lab)?;
        let register = self
            .registry
            .register(&request.course, &self.register_defaults)?;
        tracing::info!("Class register: {}", register.url());

        *stage = RunStage::Reading;
        let records = self
            .reader
            .fetch(
                &request.attendance_sheet_id,
                request.lab,
                request.ta_filter.as_deref(),
            )
            .instrument(tracing::info_span!("stage", name = %stage))
            .await
            .attach_printable_lazy(|| format!("Attendance sheet {}", request.attendance_sheet_id))?;

        *stage = RunStage::Computing;
        let mut failures = Vec::new();
        let entries = {
            let _span = tracing::info_span!("stage", name = %stage).entered();
            let mut entries = Vec::with_capacity(records.len());
            for record in records.iter().filter(|record| record.present) {
                match self.computer.compute(record, request.lab) {
                    Ok(entry) => entries.push(entry),
                    Err(report) => {
                        tracing::warn!("❌ {}: {}", record.student, report.current_context());
                        failures.push(EntryFailure {
                            student: record.student.clone(),
                            lab: request.lab,
                            error: report.current_context().clone(),
                        });
                    }
                }
            }
            entries
        };

        *stage = RunStage::Writing;
        let written = self
            .writer
            .write(&register, &entries)
            .instrument(tracing::info_span!("stage", name = %stage))
            .await?;

        *stage = RunStage::Done;
        let mut report = RunReport::from(written);
        failures.append(&mut report.errors);
        report.errors = failures;
        report.register_url = Some(register.url());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        adapters::sheets::in_memory::InMemorySpreadsheets,
        config::grading_config::{GradePolicy, GradingConfig},
        error::GradingError,
    };

    const ATTENDANCE: &str = "attendance";
    const REGISTER: &str = "register";

    fn spreadsheets() -> Arc<InMemorySpreadsheets> {
        Arc::new(
            InMemorySpreadsheets::new()
                .with_rows(
                    ATTENDANCE,
                    "Lista de prezenta",
                    "A1",
                    &[
                        &["ID", "TA", "Lab 1", "Lab 2"],
                        &["S1", "TA1", "x", "x"],
                        &["S2", "TA1", "", "x"],
                        &["S3", "TA2", "x", "x"],
                        &["S4", "TA2", "x", ""],
                    ],
                )
                .with_rows(
                    REGISTER,
                    "CA",
                    "C8",
                    &[&["S1"], &["S2"], &["S3"]],
                ),
        )
    }

    fn config() -> AppConfig {
        AppConfig {
            grading: GradingConfig {
                lab_count: 12,
                policy: GradePolicy::Fixed { points: 10.0 },
            },
            register_defaults: RegisterLayout {
                sheets: vec!["CA".to_string()],
                student_ids: "C8:C".to_string(),
                labs: BTreeMap::from([
                    ("1".to_string(), "H8:H".to_string()),
                    ("2".to_string(), "I8:I".to_string()),
                ]),
            },
            ..AppConfig::default()
        }
    }

    fn orchestrator(spreadsheets: &Arc<InMemorySpreadsheets>) -> Orchestrator {
        orchestrator_with(spreadsheets, &config())
    }

    fn orchestrator_with(spreadsheets: &Arc<InMemorySpreadsheets>, config: &AppConfig) -> Orchestrator {
        let registry = CourseRegistry::from_json_str(r#"{"IOCLA": "register"}"#).unwrap();
        Orchestrator::from_config(
            config,
            registry,
            spreadsheets.clone(),
            WriteOptions::default(),
        )
        .unwrap()
    }

    fn request(lab: LabNumber, course: &str, ta: Option<&str>) -> GradingRequest {
        GradingRequest {
            lab,
            course: course.to_string(),
            attendance_sheet_id: ATTENDANCE.to_string(),
            ta_filter: ta.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_run_grades_present_students_of_ta() {
        let spreadsheets = spreadsheets();

        let report = orchestrator(&spreadsheets)
            .run(&request(1, "IOCLA", Some("TA1")))
            .await
            .unwrap();

        assert_eq!(report.written, 1);
        assert!(report.is_success());
        assert_eq!(spreadsheets.cell(REGISTER, "CA", "H8").as_deref(), Some("10"));
        // S2 was absent, S3 belongs to another TA.
        assert_eq!(spreadsheets.cell(REGISTER, "CA", "H9"), None);
        assert_eq!(spreadsheets.cell(REGISTER, "CA", "H10"), None);
    }

    #[tokio::test]
    async fn test_run_collects_missing_students() {
        let spreadsheets = spreadsheets();

        let report = orchestrator(&spreadsheets)
            .run(&request(1, "IOCLA", None))
            .await
            .unwrap();

        // S4 attended but is not in the register.
        assert_eq!(report.written, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(!report.is_success());
        assert_eq!(spreadsheets.cell(REGISTER, "CA", "H10").as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_unusable_score_fails_only_that_student() {
        let spreadsheets = Arc::new(
            InMemorySpreadsheets::new()
                .with_rows(
                    "scores",
                    "Lista de prezenta",
                    "A1",
                    &[&["ID", "Nota"], &["S1", "10"], &["S2", "absent?"], &["S3", "9"]],
                )
                .with_rows(REGISTER, "CA", "C8", &[&["S1"], &["S2"], &["S3"]]),
        );
        let mut config = config();
        config.attendance.presence_header = String::new();
        config.attendance.score_header = Some("Nota".to_string());
        config.grading.policy = GradePolicy::AttendanceScore;

        let report = orchestrator_with(&spreadsheets, &config)
            .run(&GradingRequest {
                attendance_sheet_id: "scores".to_string(),
                ..request(1, "IOCLA", None)
            })
            .await
            .unwrap();

        assert_eq!(report.written, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].student.as_str(), "S2");
        assert!(matches!(report.errors[0].error, GradingError::Validation { .. }));
        assert_eq!(spreadsheets.cell(REGISTER, "CA", "H8").as_deref(), Some("10"));
        assert_eq!(spreadsheets.cell(REGISTER, "CA", "H9"), None);
        assert_eq!(spreadsheets.cell(REGISTER, "CA", "H10").as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_report_carries_register_url() {
        let report = orchestrator(&spreadsheets())
            .run(&request(1, "IOCLA", None))
            .await
            .unwrap();
        assert_eq!(
            report.register_url.as_deref(),
            Some("https://docs.google.com/spreadsheets/d/register")
        );
    }

    #[tokio::test]
    async fn test_rerun_only_skips() {
        let spreadsheets = spreadsheets();
        let orchestrator = orchestrator(&spreadsheets);

        orchestrator.run(&request(2, "IOCLA", None)).await.unwrap();
        let report = orchestrator.run(&request(2, "IOCLA", None)).await.unwrap();

        assert_eq!(report.written, 0);
        assert_eq!(report.skipped.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_course_aborts_before_reading() {
        let spreadsheets = spreadsheets();

        let err = orchestrator(&spreadsheets)
            .run(&request(1, "PCLP", None))
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), GradingError::Config { .. }));
        assert!(spreadsheets.writes().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_lab_aborts() {
        let spreadsheets = spreadsheets();

        let err = orchestrator(&spreadsheets)
            .run(&request(0, "IOCLA", None))
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), GradingError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_bad_attendance_layout_aborts() {
        let spreadsheets = spreadsheets();

        let err = orchestrator(&spreadsheets)
            .run(&request(7, "IOCLA", None))
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), GradingError::Schema { .. }));
    }
}
