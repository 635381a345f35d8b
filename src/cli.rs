use std::path::PathBuf;

use clap::Parser;

use crate::{
    application::{grade_writer::WriteOptions, orchestrator::GradingRequest},
    domain::grading::{LabNumber, RunReport},
    error::Result,
};

/// Grades the students who attended a lab into the course's grade register.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[clap(name = "lab-grading", version)]
pub struct Args {
    /// Lab number to grade.
    #[clap(long)]
    pub lab: LabNumber,
    /// Only grade the students of this teaching assistant.
    #[clap(long)]
    pub ta: Option<String>,
    /// Spreadsheet id of the attendance sheet.
    #[clap(long = "attendance")]
    pub attendance_sheet_id: String,
    /// Course name, as listed in the course registry.
    #[clap(long)]
    pub course: String,
    /// Configuration file. Defaults to `Config.*` in the working directory.
    #[clap(long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,
    /// Course registry file, overriding the configured one.
    #[clap(long)]
    pub registers: Option<PathBuf>,
    /// Log the planned writes without sending them.
    #[clap(long)]
    pub dry_run: bool,
    /// Replace grades already present in the register.
    #[clap(long)]
    pub overwrite: bool,
    /// Log everything down to trace level.
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn request(&self) -> GradingRequest {
        GradingRequest {
            lab: self.lab,
            course: self.course.trim().to_owned(),
            attendance_sheet_id: self.attendance_sheet_id.trim().to_owned(),
            ta_filter: self
                .ta
                .as_deref()
                .map(str::trim)
                .filter(|ta| !ta.is_empty())
                .map(String::from),
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            dry_run: self.dry_run,
            overwrite: self.overwrite,
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::TRACE
        } else {
            tracing::Level::INFO
        }
    }
}

/// 0 when every entry went through, 1 when some entries failed, 2 when the
/// run aborted.
pub fn exit_code(result: &Result<RunReport>) -> u8 {
    match result {
        Ok(report) if report.is_success() => 0,
        Ok(_) => 1,
        Err(_) => 2,
    }
}

#[cfg(test)]
mod tests {
    use error_stack::report;

    use super::*;
    use crate::{
        domain::grading::{EntryFailure, StudentId},
        error::GradingError,
    };

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lab-grading").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_required_flags() {
        let args = parse(&["--lab", "3", "--attendance", "sheet-id", "--course", "IOCLA"]);

        assert_eq!(
            args.request(),
            GradingRequest {
                lab: 3,
                course: "IOCLA".to_string(),
                attendance_sheet_id: "sheet-id".to_string(),
                ta_filter: None,
            }
        );
        assert_eq!(args.write_options(), WriteOptions::default());
        assert_eq!(args.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_parse_optional_flags() {
        let args = parse(&[
            "--lab", "1", "--attendance", "id", "--course", "PCLP", "--ta", " TA1 ",
            "--registers", "regs.json", "--dry-run", "--overwrite", "-v",
        ]);

        assert_eq!(args.request().ta_filter.as_deref(), Some("TA1"));
        assert_eq!(args.registers, Some(PathBuf::from("regs.json")));
        assert!(args.write_options().dry_run);
        assert!(args.write_options().overwrite);
        assert_eq!(args.log_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_blank_ta_means_no_filter() {
        let args = parse(&["--lab", "1", "--attendance", "id", "--course", "PCLP", "--ta", " "]);
        assert_eq!(args.request().ta_filter, None);
    }

    #[test]
    fn test_lab_must_be_a_number() {
        let result = Args::try_parse_from([
            "lab-grading", "--lab", "two", "--attendance", "id", "--course", "PCLP",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_codes() {
        let ok: Result<RunReport> = Ok(RunReport::default());
        assert_eq!(exit_code(&ok), 0);

        let partial: Result<RunReport> = Ok(RunReport {
            written: 1,
            errors: vec![EntryFailure {
                student: StudentId::new("S9"),
                lab: 1,
                error: GradingError::target_not_found("S9", "not in the register"),
            }],
            ..RunReport::default()
        });
        assert_eq!(exit_code(&partial), 1);

        let aborted: Result<RunReport> = Err(report!(GradingError::RemoteRead));
        assert_eq!(exit_code(&aborted), 2);
    }
}
