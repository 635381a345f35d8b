use std::fmt::{self, Display, Formatter};

use crate::error::GradingError;

/// Identifier of a student as written on the attendance sheet and in the
/// register (usually the Moodle ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(id: impl AsRef<str>) -> Self {
        StudentId(id.as_ref().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StudentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type LabNumber = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub student: StudentId,
    pub ta: String,
    pub present: bool,
    /// Value of the attendance sheet's score column, when one is configured.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Grade(f64);

impl Grade {
    pub fn new(value: f64) -> Self {
        Grade(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether a register cell already holds this grade. Accepts `,` as the
    /// decimal separator.
    pub fn matches_cell(&self, cell: &str) -> bool {
        match parse_score(cell) {
            Some(existing) => (existing - self.0).abs() < 1e-9,
            None => cell.trim() == self.to_string(),
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Parses a numeric cell, accepting `,` as the decimal separator.
pub fn parse_score(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeEntry {
    pub student: StudentId,
    pub lab: LabNumber,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The target cell already holds the same grade.
    Unchanged,
    /// The target cell holds a different value and overwriting is disabled.
    AlreadyGraded { existing: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub entry: GradeEntry,
    pub reason: SkipReason,
}

/// A student who could not be graded, either because no grade could be
/// computed or because the register has no cell for them.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFailure {
    pub student: StudentId,
    pub lab: LabNumber,
    pub error: GradingError,
}

/// Outcome of writing one batch of grades to a register.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    /// Cells written (or, in a dry run, that would have been written).
    pub written: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    pub failures: Vec<EntryFailure>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Cells written, or only planned when `dry_run` is set.
    pub written: usize,
    pub skipped: Vec<SkippedEntry>,
    pub errors: Vec<EntryFailure>,
    pub dry_run: bool,
    pub register_url: Option<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<WriteReport> for RunReport {
    fn from(report: WriteReport) -> Self {
        RunReport {
            written: report.written.len(),
            skipped: report.skipped,
            errors: report.failures,
            dry_run: report.dry_run,
            register_url: None,
        }
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let written = if self.dry_run {
            "planned (dry run, nothing sent)"
        } else {
            "written"
        };
        if let Some(url) = &self.register_url {
            writeln!(f, "Register: {}", url)?;
        }
        for skipped in &self.skipped {
            match &skipped.reason {
                SkipReason::Unchanged => {
                    writeln!(f, "⏭️  {}: already has {}", skipped.entry.student, skipped.entry.grade)?
                }
                SkipReason::AlreadyGraded { existing } => writeln!(
                    f,
                    "⚠️  {}: already graded for lab {} ({})",
                    skipped.entry.student, skipped.entry.lab, existing
                )?,
            }
        }
        for failure in &self.errors {
            writeln!(f, "❌ {}: {}", failure.student, failure.error)?;
        }
        write!(
            f,
            "Summary: {} {}, {} skipped, {} failed",
            self.written,
            written,
            self.skipped.len(),
            self.errors.len()
        )
    }
}
