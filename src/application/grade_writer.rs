use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use error_stack::ResultExt;
use tracing::instrument;

use crate::{
    config::course_registry::CourseRegister,
    domain::{
        grading::{
            EntryFailure, Grade, GradeEntry, LabNumber, SkipReason, SkippedEntry, StudentId,
            WriteReport,
        },
        sheets::{
            a1_notation::{A1Notation, ToA1Notation},
            cell_position::CellPosition,
            cell_range::CellRange,
        },
    },
    error::{GradingError, Result},
    ports::spreadsheet::{CellWrite, SpreadsheetGateway, StringGrid},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Plan the writes without sending them.
    pub dry_run: bool,
    /// Replace grades that differ from the computed one.
    pub overwrite: bool,
}

/// Where a student sits in the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StudentRow<'r> {
    sheet: &'r str,
    sheet_index: usize,
    position: CellPosition,
}

/// Snapshot of the register cells the writer needs: student ids and the
/// grade columns of the labs being written, for every sheet.
struct RegisterSnapshot<'r> {
    register: &'r CourseRegister,
    students: HashMap<StudentId, StudentRow<'r>>,
    /// (sheet index, lab) → lab column values, aligned to the lab range start.
    lab_columns: HashMap<(usize, LabNumber), Vec<String>>,
}

impl<'r> RegisterSnapshot<'r> {
    fn lab_range(&self, lab: LabNumber) -> Option<&'r CellRange> {
        self.register.labs.get(&lab)
    }

    /// Resolves the target cell of `entry` and the value it currently holds.
    fn locate(&self, entry: &GradeEntry) -> std::result::Result<(A1Notation, String), GradingError> {
        let lab_range = self.lab_range(entry.lab).ok_or_else(|| {
            GradingError::target_not_found(
                &entry.student,
                format!("no column configured for lab {}", entry.lab),
            )
        })?;
        let row = self.students.get(&entry.student).ok_or_else(|| {
            GradingError::target_not_found(
                &entry.student,
                format!("not found in sheets {:?}", self.register.sheets),
            )
        })?;

        let student_row = row.position.row;
        let below_end = lab_range.end_row.is_some_and(|end| student_row > end);
        if student_row < lab_range.start.row || below_end {
            return Err(GradingError::target_not_found(
                &entry.student,
                format!(
                    "row {} is outside the lab {} range {}",
                    student_row,
                    entry.lab,
                    lab_range.to_a1_notation(Some(row.sheet))
                ),
            ));
        }

        let target = CellPosition::new(lab_range.start.col, student_row);
        let offset = (student_row.index() - lab_range.start.row.index()) as usize;
        let existing = self
            .lab_columns
            .get(&(row.sheet_index, entry.lab))
            .and_then(|column| column.get(offset))
            .map(|value| value.trim().to_owned())
            .unwrap_or_default();

        Ok((target.to_a1_notation(Some(row.sheet)), existing))
    }
}

pub struct GradeWriter {
    gateway: Arc<dyn SpreadsheetGateway>,
    options: WriteOptions,
}

impl std::fmt::Debug for GradeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradeWriter")
            .field("options", &self.options)
            .finish()
    }
}

impl GradeWriter {
    pub fn new(gateway: Arc<dyn SpreadsheetGateway>, options: WriteOptions) -> Self {
        Self { gateway, options }
    }

    /// Writes `entries` into `register`. Entries whose target cell cannot be
    /// found are reported in [`WriteReport::failures`] without stopping the
    /// others.
    #[instrument(skip(self, register, entries), name = "GradeWriter::write", fields(course = %register.course, entries = entries.len()))]
    pub async fn write(&self, register: &CourseRegister, entries: &[GradeEntry]) -> Result<WriteReport> {
        let mut report = WriteReport {
            dry_run: self.options.dry_run,
            ..WriteReport::default()
        };
        if entries.is_empty() {
            return Ok(report);
        }

        let snapshot = self.snapshot(register, entries).await?;

        let mut planned: HashMap<A1Notation, Grade> = HashMap::new();
        let mut cells = Vec::new();
        for entry in entries {
            let (target, existing) = match snapshot.locate(entry) {
                Ok(found) => found,
                Err(error) => {
                    tracing::warn!("❌ {}", error);
                    report.failures.push(EntryFailure {
                        student: entry.student.clone(),
                        lab: entry.lab,
                        error,
                    });
                    continue;
                }
            };

            let current = match planned.get(&target) {
                Some(grade) => grade.to_string(),
                None => existing,
            };

            let skip_reason = if current.is_empty() {
                None
            } else if entry.grade.matches_cell(&current) {
                Some(SkipReason::Unchanged)
            } else if self.options.overwrite && !planned.contains_key(&target) {
                tracing::info!("Overwriting {} ({} → {})", target, current, entry.grade);
                None
            } else {
                Some(SkipReason::AlreadyGraded { existing: current })
            };

            if let Some(reason) = skip_reason {
                if let SkipReason::AlreadyGraded { existing } = &reason {
                    tracing::warn!(
                        "Student \"{}\" has already been graded for lab {} ({})",
                        entry.student,
                        entry.lab,
                        existing
                    );
                }
                report.skipped.push(SkippedEntry {
                    entry: entry.clone(),
                    reason,
                });
                continue;
            }

            planned.insert(target.clone(), entry.grade);
            report.written.push(target.to_string());
            cells.push(CellWrite {
                position: target,
                value: entry.grade.to_string(),
            });
        }

        if self.options.dry_run {
            for cell in &cells {
                tracing::info!("[dry run] {} ← {}", cell.position, cell.value);
            }
            return Ok(report);
        }
        if cells.is_empty() {
            tracing::info!("Nothing to write");
            return Ok(report);
        }

        let updated = self
            .gateway
            .write_cells(&register.spreadsheet_id, &cells)
            .await
            .change_context(GradingError::RemoteWrite)
            .attach_printable_lazy(|| format!("Register {}", register.url()))?;

        if updated != cells.len() {
            tracing::warn!("Sent {} cells but {} were updated", cells.len(), updated);
        }

        Ok(report)
    }

    #[instrument(skip_all)]
    async fn snapshot<'r>(
        &self,
        register: &'r CourseRegister,
        entries: &[GradeEntry],
    ) -> Result<RegisterSnapshot<'r>> {
        let labs: Vec<LabNumber> = entries
            .iter()
            .map(|entry| entry.lab)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|lab| register.labs.contains_key(lab))
            .collect();

        let per_sheet = 1 + labs.len();
        let mut ranges = Vec::with_capacity(register.sheets.len() * per_sheet);
        for sheet in &register.sheets {
            ranges.push(register.student_ids.to_a1_notation(Some(sheet)));
            for lab in &labs {
                ranges.push(register.labs[lab].to_a1_notation(Some(sheet)));
            }
        }

        tracing::trace!("📋 Reading {} register ranges", ranges.len());
        let grids = self
            .gateway
            .read_ranges(&register.spreadsheet_id, &ranges)
            .await
            .change_context(GradingError::RemoteRead)
            .attach_printable_lazy(|| format!("Register {}", register.url()))?;

        let mut snapshot = RegisterSnapshot {
            register,
            students: HashMap::new(),
            lab_columns: HashMap::new(),
        };

        let mut grids = grids.into_iter();
        for (sheet_index, sheet) in register.sheets.iter().enumerate() {
            let ids = grids.next().unwrap_or_default();
            for (offset, id) in first_column(ids).into_iter().enumerate() {
                let id = id.trim();
                if id.is_empty() {
                    continue;
                }
                let position = register.student_ids.cell_below_start(offset as u32);
                // The first sheet listing a student wins.
                snapshot
                    .students
                    .entry(StudentId::new(id))
                    .or_insert(StudentRow {
                        sheet,
                        sheet_index,
                        position,
                    });
            }

            for lab in &labs {
                let column = first_column(grids.next().unwrap_or_default());
                snapshot.lab_columns.insert((sheet_index, *lab), column);
            }
        }

        Ok(snapshot)
    }
}

fn first_column(grid: StringGrid) -> Vec<String> {
    grid.into_iter()
        .map(|row| row.into_iter().next().unwrap_or_default())
        .collect()
}
