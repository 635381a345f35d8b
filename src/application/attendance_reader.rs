use std::{collections::HashSet, sync::Arc};

use error_stack::{report, ResultExt};
use tracing::instrument;

use crate::{
    config::attendance_config::AttendanceConfig,
    domain::{
        grading::{parse_score, AttendanceRecord, LabNumber, StudentId},
        sheets::a1_notation::A1Notation,
    },
    error::{GradingError, Result},
    ports::spreadsheet::{SpreadsheetGateway, StringGrid},
};

/// Column positions resolved from the attendance header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttendanceColumns {
    student: usize,
    ta: Option<usize>,
    presence: Option<usize>,
    score: Option<usize>,
}

pub struct AttendanceReader {
    gateway: Arc<dyn SpreadsheetGateway>,
    config: AttendanceConfig,
}

impl std::fmt::Debug for AttendanceReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceReader")
            .field("range", &self.config.range)
            .finish()
    }
}

impl AttendanceReader {
    pub fn new(gateway: Arc<dyn SpreadsheetGateway>, config: AttendanceConfig) -> Self {
        Self { gateway, config }
    }

    /// Returns the students present at `lab`, restricted to `ta_filter`'s
    /// section when given. Each student appears at most once.
    #[instrument(skip(self), name = "AttendanceReader::fetch")]
    pub async fn fetch(
        &self,
        attendance_sheet_id: &str,
        lab: LabNumber,
        ta_filter: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>> {
        let range = A1Notation::from(self.config.range.as_str());
        tracing::trace!("📋 Reading attendance range {}", range);

        let grid = self
            .gateway
            .read_range(attendance_sheet_id, &range)
            .await
            .change_context(GradingError::RemoteRead)
            .attach_printable_lazy(|| {
                format!("Attendance sheet {} range {}", attendance_sheet_id, range)
            })?;

        let records = self.parse(grid, lab, ta_filter)?;
        tracing::info!("Found {} present students for lab {}", records.len(), lab);
        Ok(records)
    }

    fn parse(
        &self,
        grid: StringGrid,
        lab: LabNumber,
        ta_filter: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut rows = grid.into_iter();
        let header = rows.next().ok_or_else(|| {
            report!(GradingError::schema(format!(
                "range {} is empty",
                self.config.range
            )))
        })?;
        let columns = self.locate_columns(&header, lab, ta_filter.is_some())?;
        let ta_filter = ta_filter.map(str::trim);

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for (offset, row) in rows.enumerate() {
            let cell = |index: usize| row.get(index).map(|s| s.trim()).unwrap_or_default();

            let student = cell(columns.student);
            if student.is_empty() || student == self.config.missing_marker {
                continue;
            }

            let present = match columns.presence {
                Some(index) => self.config.is_present_marker(cell(index)),
                None => true,
            };
            if !present {
                continue;
            }

            let ta = columns.ta.map(cell).unwrap_or_default();
            if let Some(filter) = ta_filter {
                if !ta.eq_ignore_ascii_case(filter) {
                    continue;
                }
            }

            let student = StudentId::new(student);
            if !seen.insert(student.clone()) {
                // Header is the first row of the range.
                tracing::warn!(
                    "Student {} is listed more than once; ignoring data row {}",
                    student,
                    offset + 2
                );
                continue;
            }

            records.push(AttendanceRecord {
                student,
                ta: ta.to_owned(),
                present,
                score: columns.score.and_then(|index| parse_score(cell(index))),
            });
        }

        Ok(records)
    }

    fn locate_columns(
        &self,
        header: &[String],
        lab: LabNumber,
        needs_ta: bool,
    ) -> Result<AttendanceColumns> {
        let find = |name: &str| {
            header
                .iter()
                .position(|cell| cell.trim().eq_ignore_ascii_case(name.trim()))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                report!(GradingError::schema(format!("missing column \"{}\"", name)))
                    .attach_printable(format!("Header row: {:?}", header))
            })
        };

        let student = require(&self.config.student_header)?;
        let ta = if needs_ta {
            Some(require(&self.config.ta_header)?)
        } else {
            find(&self.config.ta_header)
        };
        let presence = match self.config.presence_header_for(lab) {
            Some(name) => Some(require(&name)?),
            None => None,
        };
        let score = match &self.config.score_header {
            Some(name) => Some(require(name)?),
            None => None,
        };

        Ok(AttendanceColumns {
            student,
            ta,
            presence,
            score,
        })
    }
}
