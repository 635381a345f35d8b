use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use error_stack::{report, ResultExt};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    domain::{
        grading::LabNumber,
        sheets::{
            a1_notation::{A1Notation, FromA1Notation},
            cell_range::CellRange,
        },
    },
    error::{GradingError, Result},
};

/// Spreadsheet id of a course whose register has not been set up yet.
pub const PLACEHOLDER_ID: &str = "<spreadsheet-id>";

/// Where grades live inside a register. Used as-is for courses given by a bare
/// spreadsheet id, and as fallback for fields a course entry leaves out.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RegisterLayout {
    /// Sheet (tab) titles searched for students, in order.
    pub sheets: Vec<String>,
    /// Single-column range holding student ids, e.g. `C8:C`.
    pub student_ids: String,
    /// Lab number → single-column range holding that lab's grades.
    pub labs: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
struct RegisterDetails {
    #[serde(alias = "ID")]
    id: String,
    #[serde(default)]
    sheets: Option<Vec<String>>,
    #[serde(default, alias = "moodle_ids")]
    student_ids: Option<String>,
    #[serde(default)]
    labs: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
enum RegisterEntry {
    Id(String),
    Details(RegisterDetails),
}

impl RegisterEntry {
    fn id(&self) -> &str {
        match self {
            RegisterEntry::Id(id) => id,
            RegisterEntry::Details(details) => &details.id,
        }
    }
}

/// A course's register with every range parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRegister {
    pub course: String,
    pub spreadsheet_id: String,
    pub sheets: Vec<String>,
    pub student_ids: CellRange,
    pub labs: BTreeMap<LabNumber, CellRange>,
}

impl CourseRegister {
    pub fn url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}",
            self.spreadsheet_id
        )
    }
}

/// Course name → grade register. Loaded once per run.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CourseRegistry {
    entries: BTreeMap<String, RegisterEntry>,
}

impl CourseRegistry {
    #[instrument(name = "CourseRegistry::load", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .change_context(GradingError::config("cannot open the course registry"))
            .attach_printable_lazy(|| format!("Registry file: {}", path.display()))?;

        let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(file));
        let registry: CourseRegistry = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| {
                let path_str = err.path().to_string();
                report!(GradingError::config("malformed course registry"))
                    .attach_printable(format!("{}: {}", path_str, err.inner()))
            })
            .attach_printable_lazy(|| format!("Registry file: {}", path.display()))?;

        tracing::debug!("Loaded {} courses", registry.entries.len());
        Ok(registry)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).change_context(GradingError::config("malformed course registry"))
    }

    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the register spreadsheet id of `course_name`.
    pub fn resolve(&self, course_name: &str) -> Result<&str> {
        let entry = self.entries.get(course_name).ok_or_else(|| {
            report!(GradingError::config(format!(
                "unknown course \"{}\"",
                course_name
            )))
            .attach_printable(format!(
                "Known courses: {}",
                self.courses().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let id = entry.id().trim();
        if id.is_empty() || id == PLACEHOLDER_ID {
            return Err(report!(GradingError::config(format!(
                "no register spreadsheet set for course \"{}\"",
                course_name
            ))));
        }

        Ok(id)
    }

    /// Resolves the full register of `course_name`, filling unset fields from
    /// `defaults`.
    pub fn register(&self, course_name: &str, defaults: &RegisterLayout) -> Result<CourseRegister> {
        let spreadsheet_id = self.resolve(course_name)?.to_owned();

        let (sheets, student_ids, labs) = match &self.entries[course_name] {
            RegisterEntry::Id(_) => (&defaults.sheets, &defaults.student_ids, &defaults.labs),
            RegisterEntry::Details(details) => (
                details.sheets.as_ref().unwrap_or(&defaults.sheets),
                details.student_ids.as_ref().unwrap_or(&defaults.student_ids),
                details.labs.as_ref().unwrap_or(&defaults.labs),
            ),
        };

        if sheets.is_empty() {
            return Err(report!(GradingError::config(format!(
                "register of \"{}\" lists no sheets",
                course_name
            ))));
        }

        let student_ids = parse_column_range(student_ids)
            .attach_printable_lazy(|| format!("student_ids of \"{}\"", course_name))?;

        let labs = labs
            .iter()
            .map(|(lab, range)| -> Result<(LabNumber, CellRange)> {
                let lab = lab.trim().parse::<LabNumber>().map_err(|_| {
                    report!(GradingError::config(format!(
                        "lab key \"{}\" of \"{}\" is not a number",
                        lab, course_name
                    )))
                })?;
                let range = parse_column_range(range)
                    .attach_printable_lazy(|| format!("lab {} of \"{}\"", lab, course_name))?;
                Ok((lab, range))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(CourseRegister {
            course: course_name.to_owned(),
            spreadsheet_id,
            sheets: sheets.clone(),
            student_ids,
            labs,
        })
    }
}

fn parse_column_range(range: &str) -> Result<CellRange> {
    let parsed = CellRange::from_a1_notation(&A1Notation::from(range))
        .change_context(GradingError::config(format!("invalid range \"{}\"", range)))?;
    if !parsed.is_single_column() {
        return Err(report!(GradingError::config(format!(
            "range \"{}\" must span a single column",
            range
        ))));
    }
    Ok(parsed)
}
