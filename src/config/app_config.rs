use std::path::{Path, PathBuf};

use config::Config;
use error_stack::{report, ResultExt};
use serde::Deserialize;
use serde_path_to_error::{Deserializer as PathDeserializer, Segment, Track};

use super::{
    attendance_config::AttendanceConfig, course_registry::RegisterLayout,
    grading_config::GradingConfig, sheets_config::SpreadsheetConfig,
};
use crate::error::{GradingError, Result};

pub const DEFAULT_CONFIG_NAME: &str = "Config";
pub const ENV_PREFIX: &str = "LAB_GRADING";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub auth: SpreadsheetConfig,
    /// JSON file mapping course names to registers.
    pub registers: PathBuf,
    pub attendance: AttendanceConfig,
    pub grading: GradingConfig,
    pub register_defaults: RegisterLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth: SpreadsheetConfig::default(),
            registers: PathBuf::from("course_registers.json"),
            attendance: AttendanceConfig::default(),
            grading: GradingConfig::default(),
            register_defaults: RegisterLayout::default(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from `path` (or `Config.*` in the working
    /// directory, which may be absent), then applies `LAB_GRADING__*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let config_name = path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| DEFAULT_CONFIG_NAME.to_string());

        let config = Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .change_context(GradingError::config("cannot read the configuration"))
            .attach_printable_lazy(|| format!("Config file: {}", config_name))?;

        let value = config
            .try_deserialize::<serde_json::Value>()
            .change_context(GradingError::config("cannot read the configuration"))?;

        Self::from_value(value).attach_printable_lazy(|| format!("Config file: {}", config_name))
    }

    fn from_value(value: serde_json::Value) -> Result<Self> {
        use serde::de::IntoDeserializer;

        let mut track = Track::new();
        let path_de = PathDeserializer::new(value.into_deserializer(), &mut track);
        AppConfig::deserialize(path_de).map_err(|e| {
            let path_str = track
                .path()
                .iter()
                .map(|seg| match seg {
                    Segment::Seq { index } => format!("[{}]", index),
                    Segment::Map { key } => format!(".{}", key),
                    Segment::Enum { variant } => format!("::{}", variant),
                    Segment::Unknown => String::from("<?>"),
                })
                .collect::<String>();
            report!(GradingError::config("invalid configuration")).attach_printable(format!(
                "{}\nField path: {}",
                e,
                path_str.trim_start_matches('.')
            ))
        })
    }

    /// The registry path given on the command line wins over the configured one.
    pub fn with_registers(mut self, registers: Option<PathBuf>) -> Self {
        if let Some(registers) = registers {
            self.registers = registers;
        }
        self
    }
}
