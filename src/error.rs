use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradingError {
    #[error("Configuration error: {details}")]
    Config { details: String },
    #[error("Failed to read from the spreadsheet service")]
    RemoteRead,
    #[error("Failed to write to the spreadsheet service")]
    RemoteWrite,
    #[error("Unexpected attendance sheet layout: {details}")]
    Schema { details: String },
    #[error("Invalid input: {details}")]
    Validation { details: String },
    #[error("No target cell for student {student}: {details}")]
    TargetNotFound { student: String, details: String },
}

impl GradingError {
    pub fn config<S: Into<String>>(details: S) -> Self {
        GradingError::Config {
            details: details.into(),
        }
    }

    pub fn schema<S: Into<String>>(details: S) -> Self {
        GradingError::Schema {
            details: details.into(),
        }
    }

    pub fn validation<S: Into<String>>(details: S) -> Self {
        GradingError::Validation {
            details: details.into(),
        }
    }

    pub fn target_not_found<S: Into<String>>(student: impl ToString, details: S) -> Self {
        GradingError::TargetNotFound {
            student: student.to_string(),
            details: details.into(),
        }
    }
}

pub type Result<T> = error_stack::Result<T, GradingError>;
