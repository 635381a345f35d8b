pub mod grading;
pub mod sheets;
