pub mod app_config;
pub mod attendance_config;
pub mod course_registry;
pub mod grading_config;
pub mod sheets_config;
