pub mod attendance_reader;
pub mod grade_computer;
pub mod grade_writer;
pub mod orchestrator;
