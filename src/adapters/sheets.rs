pub mod auth;
pub mod http_client;
#[cfg(test)]
pub mod in_memory;
pub mod spreadsheet_manager;
pub mod string_grid;
pub mod value_range_factory;
