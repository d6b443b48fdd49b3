// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod app;
pub mod cli;
pub mod config;
pub mod results_grid;
pub mod table_editor;
pub mod test_utils;
pub mod tui;
