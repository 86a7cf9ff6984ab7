pub mod config;
pub mod log;
pub mod prefs_file;
