pub mod api;
pub mod auth;
pub mod board;
pub mod cli;
pub mod form;
pub mod logging;
pub mod settings;
pub mod tasks;
pub mod tomlfile;
pub mod tui;
pub mod types;
