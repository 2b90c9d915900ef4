pub mod changelog_dir;
pub mod cli;
pub mod config;
pub mod domain;
pub mod editor;
pub mod error;
pub mod git;
pub mod release;
pub mod ui;
pub mod warning;

pub use error::{CldrError, Result};
