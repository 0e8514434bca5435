//! CLI module for the dataimport binary

#[cfg(feature = "cli")]
pub mod commands;
