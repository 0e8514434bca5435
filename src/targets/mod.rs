//! Built-in target implementations

pub mod search;
