//! Built-in datasource implementations
//!
//! All built-in datasources operate on locally available files; network
//! scraping lives outside this crate.

pub mod curated;
pub mod journals;
