//! Built-in product implementations

pub mod jac;
