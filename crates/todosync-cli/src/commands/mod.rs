//! Command handlers, one module per command group

pub mod config;
pub mod status;
pub mod todo;
