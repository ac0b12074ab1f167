pub mod commands;
pub mod common;
pub mod output;

pub use common::OutputFormat;
