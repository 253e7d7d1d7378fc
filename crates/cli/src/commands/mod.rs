//! CLI subcommands

pub mod report;
pub mod status;
