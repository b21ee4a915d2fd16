//! CLI module for argument parsing and output formatting.
//!
//! Arguments are parsed with clap; reports are rendered as aligned text,
//! JSON or comma-delimited records.

pub mod args;
pub mod output;
