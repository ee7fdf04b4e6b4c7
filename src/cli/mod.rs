//! CLI argument parsing and output formatting
//!
//! Arguments are defined with clap derive; every printable value implements
//! [`output::TableDisplay`] next to its serde JSON form.

pub mod args;
pub mod output;

pub use args::{Cli, Commands, InfoArgs, OutputFormat};
pub use output::{print_output, TableDisplay};
