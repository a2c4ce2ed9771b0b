//! Evalog command-line interface.
//!
//! Wires configuration resolution, the experiment log writer and the
//! scoring helpers into the `evalog` binary.

pub mod cli;
pub mod commands;
pub mod exit_codes;
pub mod logging;

pub use cli::Cli;
pub use commands::run;
pub use exit_codes::ExitCode;
