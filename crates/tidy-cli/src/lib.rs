//! CLI argument model and validation for the channel housekeeper binary.
//!
//! Parsing stays in [`cli_args`]; [`validation`] turns parsed flags into the
//! lifecycle policy and runtime configuration the sweep consumes.

pub mod cli_args;
pub mod validation;

pub use cli_args::Cli;
pub use validation::*;
