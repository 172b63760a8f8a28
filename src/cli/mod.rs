/*!
# CLI module
Command line interface functionality that is specific to Meerkat.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The convert CLI subcommand
pub mod convert;
/// The run CLI subcommand
pub mod run;
/// The score CLI subcommand
pub mod score;
