//! Subcommands of the `jorm` binary that do not touch a document.

pub mod generate;
