//! md2enex CLI library
//!
//! Argument definitions, config file loading and the `convert` / `batch`
//! commands behind the `md2enex` binary.

pub mod cli;
pub mod commands;
pub mod config;
