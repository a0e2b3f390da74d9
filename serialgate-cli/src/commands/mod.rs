//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`run`] - Main command (serve stdin through the compute worker)

pub mod config;
pub mod run;
