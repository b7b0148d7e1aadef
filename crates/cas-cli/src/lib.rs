//! # cas-cli
//!
//! Command-line tool for working with a CAS server.
//!
//! This crate provides command-line utilities for:
//! - Building login and logout redirect URLs
//! - Validating service and proxy tickets
//! - Requesting proxy tickets
//! - Serving the proxy callback and single sign-out endpoints
//! - Managing the client configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::future_not_send)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
