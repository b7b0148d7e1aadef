//! Core CAS types.
//!
//! This module contains the data structures exchanged with a CAS server:
//!
//! - [`TicketKind`] - Ticket kinds, derived from their prefixes
//! - [`ValidationResult`] and [`AttributeValue`] - Normalized validation output
//! - [`Endpoint`] - The protocol endpoints a client talks to
//! - [`ResponseFormat`] - The body formats a CAS server can answer with
//! - [`constants`] - Namespaces, parameter names and error codes

pub mod constants;
mod endpoint;
mod format;
mod ticket;
mod validation;

pub use constants::*;
pub use endpoint::*;
pub use format::*;
pub use ticket::*;
pub use validation::*;

use std::collections::BTreeMap;

/// Request parameters, ordered by name so that built URLs are stable.
pub type Parameters = BTreeMap<String, String>;
