//! CAS ticket identifiers.

use serde::{Deserialize, Serialize};

/// Kind of a CAS ticket, derived from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketKind {
    /// Service ticket (`ST-`).
    Service,
    /// Proxy ticket (`PT-`).
    Proxy,
    /// Proxy-granting ticket (`PGT-`).
    ProxyGranting,
    /// Proxy-granting-ticket IOU (`PGTIOU-`).
    ProxyGrantingIou,
    /// Any other prefix; validated like a service ticket.
    Unknown,
}

impl TicketKind {
    /// Determines the ticket kind from its value.
    #[must_use]
    pub fn of(value: &str) -> Self {
        // PGTIOU- must be tested before PGT-.
        if value.starts_with("PGTIOU-") {
            Self::ProxyGrantingIou
        } else if value.starts_with("PGT-") {
            Self::ProxyGranting
        } else if value.starts_with("ST-") {
            Self::Service
        } else if value.starts_with("PT-") {
            Self::Proxy
        } else {
            Self::Unknown
        }
    }

    /// Returns true for tickets a browser may present to a service.
    ///
    /// PGTs and PGTIOUs travel only between the CAS server and the service.
    #[must_use]
    pub const fn is_presentable(&self) -> bool {
        matches!(self, Self::Service | Self::Proxy | Self::Unknown)
    }
}
