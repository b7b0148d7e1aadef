//! CAS protocol endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::params;

/// An endpoint of the CAS server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Endpoint {
    /// Credential requestor / acceptor.
    Login,
    /// Destroys the single sign-on session.
    Logout,
    /// CAS 1.0 service ticket validation (plain text).
    Validate,
    /// Service ticket validation.
    ServiceValidate,
    /// Service and proxy ticket validation.
    ProxyValidate,
    /// Proxy ticket issuance.
    Proxy,
}

impl Endpoint {
    /// Every endpoint, in configuration order.
    pub const ALL: [Self; 6] = [
        Self::Login,
        Self::Logout,
        Self::Validate,
        Self::ServiceValidate,
        Self::ProxyValidate,
        Self::Proxy,
    ];

    /// The key of this endpoint in the `protocol` properties tree.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Validate => "validate",
            Self::ServiceValidate => "serviceValidate",
            Self::ProxyValidate => "proxyValidate",
            Self::Proxy => "proxy",
        }
    }

    /// Parameters the protocol requires on every request to this endpoint.
    ///
    /// They are kept even when the endpoint's allowed list omits them.
    #[must_use]
    pub const fn required_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Login | Self::Logout => &[],
            Self::Validate | Self::ServiceValidate | Self::ProxyValidate => {
                &[params::SERVICE, params::TICKET]
            }
            Self::Proxy => &[params::PGT, params::TARGET_SERVICE],
        }
    }

    /// Parameters that always travel with the request when present, even if not allowed.
    #[must_use]
    pub const fn protocol_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Login | Self::Logout => &[params::SERVICE],
            _ => self.required_parameters(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
