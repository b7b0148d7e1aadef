//! CAS protocol constants.

/// XML namespace of CAS 2.0/3.0 service responses.
pub const CAS_NAMESPACE: &str = "http://www.yale.edu/tp/cas";

/// XML namespace of the proxy callback acknowledgement.
pub const CAS_CLIENT_NAMESPACE: &str = "http://www.yale.edu/tp/casClient";

/// Parameter names used by the protocol.
pub mod params {
    /// The ticket being validated.
    pub const TICKET: &str = "ticket";
    /// The service URL the ticket was issued for.
    pub const SERVICE: &str = "service";
    /// Forces the user to re-enter credentials.
    pub const RENEW: &str = "renew";
    /// Never prompts the user for credentials.
    pub const GATEWAY: &str = "gateway";
    /// Proxy callback URL sent along a validation request.
    pub const PGT_URL: &str = "pgtUrl";
    /// Proxy-granting ticket delivered to the callback.
    pub const PGT_ID: &str = "pgtId";
    /// Proxy-granting-ticket IOU delivered to the callback.
    pub const PGT_IOU: &str = "pgtIou";
    /// Proxy-granting ticket presented to the `proxy` endpoint.
    pub const PGT: &str = "pgt";
    /// Service a proxy ticket is requested for.
    pub const TARGET_SERVICE: &str = "targetService";
    /// Response format (`XML` or `JSON`).
    pub const FORMAT: &str = "format";
    /// ECAS extension returning extended user details.
    pub const USER_DETAILS: &str = "userDetails";
    /// Form field carrying a single sign-out request.
    pub const LOGOUT_REQUEST: &str = "logoutRequest";
}

/// Error codes defined by the CAS protocol.
pub mod error_codes {
    /// Not all of the required request parameters were present.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// The ticket provided was not valid, or was not issued for this service.
    pub const INVALID_TICKET: &str = "INVALID_TICKET";
    /// The service specified did not match the service the ticket was issued for.
    pub const INVALID_SERVICE: &str = "INVALID_SERVICE";
    /// An internal error occurred during ticket validation.
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    /// The proxy callback could not be authenticated.
    pub const INVALID_PROXY_CALLBACK: &str = "INVALID_PROXY_CALLBACK";
    /// The service is not authorized to perform proxy authentication.
    pub const UNAUTHORIZED_SERVICE_PROXY: &str = "UNAUTHORIZED_SERVICE_PROXY";
    /// No pending correlation matched a callback's PGTIOU.
    pub const INVALID_PGT_IOU: &str = "INVALID_PGT_IOU";
}
