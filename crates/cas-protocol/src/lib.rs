//! CAS Client Protocol Implementation.
//!
//! This crate implements the service-provider side of the Central
//! Authentication Service protocol:
//!
//! - **Login / logout redirects** - Build the redirects that send a browser to the CAS server
//! - **Ticket validation** - `validate`, `serviceValidate` and `proxyValidate` with XML, JSON and legacy text responses
//! - **Proxy tickets** - Proxy-granting-ticket callbacks and `proxy` requests
//! - **Single sign-out** - Parse logout requests posted back by the CAS server
//! - **ECAS profile** - The [`Ecas`] wrapper forcing XML responses and `userDetails`
//!
//! # Architecture
//!
//! - [`properties`] - Immutable protocol configuration
//! - [`types`] - Tickets, validation results and protocol constants
//! - [`parser`] - Response parsers for every supported format
//! - [`request`] - Outgoing request construction and parameter filtering
//! - [`http`] - Request/response envelopes and the injected HTTP client
//! - [`engine`] - The [`Cas`] engine: validation, proxy correlation, redirects
//! - [`ecas`] - The ECAS wrapper
//! - [`endpoints`] - Axum handlers for the proxy callback and single sign-out
//! - [`error`] - Error types for CAS operations
//!
//! # Example
//!
//! ```rust,ignore
//! use cas_protocol::{CasClient, Ecas, Parameters, Properties, ProtocolVersion, ReqwestHttpClient, ServerRequest};
//! use cas_cache::MemoryCacheProvider;
//!
//! let properties = Properties::for_server("https://ecas.example.com/cas", ProtocolVersion::V3)?;
//! let http = ReqwestHttpClient::new(properties.http_timeout())?;
//! let ecas = Ecas::new(&properties, ServerRequest::get(request_url)?, http, MemoryCacheProvider::new());
//!
//! if let Some(result) = ecas.authenticate().await? {
//!     tracing::info!(user = %result.user, "authenticated");
//! } else if let Some(redirect) = ecas.login(&Parameters::new()) {
//!     return Ok(redirect);
//! }
//! ```
//!
//! # Protocol Specification
//!
//! - [CAS Protocol 3.0](https://apereo.github.io/cas/7.0.x/protocol/CAS-Protocol-Specification.html)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod ecas;
pub mod endpoints;
pub mod engine;
pub mod error;
pub mod http;
pub mod parser;
pub mod properties;
pub mod request;
pub mod types;

pub use client::CasClient;
pub use ecas::{apply_ecas_overrides, Ecas, PROXY_SUCCESS_BODY};
pub use engine::Cas;
pub use error::{CasError, CasResult};
pub use http::{CasResponse, HttpClient, Method, OutboundRequest, ReqwestHttpClient, ServerRequest};
pub use properties::{
    CacheProperties, EndpointProperties, HttpProperties, Properties, ProtocolVersion, ProxyProperties,
};
pub use types::*;
