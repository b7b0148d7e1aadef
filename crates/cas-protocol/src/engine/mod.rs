//! CAS protocol engine.
//!
//! [`Cas`] binds the shared, immutable client state (properties, HTTP client,
//! ticket cache, proxy correlations) to one inbound [`ServerRequest`]. The
//! operations are split by concern:
//!
//! - [`validation`] - ticket dispatch, single-flight validation and caching
//! - [`proxy`] - proxy tickets and the proxy callback rendezvous
//! - [`redirect`] - login and logout redirects

mod proxy;
mod redirect;
mod validation;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use cas_cache::AtomicCacheProvider;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::{CasError, CasResult};
use crate::http::{CasResponse, HttpClient, OutboundRequest, ServerRequest};
use crate::parser::{self, LogoutRequest};
use crate::properties::Properties;
use crate::types::{params, Endpoint, Parameters, TicketKind, ValidationResult};

use proxy::Correlation;

/// Prefix of validated-ticket cache keys.
const TICKET_KEY_PREFIX: &str = "cas:ticket:";

fn ticket_key(ticket: &str) -> String {
    format!("{TICKET_KEY_PREFIX}{ticket}")
}

/// A validated ticket as stored in the cache.
///
/// The entry is keyed by ticket alone so single sign-out can evict it; the
/// endpoint and service it was validated for are kept alongside, and a lookup
/// for any other pair is a miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachedValidation {
    endpoint: Endpoint,
    service: String,
    result: ValidationResult,
}

impl CachedValidation {
    fn matches(&self, endpoint: Endpoint, service: &str) -> bool {
        self.endpoint == endpoint && self.service == service
    }
}

/// State shared by every request-bound instance of one client.
struct Shared<H, C> {
    properties: Properties,
    http: H,
    cache: C,
    /// Validations in progress, by endpoint, service and ticket.
    inflight: DashMap<String, Arc<OnceCell<CasResult<ValidationResult>>>>,
    /// Proxy-granting tickets awaited or buffered, by PGTIOU.
    correlations: DashMap<String, Correlation>,
    /// Number of validations currently expecting a proxy callback.
    callback_window: AtomicUsize,
}

/// The CAS client protocol engine, bound to one inbound request.
pub struct Cas<H, C> {
    request: ServerRequest,
    shared: Arc<Shared<H, C>>,
}

impl<H, C> Clone for Cas<H, C> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H, C> std::fmt::Debug for Cas<H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cas")
            .field("request", &self.request.uri().as_str())
            .field("base_url", &self.shared.properties.base_url().as_str())
            .field("inflight", &self.shared.inflight.len())
            .field("correlations", &self.shared.correlations.len())
            .finish()
    }
}

impl<H, C> Cas<H, C>
where
    H: HttpClient,
    C: AtomicCacheProvider,
{
    /// Creates a client.
    pub fn new(properties: Properties, request: ServerRequest, http: H, cache: C) -> Self {
        Self {
            request,
            shared: Arc::new(Shared {
                properties,
                http,
                cache,
                inflight: DashMap::new(),
                correlations: DashMap::new(),
                callback_window: AtomicUsize::new(0),
            }),
        }
    }

    /// The client properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.shared.properties
    }

    /// The inbound request this instance is bound to.
    #[must_use]
    pub const fn server_request(&self) -> &ServerRequest {
        &self.request
    }

    /// The ticket cache.
    #[must_use]
    pub fn cache(&self) -> &C {
        &self.shared.cache
    }

    /// Returns a new instance bound to another inbound request.
    ///
    /// Properties, HTTP client, ticket cache and proxy correlations are shared;
    /// nothing belonging to the current request is carried over.
    #[must_use]
    pub fn with_server_request(&self, request: ServerRequest) -> Self {
        Self {
            request,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns true if the inbound request carries a ticket a browser may present.
    ///
    /// Never performs I/O.
    #[must_use]
    pub fn support_authentication(&self) -> bool {
        self.request
            .query_param(params::TICKET)
            .is_some_and(|ticket| !ticket.trim().is_empty() && TicketKind::of(&ticket).is_presentable())
    }

    /// Validates the ticket of the inbound request, if it carries one.
    ///
    /// Returns `Ok(None)` without any network call when there is no ticket.
    ///
    /// ## Errors
    ///
    /// See [`Cas::request_ticket_validation`].
    pub async fn authenticate(&self) -> CasResult<Option<ValidationResult>> {
        if !self.support_authentication() {
            tracing::debug!(uri = %self.request.uri(), "No ticket on request; not authenticating");
            return Ok(None);
        }
        self.request_ticket_validation(&Parameters::new()).await
    }

    /// Handles a single sign-out notification carried by the inbound request.
    ///
    /// The `LogoutRequest` document is read from the `logoutRequest` form field
    /// or, failing that, from a raw XML body. The ticket named by its
    /// `SessionIndex` is evicted from the ticket cache. Returns `Ok(None)` when
    /// the request is not a logout notification.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::MalformedResponse` for an unreadable document and
    /// `CasError::Cache` if the eviction fails.
    pub async fn handle_logout_request(&self) -> CasResult<Option<LogoutRequest>> {
        let form = self.request.form();
        let document = match form.get(params::LOGOUT_REQUEST) {
            Some(document) => document.clone(),
            None if self.request.body().trim_start().starts_with('<') => {
                self.request.body().to_string()
            }
            None => return Ok(None),
        };

        let logout = parser::parse_logout_request(&document)?;
        let evicted: Option<CachedValidation> = self
            .shared
            .cache
            .get_del(&ticket_key(&logout.session_index))
            .await?;

        match evicted {
            Some(cached) => tracing::info!(
                ticket = %logout.session_index,
                user = %cached.result.user,
                "Single sign-out: evicted validated ticket"
            ),
            None => tracing::debug!(
                ticket = %logout.session_index,
                "Single sign-out for a ticket that is not cached"
            ),
        }

        Ok(Some(logout))
    }

    /// Sends an outbound request within the configured timeout.
    async fn send(&self, request: OutboundRequest) -> CasResult<CasResponse> {
        let timeout = self.shared.properties.http_timeout();
        let url = request.url.clone();
        match tokio::time::timeout(timeout, self.shared.http.send(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                tracing::error!(url = %url, error = %err, "Call to CAS server failed");
                Err(err)
            }
            Err(_) => {
                tracing::error!(url = %url, timeout_secs = timeout.as_secs(), "Call to CAS server timed out");
                Err(CasError::Transport(format!(
                    "request to {url} timed out after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }

    /// Fills in the `service` parameter from the inbound request when absent.
    fn with_service(&self, parameters: &Parameters) -> Parameters {
        let mut parameters = parameters.clone();
        if parameters
            .get(params::SERVICE)
            .map_or(true, |service| service.is_empty())
        {
            parameters.insert(params::SERVICE.to_string(), self.request.service_url());
        }
        parameters
    }
}
