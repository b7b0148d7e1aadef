//! Ticket validation.
//!
//! A validation call goes through dispatch (endpoint selection from the
//! ticket prefix and protocol version), a cache lookup, the remote call and
//! parsing. Concurrent callers presenting the same ticket for the same
//! endpoint and service share one remote call; successes are cached for the
//! ticket TTL, failures never are.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cas_cache::{AtomicCacheProvider, CacheProvider};

use super::{ticket_key, Cas, CachedValidation};
use crate::error::{CasError, CasResult};
use crate::http::{CasResponse, HttpClient, OutboundRequest};
use crate::parser;
use crate::properties::ProtocolVersion;
use crate::request;
use crate::types::{params, Endpoint, Parameters, ResponseFormat, TicketKind, ValidationResult};

/// Keeps the proxy callback window open while alive.
struct CallbackWindow<'a>(&'a AtomicUsize);

impl<'a> CallbackWindow<'a> {
    fn open(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for CallbackWindow<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Picks the declared format of a validation answer.
pub(super) fn response_format(
    endpoint: Endpoint,
    response: &CasResponse,
    requested: Option<&str>,
) -> ResponseFormat {
    if endpoint == Endpoint::Validate {
        return ResponseFormat::Text;
    }
    // Many servers label XML as text/plain, so only structured types are trusted.
    if let Some(format) = response
        .content_type()
        .and_then(ResponseFormat::from_content_type)
        .filter(|format| *format != ResponseFormat::Text)
    {
        return format;
    }
    requested
        .and_then(ResponseFormat::from_param)
        .unwrap_or_default()
}

impl<H, C> Cas<H, C>
where
    H: HttpClient,
    C: AtomicCacheProvider,
{
    /// Validates the ticket of the inbound request, or the one in `parameters`.
    ///
    /// The endpoint is chosen from the ticket: `PT-` tickets go to
    /// `proxyValidate`, everything else to `serviceValidate`, or to `validate`
    /// under CAS 1.0. Returns `Ok(None)` when there is no ticket at all.
    ///
    /// ## Errors
    ///
    /// - `CasError::AuthenticationFailed` if the server rejects the ticket
    /// - `CasError::Transport` / `CasError::UnexpectedStatus` on call failure
    /// - `CasError::MalformedResponse` if the answer cannot be parsed
    /// - `CasError::Configuration` for a proxy ticket under CAS 1.0
    /// - `CasError::Proxy` if a requested PGT is not delivered in time
    pub async fn request_ticket_validation(
        &self,
        parameters: &Parameters,
    ) -> CasResult<Option<ValidationResult>> {
        let Some(parameters) = self.with_ticket(parameters) else {
            return Ok(None);
        };
        let ticket = parameters
            .get(params::TICKET)
            .map(String::as_str)
            .unwrap_or_default();

        let kind = TicketKind::of(ticket);
        let endpoint = match (self.properties().protocol_version(), kind) {
            (ProtocolVersion::V1, TicketKind::Proxy) => {
                return Err(CasError::Configuration(
                    "proxy tickets cannot be validated with CAS 1.0".into(),
                ));
            }
            (ProtocolVersion::V1, _) => Endpoint::Validate,
            (_, TicketKind::Proxy) => Endpoint::ProxyValidate,
            _ => Endpoint::ServiceValidate,
        };
        tracing::debug!(ticket = %ticket, kind = ?kind, endpoint = %endpoint, "Dispatching ticket validation");

        self.validate(endpoint, parameters).await.map(Some)
    }

    /// Validates a service ticket against `serviceValidate`.
    ///
    /// ## Errors
    ///
    /// As [`Cas::request_ticket_validation`], plus `CasError::MissingParameter`
    /// when no ticket is available.
    pub async fn request_service_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult> {
        let parameters = self
            .with_ticket(parameters)
            .ok_or_else(|| CasError::MissingParameter(params::TICKET.into()))?;
        self.validate(Endpoint::ServiceValidate, parameters).await
    }

    /// Validates a service or proxy ticket against `proxyValidate`.
    ///
    /// ## Errors
    ///
    /// As [`Cas::request_service_validate`].
    pub async fn request_proxy_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult> {
        let parameters = self
            .with_ticket(parameters)
            .ok_or_else(|| CasError::MissingParameter(params::TICKET.into()))?;
        self.validate(Endpoint::ProxyValidate, parameters).await
    }

    /// Completes `parameters` with the inbound ticket and service URL.
    fn with_ticket(&self, parameters: &Parameters) -> Option<Parameters> {
        let mut parameters = self.with_service(parameters);
        let has_ticket = parameters
            .get(params::TICKET)
            .is_some_and(|ticket| !ticket.trim().is_empty());
        if !has_ticket {
            let ticket = self
                .server_request()
                .query_param(params::TICKET)
                .filter(|ticket| !ticket.trim().is_empty())?;
            parameters.insert(params::TICKET.to_string(), ticket);
        }
        Some(parameters)
    }

    /// Validates once per ticket, whatever the number of concurrent callers.
    ///
    /// Callers share a remote call, and a cached result, only when they ask
    /// for the same ticket on the same endpoint for the same service.
    async fn validate(&self, endpoint: Endpoint, parameters: Parameters) -> CasResult<ValidationResult> {
        let ticket = parameters
            .get(params::TICKET)
            .cloned()
            .ok_or_else(|| CasError::MissingParameter(params::TICKET.into()))?;
        let service = parameters.get(params::SERVICE).cloned().unwrap_or_default();

        if let Some(cached) = self.cached(endpoint, &service, &ticket).await {
            tracing::debug!(ticket = %ticket, user = %cached.user, "Ticket served from cache");
            return Ok(cached);
        }

        let flight = format!("{endpoint}:{service}:{ticket}");
        let cell = Arc::clone(
            self.shared
                .inflight
                .entry(flight.clone())
                .or_default()
                .value(),
        );

        let outcome = cell
            .get_or_init(|| async {
                if let Some(cached) = self.cached(endpoint, &service, &ticket).await {
                    return Ok(cached);
                }
                let outcome = self.validate_remote(endpoint, &parameters).await;
                match &outcome {
                    Ok(result) => {
                        tracing::info!(ticket = %ticket, user = %result.user, endpoint = %endpoint, "Ticket validated");
                        self.store(endpoint, &service, &ticket, result).await;
                    }
                    Err(err) if err.is_negative_outcome() => {
                        tracing::warn!(ticket = %ticket, error = %err, "Ticket rejected by CAS server");
                    }
                    Err(err) => {
                        tracing::error!(ticket = %ticket, error = %err, "Ticket validation failed");
                    }
                }
                outcome
            })
            .await
            .clone();

        self.shared
            .inflight
            .remove_if(&flight, |_, current| Arc::ptr_eq(current, &cell));

        outcome
    }

    async fn cached(&self, endpoint: Endpoint, service: &str, ticket: &str) -> Option<ValidationResult> {
        match self.shared.cache.get::<CachedValidation>(&ticket_key(ticket)).await {
            Ok(Some(cached)) if cached.matches(endpoint, service) => Some(cached.result),
            Ok(Some(cached)) => {
                tracing::debug!(
                    ticket = %ticket,
                    cached_endpoint = %cached.endpoint,
                    cached_service = %cached.service,
                    "Cached ticket was validated for another endpoint or service"
                );
                None
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(ticket = %ticket, error = %err, "Ticket cache lookup failed");
                None
            }
        }
    }

    async fn store(&self, endpoint: Endpoint, service: &str, ticket: &str, result: &ValidationResult) {
        let ttl = self.properties().ticket_ttl();
        if ttl.is_zero() {
            return;
        }
        let entry = CachedValidation {
            endpoint,
            service: service.to_string(),
            result: result.clone(),
        };
        match self
            .shared
            .cache
            .set_nx(&ticket_key(ticket), &entry, Some(ttl))
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!(ticket = %ticket, "Ticket already cached"),
            Err(err) => tracing::warn!(ticket = %ticket, error = %err, "Failed to cache validated ticket"),
        }
    }

    async fn validate_remote(&self, endpoint: Endpoint, parameters: &Parameters) -> CasResult<ValidationResult> {
        let sent = request::build_parameters(self.properties(), endpoint, parameters)?;
        let mut url = self.properties().endpoint_url(endpoint)?;
        request::append_query(&mut url, &sent);

        let expects_callback = sent.contains_key(params::PGT_URL);
        let _window = expects_callback.then(|| CallbackWindow::open(&self.shared.callback_window));

        let accepted = if endpoint == Endpoint::Validate {
            ResponseFormat::Text
        } else {
            sent.get(params::FORMAT)
                .and_then(|format| ResponseFormat::from_param(format))
                .unwrap_or_default()
        };
        let outbound = OutboundRequest::get(url).with_header("accept", accepted.media_type());
        let response = self.send(outbound).await?;
        if !response.is_success() {
            return Err(CasError::UnexpectedStatus {
                status: response.status,
            });
        }

        let format = response_format(
            endpoint,
            &response,
            sent.get(params::FORMAT).map(String::as_str),
        );
        let mut result = parser::parse_validation(&response.body, format)?;

        if expects_callback {
            if let Some(iou) = result.proxy_granting_ticket_iou.clone() {
                let pgt = self.await_proxy_granting_ticket(&iou).await?;
                result.proxy_granting_ticket = Some(pgt);
            }
        }

        Ok(result)
    }
}
