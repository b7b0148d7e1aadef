//! Proxy tickets and the proxy callback rendezvous.
//!
//! When a validation asks for a proxy-granting ticket (it sends `pgtUrl`),
//! the CAS server calls the service back with `pgtId` and `pgtIou` and
//! returns only the PGTIOU in the validation answer. The two exchanges meet
//! in the correlation map, keyed by PGTIOU:
//!
//! - a validation holding a PGTIOU waits on a [`Correlation::Pending`] entry;
//! - a callback resolves that entry, or buffers the PGT as
//!   [`Correlation::Delivered`] while a validation expecting a callback is in
//!   flight (the usual server ordering) or when unsolicited callbacks are
//!   accepted.
//!
//! Entries carry a deadline and are purged once expired.

use std::sync::atomic::Ordering;

use cas_cache::AtomicCacheProvider;
use dashmap::mapref::entry::Entry;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::validation::response_format;
use super::Cas;
use crate::error::{CasError, CasResult};
use crate::http::{CasResponse, HttpClient, OutboundRequest};
use crate::parser;
use crate::request;
use crate::types::{error_codes, params, Endpoint, Parameters, CAS_NAMESPACE};

/// A proxy-granting ticket awaited or buffered under its PGTIOU.
pub(super) enum Correlation {
    /// A validation is waiting for the callback.
    Pending {
        sender: oneshot::Sender<String>,
        expires_at: Instant,
    },
    /// The callback arrived first.
    Delivered { pgt: String, expires_at: Instant },
}

impl Correlation {
    const fn expires_at(&self) -> Instant {
        match self {
            Self::Pending { expires_at, .. } | Self::Delivered { expires_at, .. } => *expires_at,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at() <= now
    }
}

/// Body the engine answers an accepted callback with.
const CALLBACK_SUCCESS_BODY: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<cas:proxySuccess xmlns:cas="http://www.yale.edu/tp/cas"/>"#
);

fn callback_failure(code: &str, message: &str) -> CasResponse {
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><cas:serviceResponse xmlns:cas="{CAS_NAMESPACE}"><cas:proxyFailure code="{code}">{}</cas:proxyFailure></cas:serviceResponse>"#,
        quick_xml::escape::escape(message)
    );
    CasResponse::new(404)
        .with_header("content-type", "application/xml; charset=utf-8")
        .with_body(body)
}

fn non_empty<'a>(parameters: &'a Parameters, name: &str) -> Option<&'a str> {
    parameters
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

impl<H, C> Cas<H, C>
where
    H: HttpClient,
    C: AtomicCacheProvider,
{
    /// Requests a proxy ticket for `targetService`.
    ///
    /// The proxy-granting ticket is `pgt`, or the `pgt` entry of `parameters`.
    ///
    /// ## Errors
    ///
    /// - `CasError::Proxy` if no PGT is available or the server refuses it
    /// - `CasError::MissingParameter` without a `targetService`
    /// - `CasError::Configuration` if no `proxy` endpoint is configured
    /// - `CasError::Transport` / `CasError::UnexpectedStatus` / `CasError::MalformedResponse`
    pub async fn request_proxy_ticket(&self, parameters: &Parameters, pgt: Option<&str>) -> CasResult<String> {
        let pgt = pgt
            .map(str::trim)
            .filter(|pgt| !pgt.is_empty())
            .or_else(|| non_empty(parameters, params::PGT))
            .ok_or_else(|| CasError::Proxy("no proxy-granting ticket available".into()))?
            .to_string();

        let mut parameters = parameters.clone();
        parameters.insert(params::PGT.to_string(), pgt);

        let sent = request::build_parameters(self.properties(), Endpoint::Proxy, &parameters)?;
        let mut url = self.properties().endpoint_url(Endpoint::Proxy)?;
        request::append_query(&mut url, &sent);

        let response = self.send(OutboundRequest::get(url)).await?;
        if !response.is_success() {
            return Err(CasError::UnexpectedStatus {
                status: response.status,
            });
        }

        let format = response_format(Endpoint::Proxy, &response, None);
        match parser::parse_proxy(&response.body, format) {
            Ok(ticket) => {
                tracing::info!(
                    target_service = sent.get(params::TARGET_SERVICE).map_or("", String::as_str),
                    "Proxy ticket issued"
                );
                Ok(ticket)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Proxy ticket request refused");
                Err(err)
            }
        }
    }

    /// Handles a proxy callback from the CAS server.
    ///
    /// Reads `pgtId` and `pgtIou` from `parameters`, or from the inbound
    /// request query when `parameters` is empty.
    ///
    /// - neither present: a reachability probe, answered `200`;
    /// - exactly one present: malformed, no response;
    /// - both present: the PGT is handed to the validation awaiting it and the
    ///   callback is answered `200` with a `proxySuccess` body; with nobody to
    ///   hand it to, `404` with a `proxyFailure` body.
    pub fn handle_proxy_callback(&self, parameters: &Parameters) -> Option<CasResponse> {
        let parameters = if parameters.is_empty() {
            self.server_request().query()
        } else {
            parameters.clone()
        };

        match (
            non_empty(&parameters, params::PGT_ID),
            non_empty(&parameters, params::PGT_IOU),
        ) {
            (None, None) => {
                tracing::debug!("Proxy callback probe");
                Some(CasResponse::new(200))
            }
            (Some(pgt), Some(iou)) => Some(self.deliver_proxy_granting_ticket(pgt, iou)),
            _ => {
                tracing::warn!("Malformed proxy callback: pgtId and pgtIou must come together");
                None
            }
        }
    }

    fn deliver_proxy_granting_ticket(&self, pgt: &str, iou: &str) -> CasResponse {
        let now = Instant::now();
        self.purge_expired_correlations(now);

        let mut pgt = pgt.to_string();
        if let Some((_, Correlation::Pending { sender, expires_at })) =
            self.shared.correlations.remove(iou)
        {
            if expires_at > now {
                match sender.send(pgt) {
                    Ok(()) => {
                        tracing::info!(pgt_iou = %iou, "Proxy-granting ticket delivered");
                        return Self::callback_success();
                    }
                    Err(returned) => pgt = returned,
                }
            }
        }

        let awaited = self.shared.callback_window.load(Ordering::SeqCst) > 0;
        if awaited || self.properties().accept_unsolicited_callbacks() {
            let expires_at = now + self.properties().correlation_ttl();
            self.shared
                .correlations
                .insert(iou.to_string(), Correlation::Delivered { pgt, expires_at });
            tracing::info!(pgt_iou = %iou, "Proxy-granting ticket buffered");
            return Self::callback_success();
        }

        tracing::warn!(pgt_iou = %iou, "Proxy callback without pending request");
        callback_failure(
            error_codes::INVALID_PGT_IOU,
            &format!("no pending proxy request for {iou}"),
        )
    }

    fn callback_success() -> CasResponse {
        CasResponse::new(200)
            .with_header("content-type", "application/xml; charset=utf-8")
            .with_body(CALLBACK_SUCCESS_BODY)
    }

    /// Waits for the PGT matching `iou`, or takes it if already delivered.
    pub(super) async fn await_proxy_granting_ticket(&self, iou: &str) -> CasResult<String> {
        let wait = self.properties().callback_wait();
        let receiver = match self.open_correlation(iou, wait) {
            Ok(pgt) => {
                tracing::debug!(pgt_iou = %iou, "Proxy-granting ticket was already delivered");
                return Ok(pgt);
            }
            Err(receiver) => receiver,
        };

        match tokio::time::timeout(wait, receiver).await {
            Ok(Ok(pgt)) => Ok(pgt),
            _ => {
                self.shared
                    .correlations
                    .remove_if(iou, |_, entry| matches!(entry, Correlation::Pending { .. }));
                tracing::warn!(pgt_iou = %iou, wait_secs = wait.as_secs(), "Proxy callback did not arrive");
                Err(CasError::Proxy(format!(
                    "no proxy-granting ticket delivered for {iou}"
                )))
            }
        }
    }

    /// Takes a delivered PGT, or registers a pending entry and returns its receiver.
    fn open_correlation(
        &self,
        iou: &str,
        wait: std::time::Duration,
    ) -> Result<String, oneshot::Receiver<String>> {
        let now = Instant::now();
        let (sender, receiver) = oneshot::channel();
        let pending = Correlation::Pending {
            sender,
            expires_at: now + wait,
        };

        match self.shared.correlations.entry(iou.to_string()) {
            Entry::Occupied(mut occupied) => {
                if let Correlation::Delivered { pgt, expires_at } = occupied.get() {
                    if *expires_at > now {
                        let pgt = pgt.clone();
                        occupied.remove();
                        return Ok(pgt);
                    }
                }
                occupied.insert(pending);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(pending);
            }
        }
        Err(receiver)
    }

    fn purge_expired_correlations(&self, now: Instant) {
        self.shared
            .correlations
            .retain(|_, entry| !entry.is_expired(now));
    }
}
