//! ECAS client.
//!
//! ECAS, the European Commission Authentication Service, is a CAS server that
//! returns user details when asked with `userDetails` and expects the XML
//! format. [`Ecas`] is a [`Cas`] built on adjusted properties; it also answers
//! every proxy callback it responds to with a fixed `proxySuccess` document.

use async_trait::async_trait;
use cas_cache::AtomicCacheProvider;

use crate::client::CasClient;
use crate::engine::Cas;
use crate::error::CasResult;
use crate::http::{CasResponse, HttpClient, ServerRequest};
use crate::parser::LogoutRequest;
use crate::properties::Properties;
use crate::types::{params, Endpoint, Parameters, ResponseFormat, ValidationResult};

/// Body of every proxy callback answer produced by [`Ecas`].
pub const PROXY_SUCCESS_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?><proxySuccess xmlns="http://www.yale.edu/tp/casClient" />"#;

/// Adds `userDetails` to the allowed parameters and forces `format=XML`
/// on `serviceValidate` and `proxyValidate`.
#[must_use]
pub fn apply_ecas_overrides(properties: &Properties) -> Properties {
    [Endpoint::ServiceValidate, Endpoint::ProxyValidate]
        .into_iter()
        .fold(properties.clone(), |properties, endpoint| {
            properties
                .with_allowed_parameter(endpoint, params::USER_DETAILS)
                .with_default_parameter(endpoint, params::FORMAT, ResponseFormat::Xml.as_param())
        })
}

/// CAS client for ECAS servers.
pub struct Ecas<H, C> {
    cas: Cas<H, C>,
}

impl<H, C> Clone for Ecas<H, C> {
    fn clone(&self) -> Self {
        Self {
            cas: self.cas.clone(),
        }
    }
}

impl<H, C> std::fmt::Debug for Ecas<H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ecas").field("cas", &self.cas).finish()
    }
}

impl<H, C> Ecas<H, C>
where
    H: HttpClient,
    C: AtomicCacheProvider,
{
    /// Creates an ECAS client. The ECAS overrides are applied to `properties` once, here.
    pub fn new(properties: &Properties, request: ServerRequest, http: H, cache: C) -> Self {
        Self {
            cas: Cas::new(apply_ecas_overrides(properties), request, http, cache),
        }
    }

    /// The wrapped protocol engine.
    #[must_use]
    pub const fn inner(&self) -> &Cas<H, C> {
        &self.cas
    }
}

#[async_trait]
impl<H, C> CasClient for Ecas<H, C>
where
    H: HttpClient,
    C: AtomicCacheProvider,
{
    fn properties(&self) -> &Properties {
        self.cas.properties()
    }

    fn support_authentication(&self) -> bool {
        self.cas.support_authentication()
    }

    async fn authenticate(&self) -> CasResult<Option<ValidationResult>> {
        self.cas.authenticate().await
    }

    fn login(&self, parameters: &Parameters) -> Option<CasResponse> {
        self.cas.login(parameters)
    }

    fn logout(&self, parameters: &Parameters) -> CasResponse {
        self.cas.logout(parameters)
    }

    async fn request_ticket_validation(&self, parameters: &Parameters) -> CasResult<Option<ValidationResult>> {
        self.cas.request_ticket_validation(parameters).await
    }

    async fn request_service_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult> {
        self.cas.request_service_validate(parameters).await
    }

    async fn request_proxy_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult> {
        self.cas.request_proxy_validate(parameters).await
    }

    async fn request_proxy_ticket(&self, parameters: &Parameters, pgt: Option<&str>) -> CasResult<String> {
        self.cas.request_proxy_ticket(parameters, pgt).await
    }

    /// Any answer of the engine, failures included, gets [`PROXY_SUCCESS_BODY`]
    /// as its body; no answer stays no answer.
    fn handle_proxy_callback(&self, parameters: &Parameters) -> Option<CasResponse> {
        self.cas
            .handle_proxy_callback(parameters)
            .map(|response| response.with_body(PROXY_SUCCESS_BODY))
    }

    async fn handle_logout_request(&self) -> CasResult<Option<LogoutRequest>> {
        self.cas.handle_logout_request().await
    }

    fn with_server_request(&self, request: ServerRequest) -> Self {
        Self {
            cas: self.cas.with_server_request(request),
        }
    }
}
