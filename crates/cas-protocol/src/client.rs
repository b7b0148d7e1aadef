//! The CAS client interface.
//!
//! [`CasClient`] is what an application programs against. [`Cas`] implements
//! the protocol; [`crate::Ecas`] wraps it with the ECAS adjustments.

use async_trait::async_trait;
use cas_cache::AtomicCacheProvider;

use crate::engine::Cas;
use crate::error::CasResult;
use crate::http::{CasResponse, HttpClient, ServerRequest};
use crate::parser::LogoutRequest;
use crate::properties::Properties;
use crate::types::{Parameters, ValidationResult};

/// A CAS client bound to one inbound request.
#[async_trait]
pub trait CasClient: Send + Sync + Sized {
    /// The effective properties.
    fn properties(&self) -> &Properties;

    /// Returns true if the inbound request carries a ticket. No I/O.
    fn support_authentication(&self) -> bool;

    /// Validates the inbound ticket; `None` when there is none.
    async fn authenticate(&self) -> CasResult<Option<ValidationResult>>;

    /// Redirect to the login page, if one can be built.
    fn login(&self, parameters: &Parameters) -> Option<CasResponse>;

    /// Redirect to the logout page.
    fn logout(&self, parameters: &Parameters) -> CasResponse;

    /// Validates a ticket on the endpoint matching its kind.
    async fn request_ticket_validation(&self, parameters: &Parameters) -> CasResult<Option<ValidationResult>>;

    /// Validates a ticket on `serviceValidate`.
    async fn request_service_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult>;

    /// Validates a ticket on `proxyValidate`.
    async fn request_proxy_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult>;

    /// Obtains a proxy ticket.
    async fn request_proxy_ticket(&self, parameters: &Parameters, pgt: Option<&str>) -> CasResult<String>;

    /// Answers a proxy callback from the CAS server.
    fn handle_proxy_callback(&self, parameters: &Parameters) -> Option<CasResponse>;

    /// Processes a single sign-out notification.
    async fn handle_logout_request(&self) -> CasResult<Option<LogoutRequest>>;

    /// A new instance bound to another inbound request.
    #[must_use]
    fn with_server_request(&self, request: ServerRequest) -> Self;
}

#[async_trait]
impl<H, C> CasClient for Cas<H, C>
where
    H: HttpClient,
    C: AtomicCacheProvider,
{
    fn properties(&self) -> &Properties {
        Cas::properties(self)
    }

    fn support_authentication(&self) -> bool {
        Cas::support_authentication(self)
    }

    async fn authenticate(&self) -> CasResult<Option<ValidationResult>> {
        Cas::authenticate(self).await
    }

    fn login(&self, parameters: &Parameters) -> Option<CasResponse> {
        Cas::login(self, parameters)
    }

    fn logout(&self, parameters: &Parameters) -> CasResponse {
        Cas::logout(self, parameters)
    }

    async fn request_ticket_validation(&self, parameters: &Parameters) -> CasResult<Option<ValidationResult>> {
        Cas::request_ticket_validation(self, parameters).await
    }

    async fn request_service_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult> {
        Cas::request_service_validate(self, parameters).await
    }

    async fn request_proxy_validate(&self, parameters: &Parameters) -> CasResult<ValidationResult> {
        Cas::request_proxy_validate(self, parameters).await
    }

    async fn request_proxy_ticket(&self, parameters: &Parameters, pgt: Option<&str>) -> CasResult<String> {
        Cas::request_proxy_ticket(self, parameters, pgt).await
    }

    fn handle_proxy_callback(&self, parameters: &Parameters) -> Option<CasResponse> {
        Cas::handle_proxy_callback(self, parameters)
    }

    async fn handle_logout_request(&self) -> CasResult<Option<LogoutRequest>> {
        Cas::handle_logout_request(self).await
    }

    fn with_server_request(&self, request: ServerRequest) -> Self {
        Cas::with_server_request(self, request)
    }
}
