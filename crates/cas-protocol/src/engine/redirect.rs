//! Login and logout redirects.

use cas_cache::AtomicCacheProvider;

use super::Cas;
use crate::http::{CasResponse, HttpClient};
use crate::request::{self, is_truthy};
use crate::types::{params, Endpoint, Parameters};

impl<H, C> Cas<H, C>
where
    H: HttpClient,
    C: AtomicCacheProvider,
{
    /// Builds the redirect to the CAS login page.
    ///
    /// The `service` parameter defaults to the inbound request URL without its
    /// ticket. Returns `None` if the redirect cannot be built, including when
    /// both `renew` and `gateway` are requested.
    #[must_use]
    pub fn login(&self, parameters: &Parameters) -> Option<CasResponse> {
        let parameters = self.with_service(parameters);

        let flag = |name: &str| parameters.get(name).is_some_and(|value| is_truthy(value));
        if flag(params::RENEW) && flag(params::GATEWAY) {
            tracing::error!("Login cannot use renew and gateway together");
            return None;
        }

        match request::build_url(self.properties(), Endpoint::Login, &parameters) {
            Ok(url) => {
                tracing::debug!(location = %url, "Redirecting to CAS login");
                Some(CasResponse::redirect(&url))
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to build login redirect");
                None
            }
        }
    }

    /// Builds the redirect to the CAS logout page. Always answers.
    #[must_use]
    pub fn logout(&self, parameters: &Parameters) -> CasResponse {
        match request::build_url(self.properties(), Endpoint::Logout, parameters) {
            Ok(url) => {
                tracing::debug!(location = %url, "Redirecting to CAS logout");
                CasResponse::redirect(&url)
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to build logout redirect; using server base URL");
                CasResponse::redirect(self.properties().base_url())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::http::ServerRequest;

    fn query(response: &CasResponse) -> Parameters {
        let location = response.location().unwrap();
        ServerRequest::get(location).unwrap().query()
    }

    #[test]
    fn login_defaults_service_to_current_url() {
        let (cas, http) = client(properties(), "https://app.example.com/page?ticket=ST-old&a=1");
        let response = cas.login(&Parameters::new()).unwrap();

        assert_eq!(response.status, 302);
        assert!(response
            .location()
            .unwrap()
            .starts_with("https://cas.example.com/cas/login?"));
        assert_eq!(
            query(&response).get("service").map(String::as_str),
            Some("https://app.example.com/page?a=1")
        );
        assert_eq!(http.calls(), 0);
    }

    #[test]
    fn login_flags() {
        let (cas, _) = client(properties(), "https://app.example.com/");

        let mut parameters = Parameters::new();
        parameters.insert("renew".into(), "yes".into());
        parameters.insert("unknown".into(), "dropped".into());
        let response = cas.login(&parameters).unwrap();
        let sent = query(&response);
        assert_eq!(sent.get("renew").map(String::as_str), Some("true"));
        assert!(!sent.contains_key("unknown"));

        parameters.insert("gateway".into(), "true".into());
        assert!(cas.login(&parameters).is_none());

        parameters.insert("gateway".into(), "false".into());
        assert!(cas.login(&parameters).is_some());
    }

    #[test]
    fn logout_always_answers() {
        let (cas, _) = client(properties(), "https://app.example.com/");
        let response = cas.logout(&Parameters::new());
        assert_eq!(response.status, 302);
        assert_eq!(response.location(), Some("https://cas.example.com/cas/logout"));

        let mut parameters = Parameters::new();
        parameters.insert("service".into(), "https://app.example.com/bye".into());
        let response = cas.logout(&parameters);
        assert_eq!(
            query(&response).get("service").map(String::as_str),
            Some("https://app.example.com/bye")
        );
    }
}
