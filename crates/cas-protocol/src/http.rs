//! HTTP abstractions.
//!
//! The engine never talks to a web framework or an HTTP library directly:
//!
//! - [`ServerRequest`] is the incoming request of the application being protected.
//! - [`CasResponse`] is what the engine answers with (redirects, callback replies)
//!   and also what the [`HttpClient`] returns for outbound calls.
//! - [`HttpClient`] performs server-to-server calls; [`ReqwestHttpClient`] is the
//!   production implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{CasError, CasResult};
use crate::types::{params, Parameters};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET.
    #[default]
    Get,
    /// POST.
    Post,
}

impl Method {
    /// Parses a method name, case-insensitively. Anything but POST is GET.
    #[must_use]
    pub fn parse(method: &str) -> Self {
        if method.eq_ignore_ascii_case("POST") {
            Self::Post
        } else {
            Self::Get
        }
    }
}

/// The incoming request of the protected application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRequest {
    method: Method,
    uri: Url,
    headers: BTreeMap<String, String>,
    body: String,
}

impl ServerRequest {
    /// Creates a GET request for an absolute URI.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if the URI is not absolute.
    pub fn get(uri: &str) -> CasResult<Self> {
        Ok(Self::new(Method::Get, Url::parse(uri)?))
    }

    /// Creates a request.
    #[must_use]
    pub fn new(method: Method, uri: Url) -> Self {
        Self {
            method,
            uri,
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }

    /// Rebuilds an absolute request from what a server framework hands over.
    ///
    /// The scheme comes from `X-Forwarded-Proto` when present, the authority
    /// from the `Host` header, falling back to `localhost`.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if no valid absolute URI can be formed.
    pub fn from_parts<'a>(
        method: &str,
        path_and_query: &str,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
        body: String,
    ) -> CasResult<Self> {
        let headers: BTreeMap<String, String> = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect();

        let scheme = headers
            .get("x-forwarded-proto")
            .map_or("http", String::as_str);
        let host = headers.get("host").map_or("localhost", String::as_str);
        let uri = Url::parse(&format!("{scheme}://{host}{path_and_query}"))?;

        Ok(Self {
            method: Method::parse(method),
            uri,
            headers,
            body,
        })
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// The request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// The absolute request URI.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }

    /// Looks up a header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Query string parameters. On repeated names the last value wins.
    #[must_use]
    pub fn query(&self) -> Parameters {
        self.uri
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// A single query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.uri
            .query_pairs()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .last()
    }

    /// Body parameters of a form POST. Empty for other requests.
    #[must_use]
    pub fn form(&self) -> Parameters {
        if self.method != Method::Post {
            return Parameters::new();
        }
        url::form_urlencoded::parse(self.body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// The URL of this request with any `ticket` parameter removed.
    ///
    /// This is the service URL CAS redirects back to, and the one a ticket
    /// must be validated against.
    #[must_use]
    pub fn service_url(&self) -> String {
        let mut url = self.uri.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != params::TICKET)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.set_fragment(None);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        url.to_string()
    }
}

/// A server-to-server request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: Url,
    /// Request headers.
    pub headers: Vec<(String, String)>,
}

impl OutboundRequest {
    /// Creates a GET request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// An HTTP response, produced by the engine or received from the CAS server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasResponse {
    /// Status code.
    pub status: u16,
    /// Headers, names lowercased.
    pub headers: BTreeMap<String, String>,
    /// Body.
    pub body: String,
}

impl CasResponse {
    /// Creates a response with the given status and no body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }

    /// A `302 Found` redirect.
    #[must_use]
    pub fn redirect(location: &Url) -> Self {
        Self::new(302).with_header("location", location.as_str())
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Looks up a header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// The content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Performs server-to-server HTTP calls.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the full response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Transport` on network failure or timeout.
    async fn send(&self, request: OutboundRequest) -> CasResult<CasResponse>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    async fn send(&self, request: OutboundRequest) -> CasResult<CasResponse> {
        (**self).send(request).await
    }
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Creates a client with the given timeout.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Transport` if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> CasResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cas-protocol/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest` client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: OutboundRequest) -> CasResult<CasResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CasError::Transport(format!("request to {} timed out", request.url))
            } else {
                CasError::from(e)
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(CasResponse {
            status,
            headers,
            body,
        })
    }
}
