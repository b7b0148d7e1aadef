//! Protocol properties.
//!
//! [`Properties`] is the immutable configuration tree of a CAS client: the
//! server base URL, the protocol version, and for every endpoint its path,
//! allowed parameters and default parameters. Derivations such as
//! [`Properties::with_allowed_parameter`] return a new instance; nothing is
//! ever changed in place.
//!
//! ```toml
//! base_url = "https://cas.example.com/cas"
//! protocol_version = "3.0"
//!
//! [protocol.login]
//! path = "/login"
//! allowed_parameters = ["service", "renew", "gateway"]
//!
//! [protocol.serviceValidate]
//! path = "/p3/serviceValidate"
//! allowed_parameters = ["service", "ticket", "pgtUrl", "format"]
//! default_parameters = { format = "XML" }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CasError, CasResult};
use crate::types::{params, Endpoint};

/// CAS protocol version spoken with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// CAS 1.0: `validate` with plain-text answers.
    #[serde(rename = "1.0")]
    V1,
    /// CAS 2.0: `serviceValidate` / `proxyValidate` with XML answers.
    #[serde(rename = "2.0")]
    V2,
    /// CAS 3.0: `p3/serviceValidate` / `p3/proxyValidate` with attributes, XML or JSON.
    #[default]
    #[serde(rename = "3.0")]
    V3,
}

impl ProtocolVersion {
    /// Endpoints that must be configured for this version.
    #[must_use]
    pub const fn required_endpoints(&self) -> &'static [Endpoint] {
        match self {
            Self::V1 => &[Endpoint::Login, Endpoint::Logout, Endpoint::Validate],
            Self::V2 | Self::V3 => &[Endpoint::Login, Endpoint::Logout, Endpoint::ServiceValidate],
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1 => "1.0",
            Self::V2 => "2.0",
            Self::V3 => "3.0",
        })
    }
}

/// Definition of a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointProperties {
    /// Path appended to the base URL, or an absolute URL.
    pub path: String,

    /// Parameters a request to this endpoint may carry.
    #[serde(default)]
    pub allowed_parameters: BTreeSet<String>,

    /// Parameters sent unless the caller supplies its own value.
    #[serde(default)]
    pub default_parameters: BTreeMap<String, String>,
}

impl EndpointProperties {
    /// Creates an endpoint definition with the given allowed parameters.
    #[must_use]
    pub fn new(path: impl Into<String>, allowed: &[&str]) -> Self {
        Self {
            path: path.into(),
            allowed_parameters: allowed.iter().map(|p| (*p).to_string()).collect(),
            default_parameters: BTreeMap::new(),
        }
    }

    /// Adds a default parameter.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_parameters.insert(name.into(), value.into());
        self.normalize();
        self
    }

    /// Returns true if the parameter may be sent to this endpoint.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.allowed_parameters.contains(name)
    }

    /// Makes every default parameter an allowed parameter.
    fn normalize(&mut self) {
        for name in self.default_parameters.keys() {
            if !self.allowed_parameters.contains(name) {
                self.allowed_parameters.insert(name.clone());
            }
        }
    }
}

/// Validated-ticket cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheProperties {
    /// How long a validated ticket short-circuits re-validation.
    #[serde(default = "default_ticket_ttl")]
    pub ticket_ttl_secs: u64,
}

impl Default for CacheProperties {
    fn default() -> Self {
        Self {
            ticket_ttl_secs: default_ticket_ttl(),
        }
    }
}

/// Proxy callback settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyProperties {
    /// How long a validation waits for the callback delivering its PGT.
    #[serde(default = "default_callback_wait")]
    pub callback_wait_secs: u64,

    /// How long a buffered, not yet claimed PGT is kept.
    #[serde(default = "default_correlation_ttl")]
    pub correlation_ttl_secs: u64,

    /// Buffer callbacks that arrive before the validation saw their PGTIOU.
    #[serde(default)]
    pub accept_unsolicited_callbacks: bool,

    /// Path the proxy callback handler is mounted on.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
}

impl ProxyProperties {
    fn validate(&self) -> CasResult<()> {
        check_duration("proxy.callback_wait_secs", self.callback_wait_secs)?;
        check_duration("proxy.correlation_ttl_secs", self.correlation_ttl_secs)?;
        if !self.callback_path.starts_with('/') {
            return Err(CasError::Configuration(format!(
                "proxy.callback_path must start with '/', got '{}'",
                self.callback_path
            )));
        }
        Ok(())
    }
}

impl Default for ProxyProperties {
    fn default() -> Self {
        Self {
            callback_wait_secs: default_callback_wait(),
            correlation_ttl_secs: default_correlation_ttl(),
            accept_unsolicited_callbacks: false,
            callback_path: default_callback_path(),
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpProperties {
    /// Timeout of every call to the CAS server.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpProperties {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
        }
    }
}

/// Upper bound of every duration setting: one year.
const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

fn check_duration(name: &str, secs: u64) -> CasResult<()> {
    if secs > MAX_DURATION_SECS {
        return Err(CasError::Configuration(format!(
            "{name} must be at most {MAX_DURATION_SECS} seconds, got {secs}"
        )));
    }
    Ok(())
}

const fn default_ticket_ttl() -> u64 {
    30
}

const fn default_callback_wait() -> u64 {
    10
}

const fn default_correlation_ttl() -> u64 {
    300
}

fn default_callback_path() -> String {
    "/cas/proxy-callback".to_string()
}

const fn default_http_timeout() -> u64 {
    10
}

/// Properties as they appear in a configuration file, before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawProperties {
    base_url: Option<String>,
    #[serde(default)]
    protocol_version: ProtocolVersion,
    #[serde(default)]
    protocol: BTreeMap<Endpoint, EndpointProperties>,
    #[serde(default)]
    cache: CacheProperties,
    #[serde(default)]
    proxy: ProxyProperties,
    #[serde(default)]
    http: HttpProperties,
}

/// Immutable CAS client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProperties")]
pub struct Properties {
    base_url: Url,
    protocol_version: ProtocolVersion,
    protocol: BTreeMap<Endpoint, EndpointProperties>,
    cache: CacheProperties,
    proxy: ProxyProperties,
    http: HttpProperties,
}

impl TryFrom<RawProperties> for Properties {
    type Error = CasError;

    fn try_from(raw: RawProperties) -> CasResult<Self> {
        let base_url = raw
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CasError::Configuration("missing required property: base_url".into()))?;
        let base_url = Url::parse(&base_url)?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CasError::Configuration(format!(
                "base_url must be an http(s) URL, got scheme '{}'",
                base_url.scheme()
            )));
        }

        for endpoint in raw.protocol_version.required_endpoints() {
            if !raw.protocol.contains_key(endpoint) {
                return Err(CasError::Configuration(format!(
                    "missing required endpoint definition: protocol.{endpoint}"
                )));
            }
        }

        check_duration("cache.ticket_ttl_secs", raw.cache.ticket_ttl_secs)?;
        check_duration("http.timeout_secs", raw.http.timeout_secs)?;
        raw.proxy.validate()?;

        let mut protocol = raw.protocol;
        for properties in protocol.values_mut() {
            properties.normalize();
        }

        Ok(Self {
            base_url,
            protocol_version: raw.protocol_version,
            protocol,
            cache: raw.cache,
            proxy: raw.proxy,
            http: raw.http,
        })
    }
}

impl Properties {
    /// Creates properties with the standard endpoint definitions of a protocol version.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if the base URL is not a valid http(s) URL.
    pub fn for_server(base_url: &str, version: ProtocolVersion) -> CasResult<Self> {
        let mut protocol = BTreeMap::new();
        protocol.insert(
            Endpoint::Login,
            EndpointProperties::new(
                "/login",
                &[params::SERVICE, params::RENEW, params::GATEWAY, "method"],
            ),
        );
        protocol.insert(
            Endpoint::Logout,
            EndpointProperties::new("/logout", &[params::SERVICE]),
        );
        protocol.insert(
            Endpoint::Validate,
            EndpointProperties::new(
                "/validate",
                &[params::SERVICE, params::TICKET, params::RENEW],
            ),
        );

        let validate_parameters: &[&str] = match version {
            ProtocolVersion::V3 => &[
                params::SERVICE,
                params::TICKET,
                params::PGT_URL,
                params::RENEW,
                params::FORMAT,
            ],
            _ => &[params::SERVICE, params::TICKET, params::PGT_URL, params::RENEW],
        };
        match version {
            ProtocolVersion::V1 => {}
            ProtocolVersion::V2 => {
                protocol.insert(
                    Endpoint::ServiceValidate,
                    EndpointProperties::new("/serviceValidate", validate_parameters),
                );
                protocol.insert(
                    Endpoint::ProxyValidate,
                    EndpointProperties::new("/proxyValidate", validate_parameters),
                );
            }
            ProtocolVersion::V3 => {
                protocol.insert(
                    Endpoint::ServiceValidate,
                    EndpointProperties::new("/p3/serviceValidate", validate_parameters),
                );
                protocol.insert(
                    Endpoint::ProxyValidate,
                    EndpointProperties::new("/p3/proxyValidate", validate_parameters),
                );
            }
        }
        if version != ProtocolVersion::V1 {
            protocol.insert(
                Endpoint::Proxy,
                EndpointProperties::new("/proxy", &[params::PGT, params::TARGET_SERVICE]),
            );
        }

        Self::try_from(RawProperties {
            base_url: Some(base_url.to_string()),
            protocol_version: version,
            protocol,
            cache: CacheProperties::default(),
            proxy: ProxyProperties::default(),
            http: HttpProperties::default(),
        })
    }

    /// Parses and validates properties from a JSON document.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if the document is invalid or incomplete.
    pub fn from_json_str(json: &str) -> CasResult<Self> {
        serde_json::from_str(json).map_err(|e| CasError::Configuration(e.to_string()))
    }

    /// Parses and validates properties from a TOML document.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if the document is invalid or incomplete.
    pub fn from_toml_str(toml: &str) -> CasResult<Self> {
        toml::from_str(toml).map_err(|e| CasError::Configuration(e.to_string()))
    }

    /// Returns the whole configuration tree.
    #[must_use]
    pub fn all(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Looks up a value by dotted path, e.g. `protocol.serviceValidate.default_parameters.format`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<serde_json::Value> {
        let mut current = self.all();
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                serde_json::Value::Object(mut map) => map.remove(segment)?,
                serde_json::Value::Array(mut items) => {
                    let index: usize = segment.parse().ok()?;
                    if index >= items.len() {
                        return None;
                    }
                    items.swap_remove(index)
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Looks up a value by dotted path, falling back to `default`.
    #[must_use]
    pub fn get_or(&self, path: &str, default: serde_json::Value) -> serde_json::Value {
        self.get(path).unwrap_or(default)
    }

    /// The CAS server base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The protocol version.
    #[must_use]
    pub const fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// Returns an endpoint definition.
    #[must_use]
    pub fn endpoint(&self, endpoint: Endpoint) -> Option<&EndpointProperties> {
        self.protocol.get(&endpoint)
    }

    /// Returns an endpoint definition or a configuration error.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if the endpoint is not configured.
    pub fn require_endpoint(&self, endpoint: Endpoint) -> CasResult<&EndpointProperties> {
        self.endpoint(endpoint).ok_or_else(|| {
            CasError::Configuration(format!("endpoint protocol.{endpoint} is not configured"))
        })
    }

    /// Absolute URL of an endpoint, without query parameters.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if the endpoint is missing or its URL is invalid.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> CasResult<Url> {
        let path = &self.require_endpoint(endpoint)?.path;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// How long validated tickets are cached.
    #[must_use]
    pub const fn ticket_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ticket_ttl_secs)
    }

    /// How long a validation waits for its proxy callback.
    #[must_use]
    pub const fn callback_wait(&self) -> Duration {
        Duration::from_secs(self.proxy.callback_wait_secs)
    }

    /// How long an unclaimed PGT is buffered.
    #[must_use]
    pub const fn correlation_ttl(&self) -> Duration {
        Duration::from_secs(self.proxy.correlation_ttl_secs)
    }

    /// Whether callbacks without a pending correlation are buffered.
    #[must_use]
    pub const fn accept_unsolicited_callbacks(&self) -> bool {
        self.proxy.accept_unsolicited_callbacks
    }

    /// Path of the proxy callback handler.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.proxy.callback_path
    }

    /// Timeout of outbound calls.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Returns a copy with an endpoint definition replaced.
    #[must_use]
    pub fn with_endpoint(&self, endpoint: Endpoint, mut properties: EndpointProperties) -> Self {
        properties.normalize();
        let mut derived = self.clone();
        derived.protocol.insert(endpoint, properties);
        derived
    }

    /// Returns a copy allowing one more parameter on an endpoint.
    ///
    /// Endpoints that are not configured are left untouched.
    #[must_use]
    pub fn with_allowed_parameter(&self, endpoint: Endpoint, name: &str) -> Self {
        let mut derived = self.clone();
        if let Some(properties) = derived.protocol.get_mut(&endpoint) {
            properties.allowed_parameters.insert(name.to_string());
        }
        derived
    }

    /// Returns a copy with a default parameter set on an endpoint.
    ///
    /// The parameter also becomes allowed. Endpoints that are not configured are left untouched.
    #[must_use]
    pub fn with_default_parameter(&self, endpoint: Endpoint, name: &str, value: &str) -> Self {
        let mut derived = self.clone();
        if let Some(properties) = derived.protocol.get_mut(&endpoint) {
            properties
                .default_parameters
                .insert(name.to_string(), value.to_string());
            properties.normalize();
        }
        derived
    }

    /// Returns a copy pointing at another CAS server.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if the URL is not a valid http(s) URL.
    pub fn with_base_url(&self, base_url: &str) -> CasResult<Self> {
        let url = Url::parse(base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CasError::Configuration(format!(
                "base_url must be an http(s) URL, got scheme '{}'",
                url.scheme()
            )));
        }
        let mut derived = self.clone();
        derived.base_url = url;
        Ok(derived)
    }

    /// Returns a copy with different proxy settings.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if a duration is out of range or the
    /// callback path is not absolute.
    pub fn with_proxy(&self, proxy: ProxyProperties) -> CasResult<Self> {
        proxy.validate()?;
        let mut derived = self.clone();
        derived.proxy = proxy;
        Ok(derived)
    }

    /// Proxy settings.
    #[must_use]
    pub const fn proxy(&self) -> &ProxyProperties {
        &self.proxy
    }
}
