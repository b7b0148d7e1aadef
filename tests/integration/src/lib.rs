//! In-process CAS server for end-to-end tests.
//!
//! [`FakeCas`] serves `validate`, `p3/serviceValidate`, `p3/proxyValidate`
//! and `proxy` under `/cas`. Tickets are single use, and a validation sent
//! with `pgtUrl` calls the service back *before* answering, like real CAS
//! servers do. [`serve_client`] mounts a client's proxy callback and single
//! sign-out endpoints on a local port.

#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use cas_cache::MemoryCacheProvider;
use cas_protocol::endpoints::{cas_router, CasState};
use cas_protocol::{Cas, CasClient, Ecas, Properties, ProtocolVersion, ReqwestHttpClient, ServerRequest};
use parking_lot::Mutex;
use quick_xml::escape::escape;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// The client type most tests use.
pub type TestCas = Cas<ReqwestHttpClient, Arc<MemoryCacheProvider>>;

/// The ECAS client type.
pub type TestEcas = Ecas<ReqwestHttpClient, Arc<MemoryCacheProvider>>;

/// Request URL clients are bound to until a test rebinds them.
pub const APP_URL: &str = "https://app.example.com/";

/// Initializes test logging once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("cas_protocol=debug,cas_integration_tests=debug")
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
struct Issued {
    service: String,
    user: String,
    proxies: Vec<String>,
}

#[derive(Default)]
struct ServerState {
    tickets: Mutex<HashMap<String, Issued>>,
    /// Proxy-granting tickets with their owner and proxy chain.
    pgts: Mutex<HashMap<String, Issued>>,
    sequence: AtomicUsize,
    validation_calls: AtomicUsize,
    proxy_calls: AtomicUsize,
    delay: Mutex<Duration>,
    callbacks: reqwest::Client,
    /// Status and body of every proxy callback answer, in order.
    callback_answers: Mutex<Vec<(u16, String)>>,
}

impl ServerState {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}-fakecas")
    }
}

/// A running in-process CAS server.
pub struct FakeCas {
    base_url: String,
    state: Arc<ServerState>,
    _shutdown: oneshot::Sender<()>,
}

impl FakeCas {
    /// Starts a server on an ephemeral local port.
    pub async fn start() -> anyhow::Result<Self> {
        init_tracing();
        let state = Arc::new(ServerState::default());

        let app = Router::new()
            .route("/cas/validate", get(validate))
            .route("/cas/p3/serviceValidate", get(service_validate))
            .route("/cas/p3/proxyValidate", get(proxy_validate))
            .route("/cas/proxy", get(proxy))
            .with_state(Arc::clone(&state));

        let (shutdown, base_url) = spawn(app).await?;
        Ok(Self {
            base_url: format!("{base_url}/cas"),
            state,
            _shutdown: shutdown,
        })
    }

    /// The CAS base URL, `http://127.0.0.1:<port>/cas`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Standard client properties for this server.
    pub fn properties(&self, version: ProtocolVersion) -> anyhow::Result<Properties> {
        Ok(Properties::for_server(&self.base_url, version)?)
    }

    /// Logs `user` in for `service` and returns the service ticket.
    #[must_use]
    pub fn issue_service_ticket(&self, service: &str, user: &str) -> String {
        let ticket = self.state.next_id("ST");
        self.state.tickets.lock().insert(
            ticket.clone(),
            Issued {
                service: service.to_string(),
                user: user.to_string(),
                proxies: Vec::new(),
            },
        );
        ticket
    }

    /// Number of `validate`, `serviceValidate` and `proxyValidate` calls.
    #[must_use]
    pub fn validation_calls(&self) -> usize {
        self.state.validation_calls.load(Ordering::SeqCst)
    }

    /// Number of `proxy` calls.
    #[must_use]
    pub fn proxy_calls(&self) -> usize {
        self.state.proxy_calls.load(Ordering::SeqCst)
    }

    /// Status and body of every answer the proxy callback gave this server.
    #[must_use]
    pub fn callback_answers(&self) -> Vec<(u16, String)> {
        self.state.callback_answers.lock().clone()
    }

    /// Delays every validation answer.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = delay;
    }
}

/// Builds a CAS client for `properties`, bound to [`APP_URL`].
pub fn cas_client(properties: Properties) -> anyhow::Result<TestCas> {
    let http = ReqwestHttpClient::new(properties.http_timeout())?;
    Ok(Cas::new(
        properties,
        ServerRequest::get(APP_URL)?,
        http,
        Arc::new(MemoryCacheProvider::new()),
    ))
}

/// Builds an ECAS client for `properties`, bound to [`APP_URL`].
pub fn ecas_client(properties: &Properties) -> anyhow::Result<TestEcas> {
    let http = ReqwestHttpClient::new(properties.http_timeout())?;
    Ok(Ecas::new(
        properties,
        ServerRequest::get(APP_URL)?,
        http,
        Arc::new(MemoryCacheProvider::new()),
    ))
}

/// The client side of a test: its proxy callback and single sign-out endpoints.
pub struct ServiceEndpoints {
    base_url: String,
    callback_path: String,
    _shutdown: oneshot::Sender<()>,
}

/// Path of the single sign-out endpoint mounted by [`serve_client`].
pub const LOGOUT_PATH: &str = "/cas/logout";

impl ServiceEndpoints {
    /// Absolute URL of the proxy callback.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.base_url, self.callback_path)
    }

    /// Absolute URL of the single sign-out endpoint.
    #[must_use]
    pub fn logout_url(&self) -> String {
        format!("{}{LOGOUT_PATH}", self.base_url)
    }
}

/// Serves the proxy callback and single sign-out endpoints of `client`.
pub async fn serve_client<T>(client: T) -> anyhow::Result<ServiceEndpoints>
where
    T: CasClient + Clone + 'static,
{
    let callback_path = client.properties().callback_path().to_string();
    let app: Router = cas_router(&callback_path, LOGOUT_PATH).with_state(CasState::new(client));
    let (shutdown, base_url) = spawn(app).await?;
    Ok(ServiceEndpoints {
        base_url,
        callback_path,
        _shutdown: shutdown,
    })
}

async fn spawn(app: Router) -> anyhow::Result<(oneshot::Sender<()>, String)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let (shutdown, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!("Test server error: {}", e);
        }
    });

    Ok((shutdown, format!("http://{addr}")))
}

#[derive(Debug, Deserialize)]
struct ValidateQuery {
    ticket: Option<String>,
    service: Option<String>,
    #[serde(rename = "pgtUrl")]
    pgt_url: Option<String>,
    format: Option<String>,
    #[serde(rename = "userDetails")]
    user_details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyQuery {
    pgt: Option<String>,
    #[serde(rename = "targetService")]
    target_service: Option<String>,
}

struct Success {
    user: String,
    proxies: Vec<String>,
    pgt_iou: Option<String>,
    user_details: bool,
}

async fn validate(State(state): State<Arc<ServerState>>, Query(query): Query<ValidateQuery>) -> Response {
    match check_ticket(&state, &query, false).await {
        Ok(issued) => format!("yes\n{}\n", issued.user).into_response(),
        Err(_) => "no\n\n".into_response(),
    }
}

async fn service_validate(State(state): State<Arc<ServerState>>, Query(query): Query<ValidateQuery>) -> Response {
    validation_response(&state, &query, false).await
}

async fn proxy_validate(State(state): State<Arc<ServerState>>, Query(query): Query<ValidateQuery>) -> Response {
    validation_response(&state, &query, true).await
}

async fn validation_response(state: &ServerState, query: &ValidateQuery, allow_proxy: bool) -> Response {
    let json = query
        .format
        .as_deref()
        .is_some_and(|format| format.eq_ignore_ascii_case("JSON"));

    let issued = match check_ticket(state, query, allow_proxy).await {
        Ok(issued) => issued,
        Err((code, description)) => return failure_response(json, code, description),
    };

    let pgt_iou = match &query.pgt_url {
        Some(pgt_url) => grant_proxy_ticket(state, &issued, pgt_url).await,
        None => None,
    };

    let success = Success {
        user: issued.user,
        proxies: issued.proxies,
        pgt_iou,
        user_details: query.user_details.as_deref() == Some("true"),
    };
    if json {
        json_success(&success)
    } else {
        xml_success(&success)
    }
}

async fn check_ticket(
    state: &ServerState,
    query: &ValidateQuery,
    allow_proxy: bool,
) -> Result<Issued, (&'static str, String)> {
    state.validation_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *state.delay.lock();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (Some(ticket), Some(service)) = (&query.ticket, &query.service) else {
        return Err(("INVALID_REQUEST", "ticket and service are required".to_string()));
    };

    let issued = state
        .tickets
        .lock()
        .remove(ticket)
        .ok_or_else(|| ("INVALID_TICKET", format!("Ticket {ticket} not recognized")))?;
    if ticket.starts_with("PT-") && !allow_proxy {
        return Err(("INVALID_TICKET", format!("Ticket {ticket} is a proxy ticket")));
    }
    if &issued.service != service {
        return Err(("INVALID_SERVICE", format!("Ticket {ticket} was not issued for {service}")));
    }
    Ok(issued)
}

/// Calls the service back with a new PGT; returns its IOU if the service took it.
async fn grant_proxy_ticket(state: &ServerState, issued: &Issued, pgt_url: &str) -> Option<String> {
    let pgt = state.next_id("PGT");
    let iou = state.next_id("PGTIOU");

    let delivered = match state
        .callbacks
        .get(pgt_url)
        .query(&[("pgtId", pgt.as_str()), ("pgtIou", iou.as_str())])
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            state.callback_answers.lock().push((status.as_u16(), body));
            status.is_success()
        }
        Err(_) => false,
    };
    if !delivered {
        tracing::warn!(pgt_url, "Proxy callback refused; no PGT granted");
        return None;
    }

    let mut proxies = vec![pgt_url.to_string()];
    proxies.extend(issued.proxies.iter().cloned());
    state.pgts.lock().insert(
        pgt,
        Issued {
            service: issued.service.clone(),
            user: issued.user.clone(),
            proxies,
        },
    );
    Some(iou)
}

async fn proxy(State(state): State<Arc<ServerState>>, Query(query): Query<ProxyQuery>) -> Response {
    state.proxy_calls.fetch_add(1, Ordering::SeqCst);

    let (Some(pgt), Some(target_service)) = (query.pgt, query.target_service) else {
        return proxy_failure("INVALID_REQUEST", "pgt and targetService are required");
    };
    let Some(granted) = state.pgts.lock().get(&pgt).cloned() else {
        return proxy_failure("INVALID_TICKET", &format!("PGT {pgt} not recognized"));
    };

    let ticket = state.next_id("PT");
    state.tickets.lock().insert(
        ticket.clone(),
        Issued {
            service: target_service,
            user: granted.user,
            proxies: granted.proxies,
        },
    );

    xml(format!(
        r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas"><cas:proxySuccess><cas:proxyTicket>{ticket}</cas:proxyTicket></cas:proxySuccess></cas:serviceResponse>"#
    ))
}

fn proxy_failure(code: &str, description: &str) -> Response {
    xml(format!(
        r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas"><cas:proxyFailure code="{code}">{}</cas:proxyFailure></cas:serviceResponse>"#,
        escape(description)
    ))
}

fn xml_success(success: &Success) -> Response {
    let mut body = String::from(r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas"><cas:authenticationSuccess>"#);
    body.push_str(&format!("<cas:user>{}</cas:user>", escape(&success.user)));
    body.push_str(&format!(
        "<cas:attributes><cas:email>{}@example.com</cas:email><cas:memberOf>staff</cas:memberOf><cas:memberOf>admins</cas:memberOf></cas:attributes>",
        escape(&success.user)
    ));
    if success.user_details {
        body.push_str("<cas:departmentNumber>DIGIT.B.1</cas:departmentNumber>");
    }
    if let Some(iou) = &success.pgt_iou {
        body.push_str(&format!("<cas:proxyGrantingTicket>{iou}</cas:proxyGrantingTicket>"));
    }
    if !success.proxies.is_empty() {
        body.push_str("<cas:proxies>");
        for proxy in &success.proxies {
            body.push_str(&format!("<cas:proxy>{}</cas:proxy>", escape(proxy)));
        }
        body.push_str("</cas:proxies>");
    }
    body.push_str("</cas:authenticationSuccess></cas:serviceResponse>");
    xml(body)
}

fn json_success(success: &Success) -> Response {
    let mut outcome = serde_json::json!({
        "user": success.user,
        "attributes": {
            "email": [format!("{}@example.com", success.user)],
            "memberOf": ["staff", "admins"],
        },
    });
    if let Some(iou) = &success.pgt_iou {
        outcome["proxyGrantingTicket"] = serde_json::json!(iou);
    }
    if !success.proxies.is_empty() {
        outcome["proxies"] = serde_json::json!(success.proxies);
    }
    json(&serde_json::json!({ "serviceResponse": { "authenticationSuccess": outcome } }))
}

fn failure_response(json_format: bool, code: &str, description: String) -> Response {
    if json_format {
        json(&serde_json::json!({
            "serviceResponse": {
                "authenticationFailure": { "code": code, "description": description }
            }
        }))
    } else {
        xml(format!(
            r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas"><cas:authenticationFailure code="{code}">{}</cas:authenticationFailure></cas:serviceResponse>"#,
            escape(&description)
        ))
    }
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml;charset=UTF-8")], body).into_response()
}

fn json(body: &serde_json::Value) -> Response {
    ([(header::CONTENT_TYPE, "application/json;charset=UTF-8")], body.to_string()).into_response()
}
