//! Proxy-granting tickets, proxy tickets and the proxy callback.

use cas_integration_tests::{cas_client, ecas_client, serve_client, FakeCas};
use cas_protocol::{CasClient, CasError, Parameters, ProtocolVersion, ProxyProperties, PROXY_SUCCESS_BODY};

const APP: &str = "https://app.example.com/";
const BACKEND: &str = "https://backend.example.com/api";

fn validation_parameters(ticket: &str, service: &str, pgt_url: Option<&str>) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert("ticket".into(), ticket.into());
    parameters.insert("service".into(), service.into());
    if let Some(pgt_url) = pgt_url {
        parameters.insert("pgtUrl".into(), pgt_url.into());
    }
    parameters
}

fn target(service: &str) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert("targetService".into(), service.into());
    parameters
}

/// The full proxy chain: PGT through the callback, a proxy ticket for a
/// backend, and the backend validating it on `proxyValidate`.
#[tokio::test]
async fn test_proxy_chain() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let app = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let endpoints = serve_client(app.clone()).await?;
    let callback_url = endpoints.callback_url();

    let ticket = cas.issue_service_ticket(APP, "jdoe");
    let result = app
        .request_service_validate(&validation_parameters(&ticket, APP, Some(&callback_url)))
        .await?;
    assert_eq!(result.user, "jdoe");
    assert!(result.proxy_granting_ticket_iou.is_some());
    let pgt = result
        .proxy_granting_ticket
        .expect("the callback delivered a PGT");
    assert!(pgt.starts_with("PGT-"));

    let proxy_ticket = app.request_proxy_ticket(&target(BACKEND), Some(&pgt)).await?;
    assert!(proxy_ticket.starts_with("PT-"));

    // The backend sees a PT and validates it on proxyValidate.
    let backend = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let validated = backend
        .request_ticket_validation(&validation_parameters(&proxy_ticket, BACKEND, None))
        .await?
        .expect("a ticket was supplied");
    assert_eq!(validated.user, "jdoe");
    assert_eq!(validated.proxies, vec![callback_url]);

    Ok(())
}

/// `serviceValidate` does not accept proxy tickets.
#[tokio::test]
async fn test_proxy_ticket_refused_by_service_validate() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let app = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let endpoints = serve_client(app.clone()).await?;

    let ticket = cas.issue_service_ticket(APP, "jdoe");
    let pgt = app
        .request_service_validate(&validation_parameters(&ticket, APP, Some(&endpoints.callback_url())))
        .await?
        .proxy_granting_ticket
        .expect("the callback delivered a PGT");
    let proxy_ticket = app.request_proxy_ticket(&target(BACKEND), Some(&pgt)).await?;

    let backend = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let err = backend
        .request_service_validate(&validation_parameters(&proxy_ticket, BACKEND, None))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("INVALID_TICKET"));

    Ok(())
}

/// An unreachable callback leaves the validation without a PGT.
#[tokio::test]
async fn test_unreachable_callback() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let app = cas_client(cas.properties(ProtocolVersion::V3)?)?;

    let ticket = cas.issue_service_ticket(APP, "jdoe");
    let result = app
        .request_service_validate(&validation_parameters(
            &ticket,
            APP,
            Some("http://127.0.0.1:9/cas/proxy-callback"),
        ))
        .await?;
    assert_eq!(result.user, "jdoe");
    assert!(result.proxy_granting_ticket_iou.is_none());
    assert!(result.proxy_granting_ticket.is_none());

    Ok(())
}

/// Proxy ticket requests fail without a PGT or with an unknown one.
#[tokio::test]
async fn test_proxy_ticket_failures() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let app = cas_client(cas.properties(ProtocolVersion::V3)?)?;

    let err = app.request_proxy_ticket(&target(BACKEND), None).await.unwrap_err();
    assert!(matches!(err, CasError::Proxy(_)), "unexpected error: {err}");
    assert_eq!(cas.proxy_calls(), 0);

    let err = app
        .request_proxy_ticket(&target(BACKEND), Some("PGT-unknown"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, CasError::Proxy(message) if message.contains("INVALID_TICKET")),
        "unexpected error: {err}"
    );
    assert_eq!(cas.proxy_calls(), 1);

    Ok(())
}

/// Callback answers over HTTP.
#[tokio::test]
async fn test_callback_endpoint() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let app = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let endpoints = serve_client(app).await?;
    let http = reqwest::Client::new();

    // Reachability probe.
    let response = http.get(endpoints.callback_url()).send().await?;
    assert_eq!(response.status(), 200);
    assert!(response.text().await?.is_empty());

    // Half a delivery.
    let response = http
        .get(endpoints.callback_url())
        .query(&[("pgtId", "PGT-1")])
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    // Nobody waits for this IOU.
    let response = http
        .get(endpoints.callback_url())
        .query(&[("pgtId", "PGT-1"), ("pgtIou", "PGTIOU-1")])
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    assert!(response.text().await?.contains("INVALID_PGT_IOU"));

    Ok(())
}

/// With unsolicited callbacks accepted, an early PGT is buffered.
#[tokio::test]
async fn test_unsolicited_callback_accepted() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let properties = cas.properties(ProtocolVersion::V3)?.with_proxy(ProxyProperties {
        accept_unsolicited_callbacks: true,
        ..ProxyProperties::default()
    })?;
    let endpoints = serve_client(cas_client(properties)?).await?;

    let response = reqwest::Client::new()
        .get(endpoints.callback_url())
        .query(&[("pgtId", "PGT-1"), ("pgtIou", "PGTIOU-1")])
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    assert!(response.text().await?.contains("proxySuccess"));

    Ok(())
}

/// ECAS answers every callback with its fixed body; the chain still works.
#[tokio::test]
async fn test_ecas_callback() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let app = ecas_client(&cas.properties(ProtocolVersion::V3)?)?;
    let endpoints = serve_client(app.clone()).await?;

    let response = reqwest::Client::new()
        .get(endpoints.callback_url())
        .query(&[("pgtId", "PGT-1"), ("pgtIou", "PGTIOU-1")])
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await?, PROXY_SUCCESS_BODY);

    let ticket = cas.issue_service_ticket(APP, "jdoe");
    let result = app
        .request_service_validate(&validation_parameters(&ticket, APP, Some(&endpoints.callback_url())))
        .await?;
    assert!(result.proxy_granting_ticket.is_some());

    // The callback that delivered the PGT answered 200 with the fixed body too.
    assert_eq!(cas.callback_answers(), vec![(200, PROXY_SUCCESS_BODY.to_string())]);

    Ok(())
}
