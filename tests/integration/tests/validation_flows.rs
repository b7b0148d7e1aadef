//! Ticket validation flows.

use std::time::Duration;

use cas_integration_tests::{cas_client, ecas_client, serve_client, FakeCas};
use cas_protocol::{CasClient, CasError, Parameters, ProtocolVersion, ServerRequest};

fn ticket_parameters(ticket: &str, service: &str) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert("ticket".into(), ticket.into());
    parameters.insert("service".into(), service.into());
    parameters
}

/// A validated ticket is answered from the cache afterwards.
#[tokio::test]
async fn test_service_ticket_validation_is_cached() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let ticket = cas.issue_service_ticket("https://app.example.com/", "jdoe");

    let parameters = ticket_parameters(&ticket, "https://app.example.com/");
    let first = client
        .request_ticket_validation(&parameters)
        .await?
        .expect("a ticket was supplied");
    assert_eq!(first.user, "jdoe");
    assert_eq!(
        first.attribute("memberOf").map(|v| v.values()),
        Some(vec!["staff", "admins"])
    );

    // The server consumed the ticket; only the cache can answer now.
    let second = client.request_ticket_validation(&parameters).await?;
    assert_eq!(second.as_ref(), Some(&first));
    assert_eq!(cas.validation_calls(), 1);

    Ok(())
}

/// Concurrent validations of one ticket make a single server call.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_validations_share_one_call() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    cas.set_delay(Duration::from_millis(200));
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let ticket = cas.issue_service_ticket("https://app.example.com/", "jdoe");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            let parameters = ticket_parameters(&ticket, "https://app.example.com/");
            tokio::spawn(async move { client.request_service_validate(&parameters).await })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        assert_eq!(result??.user, "jdoe");
    }
    assert_eq!(cas.validation_calls(), 1);

    Ok(())
}

/// Rejections are reported with the server's code and are not cached.
#[tokio::test]
async fn test_rejected_ticket_is_not_cached() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let parameters = ticket_parameters("ST-unknown", "https://app.example.com/");

    for _ in 0..2 {
        let err = client.request_service_validate(&parameters).await.unwrap_err();
        assert!(
            matches!(&err, CasError::AuthenticationFailed { code, .. } if code == "INVALID_TICKET"),
            "unexpected error: {err}"
        );
    }
    assert_eq!(cas.validation_calls(), 2);

    Ok(())
}

/// A ticket issued for another service is refused.
#[tokio::test]
async fn test_service_mismatch() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let ticket = cas.issue_service_ticket("https://other.example.com/", "jdoe");

    let err = client
        .request_service_validate(&ticket_parameters(&ticket, "https://app.example.com/"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("INVALID_SERVICE"));

    Ok(())
}

/// A cached ticket only answers for the service it was validated for.
#[tokio::test]
async fn test_cached_ticket_keeps_its_service() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let ticket = cas.issue_service_ticket("https://app.example.com/", "jdoe");

    client
        .request_service_validate(&ticket_parameters(&ticket, "https://app.example.com/"))
        .await?;

    let err = client
        .request_service_validate(&ticket_parameters(&ticket, "https://other.example.com/"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("INVALID_TICKET"));
    assert_eq!(cas.validation_calls(), 2);

    Ok(())
}

/// CAS 3.0 JSON answers are parsed like XML ones.
#[tokio::test]
async fn test_json_format() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let ticket = cas.issue_service_ticket("https://app.example.com/", "jdoe");

    let mut parameters = ticket_parameters(&ticket, "https://app.example.com/");
    parameters.insert("format".into(), "JSON".into());
    let result = client.request_service_validate(&parameters).await?;

    assert_eq!(result.user, "jdoe");
    assert_eq!(
        result.attribute("email").and_then(|v| v.first()),
        Some("jdoe@example.com")
    );

    Ok(())
}

/// `authenticate` validates the ticket of the inbound request for the
/// request URL without its ticket.
#[tokio::test]
async fn test_authenticate_inbound_request() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let ticket = cas.issue_service_ticket("https://app.example.com/page?tab=2", "jdoe");

    let bound = client.with_server_request(ServerRequest::get(&format!(
        "https://app.example.com/page?tab=2&ticket={ticket}"
    ))?);
    assert!(bound.support_authentication());
    let result = bound.authenticate().await?.expect("request carries a ticket");
    assert_eq!(result.user, "jdoe");

    // Without a ticket, nothing is sent.
    assert!(client.authenticate().await?.is_none());
    assert_eq!(cas.validation_calls(), 1);

    Ok(())
}

/// CAS 1.0 servers answer in plain text.
#[tokio::test]
async fn test_cas1_validation() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V1)?)?;
    let ticket = cas.issue_service_ticket("https://app.example.com/", "jdoe");

    let parameters = ticket_parameters(&ticket, "https://app.example.com/");
    let result = client.request_ticket_validation(&parameters).await?;
    assert_eq!(result.map(|r| r.user).as_deref(), Some("jdoe"));

    // Single use: a second validation would fail, the cache answers instead.
    assert!(client.request_ticket_validation(&parameters).await?.is_some());

    let err = client
        .request_ticket_validation(&ticket_parameters("ST-unknown", "https://app.example.com/"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("INVALID_TICKET"));

    Ok(())
}

/// ECAS asks for user details in XML and reads them.
#[tokio::test]
async fn test_ecas_user_details() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = ecas_client(&cas.properties(ProtocolVersion::V3)?)?;
    let ticket = cas.issue_service_ticket("https://app.example.com/", "jdoe");

    let mut parameters = ticket_parameters(&ticket, "https://app.example.com/");
    parameters.insert("userDetails".into(), "true".into());
    let result = client.request_service_validate(&parameters).await?;

    assert_eq!(result.user, "jdoe");
    assert_eq!(
        result.attribute("departmentNumber").and_then(|v| v.first()),
        Some("DIGIT.B.1")
    );

    Ok(())
}

/// A single sign-out notification evicts the validated ticket.
#[tokio::test]
async fn test_single_sign_out_evicts_ticket() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?;
    let endpoints = serve_client(client.clone()).await?;
    let ticket = cas.issue_service_ticket("https://app.example.com/", "jdoe");
    let parameters = ticket_parameters(&ticket, "https://app.example.com/");

    client.request_service_validate(&parameters).await?;

    let logout_request = format!(
        r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="LR-1" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"><saml:NameID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">jdoe</saml:NameID><samlp:SessionIndex>{ticket}</samlp:SessionIndex></samlp:LogoutRequest>"#
    );
    let response = reqwest::Client::new()
        .post(endpoints.logout_url())
        .form(&[("logoutRequest", logout_request.as_str())])
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    // Evicted: the server is asked again and the ticket is spent.
    let err = client.request_service_validate(&parameters).await.unwrap_err();
    assert_eq!(err.code(), Some("INVALID_TICKET"));
    assert_eq!(cas.validation_calls(), 2);

    let response = reqwest::Client::new()
        .post(endpoints.logout_url())
        .body("not a logout request")
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    Ok(())
}
