//! Login and logout redirects.

use cas_integration_tests::{cas_client, ecas_client, FakeCas};
use cas_protocol::{CasClient, Parameters, ProtocolVersion, ServerRequest};

#[tokio::test]
async fn test_login_redirect_points_at_server() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = cas_client(cas.properties(ProtocolVersion::V3)?)?
        .with_server_request(ServerRequest::get("https://app.example.com/page?ticket=ST-old")?);

    let response = client.login(&Parameters::new()).expect("login redirect");
    assert_eq!(response.status, 302);

    let location = ServerRequest::get(response.location().expect("location"))?;
    assert_eq!(
        format!("{}{}", location.uri().origin().ascii_serialization(), location.uri().path()),
        format!("{}/login", cas.base_url())
    );
    assert_eq!(
        location.query_param("service").as_deref(),
        Some("https://app.example.com/page")
    );

    Ok(())
}

#[tokio::test]
async fn test_logout_redirect() -> anyhow::Result<()> {
    let cas = FakeCas::start().await?;
    let client = ecas_client(&cas.properties(ProtocolVersion::V2)?)?;

    let mut parameters = Parameters::new();
    parameters.insert("service".into(), "https://app.example.com/bye".into());
    let response = client.logout(&parameters);

    assert_eq!(response.status, 302);
    let location = ServerRequest::get(response.location().expect("location"))?;
    assert!(location.uri().as_str().starts_with(&format!("{}/logout?", cas.base_url())));
    assert_eq!(
        location.query_param("service").as_deref(),
        Some("https://app.example.com/bye")
    );

    Ok(())
}
