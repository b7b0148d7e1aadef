//! Proxy callback endpoint.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::client::CasClient;
use crate::error::CasResult;
use crate::http::{CasResponse, ServerRequest};
use crate::types::Parameters;

use super::state::CasState;

impl IntoResponse for CasResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        (status, headers, self.body).into_response()
    }
}

/// Rebuilds the engine's view of an inbound request.
pub(super) fn server_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: String,
) -> CasResult<ServerRequest> {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    ServerRequest::from_parts(
        method.as_str(),
        path_and_query,
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value))),
        body,
    )
}

/// GET handler for the proxy callback.
///
/// A callback the client gives no answer to is a `400 Bad Request`.
pub async fn proxy_callback<T>(
    State(state): State<CasState<T>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response
where
    T: CasClient + Clone + 'static,
{
    let request = match server_request(&method, &uri, &headers, String::new()) {
        Ok(request) => request,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    match state
        .client
        .with_server_request(request)
        .handle_proxy_callback(&Parameters::new())
    {
        Some(response) => response.into_response(),
        None => (StatusCode::BAD_REQUEST, "malformed proxy callback").into_response(),
    }
}
