//! Single sign-out endpoint.

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::client::CasClient;
use crate::error::CasError;

use super::callback::server_request;
use super::state::CasState;

/// POST handler for single sign-out notifications.
///
/// Answers `200` once the ticket of the ended session is evicted and `400`
/// for a body that is not a `LogoutRequest`.
pub async fn single_sign_out<T>(
    State(state): State<CasState<T>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response
where
    T: CasClient + Clone + 'static,
{
    let request = match server_request(&method, &uri, &headers, body) {
        Ok(request) => request,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    match state
        .client
        .with_server_request(request)
        .handle_logout_request()
        .await
    {
        Ok(Some(_)) => StatusCode::OK.into_response(),
        Ok(None) => (StatusCode::BAD_REQUEST, "not a logout request").into_response(),
        Err(err @ CasError::MalformedResponse(_)) => {
            tracing::warn!(error = %err, "Rejected single sign-out notification");
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        Err(err) => {
            let status =
                StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, err.to_string()).into_response()
        }
    }
}
