//! CAS router configuration.

use axum::{
    routing::{get, post},
    Router,
};

use crate::client::CasClient;

use super::callback::proxy_callback;
use super::sls::single_sign_out;
use super::state::CasState;

/// Creates the router for the requests a CAS server sends to the service.
///
/// # Endpoints
///
/// | Method | Path            | Handler           | Description                      |
/// |--------|-----------------|-------------------|----------------------------------|
/// | GET    | `callback_path` | `proxy_callback`  | Proxy-granting ticket delivery   |
/// | POST   | `logout_path`   | `single_sign_out` | Single sign-out notification     |
pub fn cas_router<T>(callback_path: &str, logout_path: &str) -> Router<CasState<T>>
where
    T: CasClient + Clone + 'static,
{
    Router::new()
        .route(callback_path, get(proxy_callback::<T>))
        .route(logout_path, post(single_sign_out::<T>))
}
