//! CAS endpoint handlers.
//!
//! Axum handlers for the requests a CAS server makes to a service:
//!
//! - **Proxy callback** - Delivery of proxy-granting tickets (`pgtId` / `pgtIou`)
//! - **Single sign-out** - `LogoutRequest` notifications posted on logout
//!
//! # Example
//!
//! ```rust,ignore
//! use cas_protocol::endpoints::{cas_router, CasState};
//!
//! let app = Router::new()
//!     .merge(cas_router(properties.callback_path(), "/cas/logout"))
//!     .with_state(CasState::new(ecas));
//! ```

mod callback;
mod router;
mod sls;
mod state;

pub use callback::*;
pub use router::*;
pub use sls::*;
pub use state::*;
