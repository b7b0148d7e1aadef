//! End-to-end tests.
//!
//! These tests run the CAS client against an in-process CAS server and
//! exercise ticket validation, proxy tickets and single sign-out over HTTP.

mod proxy_flows;
mod redirect_flows;
mod validation_flows;
