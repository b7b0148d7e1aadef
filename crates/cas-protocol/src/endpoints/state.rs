//! CAS endpoint state.

use crate::client::CasClient;

/// State of the CAS endpoints: the client every inbound request is bound to.
#[derive(Clone)]
pub struct CasState<T>
where
    T: CasClient + Clone,
{
    /// The client; each handler binds a copy to its own request.
    pub client: T,
}

impl<T: CasClient + Clone> CasState<T> {
    /// Creates the endpoint state.
    pub const fn new(client: T) -> Self {
        Self { client }
    }
}
