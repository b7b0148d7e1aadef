//! # cas-cache
//!
//! Cache abstraction traits for the CAS client.
//!
//! The protocol engine never talks to a concrete store: it is handed a
//! [`CacheProvider`] at construction and uses it for validated-ticket results.
//! [`MemoryCacheProvider`] is the in-process implementation used by default.
//!
//! ## Cache Providers
//!
//! - [`CacheProvider`] - Basic key-value cache operations with TTL
//! - [`AtomicCacheProvider`] - Atomic operations (set-if-not-exists, get-and-delete)
//!
//! ## Example
//!
//! ```ignore
//! use cas_cache::{CacheProvider, CacheResult, MemoryCacheProvider};
//! use std::time::Duration;
//!
//! async fn remember(cache: &MemoryCacheProvider, ticket: &str, user: &str) -> CacheResult<()> {
//!     cache.set(&format!("ticket:{ticket}"), &user, Some(Duration::from_secs(30))).await
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod provider;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryCacheProvider;
pub use provider::{AtomicCacheProvider, CacheProvider};
