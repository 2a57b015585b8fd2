//! Outbound adapters implementing the domain's driven ports.
//!
//! HTTP adapters live under [`http`]; session storage lives under
//! [`token_store`].

pub mod http;
pub mod token_store;

pub use http::{HttpAuthApi, HttpTokenRefresher, ReqwestTransport};
pub use token_store::TabTokenStore;
