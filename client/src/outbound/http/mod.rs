//! HTTP outbound adapters.
//!
//! [`ReqwestTransport`] implements the transport port; the auth adapters sit
//! on top of it (refresh) or of the gateway (everything else).

mod auth_api;
mod dto;
mod token_refresher;
mod transport;

pub use auth_api::HttpAuthApi;
pub use token_refresher::HttpTokenRefresher;
pub use transport::ReqwestTransport;
