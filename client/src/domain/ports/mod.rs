//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_api;
mod http_transport;
mod token_refresher;
mod token_store;

#[cfg(test)]
pub use auth_api::MockAuthApi;
pub use auth_api::AuthApi;
#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{
    ApiRequest, ApiResponse, HttpTransport, Method, RequestMeta, TransportError,
};
#[cfg(test)]
pub use token_refresher::MockTokenRefresher;
pub use token_refresher::TokenRefresher;
#[cfg(test)]
pub use token_store::MockTokenStore;
pub use token_store::{
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore, TokenStoreError, USER_KEY,
};
