//! Client runtime for the fabrication operations portal.
//!
//! The crate follows a hexagonal layout:
//! - [`domain`] holds the session lifecycle, the HTTP refresh-and-retry
//!   protocol, route authorisation, and the notification center;
//! - [`inbound`] holds the route guards the page layer renders through;
//! - [`outbound`] holds the `reqwest` transport, the HTTP auth adapters, and
//!   the tab-scoped token store.
//!
//! [`runtime::PortalRuntime`] wires one instance of everything together.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod runtime;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::PortalSettings;
pub use runtime::PortalRuntime;
