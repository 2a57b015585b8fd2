//! Inbound adapters that the page layer drives.
//!
//! Route guards live under [`guards`]; they read session snapshots and never
//! touch transports or storage.

pub mod guards;

pub use guards::{GuardView, Navigator, ProtectedRoute, PublicOnlyRoute, RouteGuard, login_location};
