//! Role-based route authorisation.
//!
//! [`decide`] and [`decide_public`] are pure functions of the session
//! snapshot. [`RouteTable`] classifies paths and is validated on
//! construction so that the protected and public-only guards can never
//! bounce a user between each other.

mod decision;
mod table;

pub use self::decision::{RouteDecision, decide, decide_public, sanitize_return_to};
pub(crate) use self::table::return_to_param;
pub use self::table::{RouteAccess, RouteTable, RouteTableError};

use crate::domain::Role;

/// Sign-in page; always public-only.
pub const LOGIN_PATH: &str = "/login";
/// Generic dashboard for roles without a dedicated one.
pub const FALLBACK_DASHBOARD_PATH: &str = "/dashboard";
/// Query parameter carrying the page to return to after sign-in.
pub const RETURN_TO_PARAM: &str = "from";

/// Landing page for a role. Total and constant-time.
pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Customer => "/dashboard/customer",
        Role::Admin => "/dashboard/admin",
        Role::Sales => "/dashboard/sales",
        Role::Designer => "/dashboard/designer",
        Role::Fabricator => "/dashboard/fabricator",
        Role::Installer => "/dashboard/installer",
        Role::Finance => "/dashboard/finance",
        Role::Unknown => FALLBACK_DASHBOARD_PATH,
    }
}
