//! Domain primitives, ports, and services of the portal client runtime.
//!
//! Purpose: hold everything that is independent of HTTP libraries and page
//! rendering. Adapters in `inbound` and `outbound` depend on this module,
//! never the other way round.
//!
//! Public surface:
//! - Error (alias to `error::Error`): error payload rendered by pages.
//! - User, Role: the signed-in user and the role used for authorisation.
//! - LoginCredentials and the account-flow inputs, validated before use.
//! - SessionManager / SessionCore: session lifecycle and single token writer.
//! - HttpGateway: bearer attachment and refresh-and-retry.
//! - routing: route decisions and dashboard resolution.
//! - NotificationCenter: toasts and the persistent feed.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod notifications;
pub mod ports;
pub mod routing;
pub mod session;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    AccessToken, AuthGrant, CredentialValidationError, EmailAddress, EmailVerification,
    LoginCredentials, OTP_LENGTH, PASSWORD_MIN, PasswordChange, PasswordReset, ProfileUpdate,
    RefreshGrant, RefreshToken, Registration, RegistrationForm, TokenPair,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::gateway::HttpGateway;
pub use self::notifications::NotificationCenter;
pub use self::session::{Session, SessionCore, SessionManager};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Role, User, UserId, UserIdentity, UserValidationError};

/// Convenient result alias for domain operations.
///
/// # Examples
/// ```
/// use portal_client::domain::{ClientResult, Error};
///
/// fn load() -> ClientResult<()> {
///     Err(Error::not_found("missing"))
/// }
/// assert!(load().is_err());
/// ```
pub type ClientResult<T> = Result<T, Error>;
