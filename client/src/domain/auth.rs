//! Authentication primitives: credentials, account flows, and bearer tokens.
//!
//! Constructors validate raw page-layer input before the session manager
//! talks to a port, so a malformed form never reaches the network. Secrets
//! are held in [`Zeroizing`] buffers and token types redact themselves in
//! `Debug` output.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;
use zeroize::Zeroizing;

use super::{Error, User};

/// Minimum length accepted for a new password.
pub const PASSWORD_MIN: usize = 6;
/// Number of digits in an email verification code.
pub const OTP_LENGTH: usize = 6;

/// Domain error returned when credential or account-flow input is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email does not look like `local@domain.tld`.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// New password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
    /// New password equals the current password.
    PasswordUnchanged,
    /// Verification code is not exactly [`OTP_LENGTH`] digits.
    InvalidOtp,
    /// Password reset token was blank.
    EmptyResetToken,
    /// A required name field was blank.
    EmptyName { field: &'static str },
    /// A profile update carried no changes.
    EmptyProfileUpdate,
}

impl CredentialValidationError {
    fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::EmptyPassword | Self::PasswordTooShort { .. } | Self::PasswordUnchanged => {
                "password"
            }
            Self::InvalidOtp => "otp",
            Self::EmptyResetToken => "token",
            Self::EmptyName { field } => *field,
            Self::EmptyProfileUpdate => "profile",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "empty_email",
            Self::InvalidEmail => "invalid_email",
            Self::EmptyPassword => "empty_password",
            Self::PasswordTooShort { .. } => "password_too_short",
            Self::PasswordUnchanged => "password_unchanged",
            Self::InvalidOtp => "invalid_otp",
            Self::EmptyResetToken => "empty_reset_token",
            Self::EmptyName { .. } => "empty_name",
            Self::EmptyProfileUpdate => "empty_profile_update",
        }
    }
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordUnchanged => write!(f, "new password must differ from the current one"),
            Self::InvalidOtp => write!(f, "verification code must be {OTP_LENGTH} digits"),
            Self::EmptyResetToken => write!(f, "reset token must not be empty"),
            Self::EmptyName { field } => write!(f, "{field} must not be empty"),
            Self::EmptyProfileUpdate => write!(f, "profile update must change at least one field"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

impl From<CredentialValidationError> for Error {
    fn from(value: CredentialValidationError) -> Self {
        Error::invalid_request(value.to_string()).with_details(json!({
            "field": value.field(),
            "code": value.code(),
        }))
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Normalised email address.
///
/// ## Invariants
/// - trimmed and lower-cased.
/// - matches `local@domain.tld` with no whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn parse(raw: &str) -> Result<Self, CredentialValidationError> {
        let normalised = raw.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(CredentialValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&normalised) {
            return Err(CredentialValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

fn new_password(raw: &str) -> Result<Zeroizing<String>, CredentialValidationError> {
    if raw.is_empty() {
        return Err(CredentialValidationError::EmptyPassword);
    }
    if raw.chars().count() < PASSWORD_MIN {
        return Err(CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(Zeroizing::new(raw.to_owned()))
}

fn required_name(raw: &str, field: &'static str) -> Result<String, CredentialValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(CredentialValidationError::EmptyName { field })
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is a normalised [`EmailAddress`].
/// - `password` is non-empty but keeps caller-provided whitespace; strength
///   rules apply to new passwords only, never to sign-in.
///
/// # Examples
/// ```
/// use portal_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" A@B.com ", "secret1").unwrap();
/// assert_eq!(creds.email().as_ref(), "a@b.com");
/// assert_eq!(creds.password(), "secret1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email = EmailAddress::parse(email)?;
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Raw registration form values.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationForm<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password: &'a str,
}

/// Validated customer self-registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    first_name: String,
    last_name: String,
    email: EmailAddress,
    phone: Option<String>,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate a registration form.
    pub fn try_from_form(form: RegistrationForm<'_>) -> Result<Self, CredentialValidationError> {
        Ok(Self {
            first_name: required_name(form.first_name, "firstName")?,
            last_name: required_name(form.last_name, "lastName")?,
            email: EmailAddress::parse(form.email)?,
            phone: form
                .phone
                .map(str::trim)
                .filter(|phone| !phone.is_empty())
                .map(str::to_owned),
            password: new_password(form.password)?,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Email verification code submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailVerification {
    email: EmailAddress,
    otp: String,
}

impl EmailVerification {
    /// Validate an email and a numeric one-time code.
    pub fn try_from_parts(email: &str, otp: &str) -> Result<Self, CredentialValidationError> {
        let email = EmailAddress::parse(email)?;
        let otp = otp.trim();
        if otp.len() != OTP_LENGTH || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(CredentialValidationError::InvalidOtp);
        }
        Ok(Self {
            email,
            otp: otp.to_owned(),
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn otp(&self) -> &str {
        &self.otp
    }
}

/// Password reset using the token mailed by `forgot-password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    token: Zeroizing<String>,
    new_password: Zeroizing<String>,
}

impl PasswordReset {
    pub fn try_from_parts(token: &str, new: &str) -> Result<Self, CredentialValidationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialValidationError::EmptyResetToken);
        }
        Ok(Self {
            token: Zeroizing::new(token.to_owned()),
            new_password: new_password(new)?,
        })
    }

    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    pub fn new_password(&self) -> &str {
        self.new_password.as_str()
    }
}

/// Password change for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    current_password: Zeroizing<String>,
    new_password: Zeroizing<String>,
}

impl PasswordChange {
    pub fn try_from_parts(current: &str, new: &str) -> Result<Self, CredentialValidationError> {
        if current.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        let new_password = new_password(new)?;
        if current == new_password.as_str() {
            return Err(CredentialValidationError::PasswordUnchanged);
        }
        Ok(Self {
            current_password: Zeroizing::new(current.to_owned()),
            new_password,
        })
    }

    pub fn current_password(&self) -> &str {
        self.current_password.as_str()
    }

    pub fn new_password(&self) -> &str {
        self.new_password.as_str()
    }
}

/// Partial profile update. Absent fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Reject updates that would blank a name or change nothing at all.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        if let Some(first_name) = &self.first_name {
            required_name(first_name, "firstName")?;
        }
        if let Some(last_name) = &self.last_name {
            required_name(last_name, "lastName")?;
        }
        let unchanged = self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.avatar_url.is_none();
        if unchanged {
            return Err(CredentialValidationError::EmptyProfileUpdate);
        }
        Ok(())
    }
}

/// Short-lived bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

/// Long-lived credential used only to mint new access tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(Zeroizing<String>);

macro_rules! opaque_token {
    ($name:ident) => {
        impl $name {
            /// Wrap a backend-issued token. Returns `None` for blank input.
            pub fn new(raw: impl Into<String>) -> Option<Self> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    None
                } else {
                    Some(Self(Zeroizing::new(raw)))
                }
            }

            /// Expose the raw token for header construction.
            pub fn expose(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

opaque_token!(AccessToken);
opaque_token!(RefreshToken);

/// Access/refresh token pair. Always stored and cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    access: AccessToken,
    refresh: RefreshToken,
}

impl TokenPair {
    pub fn new(access: AccessToken, refresh: RefreshToken) -> Self {
        Self { access, refresh }
    }

    pub fn access(&self) -> &AccessToken {
        &self.access
    }

    pub fn refresh(&self) -> &RefreshToken {
        &self.refresh
    }

    /// Apply a refresh result. A rotated refresh token replaces the stored
    /// one; when the backend omits it the current one is kept.
    #[must_use]
    pub fn rotate(self, grant: RefreshGrant) -> Self {
        Self {
            access: grant.access,
            refresh: grant.refresh.unwrap_or(self.refresh),
        }
    }
}

/// Result of a successful login or email verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub tokens: TokenPair,
    pub user: User,
}

/// Result of a successful token refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshGrant {
    pub access: AccessToken,
    pub refresh: Option<RefreshToken>,
}
