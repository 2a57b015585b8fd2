//! User data model as cached by the session.
//!
//! The backend owns user records; the client only validates the shape it
//! receives so the route authoriser can rely on a well-formed role.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`User::try_new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyFirstName,
    EmptyLastName,
    EmptyEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must not contain whitespace"),
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque backend identifier for a user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Portal role. One customer role plus six staff roles.
///
/// Roles the client does not recognise deserialise to [`Role::Unknown`] so a
/// newer backend never breaks sign-in; such users land on the generic
/// dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
    Sales,
    Designer,
    Fabricator,
    Installer,
    Finance,
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Every role the portal knows about, in display order.
    pub const KNOWN: [Role; 7] = [
        Role::Customer,
        Role::Admin,
        Role::Sales,
        Role::Designer,
        Role::Fabricator,
        Role::Installer,
        Role::Finance,
    ];

    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::Sales => "sales",
            Self::Designer => "designer",
            Self::Fabricator => "fabricator",
            Self::Installer => "installer",
            Self::Finance => "finance",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the role belongs to staff rather than customers.
    pub fn is_staff(self) -> bool {
        !matches!(self, Self::Customer | Self::Unknown)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portal user as returned by `/auth/me`.
///
/// ## Invariants
/// - `id` is non-empty and contains no whitespace.
/// - `first_name`, `last_name`, and `email` are non-empty once trimmed.
/// - `role` never changes for the lifetime of a session; a role change
///   requires signing in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    id: UserId,
    role: Role,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    avatar_url: Option<String>,
}

/// Required identity fields for building a [`User`].
#[derive(Debug, Clone)]
pub struct UserIdentity<'a> {
    pub id: &'a str,
    pub role: Role,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

impl User {
    /// Fallible constructor enforcing the identity invariants.
    pub fn try_new(identity: UserIdentity<'_>) -> Result<Self, UserValidationError> {
        let id = UserId::new(identity.id)?;
        let first_name = required(identity.first_name, UserValidationError::EmptyFirstName)?;
        let last_name = required(identity.last_name, UserValidationError::EmptyLastName)?;
        let email = required(identity.email, UserValidationError::EmptyEmail)?;
        Ok(Self {
            id,
            role: identity.role,
            first_name,
            last_name,
            email,
            phone: None,
            avatar_url: None,
        })
    }

    /// Attach an optional phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = non_blank(phone.into());
        self
    }

    /// Attach an optional avatar URL.
    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = non_blank(avatar_url.into());
        self
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Role used for route authorisation.
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Full name for greetings and avatars.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }
}

fn required(value: &str, error: UserValidationError) -> Result<String, UserValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(error)
    } else {
        Ok(trimmed.to_owned())
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    #[serde(alias = "_id")]
    id: String,
    role: Role,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "avatar")]
    avatar_url: Option<String>,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        let User {
            id,
            role,
            first_name,
            last_name,
            email,
            phone,
            avatar_url,
        } = value;
        Self {
            id: id.into(),
            role,
            first_name,
            last_name,
            email,
            phone,
            avatar_url,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        let mut user = User::try_new(UserIdentity {
            id: &value.id,
            role: value.role,
            first_name: &value.first_name,
            last_name: &value.last_name,
            email: &value.email,
        })?;
        user.phone = value.phone.and_then(non_blank);
        user.avatar_url = value.avatar_url.and_then(non_blank);
        Ok(user)
    }
}
