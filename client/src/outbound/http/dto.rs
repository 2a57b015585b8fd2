//! Wire shapes for the `/auth/*` endpoints.
//!
//! Request bodies borrow from validated domain values; responses decode into
//! these DTOs first and are mapped into domain grants in one pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    AccessToken, AuthGrant, EmailAddress, EmailVerification, Error, LoginCredentials,
    PasswordChange, PasswordReset, ProfileUpdate, RefreshGrant, RefreshToken, Registration,
    TokenPair, User,
};

#[derive(Debug, Serialize)]
pub(super) struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> From<&'a LoginCredentials> for LoginBody<'a> {
    fn from(value: &'a LoginCredentials) -> Self {
        Self {
            email: value.email().as_ref(),
            password: value.password(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RegisterBody<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    password: &'a str,
}

impl<'a> From<&'a Registration> for RegisterBody<'a> {
    fn from(value: &'a Registration) -> Self {
        Self {
            first_name: value.first_name(),
            last_name: value.last_name(),
            email: value.email().as_ref(),
            phone: value.phone(),
            password: value.password(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyEmailBody<'a> {
    email: &'a str,
    otp: &'a str,
}

impl<'a> From<&'a EmailVerification> for VerifyEmailBody<'a> {
    fn from(value: &'a EmailVerification) -> Self {
        Self {
            email: value.email().as_ref(),
            otp: value.otp(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct EmailBody<'a> {
    email: &'a str,
}

impl<'a> From<&'a EmailAddress> for EmailBody<'a> {
    fn from(value: &'a EmailAddress) -> Self {
        Self {
            email: value.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResetPasswordBody<'a> {
    token: &'a str,
    new_password: &'a str,
}

impl<'a> From<&'a PasswordReset> for ResetPasswordBody<'a> {
    fn from(value: &'a PasswordReset) -> Self {
        Self {
            token: value.token(),
            new_password: value.new_password(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChangePasswordBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl<'a> From<&'a PasswordChange> for ChangePasswordBody<'a> {
    fn from(value: &'a PasswordChange) -> Self {
        Self {
            current_password: value.current_password(),
            new_password: value.new_password(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
}

impl<'a> From<&'a ProfileUpdate> for ProfileUpdateBody<'a> {
    fn from(value: &'a ProfileUpdate) -> Self {
        Self {
            first_name: value.first_name.as_deref(),
            last_name: value.last_name.as_deref(),
            phone: value.phone.as_deref(),
            avatar_url: value.avatar_url.as_deref(),
        }
    }
}

/// Body for both `/auth/refresh` and `/auth/logout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshTokenBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

impl<'a> RefreshTokenBody<'a> {
    pub(super) fn new(token: Option<&'a RefreshToken>) -> Self {
        Self {
            refresh_token: token.map(RefreshToken::expose),
        }
    }
}

/// Serialise a request body into the JSON value carried by an `ApiRequest`.
pub(super) fn to_json<T: Serialize>(body: &T) -> Result<Value, Error> {
    serde_json::to_value(body)
        .map_err(|error| Error::internal(format!("failed to encode request body: {error}")))
}

/// `{accessToken, refreshToken, user}` as returned by login and email
/// verification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthGrantDto {
    access_token: String,
    refresh_token: String,
    user: User,
}

impl AuthGrantDto {
    pub(super) fn into_grant(self) -> Result<AuthGrant, Error> {
        let access = AccessToken::new(self.access_token);
        let refresh = RefreshToken::new(self.refresh_token);
        match (access, refresh) {
            (Some(access), Some(refresh)) => Ok(AuthGrant {
                tokens: TokenPair::new(access, refresh),
                user: self.user,
            }),
            _ => Err(Error::server("sign-in response is missing a token")),
        }
    }
}

/// `/auth/refresh` response. The refresh token is present only when the
/// backend rotates it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshResponseDto {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl RefreshResponseDto {
    pub(super) fn into_grant(self) -> Result<RefreshGrant, Error> {
        let access = AccessToken::new(self.access_token)
            .ok_or_else(|| Error::server("refresh response is missing the access token"))?;
        Ok(RefreshGrant {
            access,
            refresh: self.refresh_token.and_then(RefreshToken::new),
        })
    }
}

/// Profile responses arrive either bare or wrapped in `{ "user": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ProfileDto {
    Wrapped { user: User },
    Bare(User),
}

impl From<ProfileDto> for User {
    fn from(value: ProfileDto) -> Self {
        match value {
            ProfileDto::Wrapped { user } | ProfileDto::Bare(user) => user,
        }
    }
}
