//! [`AuthApi`] adapter over the [`HttpGateway`].
//!
//! Every call goes through the gateway, so bearer attachment and the
//! refresh-and-retry protocol apply exactly as they do for page traffic.

use async_trait::async_trait;

use super::dto::{
    AuthGrantDto, ChangePasswordBody, EmailBody, LoginBody, ProfileDto, ProfileUpdateBody,
    RefreshTokenBody, RegisterBody, ResetPasswordBody, VerifyEmailBody, to_json,
};
use crate::domain::ports::{ApiRequest, AuthApi};
use crate::domain::{
    AuthGrant, EmailAddress, EmailVerification, Error, HttpGateway, LoginCredentials,
    PasswordChange, PasswordReset, ProfileUpdate, RefreshToken, Registration, User,
};

const LOGIN: &str = "/auth/login";
const REGISTER: &str = "/auth/register";
const VERIFY_EMAIL: &str = "/auth/verify-email";
const RESEND_OTP: &str = "/auth/resend-otp";
const FORGOT_PASSWORD: &str = "/auth/forgot-password";
const RESET_PASSWORD: &str = "/auth/reset-password";
const CHANGE_PASSWORD: &str = "/auth/change-password";
const PROFILE: &str = "/auth/me";
const LOGOUT: &str = "/auth/logout";

/// HTTP implementation of the `/auth/*` endpoint family.
#[derive(Clone)]
pub struct HttpAuthApi {
    gateway: HttpGateway,
}

impl HttpAuthApi {
    pub fn new(gateway: HttpGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthGrant, Error> {
        let body = to_json(&LoginBody::from(credentials))?;
        self.gateway
            .execute_json::<AuthGrantDto>(ApiRequest::post(LOGIN, body))
            .await?
            .into_grant()
    }

    async fn register(&self, registration: &Registration) -> Result<(), Error> {
        let body = to_json(&RegisterBody::from(registration))?;
        self.gateway
            .execute_unit(ApiRequest::post(REGISTER, body))
            .await
    }

    async fn verify_email(&self, verification: &EmailVerification) -> Result<AuthGrant, Error> {
        let body = to_json(&VerifyEmailBody::from(verification))?;
        self.gateway
            .execute_json::<AuthGrantDto>(ApiRequest::post(VERIFY_EMAIL, body))
            .await?
            .into_grant()
    }

    async fn resend_otp(&self, email: &EmailAddress) -> Result<(), Error> {
        let body = to_json(&EmailBody::from(email))?;
        self.gateway
            .execute_unit(ApiRequest::post(RESEND_OTP, body))
            .await
    }

    async fn forgot_password(&self, email: &EmailAddress) -> Result<(), Error> {
        let body = to_json(&EmailBody::from(email))?;
        self.gateway
            .execute_unit(ApiRequest::post(FORGOT_PASSWORD, body))
            .await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<(), Error> {
        let body = to_json(&ResetPasswordBody::from(reset))?;
        self.gateway
            .execute_unit(ApiRequest::post(RESET_PASSWORD, body))
            .await
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), Error> {
        let body = to_json(&ChangePasswordBody::from(change))?;
        self.gateway
            .execute_unit(ApiRequest::put(CHANGE_PASSWORD, body))
            .await
    }

    async fn fetch_profile(&self) -> Result<User, Error> {
        self.gateway
            .execute_json::<ProfileDto>(ApiRequest::get(PROFILE))
            .await
            .map(User::from)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, Error> {
        let body = to_json(&ProfileUpdateBody::from(update))?;
        self.gateway
            .execute_json::<ProfileDto>(ApiRequest::put(PROFILE, body))
            .await
            .map(User::from)
    }

    async fn logout(&self, refresh_token: Option<RefreshToken>) -> Result<(), Error> {
        let body = to_json(&RefreshTokenBody::new(refresh_token.as_ref()))?;
        self.gateway
            .execute_unit(ApiRequest::post(LOGOUT, body))
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Endpoint mapping coverage using a scripted transport.

    use std::sync::Arc;

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::ports::Method;
    use crate::domain::{ErrorCode, SessionCore};
    use crate::test_support::{
        RecordingTokenStore, ScriptedRefresher, ScriptedTransport, sample_user, token_pair,
    };

    fn api_over(transport: Arc<ScriptedTransport>, store: RecordingTokenStore) -> HttpAuthApi {
        let core = Arc::new(SessionCore::new(
            Arc::new(store),
            Arc::new(ScriptedRefresher::failing(Error::unauthorized("expired"))),
        ));
        HttpAuthApi::new(HttpGateway::new(transport, core))
    }

    fn signed_in_store() -> RecordingTokenStore {
        RecordingTokenStore::seeded(token_pair("a1", "r1"), Some(sample_user()))
    }

    fn grant_body() -> serde_json::Value {
        json!({
            "accessToken": "a1",
            "refreshToken": "r1",
            "user": {
                "id": "u-1",
                "role": "customer",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "a@b.com"
            }
        })
    }

    #[rstest]
    #[tokio::test]
    async fn login_posts_credentials_without_a_bearer() {
        let transport = Arc::new(ScriptedTransport::always(200, grant_body()));
        let api = api_over(transport.clone(), signed_in_store());
        let credentials = LoginCredentials::try_from_parts("a@b.com", "secret1").expect("valid");

        let grant = api.login(&credentials).await.expect("signed in");

        assert_eq!(grant.user, sample_user());
        let sent = transport.requests();
        let request = sent.first().expect("one request");
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.path(), LOGIN);
        assert!(request.bearer().is_none());
        assert_eq!(
            request.body(),
            Some(&json!({ "email": "a@b.com", "password": "secret1" }))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_login_surfaces_the_backend_message() {
        let transport = Arc::new(ScriptedTransport::always(
            401,
            json!({ "message": "Invalid email or password" }),
        ));
        let api = api_over(transport.clone(), signed_in_store());
        let credentials = LoginCredentials::try_from_parts("a@b.com", "nope").expect("valid");

        let error = api.login(&credentials).await.expect_err("rejected");

        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.message(), "Invalid email or password");
        assert_eq!(transport.requests().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn registration_errors_keep_their_field_details() {
        let transport = Arc::new(ScriptedTransport::always(
            422,
            json!({ "message": "Validation failed", "errors": { "email": "taken" } }),
        ));
        let api = api_over(transport, RecordingTokenStore::default());
        let registration = Registration::try_from_form(crate::domain::RegistrationForm {
            first_name: "Ada",
            last_name: "Lovelace",
            email: "a@b.com",
            phone: None,
            password: "secret1",
        })
        .expect("valid form");

        let error = api.register(&registration).await.expect_err("taken");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(error.details(), Some(&json!({ "email": "taken" })));
    }

    #[rstest]
    #[tokio::test]
    async fn profile_calls_carry_the_bearer() {
        let transport = Arc::new(ScriptedTransport::always(
            200,
            json!({ "user": grant_body()["user"].clone() }),
        ));
        let api = api_over(transport.clone(), signed_in_store());

        let user = api.fetch_profile().await.expect("profile");

        assert_eq!(user, sample_user());
        let sent = transport.requests();
        let request = sent.first().expect("one request");
        assert_eq!(request.path(), PROFILE);
        assert_eq!(request.bearer().map(|token| token.expose()), Some("a1"));
    }

    #[rstest]
    #[tokio::test]
    async fn password_changes_use_put() {
        let transport = Arc::new(ScriptedTransport::always(200, json!({})));
        let api = api_over(transport.clone(), signed_in_store());
        let change = PasswordChange::try_from_parts("secret1", "secret2").expect("valid");

        api.change_password(&change).await.expect("changed");

        let sent = transport.requests();
        let request = sent.first().expect("one request");
        assert_eq!(request.method(), Method::Put);
        assert_eq!(
            request.body(),
            Some(&json!({ "currentPassword": "secret1", "newPassword": "secret2" }))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_logout_never_starts_a_refresh() {
        let transport = Arc::new(ScriptedTransport::always(
            401,
            json!({ "message": "jwt expired" }),
        ));
        let api = api_over(transport.clone(), signed_in_store());

        let error = api
            .logout(RefreshToken::new("r1"))
            .await
            .expect_err("rejected");

        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(transport.requests().len(), 1);
        let sent = transport.requests();
        let request = sent.first().expect("one request");
        assert_eq!(request.body(), Some(&json!({ "refreshToken": "r1" })));
        assert_eq!(request.bearer().map(|token| token.expose()), Some("a1"));
    }
}
