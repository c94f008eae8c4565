use reqwest::Method;

use super::models::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, OtpRequest, RegisterRequest,
    ResetPasswordRequest, User, VerifyResponse,
};
use super::{ApiClient, ApiError};

/// Wrapper over the `/auth` endpoints.
///
/// Login and registration are sent without a bearer token; every other call carries
/// whatever token the underlying client holds.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }
}

impl AuthApi<'_> {
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.client.public(Method::POST, "/auth/login").json(&body);
        self.client.send(request, "Login failed").await
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let request = self.client.public(Method::POST, "/auth/register").json(body);
        self.client.send(request, "Registration failed").await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthResponse, ApiError> {
        let body = OtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        let request = self.client.request(Method::POST, "/auth/verify-otp").json(&body);
        self.client.send(request, "OTP verification failed").await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        let request = self
            .client
            .request(Method::POST, "/auth/forgot-password")
            .json(&body);
        self.client
            .send(request, "Failed to send password reset code")
            .await
    }

    pub async fn verify_reset_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<MessageResponse, ApiError> {
        let body = OtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        let request = self
            .client
            .request(Method::POST, "/auth/verify-reset-otp")
            .json(&body);
        self.client.send(request, "Invalid or expired code").await
    }

    pub async fn reset_password(
        &self,
        body: &ResetPasswordRequest,
    ) -> Result<AuthResponse, ApiError> {
        let request = self
            .client
            .request(Method::POST, "/auth/reset-password")
            .json(body);
        self.client.send(request, "Password reset failed").await
    }

    pub async fn resend_reset_otp(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        let request = self
            .client
            .request(Method::POST, "/auth/resend-reset-otp")
            .json(&body);
        self.client.send(request, "Failed to resend code").await
    }

    /// Confirms the current token is still accepted by the backend.
    pub async fn verify(&self) -> Result<VerifyResponse, ApiError> {
        let request = self.client.request(Method::GET, "/auth/verify");
        self.client.send(request, "Session verification failed").await
    }

    /// Replaces the signed-in user's profile with `user`.
    pub async fn update_profile(&self, user: &User) -> Result<User, ApiError> {
        let request = self.client.request(Method::PUT, "/auth/profile").json(user);
        self.client.send(request, "Failed to update profile").await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        let request = self
            .client
            .request(Method::GET, &format!("/auth/user/{}", id));
        self.client.send(request, "Failed to fetch user").await
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::api::testing::{serve, unreachable_client};

    fn auth_ok() -> Value {
        json!({
            "token": "tok-123",
            "user": { "_id": "u1", "firstName": "Ada", "email": "ada@example.com", "role": "patient" }
        })
    }

    #[tokio::test]
    async fn login_returns_token_and_user() {
        let router = Router::new().route(
            "/auth/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "ada@example.com");
                Json(auth_ok())
            }),
        );
        let client = serve(router).await;

        let response = client.auth().login("ada@example.com", "pw").await.unwrap();
        assert_eq!(response.token, "tok-123");
        assert_eq!(response.user.id, "u1");
    }

    #[tokio::test]
    async fn login_is_sent_without_bearer_token() {
        let router = Router::new().route(
            "/auth/login",
            post(|headers: HeaderMap| async move {
                assert!(headers.get("authorization").is_none());
                Json(auth_ok())
            }),
        );
        let client = serve(router).await.with_token("stale");

        client.auth().login("ada@example.com", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn server_message_becomes_the_error() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Invalid credentials" })),
                )
            }),
        );
        let client = serve(router).await;

        let err = client.auth().login("ada@example.com", "bad").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn missing_message_uses_fallback() {
        let router = Router::new().route(
            "/auth/verify",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = serve(router).await.with_token("tok");

        let err = client.auth().verify().await.unwrap_err();
        assert_eq!(err.message(), "Session verification failed");
    }

    #[tokio::test]
    async fn transport_failure_uses_fallback() {
        let err = unreachable_client()
            .auth()
            .forgot_password("ada@example.com")
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Failed to send password reset code");
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn verify_sends_bearer_token() {
        let router = Router::new().route(
            "/auth/verify",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth == "Bearer tok-123" {
                    (StatusCode::OK, Json(json!({ "user": { "_id": "u1" } })))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "no token" })))
                }
            }),
        );
        let client = serve(router).await.with_token("tok-123");

        let verified = client.auth().verify().await.unwrap();
        assert_eq!(verified.user.map(|u| u.id), Some("u1".to_string()));
    }
}
