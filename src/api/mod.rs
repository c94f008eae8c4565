use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod medical_records;
pub mod models;
pub mod patients;
pub mod prescriptions;
pub mod symptom_assessments;

#[cfg(test)]
pub(crate) mod testing;

/// Header carrying the patient a doctor is acting on behalf of.
pub const PATIENT_ID_HEADER: &str = "X-Patient-ID";

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    /// The request never produced a response (connect failure, timeout...).
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// A 2xx response whose body did not match the expected shape.
    #[error("{message}")]
    Decode {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of the response, when there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Server { message, .. }
            | ApiError::Transport { message, .. }
            | ApiError::Decode { message, .. } => message,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Thin HTTP client for the platform's REST backend.
///
/// Every resource wrapper borrows an `ApiClient` and issues exactly one request per
/// call. The client carries an optional bearer token that is attached to every
/// authenticated request; cloning is cheap since `reqwest::Client` is reference counted.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for `base_url` with the given request timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the REST API, e.g. `http://localhost:5000/api`
    /// * `timeout_secs` - Per-request timeout applied by the HTTP client
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|source| ApiError::Transport {
                message: "Failed to create HTTP client".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Sets or clears the default bearer token.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Returns a copy of this client authenticated with `token`.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds a request without the authorization header.
    pub(crate) fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Builds a request carrying the bearer token when one is set.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.public(method, path);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends `builder` and decodes the JSON body into `T`.
    ///
    /// Non-2xx responses become [`ApiError::Server`] carrying the body's `message`
    /// field, or `fallback` when the body has none.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let bytes = self.execute(builder, fallback).await?;
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .and_then(|mut value| {
                models::dedupe_ids(&mut value);
                serde_json::from_value(value)
            })
            .map_err(|source| {
                log::warn!("Undecodable response body: {}", source);
                ApiError::Decode {
                    message: fallback.to_string(),
                    source,
                }
            })
    }

    /// Sends `builder` and ignores whatever body comes back.
    pub(crate) async fn send_discard(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<(), ApiError> {
        self.execute(builder, fallback).await.map(|_| ())
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let response = builder.send().await.map_err(|source| {
            log::warn!("Request failed: {}", source);
            ApiError::Transport {
                message: fallback.to_string(),
                source,
            }
        })?;

        let status = response.status();
        let url = response.url().path().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                message: fallback.to_string(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            log::debug!("{} responded {}: {}", url, status, message);
            return Err(ApiError::Server { status, message });
        }

        Ok(bytes.to_vec())
    }
}
