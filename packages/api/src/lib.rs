#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP plumbing for the pest map backend.
//!
//! Every repository call goes through [`ApiClient`] instead of calling
//! `reqwest` directly. This keeps the concerns that apply to every request
//! in one place: bearer-token attachment from the [`session::Session`],
//! distinguishing session expiry (401) from other failures, and extracting
//! the server's `{"error": …}` body text for user-facing messages.

pub mod paths;
pub mod session;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::session::Session;

/// Default backend base URL when `PEST_MAP_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

/// Maximum length of the response body preview included in parse errors.
const BODY_PREVIEW_LEN: usize = 500;

/// Errors from backend API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The session token was rejected (HTTP 401). The user must log in
    /// again; callers present this differently from transient failures.
    #[error("Session expired. Log in again.")]
    Unauthorized,

    /// The backend answered with a non-success status other than 401.
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided error text, or the status' canonical reason.
        message: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the decoding failure.
        message: String,
    },
}

/// Maps a non-success response status and body to an [`ApiError`].
///
/// The backend reports failures as `{"error": "…"}`; when the body does
/// not match that shape the raw text (truncated) is used instead.
#[must_use]
pub fn error_for_status(status: u16, body: &str) -> ApiError {
    if status == 401 {
        return ApiError::Unauthorized;
    }

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or_else(|| {
            let mut text = body.trim().to_string();
            text.truncate(BODY_PREVIEW_LEN);
            text
        });

    ApiError::Status { status, message }
}

/// Authenticated JSON client for the pest map backend.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// Creates a client for the given base URL and session store.
    #[must_use]
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    /// Creates a client from `PEST_MAP_API_URL` (default
    /// [`DEFAULT_API_URL`]) with the session at its default location.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("PEST_MAP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url, Session::default_location())
    }

    /// The session store backing this client.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// `GET {base}{path}` decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on connection failure, non-success status
    /// (401 mapped to [`ApiError::Unauthorized`]), or undecodable body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path));
        self.send(request).await
    }

    /// `POST {base}{path}` with a JSON body, decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on connection failure, non-success status, or
    /// undecodable body.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await
    }

    /// `PUT {base}{path}` with a JSON body, decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on connection failure, non-success status, or
    /// undecodable body.
    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.put(self.url(path)).json(body);
        self.send(request).await
    }

    /// `DELETE {base}{path}`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on connection failure or non-success status.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(path));
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status.as_u16(), &body))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attaches the bearer token, re-reading the session store on every
    /// request so an external login/logout takes effect immediately.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.authorize(request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            let mut preview = body;
            preview.truncate(BODY_PREVIEW_LEN);
            ApiError::Parse {
                message: format!("{e} (body: {preview})"),
            }
        })
    }
}
