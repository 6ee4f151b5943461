//! Shared HTTP plumbing for the pipeline stages.
//!
//! [`ServiceClient`] owns the one `reqwest::Client` used for the whole run plus
//! the service base address and client id. After authentication it is paired
//! with the access token in a [`Session`], which stamps the two headers every
//! authenticated call needs:
//!
//! ```text
//! Authorization: Bearer <token>
//! x-api-key:     <client_id>
//! ```
//!
//! Pre-signed storage URIs (upload and download) are called through the bare
//! `ServiceClient` and carry neither header.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, Stage};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Header carrying the client id on authenticated calls.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Longest error body kept in [`ConvertError::HttpStatus`].
const MAX_ERROR_BODY: usize = 2048;

/// Opaque bearer token returned by the token endpoint.
///
/// Expiry is not tracked; a run is expected to finish well within the
/// token's lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// HTTP client bound to one service endpoint and client id.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: String,
    client_id: String,
}

impl ServiceClient {
    /// Build the client from a validated config.
    pub fn new(config: &ConversionConfig) -> Result<Self, ConvertError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("cloudpdf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConvertError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.credentials.client_id.clone(),
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Absolute URL for a path under the service base address.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Pair the client with a token for authenticated calls.
    pub fn session(&self, token: AccessToken) -> Session {
        Session {
            client: self.clone(),
            token,
        }
    }
}

/// A [`ServiceClient`] plus the access token obtained for this run.
#[derive(Debug, Clone)]
pub struct Session {
    client: ServiceClient,
    token: AccessToken,
}

impl Session {
    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    /// Attach `Authorization` and `x-api-key` to a request.
    pub fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(self.token.as_str())
            .header(API_KEY_HEADER, self.client.client_id())
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.http().get(url))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.http().post(self.client.endpoint(path)))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.http().delete(self.client.endpoint(path)))
    }
}

/// Send a request, mapping transport failures to [`ConvertError::Transport`]
/// and non-success statuses to [`ConvertError::HttpStatus`].
pub async fn send(stage: Stage, req: RequestBuilder) -> Result<Response, ConvertError> {
    let response = req
        .send()
        .await
        .map_err(|source| ConvertError::Transport { stage, source })?;
    check_status(stage, response).await
}

/// Pass a success response through; turn anything else into an error that
/// carries the status and (truncated) body verbatim.
pub async fn check_status(stage: Stage, response: Response) -> Result<Response, ConvertError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    Err(ConvertError::HttpStatus {
        stage,
        status: status.as_u16(),
        body,
    })
}

/// Decode a JSON success body, reporting shape mismatches as protocol errors.
pub async fn read_json<T: DeserializeOwned>(stage: Stage, response: Response) -> Result<T, ConvertError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ConvertError::Transport { stage, source })?;
    serde_json::from_slice(&bytes).map_err(|e| ConvertError::InvalidResponse {
        stage,
        detail: e.to_string(),
    })
}
