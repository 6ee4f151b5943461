//! Stage 1: exchange client credentials for an access token.

use crate::client::{read_json, send, AccessToken, ServiceClient};
use crate::config::Credentials;
use crate::error::{ConvertError, Stage};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// `POST {base}/token` with a form-encoded `client_id` / `client_secret`.
///
/// Any non-success status aborts the run; there is no retry.
pub async fn authenticate(
    client: &ServiceClient,
    credentials: &Credentials,
) -> Result<AccessToken, ConvertError> {
    info!("Requesting access token for client_id {}", credentials.client_id);

    let req = client.http().post(client.endpoint("/token")).form(&[
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
    ]);
    let response = send(Stage::Authenticate, req).await?;
    let body: TokenResponse = read_json(Stage::Authenticate, response).await?;

    if body.access_token.is_empty() {
        return Err(ConvertError::InvalidResponse {
            stage: Stage::Authenticate,
            detail: "empty access_token".into(),
        });
    }

    debug!("Access token received");
    Ok(AccessToken::new(body.access_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_ignores_extra_fields() {
        let body: TokenResponse = serde_json::from_str(
            r#"{"access_token":"tok123","token_type":"bearer","expires_in":86399}"#,
        )
        .unwrap();
        assert_eq!(body.access_token, "tok123");
    }

    #[test]
    fn token_response_requires_access_token() {
        assert!(serde_json::from_str::<TokenResponse>(r#"{"token":"x"}"#).is_err());
    }
}
