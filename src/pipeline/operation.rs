//! Stage 4: start the create-PDF job.
//!
//! The job's status location comes back in the `Location` response header,
//! not the body.

use crate::client::{send, Session};
use crate::error::{ConvertError, Stage};
use reqwest::header::LOCATION;
use reqwest::Url;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
struct CreatePdfRequest<'a> {
    #[serde(rename = "assetID")]
    asset_id: &'a str,
}

/// A submitted conversion job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Absolute URL to GET for the job status.
    pub poll_url: String,
}

/// `POST {base}/operation/createpdf` with `{"assetID": ...}`.
pub async fn request_conversion(session: &Session, asset_id: &str) -> Result<ConversionJob, ConvertError> {
    info!("Creating PDF for asset {}", asset_id);

    let req = session
        .post("/operation/createpdf")
        .json(&CreatePdfRequest { asset_id });
    let response = send(Stage::RequestConversion, req).await?;

    let location = response
        .headers()
        .get(LOCATION)
        .ok_or(ConvertError::MissingLocation)?
        .to_str()
        .map_err(|e| ConvertError::InvalidResponse {
            stage: Stage::RequestConversion,
            detail: format!("Location header is not valid text: {e}"),
        })?;

    let poll_url = resolve_location(response.url(), location)?;
    info!("PDF creation initiated, status at {}", poll_url);
    Ok(ConversionJob { poll_url })
}

/// Resolve a possibly relative `Location` against the URL it was returned from.
fn resolve_location(request_url: &Url, location: &str) -> Result<String, ConvertError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ConvertError::MissingLocation);
    }
    request_url
        .join(location)
        .map(String::from)
        .map_err(|e| ConvertError::InvalidResponse {
            stage: Stage::RequestConversion,
            detail: format!("bad Location '{location}': {e}"),
        })
}
