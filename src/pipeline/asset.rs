//! Stages 2 and 7: allocate the remote asset and delete it again.
//!
//! The asset id returned by [`allocate`] is the single handle for the
//! document on the service. It is passed unchanged to the conversion request
//! and to [`delete`]; nothing allocates a second one.

use crate::client::{read_json, send, Session};
use crate::error::{ConvertError, Stage};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
struct AllocateRequest<'a> {
    #[serde(rename = "mediaType")]
    media_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct AllocateResponse {
    #[serde(rename = "uploadUri")]
    upload_uri: String,
    #[serde(rename = "assetID")]
    asset_id: String,
}

/// Where to PUT the document, and the id the service knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub upload_uri: String,
    pub asset_id: String,
}

/// `POST {base}/assets` with `{"mediaType": ...}`.
pub async fn allocate(session: &Session, media_type: &str) -> Result<UploadTarget, ConvertError> {
    info!("Requesting upload URI for {}", media_type);

    let req = session
        .post("/assets")
        .json(&AllocateRequest { media_type });
    let response = send(Stage::AllocateAsset, req).await?;
    let body: AllocateResponse = read_json(Stage::AllocateAsset, response).await?;

    if body.asset_id.is_empty() || body.upload_uri.is_empty() {
        return Err(ConvertError::InvalidResponse {
            stage: Stage::AllocateAsset,
            detail: "empty uploadUri or assetID".into(),
        });
    }

    info!("Asset {} allocated", body.asset_id);
    Ok(UploadTarget {
        upload_uri: body.upload_uri,
        asset_id: body.asset_id,
    })
}

/// `DELETE {base}/assets/{asset_id}`.
pub async fn delete(session: &Session, asset_id: &str) -> Result<(), ConvertError> {
    info!("Deleting asset {}", asset_id);
    send(Stage::Cleanup, session.delete(&format!("/assets/{asset_id}"))).await?;
    info!("Asset {} deleted", asset_id);
    Ok(())
}
