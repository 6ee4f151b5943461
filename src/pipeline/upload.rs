//! Stage 3: PUT the document bytes to the pre-signed upload URI.
//!
//! The file is read whole and sent in one request with an explicit
//! `Content-Length`. The storage endpoint does not negotiate chunked
//! transfer, so streaming is not attempted.

use crate::client::{send, ServiceClient};
use crate::error::{ConvertError, Stage};
use crate::pipeline::asset::UploadTarget;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::info;

/// Upload `path` to `target.upload_uri`. Returns the number of bytes sent.
pub async fn upload(
    client: &ServiceClient,
    target: &UploadTarget,
    path: &Path,
    media_type: &str,
) -> Result<u64, ConvertError> {
    info!("Uploading {} to {}", path.display(), target.upload_uri);

    let body = read_document(path).await?;
    let size = body.len() as u64;

    let req = client
        .http()
        .put(&target.upload_uri)
        .header(CONTENT_TYPE, media_type)
        .header(CONTENT_LENGTH, size)
        .body(body);
    send(Stage::Upload, req).await?;

    info!("Uploaded {} bytes", size);
    Ok(size)
}

/// Read the file, checking the byte count against its metadata so a file
/// that changes mid-read is not sent with a mismatched length.
async fn read_document(path: &Path) -> Result<Vec<u8>, ConvertError> {
    let read_err = |source| ConvertError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;
    let expected = file.metadata().await.map_err(read_err)?.len();

    let mut buf = Vec::with_capacity(expected as usize);
    file.read_to_end(&mut buf).await.map_err(read_err)?;

    if buf.len() as u64 != expected {
        return Err(read_err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("file size changed while reading: expected {expected} bytes, read {}", buf.len()),
        )));
    }
    Ok(buf)
}
