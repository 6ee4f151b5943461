//! Stage 6: fetch the converted PDF and write it to disk.
//!
//! The body is streamed chunk by chunk into `<output>.pdf.tmp` and renamed
//! onto the output path only after the last byte is flushed, so a failed
//! transfer or write never leaves a truncated PDF behind.

use crate::client::{send, ServiceClient};
use crate::error::{ConvertError, Stage};
use crate::pipeline::poll::ConversionResult;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// GET `result.download_uri` and write the body to `output_path`.
/// Returns the number of bytes written.
pub async fn download(
    client: &ServiceClient,
    result: &ConversionResult,
    output_path: &Path,
) -> Result<u64, ConvertError> {
    info!("Downloading PDF to {} from {}", output_path.display(), result.download_uri);

    let response = send(Stage::Download, client.http().get(&result.download_uri)).await?;

    let write_err = |source| ConvertError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source,
    };

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = temp_path_for(output_path);
    let written = match write_stream(response, &tmp_path).await {
        Ok(n) => n,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&tmp_path).await {
                warn!("Could not remove partial download {}: {}", tmp_path.display(), rm);
            }
            return Err(match e {
                WriteFailure::Body(source) => ConvertError::Transport {
                    stage: Stage::Download,
                    source,
                },
                WriteFailure::Io(source) => write_err(source),
            });
        }
    };

    tokio::fs::rename(&tmp_path, output_path)
        .await
        .map_err(write_err)?;

    info!("PDF downloaded: {} bytes", written);
    Ok(written)
}

enum WriteFailure {
    Body(reqwest::Error),
    Io(std::io::Error),
}

async fn write_stream(response: reqwest::Response, path: &Path) -> Result<u64, WriteFailure> {
    let mut file = tokio::fs::File::create(path).await.map_err(WriteFailure::Io)?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(WriteFailure::Body)?;
        file.write_all(&chunk).await.map_err(WriteFailure::Io)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(WriteFailure::Io)?;
    file.sync_all().await.map_err(WriteFailure::Io)?;
    debug!("Wrote {} bytes to {}", written, path.display());
    Ok(written)
}

/// `report.pdf` → `report.pdf.tmp`, in the same directory so the final
/// rename stays on one filesystem.
fn temp_path_for(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output.pdf".into());
    name.push(".tmp");
    output_path.with_file_name(name)
}
