//! Conversion entry points: the orchestrator that runs every stage in order.
//!
//! ```text
//! resolve input ─▶ authenticate ─▶ allocate ─┬▶ upload ─▶ request ─▶ poll ─▶ download ─┬▶ delete asset
//!                                            └────────── transfer (stages 3–6) ─────────┘
//! ```
//!
//! Everything before allocation fails fast with nothing to release. Once an
//! asset exists, what happens to it depends on [`CleanupPolicy`]:
//!
//! | Policy | transfer ok | transfer failed |
//! |--------|-------------|-----------------|
//! | `Strict`     | delete; delete failure is fatal | no delete, transfer error returned |
//! | `BestEffort` | delete; failure logged | delete; failure logged, transfer error returned |
//! | `Skip`       | asset left in place | asset left in place |
//!
//! A [`CancelToken`](crate::CancelToken) set in the config interrupts whichever
//! stage is in flight, including cleanup, with [`ConvertError::Cancelled`].

use crate::client::{ServiceClient, Session};
use crate::config::{CleanupPolicy, ConversionConfig};
use crate::error::{ConvertError, Stage};
use crate::output::{CleanupOutcome, ConversionOutput, ConversionStats};
use crate::pipeline::asset::{self, UploadTarget};
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::{auth, download, operation, poll, upload};
use std::future::Future;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert a local document to PDF through the service.
///
/// The PDF is written to `config.output_path`, or next to the input with its
/// extension replaced by `.pdf`.
///
/// # Errors
/// Returns `Err(ConvertError)` on the first failing stage. No stage is
/// retried. See the module docs for how cleanup interacts with errors.
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();

    // Fields are public, so a config may not have gone through build().
    if config.credentials.is_uninitialized() {
        return Err(ConvertError::MissingCredentials);
    }

    info!("Starting conversion: {}", input_path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let doc = input::resolve_input(input_path, config).await?;
    let client = ServiceClient::new(config)?;
    let mut stats = ConversionStats::default();

    // ── Step 2: Authenticate ─────────────────────────────────────────────
    let (token, auth_ms) = run_stage(
        config,
        Stage::Authenticate,
        auth::authenticate(&client, &config.credentials),
    )
    .await?;
    stats.auth_duration_ms = auth_ms;
    let session = client.session(token);

    // ── Step 3: Allocate asset ───────────────────────────────────────────
    let (target, _) = run_stage(
        config,
        Stage::AllocateAsset,
        asset::allocate(&session, &doc.media_type),
    )
    .await?;

    // ── Steps 4–7: Transfer, then release the asset ──────────────────────
    let transferred = transfer(&client, &session, &target, &doc, config, &mut stats).await;

    let cleanup = match (config.cleanup, &transferred) {
        (CleanupPolicy::Skip, _) => {
            info!("Leaving asset {} on the service", target.asset_id);
            CleanupOutcome::Skipped
        }
        (CleanupPolicy::Strict, Err(_)) => {
            warn!(
                "Conversion failed; asset {} was not deleted",
                target.asset_id
            );
            CleanupOutcome::Skipped
        }
        (CleanupPolicy::Strict, Ok(())) => {
            match run_stage(config, Stage::Cleanup, asset::delete(&session, &target.asset_id)).await {
                Ok(_) => CleanupOutcome::Deleted,
                Err(e) => {
                    return Err(ConvertError::CleanupFailed {
                        asset_id: target.asset_id.clone(),
                        source: Box::new(e),
                    })
                }
            }
        }
        (CleanupPolicy::BestEffort, _) => {
            match run_stage(config, Stage::Cleanup, asset::delete(&session, &target.asset_id)).await {
                Ok(_) => CleanupOutcome::Deleted,
                Err(e) => {
                    warn!("Could not delete asset {}: {}", target.asset_id, e);
                    CleanupOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        }
    };

    transferred?;

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "PDF generated successfully: {} ({} bytes, {}ms total)",
        doc.output_path.display(),
        stats.downloaded_bytes,
        stats.total_duration_ms
    );

    let output = ConversionOutput {
        input_path: doc.path,
        output_path: doc.output_path,
        media_type: doc.media_type,
        asset_id: target.asset_id,
        cleanup,
        stats,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(&output);
    }

    Ok(output)
}

/// Convert a document and write the PDF to an explicit path.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let mut config = config.clone();
    config.output_path = Some(output_path.as_ref().to_path_buf());
    convert(input_path, &config).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_path, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Upload, request conversion, poll and download. Fills `stats` as it goes.
async fn transfer(
    client: &ServiceClient,
    session: &Session,
    target: &UploadTarget,
    doc: &SourceDocument,
    config: &ConversionConfig,
    stats: &mut ConversionStats,
) -> Result<(), ConvertError> {
    let (uploaded, upload_ms) = run_stage(
        config,
        Stage::Upload,
        upload::upload(client, target, &doc.path, &doc.media_type),
    )
    .await?;
    stats.uploaded_bytes = uploaded;
    stats.upload_duration_ms = upload_ms;

    let (job, request_ms) = run_stage(
        config,
        Stage::RequestConversion,
        operation::request_conversion(session, &target.asset_id),
    )
    .await?;

    let (result, poll_ms) = run_stage(
        config,
        Stage::Poll,
        poll::wait_for_result(
            session,
            &job,
            &config.poll,
            config.cancel.as_ref(),
            config.progress_callback.as_ref(),
        ),
    )
    .await?;
    stats.poll_attempts = result.poll_attempts;
    stats.conversion_duration_ms = request_ms + poll_ms;

    let (downloaded, download_ms) = run_stage(
        config,
        Stage::Download,
        download::download(client, &result, &doc.output_path),
    )
    .await?;
    stats.downloaded_bytes = downloaded;
    stats.download_duration_ms = download_ms;

    Ok(())
}

/// Await one stage, reporting start/finish to the progress callback.
/// Returns the stage output and its duration in milliseconds.
///
/// The stage is dropped mid-flight when the config's cancel token trips.
async fn run_stage<T>(
    config: &ConversionConfig,
    stage: Stage,
    fut: impl Future<Output = Result<T, ConvertError>>,
) -> Result<(T, u64), ConvertError> {
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let outcome = match config.cancel {
        Some(ref token) => tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!("{} cancelled", stage.label());
                Err(ConvertError::Cancelled)
            }
            out = fut => out,
        },
        None => fut.await,
    };
    match outcome {
        Ok(value) => {
            let elapsed = start.elapsed();
            if let Some(cb) = cb {
                cb.on_stage_complete(stage, elapsed);
            }
            Ok((value, elapsed.as_millis() as u64))
        }
        Err(e) => {
            if let Some(cb) = cb {
                cb.on_stage_error(stage, &e.to_string());
            }
            Err(e)
        }
    }
}
