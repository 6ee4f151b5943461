//! Result types returned by a successful conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to the remote asset at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// The asset was deleted.
    Deleted,
    /// Deletion was attempted and failed; only reachable under
    /// [`crate::CleanupPolicy::BestEffort`].
    Failed { error: String },
    /// Deletion was disabled by [`crate::CleanupPolicy::Skip`].
    Skipped,
}

impl CleanupOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, CleanupOutcome::Deleted)
    }
}

/// Timing and volume figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub uploaded_bytes: u64,
    pub downloaded_bytes: u64,
    /// Number of status requests issued, including the final one.
    pub poll_attempts: u32,
    pub auth_duration_ms: u64,
    pub upload_duration_ms: u64,
    /// From the conversion request until the service reported `done`.
    pub conversion_duration_ms: u64,
    pub download_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The outcome of [`crate::convert::convert`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Media type declared when allocating the asset.
    pub media_type: String,
    /// Identifier of the remote asset used for upload, conversion and cleanup.
    pub asset_id: String,
    pub cleanup: CleanupOutcome,
    pub stats: ConversionStats,
}
