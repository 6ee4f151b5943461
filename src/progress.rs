//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator moves through its stages.
//!
//! # Example
//!
//! ```rust
//! use cloudpdf::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct PollCounter {
//!     polls: AtomicU32,
//! }
//!
//! impl ConversionProgressCallback for PollCounter {
//!     fn on_poll(&self, attempt: u32, status: &str) {
//!         self.polls.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("status check #{attempt}: {status}");
//!     }
//! }
//!
//! let counter = Arc::new(PollCounter { polls: AtomicU32::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .credentials("id", "secret")
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Stage;
use crate::output::ConversionOutput;
use std::sync::Arc;
use std::time::Duration;

/// Called by the orchestrator as it runs each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages run sequentially, so calls never overlap, but
/// the trait is `Send + Sync` so a callback can be shared with other tasks.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before a stage issues its request.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finished successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed: Duration) {
        let _ = (stage, elapsed);
    }

    /// Called after every status response.
    ///
    /// # Arguments
    /// * `attempt`: 1-indexed number of the status request
    /// * `status` : status string reported by the service
    fn on_poll(&self, attempt: u32, status: &str) {
        let _ = (attempt, status);
    }

    /// Called when a stage fails. The run aborts right after, except for a
    /// best-effort cleanup.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the PDF is on disk and cleanup has been handled.
    fn on_conversion_complete(&self, output: &ConversionOutput) {
        let _ = output;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
