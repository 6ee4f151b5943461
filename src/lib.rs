//! # cloudpdf
//!
//! Convert office documents (DOCX, PPTX, XLSX, RTF, images, …) to PDF through
//! the Adobe PDF Services REST API.
//!
//! No conversion happens locally. The crate drives the service through its
//! fixed sequence of calls and writes the resulting PDF next to the input.
//!
//! ## Pipeline Overview
//!
//! ```text
//! report.docx
//!  │
//!  ├─ 1. Auth      POST /token                     → access token
//!  ├─ 2. Allocate  POST /assets                    → upload URI + asset id
//!  ├─ 3. Upload    PUT  <upload URI>               (raw bytes, Content-Length)
//!  ├─ 4. Convert   POST /operation/createpdf       → Location header
//!  ├─ 5. Poll      GET  <Location>                 until status = done
//!  ├─ 6. Download  GET  <downloadUri>              → report.pdf
//!  └─ 7. Cleanup   DELETE /assets/{asset id}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloudpdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .credentials(
//!             std::env::var("PDF_SERVICES_CLIENT_ID")?,
//!             std::env::var("PDF_SERVICES_CLIENT_SECRET")?,
//!         )
//!         .build()?;
//!     let output = convert("report.docx", &config).await?;
//!     println!("wrote {}", output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cloudpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use config::{
    CleanupPolicy, ConversionConfig, ConversionConfigBuilder, Credentials, PollPolicy,
    DEFAULT_BASE_URL, UNINITIALIZED,
};
pub use convert::{convert, convert_sync, convert_to_file};
pub use error::{ConvertError, Stage};
pub use output::{CleanupOutcome, ConversionOutput, ConversionStats};
pub use pipeline::input::{derive_output_path, media_type_for};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
