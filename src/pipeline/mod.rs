//! Pipeline stages for document-to-PDF conversion.
//!
//! Each submodule implements exactly one step of the service contract. Every
//! stage's output is the next stage's input; nothing runs concurrently.
//!
//! ## Data Flow
//!
//! ```text
//! input ─▶ auth ─▶ asset::allocate ─▶ upload ─▶ operation ─▶ poll ─▶ download ─▶ asset::delete
//! (path)   (token)  (uri, asset id)    (PUT)    (Location)  (status) (PDF)      (DELETE)
//! ```
//!
//! 1. [`input`]    : validate the local file, pick its media type and output path
//! 2. [`auth`]     : exchange client credentials for a bearer token
//! 3. [`asset`]    : allocate an upload destination, and later delete it
//! 4. [`upload`]   : PUT the document bytes to the pre-signed URI
//! 5. [`operation`]: start the create-PDF job and read its status location
//! 6. [`poll`]     : wait for the job with capped backoff, timeout and cancellation
//! 7. [`download`] : stream the PDF to disk

pub mod asset;
pub mod auth;
pub mod download;
pub mod input;
pub mod operation;
pub mod poll;
pub mod upload;
