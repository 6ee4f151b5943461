//! Configuration types for a document-to-PDF conversion run.
//!
//! All run behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. The config is constructed once at startup,
//! validated eagerly by [`ConversionConfigBuilder::build`], and then passed by
//! reference into [`crate::convert::convert`]. There is no ambient global
//! state: two runs with different configs never observe each other.

use crate::cancel::CancelToken;
use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default regional endpoint of the PDF Services API.
pub const DEFAULT_BASE_URL: &str = "https://pdf-services-ue1.adobe.io";

/// Placeholder value meaning "credential not filled in yet".
pub const UNINITIALIZED: &str = "UNINITIALIZED";

/// OAuth client credentials exchanged for an access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// True when either value is empty or still the [`UNINITIALIZED`] placeholder.
    pub fn is_uninitialized(&self) -> bool {
        let unset = |v: &str| v.trim().is_empty() || v == UNINITIALIZED;
        unset(&self.client_id) || unset(&self.client_secret)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(UNINITIALIZED, UNINITIALIZED)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// How the status poller waits for the remote job.
///
/// The delay before re-polling starts at `initial_delay`, doubles after every
/// `in progress` answer and is capped at `max_delay`. The whole wait is
/// bounded by `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay before the second status request. Zero re-polls immediately.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Overall budget for the polling stage.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    /// Delay to wait after the `attempt`-th `in progress` answer (1-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.initial_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// What happens to the remote asset once the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupPolicy {
    /// Delete only after a successful download; a failed delete fails the run. (default)
    #[default]
    Strict,
    /// Always try to delete an allocated asset, even when a later stage failed.
    /// A failed delete is logged and reported, never fatal.
    BestEffort,
    /// Leave the asset on the service.
    Skip,
}

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`].
///
/// # Example
/// ```rust
/// use cloudpdf::{CleanupPolicy, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .credentials("my-client-id", "my-client-secret")
///     .cleanup(CleanupPolicy::BestEffort)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Service base address, without trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Client credentials. Default: [`UNINITIALIZED`] placeholders, rejected by `build()`.
    pub credentials: Credentials,

    /// Media type declared for the source document.
    /// If None, inferred from the file extension.
    pub media_type: Option<String>,

    /// Where to write the PDF. If None, the input path with a `.pdf` extension.
    pub output_path: Option<PathBuf>,

    /// Per-request timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Status polling schedule and budget.
    pub poll: PollPolicy,

    /// Remote asset cleanup policy. Default: [`CleanupPolicy::Strict`].
    pub cleanup: CleanupPolicy,

    /// Stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Cancels a run that is waiting on the service.
    pub cancel: Option<CancelToken>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::default(),
            media_type: None,
            output_path: None,
            request_timeout_secs: 60,
            poll: PollPolicy::default(),
            cleanup: CleanupPolicy::default(),
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("media_type", &self.media_type)
            .field("output_path", &self.output_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll", &self.poll)
            .field("cleanup", &self.cleanup)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn credentials(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.config.credentials = Credentials::new(client_id, client_secret);
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.config.media_type = Some(media_type.into());
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.config.poll = policy;
        self
    }

    pub fn poll_initial_delay(mut self, delay: Duration) -> Self {
        self.config.poll.initial_delay = delay;
        self
    }

    pub fn poll_max_delay(mut self, delay: Duration) -> Self {
        self.config.poll.max_delay = delay;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll.timeout = timeout;
        self
    }

    pub fn cleanup(mut self, policy: CleanupPolicy) -> Self {
        self.config.cleanup = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Fails with [`ConvertError::MissingCredentials`] when either credential
    /// is empty or still the placeholder, so a misconfigured run never
    /// touches the network.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.credentials.is_uninitialized() {
            return Err(ConvertError::MissingCredentials);
        }
        match reqwest::Url::parse(&c.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConvertError::InvalidConfig(format!(
                    "base URL must be an http(s) URL, got '{}'",
                    c.base_url
                )))
            }
        }
        if let Some(ref mt) = c.media_type {
            if !mt.contains('/') {
                return Err(ConvertError::InvalidConfig(format!(
                    "media type must look like 'type/subtype', got '{mt}'"
                )));
            }
        }
        if c.request_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "request timeout must be ≥ 1s".into(),
            ));
        }
        if c.poll.timeout.is_zero() {
            return Err(ConvertError::InvalidConfig(
                "poll timeout must be > 0".into(),
            ));
        }
        if c.poll.max_delay < c.poll.initial_delay {
            return Err(ConvertError::InvalidConfig(format!(
                "poll max delay ({:?}) is below the initial delay ({:?})",
                c.poll.max_delay, c.poll.initial_delay
            )));
        }
        Ok(self.config)
    }
}
