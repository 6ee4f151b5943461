//! Stage 5: poll the job status until the service reports completion.
//!
//! The status endpoint answers `{"status": "...", "asset": {"downloadUri": ...}}`.
//! Only two values are understood:
//!
//! * `in progress`: wait and ask again
//! * `done`       : `asset.downloadUri` holds the converted PDF
//!
//! Anything else ends the run with [`ConvertError::UnexpectedStatus`].
//!
//! ## Wait Strategy
//!
//! Delays between requests follow [`PollPolicy::delay_for`]: exponential
//! from `initial_delay`, capped at `max_delay`. Every request and every
//! delay is raced against the overall `timeout` and the optional
//! [`CancelToken`], so a stuck job can neither hang the process nor ignore
//! Ctrl-C.

use crate::cancel::CancelToken;
use crate::client::{read_json, send, Session};
use crate::config::PollPolicy;
use crate::error::{ConvertError, Stage};
use crate::pipeline::operation::ConversionJob;
use crate::progress::ProgressCallback;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const STATUS_IN_PROGRESS: &str = "in progress";
pub const STATUS_DONE: &str = "done";

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    asset: Option<StatusAsset>,
    /// Present on failed jobs; only logged.
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StatusAsset {
    #[serde(rename = "downloadUri")]
    download_uri: Option<String>,
}

/// Where to fetch the finished PDF from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub download_uri: String,
    /// Status requests issued, including the one that returned `done`.
    pub poll_attempts: u32,
}

/// Classified answer of one status request.
#[derive(Debug, PartialEq, Eq)]
enum JobState {
    InProgress,
    Done { download_uri: String },
}

enum Interrupt {
    TimedOut,
    Cancelled,
}

/// Poll `job.poll_url` until `done`, an unknown status, timeout or cancellation.
pub async fn wait_for_result(
    session: &Session,
    job: &ConversionJob,
    policy: &PollPolicy,
    cancel: Option<&CancelToken>,
    progress: Option<&ProgressCallback>,
) -> Result<ConversionResult, ConvertError> {
    info!("Waiting for conversion at {}", job.poll_url);

    let started = Instant::now();
    let deadline = deadline_after(started, policy.timeout);
    if deadline.is_none() {
        debug!("Poll timeout {:?} is beyond the clock's range; waiting without a deadline", policy.timeout);
    }
    let mut attempts: u32 = 0;

    let interrupted = |why: Interrupt, attempts: u32| match why {
        Interrupt::Cancelled => ConvertError::Cancelled,
        Interrupt::TimedOut => ConvertError::PollTimeout {
            attempts,
            elapsed_secs: started.elapsed().as_secs(),
        },
    };

    loop {
        attempts += 1;
        let (status, state) = race(check_status(session, &job.poll_url), deadline, cancel)
            .await
            .map_err(|why| interrupted(why, attempts))??;

        if let Some(cb) = progress {
            cb.on_poll(attempts, &status);
        }

        match state {
            JobState::Done { download_uri } => {
                info!("PDF ready after {} status checks", attempts);
                return Ok(ConversionResult {
                    download_uri,
                    poll_attempts: attempts,
                });
            }
            JobState::InProgress => {
                let delay = policy.delay_for(attempts);
                debug!("Conversion in progress (check {}), next in {:?}", attempts, delay);
                race(tokio::time::sleep(delay), deadline, cancel)
                    .await
                    .map_err(|why| interrupted(why, attempts))?;
            }
        }
    }
}

/// One status request, returning the raw status string with its classification.
async fn check_status(session: &Session, url: &str) -> Result<(String, JobState), ConvertError> {
    let response = send(Stage::Poll, session.get(url)).await?;
    let body: StatusResponse = read_json(Stage::Poll, response).await?;
    let state = classify(&body)?;
    Ok((body.status, state))
}

fn classify(body: &StatusResponse) -> Result<JobState, ConvertError> {
    match body.status.as_str() {
        STATUS_IN_PROGRESS => Ok(JobState::InProgress),
        STATUS_DONE => body
            .asset
            .as_ref()
            .and_then(|a| a.download_uri.clone())
            .filter(|uri| !uri.is_empty())
            .map(|download_uri| JobState::Done { download_uri })
            .ok_or_else(|| ConvertError::InvalidResponse {
                stage: Stage::Poll,
                detail: "status is done but asset.downloadUri is missing".into(),
            }),
        other => {
            if let Some(ref err) = body.error {
                warn!("Job reported status '{}': {}", other, err);
            }
            Err(ConvertError::UnexpectedStatus {
                status: other.to_string(),
            })
        }
    }
}

/// `started + timeout`, or `None` when that instant is not representable.
fn deadline_after(started: Instant, timeout: Duration) -> Option<Instant> {
    started.checked_add(timeout)
}

/// Run `fut` unless the deadline passes or the token is cancelled first.
/// Cancellation wins ties so an already-cancelled run issues no request.
async fn race<T>(
    fut: impl Future<Output = T>,
    deadline: Option<Instant>,
    cancel: Option<&CancelToken>,
) -> Result<T, Interrupt> {
    let cancelled = async {
        match cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };
    let expired = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        biased;
        _ = cancelled => Err(Interrupt::Cancelled),
        _ = expired => Err(Interrupt::TimedOut),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StatusResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn classify_in_progress() {
        let body = parse(r#"{"status":"in progress"}"#);
        assert_eq!(classify(&body).unwrap(), JobState::InProgress);
    }

    #[test]
    fn classify_done_extracts_download_uri() {
        let body = parse(r#"{"status":"done","asset":{"downloadUri":"https://dl/a1","assetID":"x"}}"#);
        assert_eq!(
            classify(&body).unwrap(),
            JobState::Done {
                download_uri: "https://dl/a1".into()
            }
        );
    }

    #[test]
    fn classify_done_without_uri_is_protocol_error() {
        let body = parse(r#"{"status":"done","asset":{}}"#);
        assert!(matches!(
            classify(&body),
            Err(ConvertError::InvalidResponse { stage: Stage::Poll, .. })
        ));
    }

    #[test]
    fn classify_unknown_status_carries_literal() {
        let body = parse(r#"{"status":"failed","error":{"code":"BAD_PDF","message":"nope"}}"#);
        match classify(&body) {
            Err(ConvertError::UnexpectedStatus { status }) => assert_eq!(status, "failed"),
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn race_prefers_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let deadline = Instant::now() + Duration::from_secs(10);
        let out = race(async { 7 }, Some(deadline), Some(&token)).await;
        assert!(matches!(out, Err(Interrupt::Cancelled)));
    }

    #[tokio::test]
    async fn race_times_out() {
        let deadline = Instant::now() + Duration::from_millis(20);
        let out = race(std::future::pending::<()>(), Some(deadline), None).await;
        assert!(matches!(out, Err(Interrupt::TimedOut)));
    }

    #[tokio::test]
    async fn race_returns_value() {
        let deadline = Instant::now() + Duration::from_secs(10);
        let out = race(async { 7 }, Some(deadline), None).await;
        assert!(matches!(out, Ok(7)));
    }

    #[test]
    fn oversized_timeout_means_no_deadline() {
        let now = Instant::now();
        assert_eq!(deadline_after(now, Duration::from_secs(u64::MAX)), None);
        assert_eq!(deadline_after(now, Duration::MAX), None);
        assert_eq!(
            deadline_after(now, Duration::from_secs(300)),
            Some(now + Duration::from_secs(300))
        );
    }

    #[tokio::test]
    async fn race_without_deadline_runs_to_completion() {
        let out = race(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                7
            },
            None,
            None,
        )
        .await;
        assert!(matches!(out, Ok(7)));
    }
}
