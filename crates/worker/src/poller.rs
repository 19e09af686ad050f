//! The polling loop.
//!
//! [`Poller::run`] pulls the project listing once per interval until its
//! [`CancellationToken`] fires or Azure DevOps answers with one of the two
//! statuses that mean the configuration is wrong (203 or 404). Every
//! iteration runs inside a `poll` span carrying a fresh `execution_id`, so
//! all log lines of one pull can be correlated.
//!
//! Transport failures (DNS, connect, TLS, timeout) are not fatal: they are
//! logged and the next attempt happens after the normal interval.

use std::time::Duration;

use ado_core::error::PollError;
use ado_core::poll::{PollOutcome, PollVerdict};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{ClientError, ProjectSource};

pub struct Poller<S> {
    source: S,
    interval: Duration,
}

impl<S: ProjectSource> Poller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run the loop until cancelled (`Ok`) or a fatal status is seen (`Err`).
    ///
    /// Cancellation is checked before each request and interrupts the
    /// interval sleep; an in-flight request is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), PollError> {
        tracing::info!(
            organization = %self.source.organization(),
            interval_secs = self.interval.as_secs(),
            "Poller started",
        );

        let mut consecutive_failures: u32 = 0;

        while !cancel.is_cancelled() {
            let execution_id = Uuid::new_v4();
            let span = tracing::info_span!("poll", %execution_id);

            async {
                tracing::info!(
                    organization = %self.source.organization(),
                    "Pulling Azure DevOps projects",
                );

                match self.poll_once(execution_id).await {
                    Ok(outcome) => {
                        consecutive_failures = 0;
                        self.inspect(&outcome)?;
                    }
                    Err(e) => {
                        consecutive_failures = consecutive_failures.saturating_add(1);
                        tracing::warn!(
                            error = %e,
                            consecutive_failures,
                            "Azure DevOps request failed, retrying after the polling interval",
                        );
                    }
                }

                tracing::debug!(
                    polling_interval_secs = self.interval.as_secs(),
                    "Waiting for {} seconds",
                    self.interval.as_secs(),
                );

                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.interval) => {}
                }

                Ok::<(), PollError>(())
            }
            .instrument(span)
            .await?;
        }

        tracing::info!("Poller stopped");
        Ok(())
    }

    /// Issue a single request and record its outcome.
    pub async fn poll_once(&self, execution_id: Uuid) -> Result<PollOutcome, ClientError> {
        let started = std::time::Instant::now();
        let response = self.source.fetch_projects().await?;

        Ok(PollOutcome {
            execution_id,
            status_code: response.status,
            content_length: response.content_length,
            polled_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Log the outcome and turn a fatal verdict into an error.
    fn inspect(&self, outcome: &PollOutcome) -> Result<(), PollError> {
        let verdict = outcome.verdict();

        match verdict {
            PollVerdict::CredentialMisconfigured => {
                tracing::error!(status = outcome.status_code, "PAT might be misconfigured.");
            }
            PollVerdict::UrlMisconfigured => {
                tracing::error!(status = outcome.status_code, "A URL might be misconfigured.");
            }
            PollVerdict::Success => {
                tracing::info!(
                    organization = %self.source.organization(),
                    status = outcome.status_code,
                    byte_count = ?outcome.content_length,
                    elapsed_ms = outcome.elapsed_ms,
                    polled_at = %outcome.polled_at.to_rfc3339(),
                    "Pulled Azure DevOps projects",
                );
            }
        }

        match verdict.into_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
