use std::time::Duration;

use async_recursion::async_recursion;
use http::header::AUTHORIZATION;
use indicatif::ProgressBar;
use reqwest::{StatusCode, Url};

use crate::error::Error;
use crate::model::{ExtractionStatus, Token};
use crate::service::{authorization, ExtractionService, PREFER, RESPOND_ASYNC};

const STATUS_HEADER: &str = "Status";

impl ExtractionService {
    /// Checks the job status at `location` until the server answers `200`.
    ///
    /// Every other answer counts as not ready yet and adds one poll interval to `elapsed`. Once
    /// `elapsed` reaches the policy's timeout the job is given up with [`Error::Timeout`];
    /// otherwise the task sleeps one interval and checks again.
    #[async_recursion]
    pub async fn poll_status(
        &self,
        token: &Token,
        location: &Url,
        spinner: &ProgressBar,
        elapsed: Duration,
    ) -> Result<ExtractionStatus, Error> {
        let check_job_status = self
            .client
            .get(location.clone())
            .header(AUTHORIZATION, authorization(token)?)
            .header(PREFER, RESPOND_ASYNC)
            .send()
            .await?;

        if let Some(status) = check_job_status
            .headers()
            .get(STATUS_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            spinner.set_message(format!("{status} – request status at {location}"));
            tracing::info!(status, "Request status");
        }

        match check_job_status.status() {
            StatusCode::OK => {
                let job_status = check_job_status.text().await?;
                let job_status = serde_json::from_str::<ExtractionStatus>(&job_status)?;
                tracing::info!(job_id = %job_status.job_id, notes = job_status.notes.len(), "Extraction ready");
                Ok(job_status)
            }
            status => {
                if status != StatusCode::ACCEPTED {
                    tracing::warn!(%status, "Unexpected status while polling, treating job as not ready");
                }

                let elapsed = elapsed + self.poll_policy.interval;
                if elapsed >= self.poll_policy.timeout {
                    let timeout = self.poll_policy.timeout;
                    tracing::error!(?elapsed, ?timeout, "Gave up waiting for extraction");
                    return Err(Error::Timeout { elapsed, timeout });
                }

                tokio::time::sleep(self.poll_policy.interval).await;
                self.poll_status(token, location, spinner, elapsed).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use indicatif::ProgressBar;
    use mockito::Server;

    use crate::error::Error;
    use crate::model::{ExtractionStatus, Token};
    use crate::service::tests::{extraction_service, extraction_service_with};
    use crate::service::{FetchOptions, PollPolicy};

    const STATUS_PATH: &str = "/Extractions/ExtractRawResult(ExtractionId='0x05')";

    #[tokio::test]
    async fn given_ready_job_when_poll_status_then_give_status_and_surface_status_header() {
        // Given
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", STATUS_PATH)
            .match_header("authorization", "Tokenabc")
            .match_header("prefer", "respond-async")
            .with_status(200)
            .with_header("status", "Completed")
            .with_body(r#"{"JobId": "J1", "Notes": ["n1", "n2"]}"#)
            .create_async()
            .await;
        let location = format!("{url}{STATUS_PATH}", url = server.url()).parse().unwrap();
        let spinner = ProgressBar::hidden();

        // When
        let status = extraction_service(&server.url())
            .poll_status(&Token::new("abc"), &location, &spinner, Duration::ZERO)
            .await
            .unwrap();

        // Then
        m.assert_async().await;
        assert_eq!(
            status,
            ExtractionStatus {
                job_id: "J1".to_string(),
                notes: vec!["n1".to_string(), "n2".to_string()],
            }
        );
        assert!(spinner.message().starts_with("Completed"));
    }

    #[tokio::test]
    async fn given_pending_job_when_poll_status_then_retry_until_ready() {
        // Given
        let mut server = Server::new_async().await;
        let pending = server
            .mock("GET", STATUS_PATH)
            .with_status(202)
            .with_header("status", "InProgress")
            .expect(3)
            .create_async()
            .await;
        let ready = server
            .mock("GET", STATUS_PATH)
            .with_status(200)
            .with_body(r#"{"JobId": "J1", "Notes": []}"#)
            .create_async()
            .await;
        let location = format!("{url}{STATUS_PATH}", url = server.url()).parse().unwrap();

        // When
        let status = extraction_service(&server.url())
            .poll_status(&Token::new("abc"), &location, &ProgressBar::hidden(), Duration::ZERO)
            .await
            .unwrap();

        // Then
        pending.assert_async().await;
        ready.assert_async().await;
        assert_eq!(status.job_id, "J1");
    }

    #[tokio::test]
    async fn given_stuck_job_when_poll_status_then_timeout_after_two_attempts() {
        // Given
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", STATUS_PATH)
            .with_status(202)
            .expect(2)
            .create_async()
            .await;
        let location = format!("{url}{STATUS_PATH}", url = server.url()).parse().unwrap();
        let policy = PollPolicy {
            interval: Duration::from_millis(30),
            timeout: Duration::from_millis(60),
        };

        // When
        let error = extraction_service_with(&server.url(), policy, FetchOptions::default())
            .poll_status(&Token::new("abc"), &location, &ProgressBar::hidden(), Duration::ZERO)
            .await
            .unwrap_err();

        // Then
        m.assert_async().await;
        match error {
            Error::Timeout { elapsed, timeout } => {
                assert_eq!(elapsed, Duration::from_millis(60));
                assert_eq!(timeout, Duration::from_millis(60));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn given_server_error_while_polling_when_poll_status_then_keep_waiting() {
        // Given
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", STATUS_PATH)
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let ready = server
            .mock("GET", STATUS_PATH)
            .with_status(200)
            .with_body(r#"{"JobId": "J9"}"#)
            .create_async()
            .await;
        let location = format!("{url}{STATUS_PATH}", url = server.url()).parse().unwrap();

        // When
        let status = extraction_service(&server.url())
            .poll_status(&Token::new("abc"), &location, &ProgressBar::hidden(), Duration::ZERO)
            .await
            .unwrap();

        // Then
        failing.assert_async().await;
        ready.assert_async().await;
        assert_eq!(status.job_id, "J9");
        assert!(status.notes.is_empty());
    }
}
