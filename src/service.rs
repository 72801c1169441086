use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{HeaderValue, LOCATION};
use indicatif::ProgressBar;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, Url};

use crate::error::Error;
use crate::model::{Credentials, ExtractionReport, ExtractionRequest, SubmitOutcome, Token};
use crate::progress::SpinnerHelper;

pub const TICK_HISTORY_URL: &str = "https://selectapi.datascope.refinitiv.com/RestApi/v1";

pub(crate) const PREFER: &str = "Prefer";
pub(crate) const RESPOND_ASYNC: &str = "respond-async";

/// How often the job status is checked and how long to wait for it in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Let the transport decode gzip/deflate bodies instead of writing the compressed bytes.
    pub auto_decompress: bool,
    /// Ask the server to hand the result over from object storage (`X-Direct-Download`).
    pub direct_download: bool,
}

#[async_trait]
pub trait RawExtractor {
    /// Runs one raw extraction end to end and writes the result to `output`.
    async fn extract(
        &self,
        credentials: &Credentials,
        request: &ExtractionRequest,
        output: &Path,
    ) -> Result<ExtractionReport, Error>;
}

pub struct ExtractionService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) poll_policy: PollPolicy,
    pub(crate) fetch_options: FetchOptions,
    pub(crate) show_progress: bool,
}

impl ExtractionService {
    pub fn new(
        base_url: &str,
        poll_policy: PollPolicy,
        fetch_options: FetchOptions,
    ) -> Result<ExtractionService, Error> {
        // Redirects carry meaning in this API (status locations, object storage hand-off),
        // so they are always surfaced to the caller.
        let client = Client::builder()
            .redirect(Policy::none())
            .gzip(fetch_options.auto_decompress)
            .deflate(fetch_options.auto_decompress)
            .build()?;

        tracing::debug!(
            base_url,
            interval = ?poll_policy.interval,
            timeout = ?poll_policy.timeout,
            auto_decompress = fetch_options.auto_decompress,
            direct_download = fetch_options.direct_download,
            "Initialized extraction client"
        );

        Ok(ExtractionService {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_policy,
            fetch_options,
            show_progress: true,
        })
    }

    /// Disables the terminal spinners, e.g. when the output is not a terminal.
    pub fn without_progress(mut self) -> ExtractionService {
        self.show_progress = false;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{url}/{path}", url = self.base_url)
    }

    pub(crate) fn spinner(&self, message: String) -> Result<ProgressBar, Error> {
        if self.show_progress {
            SpinnerHelper::create(message)
        } else {
            let spinner = SpinnerHelper::hidden();
            spinner.set_message(message);
            Ok(spinner)
        }
    }
}

#[async_trait]
impl RawExtractor for ExtractionService {
    async fn extract(
        &self,
        credentials: &Credentials,
        request: &ExtractionRequest,
        output: &Path,
    ) -> Result<ExtractionReport, Error> {
        let token = self.request_token(credentials).await?;

        let submit_spinner = self.spinner("Sending raw extraction request".to_string())?;
        let status = match self.submit_extraction(&token, request).await {
            Ok(SubmitOutcome::Completed(status)) => {
                submit_spinner.finish_with_message(format!(
                    "SUCCESS – extraction completed right away, job id: {job_id}",
                    job_id = status.job_id
                ));
                status
            }
            Ok(SubmitOutcome::Accepted(location)) => {
                submit_spinner.set_message(format!("ACCEPTED – polling request status at {location}"));
                let status = self
                    .poll_status(&token, &location, &submit_spinner, Duration::ZERO)
                    .await;
                match status {
                    Ok(status) => {
                        submit_spinner.finish_with_message(format!(
                            "SUCCESS – extraction completed, job id: {job_id}",
                            job_id = status.job_id
                        ));
                        status
                    }
                    Err(error) => {
                        submit_spinner.abandon_with_message(format!("FAILURE – {error}"));
                        return Err(error);
                    }
                }
            }
            Err(error) => {
                submit_spinner.abandon_with_message(format!("FAILURE – {error}"));
                return Err(error);
            }
        };

        for note in &status.notes {
            tracing::info!(job_id = %status.job_id, note = %note, "Extraction note");
        }

        let download_spinner = self.spinner(format!(
            "Retrieving data for job with id: {job_id}",
            job_id = status.job_id
        ))?;
        let mut file = tokio::fs::File::create(output).await?;
        let fetched = self
            .fetch_result(&token, &status.job_id, &mut file, &download_spinner)
            .await;
        drop(file);

        match fetched {
            Ok(bytes_written) => {
                download_spinner.finish_with_message(format!(
                    "SUCCESS – data for job with id {job_id} written to {output}",
                    job_id = status.job_id,
                    output = output.display()
                ));
                Ok(ExtractionReport {
                    status,
                    output: output.to_path_buf(),
                    bytes_written,
                })
            }
            Err(error) => {
                download_spinner.abandon_with_message(format!("FAILURE – {error}"));
                if let Err(remove_error) = tokio::fs::remove_file(output).await {
                    tracing::warn!(
                        output = %output.display(),
                        error = %remove_error,
                        "Unable to remove incomplete output"
                    );
                }
                Err(error)
            }
        }
    }
}

pub(crate) fn authorization(token: &Token) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&token.header_value())?;
    value.set_sensitive(true);
    Ok(value)
}

/// Resolves the `Location` header of `response` against the URL that was requested.
pub(crate) fn location(response: &Response) -> Result<Option<Url>, Error> {
    let Some(value) = response.headers().get(LOCATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|e| Error::InvalidLocation(format!("Location header is not valid text: {e}")))?;

    response
        .url()
        .join(value)
        .map(Some)
        .map_err(|e| Error::InvalidLocation(format!("Unable to resolve location `{value}`: {e}")))
}
