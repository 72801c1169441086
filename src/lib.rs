//! Client for raw extractions against the Tick History REST API.
//!
//! One run requests a token, submits the extraction request, polls its status until the job
//! is done and downloads the result, following a single redirect to object storage.

mod auth;
pub mod error;
mod fetch;
pub mod input;
pub mod model;
mod poll;
pub mod progress;
pub mod service;
mod submit;

pub use error::Error;
pub use model::{Credentials, ExtractionReport, ExtractionRequest, ExtractionStatus, SubmitOutcome, Token, TokenInfo};
pub use service::{ExtractionService, FetchOptions, PollPolicy, RawExtractor, TICK_HISTORY_URL};
