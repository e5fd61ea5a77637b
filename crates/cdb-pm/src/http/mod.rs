//! Resilient HTTP layer used by the registry client.

mod client;

pub use client::{
    HttpClient, HttpClientConfig, HttpError, ResponseClass, DEFAULT_BACKOFF_FACTOR,
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_USER_AGENT,
};
