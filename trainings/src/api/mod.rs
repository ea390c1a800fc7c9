//! Remote trainings collection
//!
//! The store reaches the server only through [`TrainingsApi`]. The HTTP
//! implementation lives in [`http`]; tests use
//! [`MockTrainingsApi`](crate::mocks::MockTrainingsApi).

use crate::types::{Training, TrainingFields, TrainingId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub mod http;

pub use http::HttpTrainingsApi;

/// Result of a remote call
pub type ApiResult<T> = Result<T, ApiError>;

/// Future returned by [`TrainingsApi`] methods
pub type ApiFuture<T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send>>;

/// Errors from the remote collection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server rejected the request (4xx)
    #[error("Request rejected ({status}): {message}")]
    Client {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The server failed (5xx or any other non-success status)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The request never got a response
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be read
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// The configured base URL cannot carry a path
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Classify a non-success status
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (400..500).contains(&status) {
            Self::Client { status, message }
        } else {
            Self::Server { status, message }
        }
    }

    /// Client errors are an expected outcome; everything else is a fault
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    /// HTTP status, if the server answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) | Self::InvalidUrl(_) => None,
        }
    }
}

/// Remote collection of trainings
pub trait TrainingsApi: Send + Sync {
    /// Fetch every training
    fn list(&self) -> ApiFuture<Vec<Training>>;

    /// Fetch one training
    fn get(&self, id: &TrainingId) -> ApiFuture<Training>;

    /// Create a training; the server assigns its id
    fn create(&self, fields: &TrainingFields) -> ApiFuture<Training>;

    /// Replace the fields of a training
    fn update(&self, training: &Training) -> ApiFuture<()>;

    /// Delete a training
    fn delete(&self, id: &TrainingId) -> ApiFuture<()>;
}

/// Decode a list response, skipping entries that are not valid trainings
#[must_use]
pub fn decode_training_list(values: Vec<serde_json::Value>) -> Vec<Training> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(training) => Some(training),
            Err(error) => {
                tracing::warn!(index, %error, "Skipping malformed training");
                None
            },
        })
        .collect()
}
