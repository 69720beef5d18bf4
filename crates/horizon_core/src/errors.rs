//! Error Types
//!
//! This module defines the error types shared by every Horizon crate.
//!
//! # Overview
//!
//! - [`AssetError`]: a single asset load attempt or a whole load cycle failed
//! - [`SequencerError`]: the animation sequencer could not complete a pass
//! - [`ConfigError`]: site configuration was rejected
//! - [`Error`]: umbrella type with `From` conversions for all of the above
//!
//! Asset and sequencer errors are `Clone` because a single failure is handed
//! to every caller that joined the same in-flight operation.
//!
//! ```rust,ignore
//! use horizon_core::errors::{AssetError, Result};
//!
//! fn check(url: &str) -> Result<()> {
//!     if url.is_empty() {
//!         return Err(AssetError::InvalidUrl(url.to_string()).into());
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Failure of an asset load attempt or of a complete load cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The requested URL was empty or malformed.
    #[error("Invalid asset URL: {0:?}")]
    InvalidUrl(String),

    /// An attempt exceeded its connection-scaled deadline.
    #[error("Loading {url} timed out after {timeout_ms} ms")]
    Timeout {
        /// The asset URL
        url: String,
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// The transport failed before a response was received.
    #[error("Transport error while loading {url}: {reason}")]
    Transport {
        /// The asset URL
        url: String,
        /// Underlying reader message
        reason: String,
    },

    /// The asset does not exist at its source.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {status} while loading {url}")]
    HttpStatus {
        /// The asset URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The bytes arrived but could not be decoded.
    #[error("Failed to decode {url}: {reason}")]
    Decode {
        /// The asset URL
        url: String,
        /// Decoder message
        reason: String,
    },

    /// The URL is already cached (or loading) as another asset kind.
    #[error("{url} is cached as a {cached} but was requested as a {requested}")]
    KindMismatch {
        /// The asset URL
        url: String,
        /// Kind already held by the cache
        cached: &'static str,
        /// Kind asked for by the caller
        requested: &'static str,
    },

    /// Terminal failure of a load cycle. Carries the last attempt's error.
    #[error("Failed to load {url} after {attempts} attempt(s): {source}")]
    LoadFailed {
        /// The asset URL
        url: String,
        /// Attempts made in this cycle
        attempts: u32,
        /// Error of the final attempt
        source: Box<AssetError>,
    },
}

impl AssetError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Timeouts, transport errors, server errors and the throttling statuses
    /// (408, 429) are transient. Missing assets, other client errors and
    /// decode failures are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }

    /// URL the error refers to, if any.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl(url) | Self::NotFound(url) => url,
            Self::Timeout { url, .. }
            | Self::Transport { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::Decode { url, .. }
            | Self::KindMismatch { url, .. }
            | Self::LoadFailed { url, .. } => url,
        }
    }

    /// The innermost attempt error for a `LoadFailed`, otherwise `self`.
    #[must_use]
    pub fn root_cause(&self) -> &AssetError {
        match self {
            Self::LoadFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Failure inside an animation sequencer pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// The host never signalled that its anchors were mounted.
    #[error("Anchors not mounted after {waited_ms} ms")]
    AnchorsMissing {
        /// Time spent waiting
        waited_ms: u64,
    },

    /// The scroll engine rejected an operation or panicked.
    #[error("Scroll engine error: {0}")]
    Engine(String),

    /// A catalog binding could not be registered.
    #[error("Failed to register binding {binding}: {reason}")]
    Registration {
        /// Binding name
        binding: String,
        /// Engine message
        reason: String,
    },
}

/// Rejected site configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds a value outside its accepted range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// The umbrella error type for Horizon.
#[derive(Error, Debug)]
pub enum Error {
    /// Asset loading error.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Animation sequencing error.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
