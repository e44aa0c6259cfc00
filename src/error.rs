//! Error types for image intake, editing and session control.

use std::time::Duration;

/// Coarse classification of a failed intake or edit, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The file's declared content type is not `image/*`.
    InvalidType,
    /// The file exceeds the upload ceiling.
    TooLarge,
    /// The model returned no candidate content parts.
    EmptyResponse,
    /// The model answered with text instead of an image.
    ModelRefused,
    /// The model returned parts, but none carried a usable image.
    NoImageProduced,
    /// The call itself failed (network, auth, quota, timeout, ...).
    TransportError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidType => "invalid_type",
            Self::TooLarge => "too_large",
            Self::EmptyResponse => "empty_response",
            Self::ModelRefused => "model_refused",
            Self::NoImageProduced => "no_image_produced",
            Self::TransportError => "transport_error",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while loading, editing or driving a session.
#[derive(Debug, thiserror::Error)]
pub enum LensError {
    /// Declared content type is not an image.
    #[error("please upload a valid image file (JPEG, PNG, WebP), got {0:?}")]
    InvalidType(String),

    /// Upload exceeds the size ceiling.
    #[error("file size too large ({size} bytes), please upload an image under 10MB")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Ceiling in bytes.
        limit: u64,
    },

    /// No candidate content came back. Carries the block/finish reason if the
    /// provider reported one.
    #[error("no content returned from the model{}", detail_suffix(.0))]
    EmptyResponse(Option<String>),

    /// The model replied with text instead of an image.
    #[error("model returned text instead of an image: \"{0}\"")]
    ModelRefused(String),

    /// Neither an image nor a text part was found.
    #[error("no image generated")]
    NoImageProduced,

    /// An inline image came back but could not be used.
    #[error("model returned an unusable image: {0}")]
    MalformedImage(String),

    /// No API key was configured.
    #[error("no API key configured (set API_KEY or GOOGLE_API_KEY)")]
    MissingCredential,

    /// API key rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Provider returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// Quota or rate limit exhausted.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (reading the upload, saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generate action is already in flight.
    #[error("an edit is already in progress")]
    Busy,

    /// Generate requested with no image loaded.
    #[error("no image loaded")]
    NoImage,

    /// Generate requested with a blank instruction.
    #[error("instruction is empty")]
    EmptyInstruction,

    /// A completion arrived while no request was in flight.
    #[error("no edit request is in flight")]
    NoRequestInFlight,

    /// No result is available to save.
    #[error("no edited image to save")]
    NoResult,

    /// Unknown preset slug.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

impl LensError {
    /// Classifies this error into the user-facing failure taxonomy.
    ///
    /// Returns `None` for local guard errors where no intake or request
    /// was attempted.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::InvalidType(_) => Some(FailureKind::InvalidType),
            Self::TooLarge { .. } => Some(FailureKind::TooLarge),
            Self::EmptyResponse(_) => Some(FailureKind::EmptyResponse),
            Self::ModelRefused(_) => Some(FailureKind::ModelRefused),
            Self::NoImageProduced | Self::MalformedImage(_) => Some(FailureKind::NoImageProduced),
            Self::MissingCredential
            | Self::Auth(_)
            | Self::Api { .. }
            | Self::RateLimited(_)
            | Self::Timeout(_)
            | Self::Cancelled
            | Self::Network(_)
            | Self::Json(_) => Some(FailureKind::TransportError),
            Self::Io(_)
            | Self::Busy
            | Self::NoImage
            | Self::EmptyInstruction
            | Self::NoRequestInFlight
            | Self::NoResult
            | Self::UnknownPreset(_) => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, LensError>;

/// Maximum length of a provider error message kept for display.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Extracts a readable message from a provider error body.
///
/// Google APIs wrap errors as `{"error": {"message": ...}}`; anything else is
/// passed through, whitespace-collapsed and truncated.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());

    let collapsed = extracted.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "empty error body".into();
    }
    if collapsed.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        return format!("{truncated}...");
    }
    collapsed
}
