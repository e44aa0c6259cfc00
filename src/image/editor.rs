//! Image editor trait and call-control extensions.

use crate::error::{LensError, Result};
use crate::image::types::{EditRequest, EncodedImage};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A backend that applies a natural-language edit to an image.
///
/// Implementations issue exactly one upstream call per `edit` and never retry.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Applies `request.instruction()` to `request.image()`.
    async fn edit(&self, request: &EditRequest) -> Result<EncodedImage>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;

    /// Checks that the backend is reachable and the credential is accepted.
    async fn health_check(&self) -> Result<()>;
}

/// Extension trait adding timeout and cancellation around a single edit.
#[async_trait]
pub trait ImageEditorExt: ImageEditor {
    /// Runs the edit, giving up after `timeout`.
    async fn edit_with_timeout(
        &self,
        request: &EditRequest,
        timeout: Duration,
    ) -> Result<EncodedImage> {
        match tokio::time::timeout(timeout, self.edit(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis(), "edit timed out");
                Err(LensError::Timeout(timeout))
            }
        }
    }

    /// Runs the edit until it finishes or `token` is cancelled.
    async fn edit_with_cancel(
        &self,
        request: &EditRequest,
        token: &CancellationToken,
    ) -> Result<EncodedImage> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("edit cancelled");
                Err(LensError::Cancelled)
            }
            result = self.edit(request) => result,
        }
    }
}

impl<T: ImageEditor + ?Sized> ImageEditorExt for T {}
