//! Download of the edited image.

use crate::error::Result;
use crate::image::EncodedImage;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Prefix of downloaded file names.
pub const DOWNLOAD_PREFIX: &str = "edited-product";

/// File name for a download made at `at`: `edited-product-<unix millis>.<ext>`.
pub fn download_filename(image: &EncodedImage, at: DateTime<Utc>) -> String {
    format!(
        "{DOWNLOAD_PREFIX}-{}.{}",
        at.timestamp_millis(),
        image.extension()
    )
}

/// Saves `image` into `dir` under a download name stamped with the current time.
pub async fn download(image: &EncodedImage, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let path = dir.as_ref().join(download_filename(image, Utc::now()));
    image.save(&path).await?;
    tracing::info!(path = %path.display(), size_bytes = image.size(), "edited image saved");
    Ok(path)
}
