#![warn(missing_docs)]
//! ProductLens - natural-language editing of product photos.
//!
//! Load a product photo, describe an edit (or pick a preset) and get the
//! edited image back from a remote multimodal model.
//!
//! # Quick Start
//!
//! ```no_run
//! use productlens::{EditorConfig, GeminiEditor, Session};
//!
//! #[tokio::main]
//! async fn main() -> productlens::Result<()> {
//!     let editor = GeminiEditor::builder()
//!         .config(EditorConfig::from_env())
//!         .build()?;
//!
//!     let mut session = Session::new();
//!     session.set_image(productlens::image::load_path("mug.jpg").await?)?;
//!     session.set_instruction("Place the object on a clean white background")?;
//!     session.generate(&editor).await?;
//!
//!     if let Some(edited) = session.generated() {
//!         productlens::export::download(edited, ".").await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini-image`: Gemini (Google) editing backend
//! - `cli`: Command-line interface

pub mod config;
mod error;
pub mod export;
pub mod image;
pub mod presets;
pub mod session;
pub mod view;

// Re-export error types at crate root
pub use error::{FailureKind, LensError, Result};

pub use config::EditorConfig;
pub use image::{
    EditRequest, EncodedImage, ImageEditor, ImageEditorExt, ImageFormat, UploadedFile,
};
pub use presets::{Preset, PRESETS};
pub use session::{EditResult, PendingEdit, Phase, Session};

#[cfg(feature = "gemini-image")]
pub use image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{FailureKind, LensError, Result};
    pub use crate::image::{EditRequest, EncodedImage, ImageEditor, ImageEditorExt};
    pub use crate::session::{EditResult, Phase, Session};

    #[cfg(feature = "gemini-image")]
    pub use crate::image::providers::GeminiEditor;
}
