//! Image editing backends.

#[cfg(feature = "gemini-image")]
mod gemini;

#[cfg(feature = "gemini-image")]
pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
