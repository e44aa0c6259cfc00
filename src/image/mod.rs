//! Image intake, editing trait and editing backends.

mod editor;
pub mod intake;
pub mod providers;
mod types;

pub use editor::{ImageEditor, ImageEditorExt};
pub use intake::{load_path, validate_and_decode, UploadedFile, ACCEPTED_TYPES, MAX_UPLOAD_BYTES};
pub use types::{is_image_mime, EditRequest, EncodedImage, ImageFormat};
