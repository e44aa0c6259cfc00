//! Image editing example - applies a preset to a product photo.
//!
//! Run with: `cargo run --example edit_image -- <product.png> [preset]`
//!
//! Requires the `API_KEY` (or `GOOGLE_API_KEY`) environment variable.

use productlens::{
    export, presets, EditResult, EditorConfig, GeminiEditor, ImageEditorExt, Session,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> productlens::Result<()> {
    let mut args = std::env::args().skip(1);
    let input_path = args
        .next()
        .expect("Usage: edit_image <product.png> [preset]");
    let preset = presets::find(&args.next().unwrap_or_else(|| "studio-lighting".into()))?;

    let editor = GeminiEditor::builder()
        .config(EditorConfig::from_env())
        .build()?;

    let mut session = Session::new();
    session.set_image(productlens::image::load_path(&input_path).await?)?;

    // Run the request outside the session, with a tighter timeout.
    let pending = session.apply_preset(preset)?;
    let outcome = editor
        .edit_with_timeout(pending.request(), Duration::from_secs(60))
        .await;

    match session.complete(pending.ticket(), outcome)? {
        Some(EditResult::Success { image, .. }) => {
            let path = export::download(image, ".").await?;
            println!("Edited image saved to {} ({} bytes)", path.display(), image.size());
        }
        Some(EditResult::Failure { reason, message }) => {
            eprintln!("Edit failed ({reason}): {message}");
        }
        None => {}
    }

    Ok(())
}
