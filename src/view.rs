//! Plain-text rendering of a [`Session`].

use crate::image::EncodedImage;
use crate::session::{EditResult, Phase, Session};
use std::fmt::Write;

fn describe(image: &EncodedImage) -> String {
    format!("{} ({} bytes)", image.mime_type(), image.size())
}

/// Renders the session as a short status block.
pub fn render(session: &Session) -> String {
    let mut out = String::new();
    match session.phase() {
        Phase::Idle => {
            out.push_str("No image loaded. Use /load <path> to pick a product photo.\n");
            return out;
        }
        Phase::Busy => {
            let _ = writeln!(out, "Processing: \"{}\"...", session.instruction());
            return out;
        }
        Phase::Ready | Phase::ReadyWithResult => {}
    }

    if let Some(image) = session.image() {
        let _ = writeln!(out, "Original: {}", describe(image));
    }

    match session.result() {
        Some(EditResult::Success {
            image,
            instruction_echo,
        }) => {
            let _ = writeln!(out, "Edited:   {}", describe(image));
            let _ = writeln!(out, "Prompt:   \"{instruction_echo}\"");
            out.push_str("Use /save to download, /new for another edit, /reset to start over.\n");
        }
        Some(EditResult::Failure { reason, message }) => {
            let _ = writeln!(out, "Error ({reason}): {message}");
            out.push_str("Adjust the instruction and try again, or /retry.\n");
        }
        None => {
            if !session.instruction().is_empty() {
                let _ = writeln!(out, "Instruction: \"{}\"", session.instruction());
            }
            out.push_str("Type an instruction or /preset <name>.\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LensError;

    fn image() -> EncodedImage {
        EncodedImage::from_bytes(b"abc", "image/png").unwrap()
    }

    #[test]
    fn test_render_idle() {
        assert!(render(&Session::new()).starts_with("No image loaded"));
    }

    #[test]
    fn test_render_busy_and_result() {
        let mut session = Session::new();
        session.set_image(image()).unwrap();
        session.set_instruction("brighten").unwrap();
        assert!(render(&session).contains("Original: image/png (3 bytes)"));

        let pending = session.begin_generate().unwrap();
        assert_eq!(render(&session), "Processing: \"brighten\"...\n");

        session.complete(pending.ticket(), Ok(image())).unwrap();
        let text = render(&session);
        assert!(text.contains("Edited:   image/png (3 bytes)"));
        assert!(text.contains("Prompt:   \"brighten\""));
    }

    #[test]
    fn test_render_failure() {
        let mut session = Session::new();
        session.set_image(image()).unwrap();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        session
            .complete(pending.ticket(), Err(LensError::NoImageProduced))
            .unwrap();
        assert!(render(&session).contains("Error (no_image_produced): no image generated"));
    }
}
