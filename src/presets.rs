//! One-click edit presets.

use crate::error::{LensError, Result};
use serde::Serialize;

/// A quick action with a fixed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Stable identifier for command-line use.
    pub slug: &'static str,
    /// Button label.
    pub label: &'static str,
    /// Instruction sent to the model.
    pub prompt: &'static str,
}

/// All presets, in display order.
pub const PRESETS: &[Preset] = &[
    Preset {
        slug: "remove-background",
        label: "Remove Background",
        prompt: "Remove the background and make it transparent",
    },
    Preset {
        slug: "studio-lighting",
        label: "Studio Lighting",
        prompt: "Enhance lighting to look like a professional studio product shot",
    },
    Preset {
        slug: "white-background",
        label: "White Background",
        prompt: "Place the object on a clean white background",
    },
    Preset {
        slug: "black-and-white",
        label: "Black & White",
        prompt: "Convert the image to artistic black and white",
    },
];

/// Looks up a preset by slug or label, ignoring case.
pub fn find(name: &str) -> Result<&'static Preset> {
    let name = name.trim();
    PRESETS
        .iter()
        .find(|p| p.slug.eq_ignore_ascii_case(name) || p.label.eq_ignore_ascii_case(name))
        .ok_or_else(|| LensError::UnknownPreset(name.to_string()))
}
