//! Gemini (Google) image editing backend.

use crate::config::EditorConfig;
use crate::error::{sanitize_error_message, LensError, Result};
use crate::image::editor::ImageEditor;
use crate::image::types::{EditRequest, EncodedImage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// MIME type assumed when an inline image part does not declare one.
const DEFAULT_OUTPUT_MIME: &str = "image/png";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    config: EditorConfig,
}

impl GeminiEditorBuilder {
    /// Creates a builder with default settings and no API key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. one from [`EditorConfig::from_env`].
    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Sets one of the known model variants.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.config.model = model.as_str().to_string();
        self
    }

    /// Sets an arbitrary model identifier.
    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Sets the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(url);
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Builds the editor.
    ///
    /// A missing API key does not fail here; the first edit reports it.
    pub fn build(self) -> Result<GeminiEditor> {
        let client = reqwest::Client::builder().build()?;
        Ok(GeminiEditor {
            client,
            config: self.config,
        })
    }
}

/// Edits images through Gemini's `generateContent` endpoint.
pub struct GeminiEditor {
    client: reqwest::Client,
    config: EditorConfig,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Model identifier in use.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.config.base_url, self.config.model)
    }

    async fn edit_impl(&self, api_key: &str, request: &EditRequest) -> Result<EncodedImage> {
        let start = Instant::now();
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::from_edit_request(request);

        tracing::debug!(
            model = %self.config.model,
            mime_type = request.image().mime_type(),
            instruction_len = request.instruction().len(),
            "sending edit request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let image = extract_image(gemini_response)?;

        tracing::info!(
            model = %self.config.model,
            mime_type = image.mime_type(),
            size_bytes = image.size(),
            duration_ms = start.elapsed().as_millis() as u64,
            "edit completed"
        );
        Ok(image)
    }
}

fn parse_error(status: u16, text: &str) -> LensError {
    let text = sanitize_error_message(text);
    match status {
        401 | 403 => LensError::Auth(text),
        429 => LensError::RateLimited(text),
        _ => LensError::Api {
            status,
            message: text,
        },
    }
}

/// Turns a response into the edited image.
///
/// Only the first candidate is considered. Within it, the first part with
/// inline data wins regardless of any text parts before it; otherwise the
/// first text part is reported as a refusal.
fn extract_image(response: GeminiResponse) -> Result<EncodedImage> {
    let block_reason = response
        .prompt_feedback
        .and_then(|f| f.block_reason_message.or(f.block_reason))
        .map(|r| format!("blocked: {r}"));

    let candidate = response.candidates.into_iter().next();
    let finish_reason = candidate
        .as_ref()
        .and_then(|c| c.finish_reason.clone())
        .filter(|r| r != "STOP");
    let parts = candidate
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    if parts.is_empty() {
        let detail = block_reason.or_else(|| finish_reason.map(|r| format!("finish reason: {r}")));
        return Err(LensError::EmptyResponse(detail));
    }

    let inline = parts.iter().find_map(|p| {
        p.inline_data
            .as_ref()
            .and_then(|d| d.data.as_deref().filter(|data| !data.is_empty()).map(|data| (d, data)))
    });
    if let Some((inline, data)) = inline {
        let mime_type = inline
            .mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_OUTPUT_MIME);
        return EncodedImage::from_base64(data, mime_type).map_err(|e| match e {
            LensError::InvalidType(mime) => {
                LensError::MalformedImage(format!("unexpected mime type {mime}"))
            }
            other => other,
        });
    }

    if let Some(text) = parts
        .iter()
        .find_map(|p| p.text.as_deref().filter(|t| !t.is_empty()))
    {
        return Err(LensError::ModelRefused(text.to_string()));
    }

    Err(LensError::NoImageProduced)
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, request: &EditRequest) -> Result<EncodedImage> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            tracing::error!("edit attempted without an API key");
            return Err(LensError::MissingCredential);
        };

        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.edit_impl(api_key, request)).await {
            Ok(result) => result,
            Err(_) => Err(LensError::Timeout(timeout)),
        }
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LensError::MissingCredential)?;

        let timeout = self.config.timeout;
        let response = tokio::time::timeout(
            timeout,
            self.client
                .get(self.model_url())
                .header("x-goog-api-key", api_key)
                .send(),
        )
        .await
        .map_err(|_| LensError::Timeout(timeout))??;

        match response.status().as_u16() {
            401 | 403 => Err(LensError::Auth("Invalid API key".into())),
            404 => Err(LensError::Api {
                status: 404,
                message: "Model not found. Verify the model name is correct.".into(),
            }),
            s if !(200..300).contains(&s) => Err(LensError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image().mime_type().to_string(),
                    data: req.image().data_base64().to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: req.instruction().to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}
