// Azure OpenAI chat-completions vision backend
//
// Sends the screenshot as a base64 data URL together with the fixed prompt and
// asks for strict JSON-schema output.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use shared_types::EmbeddedImage;

use crate::extraction::VisionResponse;
use crate::vision::{mime_type, parse_vision_content, response_schema, VisionBackend, VISION_PROMPT};
use crate::VisionError;

pub const DEFAULT_API_VERSION: &str = "2024-08-01-preview";
pub const DEFAULT_DEPLOYMENT: &str = "gpt-5.1";

#[derive(Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub deployment: String,
}

impl AzureConfig {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
        }
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .finish()
    }
}

// ============================================================================
// Chat completions API types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Azure OpenAI vision client
pub struct AzureVisionClient {
    config: AzureConfig,
    http: reqwest::Client,
}

impl AzureVisionClient {
    pub fn new(config: AzureConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    fn build_request(image: &EmbeddedImage) -> ChatRequest {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let data_url = format!("data:{};base64,{}", mime_type(image), encoded);

        ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: VISION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "screenshot_analysis",
                    strict: true,
                    schema: response_schema(),
                },
            },
        }
    }
}

#[async_trait]
impl VisionBackend for AzureVisionClient {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn analyze(&self, image: &EmbeddedImage) -> Result<VisionResponse, VisionError> {
        let response = self
            .http
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&Self::build_request(image))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| VisionError::Parse(e.to_string()))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(VisionError::EmptyResponse)?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(VisionError::Refusal(refusal));
        }

        let content = message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(VisionError::EmptyResponse)?;

        parse_vision_content(&content)
    }
}
