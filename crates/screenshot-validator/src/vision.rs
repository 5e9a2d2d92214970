// Vision backend seam and helpers shared by implementations
use async_trait::async_trait;
use shared_types::EmbeddedImage;

use crate::extraction::VisionResponse;
use crate::VisionError;

/// Instruction sent with every screenshot
pub const VISION_PROMPT: &str = "You are an SAP audit vision expert.
ANALYZE the image to find the 'Failed data backup' and 'Failed log backup' counts.
Also look for 'failed jobs' or 'updates'.
The numbers are usually in Green (OK) or Red (Failed) cells.
You MUST extract these integers.
If the image shows a table, count the rows or find summary numbers.
If the image is unrelated, classify as 'other'.";

/// Image-to-structured-data service
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn analyze(&self, image: &EmbeddedImage) -> Result<VisionResponse, VisionError>;
}

/// JSON schema for strict structured output
pub fn response_schema() -> serde_json::Value {
    let count = |description: &str| {
        serde_json::json!({
            "type": ["integer", "null"],
            "description": description,
        })
    };

    serde_json::json!({
        "type": "object",
        "properties": {
            "type": {
                "type": "string",
                "enum": ["backup", "jobs", "logs", "other"],
                "description": "Type of data shown: 'backup', 'jobs', 'logs', or 'other'"
            },
            "summary": {
                "type": "string",
                "description": "Brief description of what is seen in the screenshot"
            },
            "data": {
                "type": "object",
                "properties": {
                    "failed_data_backup": count("Number of failed data backups visible"),
                    "failed_log_backup": count("Number of failed log backups visible"),
                    "failed_jobs": count("Number of failed jobs visible"),
                    "successful_backups": count("Number of successful backups visible"),
                    "total_entries": count("Total number of entries/rows visible in the table"),
                    "has_errors": {
                        "type": "boolean",
                        "description": "Whether any error indicators (red icons, 'failed' status) are present"
                    },
                    "error_indicators": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Specific error messages or red status text found"
                    }
                },
                "required": [
                    "failed_data_backup",
                    "failed_log_backup",
                    "failed_jobs",
                    "successful_backups",
                    "total_entries",
                    "has_errors",
                    "error_indicators"
                ],
                "additionalProperties": false
            }
        },
        "required": ["type", "summary", "data"],
        "additionalProperties": false
    })
}

/// Parse message content into a [`VisionResponse`].
///
/// Content wrapped in extra text (markdown fences, commentary) is recovered
/// by slicing the outermost braces.
pub fn parse_vision_content(content: &str) -> Result<VisionResponse, VisionError> {
    match serde_json::from_str(content) {
        Ok(response) => Ok(response),
        Err(e) => {
            let start = content.find('{');
            let end = content.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str(&content[start..=end]).map_err(|_| {
                        VisionError::Parse(format!("{}. Raw: {}", e, content))
                    })
                }
                _ => Err(VisionError::Parse(format!(
                    "Response is not JSON: {}. Raw: {}",
                    e, content
                ))),
            }
        }
    }
}

/// MIME type for an embedded image: JPEG by magic bytes, else by the media
/// part's extension, else PNG.
pub fn mime_type(image: &EmbeddedImage) -> &'static str {
    if image.bytes.starts_with(&[0xFF, 0xD8]) {
        return "image/jpeg";
    }

    let extension = image
        .media_path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "image/png",
    }
}
