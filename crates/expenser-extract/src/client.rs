//! Receipt extraction client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as _;
use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use expenser_config::{Config, ExtractionMode, LlmConfig};
use expenser_core::RawExtraction;

use crate::api::{ApiMessage, ApiRequest, ApiResponse, ResponseFormat};
use crate::error::ExtractError;
use crate::ocr::run_ocr;
use crate::prompt;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Extracts structured expense data from receipt images through an
/// OpenAI-compatible chat completions endpoint.
pub struct ReceiptExtractor {
    llm: LlmConfig,
    ocr_command: String,
    system_prompt: String,
    retries: u32,
    concurrency: usize,
    client: reqwest::Client,
}

impl ReceiptExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            llm: config.llm.clone(),
            ocr_command: config.ocr.command.clone(),
            system_prompt: prompt::system_prompt(config),
            retries: config.extraction.retries,
            concurrency: config.extraction.concurrency.max(1),
            client: reqwest::Client::new(),
        }
    }

    /// Cheap connectivity check before any receipt is read. A failure
    /// here is fatal for the whole run.
    pub async fn probe(&self) -> Result<(), ExtractError> {
        let request = ApiRequest {
            model: self.llm.model.clone(),
            messages: vec![ApiMessage::user_text("ping")],
            max_tokens: Some(1),
            temperature: None,
            response_format: None,
        };
        let response = self
            .client
            .post(&self.llm.base_url)
            .header("Authorization", format!("Bearer {}", self.llm.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ExtractError::ServiceUnavailable(format!(
                "status {status}: {text}"
            )));
        }
        info!(endpoint = %self.llm.base_url, model = %self.llm.model, "extraction service reachable");
        Ok(())
    }

    /// Extract one receipt, retrying transient failures.
    pub async fn extract(&self, image: &Path) -> Result<RawExtraction, ExtractError> {
        let user_message = self.build_user_message(image).await?;

        let mut attempt = 0;
        loop {
            match self.request_extraction(&user_message).await {
                Ok(raw) => return Ok(raw),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY * attempt;
                    warn!(
                        image = %image.display(),
                        attempt,
                        error = %e,
                        "transient extraction failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Extract a batch concurrently. Results come back in input order
    /// regardless of completion order; per-file failures stay inline.
    pub async fn extract_batch(
        &self,
        images: &[PathBuf],
    ) -> Vec<Result<RawExtraction, ExtractError>> {
        stream::iter(images)
            .map(|image| self.extract(image))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn build_user_message(&self, image: &Path) -> Result<ApiMessage, ExtractError> {
        match self.llm.mode {
            ExtractionMode::Vision => {
                let bytes = tokio::fs::read(image).await?;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                let data_url = format!("data:{};base64,{}", image_mime(image), encoded);
                Ok(ApiMessage::user_with_image(
                    prompt::vision_user_prompt(),
                    data_url,
                ))
            }
            ExtractionMode::OcrText => {
                let text = run_ocr(&self.ocr_command, image).await?;
                Ok(ApiMessage::user_text(prompt::ocr_user_prompt(&text)))
            }
        }
    }

    async fn request_extraction(
        &self,
        user_message: &ApiMessage,
    ) -> Result<RawExtraction, ExtractError> {
        let request = ApiRequest {
            model: self.llm.model.clone(),
            messages: vec![
                ApiMessage::system(self.system_prompt.clone()),
                user_message.clone(),
            ],
            max_tokens: Some(self.llm.max_tokens),
            temperature: Some(0.0),
            response_format: Some(ResponseFormat::json_object()),
        };

        let response = self
            .client
            .post(&self.llm.base_url)
            .header("Authorization", format!("Bearer {}", self.llm.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api { status, message });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        parse_payload(&api_response)
    }
}

fn parse_payload(response: &ApiResponse) -> Result<RawExtraction, ExtractError> {
    let content = response
        .content()
        .ok_or_else(|| ExtractError::SchemaViolation("empty completion".to_string()))?;
    let json = prompt::strip_code_fences(content);
    debug!(payload = %json, "extraction payload");

    let raw: RawExtraction = serde_json::from_str(json)
        .map_err(|e| ExtractError::SchemaViolation(format!("not valid JSON: {e}")))?;

    if let Some(field) = raw.missing_required_field() {
        return Err(ExtractError::SchemaViolation(format!(
            "missing required field '{field}'"
        )));
    }
    Ok(raw)
}

/// MIME type from the file extension; unknown extensions are sent as
/// JPEG, which the folder scan should have filtered out anyway.
fn image_mime(image: &Path) -> &'static str {
    match image
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
