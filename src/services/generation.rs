use crate::api::error::AppError;
use crate::models::{FileCategory, FileMetadata, IncomingFile};
use crate::services::file_validator::{self, FileValidator};
use crate::services::generative::GenerativeClient;
use crate::utils::validation::check_prompt_shape;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

pub const TEXT_FAILURE_MESSAGE: &str = "Failed to generate content";

pub fn file_success_message(category: FileCategory) -> String {
    format!("Content generated successfully from {}", category)
}

pub fn file_failure_message(category: FileCategory) -> String {
    format!("Failed to generate content from {}", category)
}

#[derive(Debug, Clone)]
pub struct FileGeneration {
    pub text: String,
    pub metadata: Option<FileMetadata>,
}

/// Sequences validation, the upstream call and error mapping for one request.
///
/// Holds no per-request state; the only shared data is the upstream client.
#[derive(Clone)]
pub struct GenerationService {
    client: Arc<dyn GenerativeClient>,
    validator: FileValidator,
}

impl GenerationService {
    pub fn new(client: Arc<dyn GenerativeClient>, validator: FileValidator) -> Self {
        Self { client, validator }
    }

    pub async fn generate_text(&self, prompt: Option<&Value>) -> Result<String, AppError> {
        let started = Instant::now();
        let prompt = check_prompt_shape(prompt)?;

        match self.client.generate_text(&prompt).await {
            Ok(text) => {
                info!(
                    prompt_length = prompt.chars().count(),
                    response_length = text.chars().count(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Text generation succeeded"
                );
                Ok(text)
            }
            Err(e) => {
                error!(
                    prompt_length = prompt.chars().count(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Text generation failed"
                );
                Err(AppError::Upstream {
                    public_message: TEXT_FAILURE_MESSAGE.to_string(),
                    source: e,
                })
            }
        }
    }

    pub async fn generate_from_file(
        &self,
        prompt: Option<&Value>,
        category: FileCategory,
        file: Option<IncomingFile>,
    ) -> Result<FileGeneration, AppError> {
        let started = Instant::now();
        let prompt = check_prompt_shape(prompt)?;

        let validation = self.validator.validate(file.as_ref(), category.as_str());
        if !validation.is_valid {
            let message = validation
                .error
                .unwrap_or_else(|| format!("Invalid {} file", category));
            warn!(
                category = %category,
                file_name = file.as_ref().map(|f| f.original_name.as_str()),
                file_size = file.as_ref().map(|f| f.size_bytes),
                mime_type = file.as_ref().and_then(|f| f.mime_type.as_deref()),
                duration_ms = started.elapsed().as_millis() as u64,
                reason = %message,
                "File validation failed"
            );
            return Err(AppError::Validation(message));
        }

        // Validation guarantees presence
        let Some(file) = file else {
            return Err(AppError::Validation(format!("{} file is required", category)));
        };

        let outcome = match file_validator::encode_for_upstream(&file) {
            Ok(payload) => self.client.generate_from_payload(&prompt, &payload).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => {
                info!(
                    category = %category,
                    prompt_length = prompt.chars().count(),
                    file_name = %file.original_name,
                    file_size = file.size_bytes,
                    response_length = text.chars().count(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "File generation succeeded"
                );
                Ok(FileGeneration {
                    text,
                    metadata: file_validator::describe_metadata(Some(&file)),
                })
            }
            Err(e) => {
                error!(
                    category = %category,
                    prompt_length = prompt.chars().count(),
                    file_name = %file.original_name,
                    file_size = file.size_bytes,
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "File generation failed"
                );
                Err(AppError::Upstream {
                    public_message: file_failure_message(category),
                    source: e,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InlinePayload;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        fail: bool,
        calls: Mutex<Vec<(String, Option<InlinePayload>)>>,
    }

    #[async_trait]
    impl GenerativeClient for RecordingClient {
        async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push((prompt.to_string(), None));
            if self.fail {
                return Err(anyhow!("upstream down"));
            }
            Ok(format!("echo: {}", prompt))
        }

        async fn generate_from_payload(
            &self,
            prompt: &str,
            payload: &InlinePayload,
        ) -> anyhow::Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), Some(payload.clone())));
            if self.fail {
                return Err(anyhow!("upstream down"));
            }
            Ok("described".to_string())
        }
    }

    fn service(fail: bool) -> (GenerationService, Arc<RecordingClient>) {
        let client = Arc::new(RecordingClient {
            fail,
            ..Default::default()
        });
        (
            GenerationService::new(client.clone(), FileValidator::default()),
            client,
        )
    }

    fn png() -> IncomingFile {
        IncomingFile::new(
            "cat.png",
            Some("image/png".to_string()),
            Bytes::from_static(&[0x89, 0x50, 0x4E, 0x47]),
        )
    }

    #[tokio::test]
    async fn test_generate_text_trims_prompt() {
        let (service, client) = service(false);
        let text = service.generate_text(Some(&json!("  Explain AI  "))).await.unwrap();
        assert_eq!(text, "echo: Explain AI");
        assert_eq!(client.calls.lock().unwrap()[0].0, "Explain AI");
    }

    #[tokio::test]
    async fn test_generate_text_rejects_missing_prompt_without_calling_upstream() {
        let (service, client) = service(false);
        let err = service.generate_text(None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_text_maps_upstream_failure() {
        let (service, _client) = service(true);
        let err = service.generate_text(Some(&json!("hi"))).await.unwrap_err();
        match err {
            AppError::Upstream { public_message, .. } => {
                assert_eq!(public_message, TEXT_FAILURE_MESSAGE)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_from_file_success() {
        let (service, client) = service(false);
        let result = service
            .generate_from_file(Some(&json!("What is this?")), FileCategory::Image, Some(png()))
            .await
            .unwrap();

        assert_eq!(result.text, "described");
        let meta = result.metadata.unwrap();
        assert_eq!(meta.original_name, "cat.png");
        assert_eq!(meta.size, 4);

        let calls = client.calls.lock().unwrap();
        let payload = calls[0].1.as_ref().unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.base64_data, "iVBORw==");
    }

    #[tokio::test]
    async fn test_generate_from_file_validation_skips_upstream() {
        let (service, client) = service(false);
        let err = service
            .generate_from_file(Some(&json!("describe")), FileCategory::Audio, Some(png()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Only audio files")));

        let err = service
            .generate_from_file(Some(&json!("describe")), FileCategory::Video, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "video file is required"));

        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_from_file_encoding_failure_is_internal() {
        let (service, client) = service(false);
        let mut broken = png();
        broken.size_bytes = 2;

        let err = service
            .generate_from_file(Some(&json!("describe")), FileCategory::Image, Some(broken))
            .await
            .unwrap_err();
        match err {
            AppError::Upstream { public_message, .. } => {
                assert_eq!(public_message, "Failed to generate content from image")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_from_file_upstream_failure() {
        let (service, _client) = service(true);
        let err = service
            .generate_from_file(Some(&json!("describe")), FileCategory::Image, Some(png()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate content from image");
    }
}
