use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Upload category accepted by the file routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Document,
    Audio,
    Video,
}

impl FileCategory {
    pub const ALL: [FileCategory; 4] = [
        FileCategory::Image,
        FileCategory::Document,
        FileCategory::Audio,
        FileCategory::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Document => "document",
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(FileCategory::Image),
            "document" => Ok(FileCategory::Document),
            "audio" => Ok(FileCategory::Audio),
            "video" => Ok(FileCategory::Video),
            _ => Err(format!("Unknown file type: {}", s)),
        }
    }
}

/// Size and MIME policy for one upload category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypeSpec {
    pub category: FileCategory,
    pub name: &'static str,
    pub max_size_bytes: u64,
    pub allowed_mime_types: &'static [&'static str],
    pub field_name: &'static str,
    pub rejection_message: &'static str,
}

impl FileTypeSpec {
    pub fn allows(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(&mime_type)
    }

    pub fn max_size_mb(&self) -> u64 {
        bytes_to_mb_rounded(self.max_size_bytes)
    }
}

/// An uploaded file held in memory for the duration of a single request
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: u64,
    pub data: Bytes,
}

impl IncomingFile {
    pub fn new(original_name: impl Into<String>, mime_type: Option<String>, data: Bytes) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type,
            size_bytes: data.len() as u64,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
        }
    }
}

/// File content prepared for the upstream multimodal call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    pub mime_type: String,
    pub base64_data: String,
}

/// Human-facing summary of an uploaded file, returned as `meta`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub original_name: String,
    pub mime_type: Option<String>,
    pub size: u64,
    pub size_formatted: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Uniform JSON wrapper returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponseEnvelope {
    pub status: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss: u64,
    pub virtual_memory: u64,
    pub system_total: u64,
    pub system_used: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub memory: MemoryUsage,
    pub version: String,
}

/// Capability entry published by the file-types endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeInfo {
    #[serde(rename = "type")]
    pub file_type: FileCategory,
    pub name: String,
    pub max_size: u64,
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: u64,
    pub allowed_mime_types: Vec<String>,
    pub field_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateTextRequest {
    /// Text prompt, 1 to 10,000 characters after trimming
    pub prompt: String,
}

/// Multipart form accepted by the generate-from-file routes
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct GenerateFromFileForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub prompt: String,
}

pub fn bytes_to_mb_rounded(bytes: u64) -> u64 {
    (bytes as f64 / (1024.0 * 1024.0)).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("IMAGE".parse::<FileCategory>(), Ok(FileCategory::Image));
        assert_eq!("Document".parse::<FileCategory>(), Ok(FileCategory::Document));
        assert_eq!(" audio ".parse::<FileCategory>(), Ok(FileCategory::Audio));
        assert_eq!(
            "spreadsheet".parse::<FileCategory>(),
            Err("Unknown file type: spreadsheet".to_string())
        );
    }

    #[test]
    fn test_envelope_omits_absent_fields() {
        let envelope = ResponseEnvelope {
            status: true,
            code: 200,
            message: "ok".to_string(),
            data: Some(serde_json::Value::Null),
            meta: None,
            errors: None,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("data"));
        assert!(!obj.contains_key("meta"));
        assert!(!obj.contains_key("errors"));
    }

    #[test]
    fn test_file_type_info_field_names() {
        let info = FileTypeInfo {
            file_type: FileCategory::Video,
            name: "Video".to_string(),
            max_size: 1024,
            max_size_mb: 0,
            allowed_mime_types: vec!["video/mp4".to_string()],
            field_name: "file".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["maxSizeMB"], 0);
        assert_eq!(json["fieldName"], "file");
        assert_eq!(json["allowedMimeTypes"][0], "video/mp4");
    }
}
