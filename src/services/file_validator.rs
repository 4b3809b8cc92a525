use crate::models::{FileMetadata, IncomingFile, InlinePayload, ValidationResult};
use crate::services::file_types;
use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Checks uploads against the per-category policy and prepares them for the upstream call.
///
/// The declared MIME type is trusted unless `verify_signatures` is enabled, in which
/// case the leading bytes are sniffed and a detected type outside the allow-list is
/// rejected. Content the sniffer cannot identify (plain text, CSV) still passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileValidator {
    verify_signatures: bool,
}

impl FileValidator {
    pub fn new(verify_signatures: bool) -> Self {
        Self { verify_signatures }
    }

    /// False when the file, its MIME type, or the category is missing, or the MIME is not allowed
    pub fn is_type_allowed(&self, file: Option<&IncomingFile>, category: &str) -> bool {
        let Some(file) = file else {
            return false;
        };
        let Some(mime_type) = file.mime_type.as_deref() else {
            return false;
        };
        match file_types::lookup(category) {
            Some(spec) => spec.allows(mime_type),
            None => false,
        }
    }

    /// Inclusive at the limit: a file of exactly `max_bytes` passes
    pub fn is_size_allowed(&self, file: Option<&IncomingFile>, max_bytes: u64) -> bool {
        match file {
            Some(file) => file.size_bytes <= max_bytes,
            None => false,
        }
    }

    pub fn validate(&self, file: Option<&IncomingFile>, category: &str) -> ValidationResult {
        let Some(spec) = file_types::lookup(category) else {
            return ValidationResult::invalid(format!("Unknown file type: {}", category));
        };

        let Some(present) = file else {
            return ValidationResult::invalid(format!("{} file is required", spec.category));
        };

        if !self.is_type_allowed(file, category) {
            return ValidationResult::invalid(spec.rejection_message);
        }

        if !self.is_size_allowed(file, spec.max_size_bytes) {
            return ValidationResult::invalid(format!(
                "File size exceeds {}MB limit",
                spec.max_size_mb()
            ));
        }

        if self.verify_signatures
            && let Some(kind) = infer::get(&present.data)
            && !spec.allows(kind.mime_type())
        {
            tracing::warn!(
                declared = ?present.mime_type,
                detected = kind.mime_type(),
                file_name = %present.original_name,
                "File signature does not match the {} allow-list",
                spec.category
            );
            return ValidationResult::invalid(spec.rejection_message);
        }

        ValidationResult::valid()
    }
}

/// Base64-encode the file for inline transmission. Fails on a missing MIME type.
pub fn encode_for_upstream(file: &IncomingFile) -> Result<InlinePayload> {
    let mime_type = file
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| anyhow!("Cannot encode '{}': MIME type is missing", file.original_name))?;

    if file.data.len() as u64 != file.size_bytes {
        return Err(anyhow!(
            "Cannot encode '{}': buffer holds {} bytes but {} were declared",
            file.original_name,
            file.data.len(),
            file.size_bytes
        ));
    }

    Ok(InlinePayload {
        mime_type: mime_type.to_string(),
        base64_data: BASE64.encode(&file.data),
    })
}

/// Metadata summary, or `None` when no file was uploaded
pub fn describe_metadata(file: Option<&IncomingFile>) -> Option<FileMetadata> {
    let file = file?;
    Some(FileMetadata {
        original_name: file.original_name.clone(),
        mime_type: file.mime_type.clone(),
        size: file.size_bytes,
        size_formatted: format_file_size(file.size_bytes),
        uploaded_at: chrono::Utc::now(),
    })
}

/// Human-readable size with up to two decimals, e.g. "1.5 MB"
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
