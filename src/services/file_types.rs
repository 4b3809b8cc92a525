use crate::models::{FileCategory, FileTypeInfo, FileTypeSpec};

const MB: u64 = 1024 * 1024;

/// Field name every upload route reads the binary part from
pub const UPLOAD_FIELD_NAME: &str = "file";

const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
    "image/heif",
];

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "text/html",
    "text/css",
    "text/csv",
    "text/markdown",
    "text/xml",
    "text/rtf",
    "application/rtf",
    "text/javascript",
    "application/x-javascript",
    "text/x-python",
    "application/x-python",
];

const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/wav",
    "audio/mp3",
    "audio/mpeg",
    "audio/aiff",
    "audio/aac",
    "audio/ogg",
    "audio/flac",
];

const VIDEO_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/mpeg",
    "video/mov",
    "video/quicktime",
    "video/avi",
    "video/x-flv",
    "video/mpg",
    "video/webm",
    "video/wmv",
    "video/3gpp",
];

/// Categories in discovery order. Ceilings grow image < document < audio < video.
static REGISTRY: [FileTypeSpec; 4] = [
    FileTypeSpec {
        category: FileCategory::Image,
        name: "Image",
        max_size_bytes: 10 * MB,
        allowed_mime_types: IMAGE_MIME_TYPES,
        field_name: UPLOAD_FIELD_NAME,
        rejection_message: "Only image files are allowed (JPEG, PNG, GIF, WebP, HEIC, HEIF)",
    },
    FileTypeSpec {
        category: FileCategory::Document,
        name: "Document",
        max_size_bytes: 20 * MB,
        allowed_mime_types: DOCUMENT_MIME_TYPES,
        field_name: UPLOAD_FIELD_NAME,
        rejection_message: "Only document files are allowed (PDF, TXT, HTML, CSS, CSV, Markdown, XML, RTF, JS, Python)",
    },
    FileTypeSpec {
        category: FileCategory::Audio,
        name: "Audio",
        max_size_bytes: 25 * MB,
        allowed_mime_types: AUDIO_MIME_TYPES,
        field_name: UPLOAD_FIELD_NAME,
        rejection_message: "Only audio files are allowed (WAV, MP3, AIFF, AAC, OGG, FLAC)",
    },
    FileTypeSpec {
        category: FileCategory::Video,
        name: "Video",
        max_size_bytes: 50 * MB,
        allowed_mime_types: VIDEO_MIME_TYPES,
        field_name: UPLOAD_FIELD_NAME,
        rejection_message: "Only video files are allowed (MP4, MPEG, MOV, AVI, FLV, MPG, WebM, WMV, 3GPP)",
    },
];

/// Case-insensitive lookup by category name. `None` is a recoverable miss.
pub fn lookup(category_name: &str) -> Option<&'static FileTypeSpec> {
    let category = category_name.parse::<FileCategory>().ok()?;
    Some(spec_for(category))
}

pub fn spec_for(category: FileCategory) -> &'static FileTypeSpec {
    match category {
        FileCategory::Image => &REGISTRY[0],
        FileCategory::Document => &REGISTRY[1],
        FileCategory::Audio => &REGISTRY[2],
        FileCategory::Video => &REGISTRY[3],
    }
}

pub fn list_all() -> &'static [FileTypeSpec] {
    &REGISTRY
}

/// Largest per-category ceiling, used to size the upload body limit
pub fn largest_max_size() -> u64 {
    REGISTRY
        .iter()
        .map(|spec| spec.max_size_bytes)
        .max()
        .unwrap_or(0)
}

/// Plain capability list for client discovery
pub fn describe_all() -> Vec<FileTypeInfo> {
    list_all()
        .iter()
        .map(|spec| FileTypeInfo {
            file_type: spec.category,
            name: spec.name.to_string(),
            max_size: spec.max_size_bytes,
            max_size_mb: spec.max_size_mb(),
            allowed_mime_types: spec
                .allowed_mime_types
                .iter()
                .map(|m| m.to_string())
                .collect(),
            field_name: spec.field_name.to_string(),
        })
        .collect()
}
