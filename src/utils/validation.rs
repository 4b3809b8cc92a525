use serde_json::{Map, Value};

/// Longest prompt accepted, in characters (inclusive)
pub const MAX_PROMPT_LENGTH: usize = 10_000;

/// Top-level body keys that are dropped before anything else reads the body
pub const FORBIDDEN_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Strip forbidden keys and trim every top-level string value
pub fn sanitize_body(body: &mut Map<String, Value>) {
    for key in FORBIDDEN_KEYS {
        if body.remove(*key).is_some() {
            tracing::warn!(key = *key, "Stripped forbidden key from request body");
        }
    }

    for value in body.values_mut() {
        if let Value::String(s) = value {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Presence, type and non-emptiness checks. Returns the trimmed prompt.
pub fn check_prompt_shape(prompt: Option<&Value>) -> Result<String, ValidationError> {
    let prompt = match prompt {
        Some(value) if !is_falsy(value) => value,
        _ => {
            return Err(ValidationError::new(
                "PROMPT_REQUIRED",
                "Prompt is required in the request body",
            ));
        }
    };

    let Value::String(text) = prompt else {
        return Err(ValidationError::new(
            "PROMPT_NOT_STRING",
            "Prompt must be a string",
        ));
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            "PROMPT_EMPTY",
            "Prompt cannot be empty",
        ));
    }

    Ok(trimmed.to_string())
}

/// Full prompt rules, first failure wins. On success the trimmed prompt is
/// written back into the body and returned.
pub fn validate_prompt(body: &mut Map<String, Value>) -> Result<String, ValidationError> {
    let trimmed = check_prompt_shape(body.get("prompt"))?;

    if trimmed.chars().count() > MAX_PROMPT_LENGTH {
        return Err(ValidationError::new(
            "PROMPT_TOO_LONG",
            "Prompt is too long (maximum 10,000 characters)",
        ));
    }

    body.insert("prompt".to_string(), Value::String(trimmed.clone()));
    Ok(trimmed)
}

/// Substring match so boundary parameters are allowed
pub fn is_multipart_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.contains(mime::MULTIPART_FORM_DATA.essence_str()))
        .unwrap_or(false)
}
