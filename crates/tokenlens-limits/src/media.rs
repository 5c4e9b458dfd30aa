//! Media request shapes and their validation against model limits
//!
//! Every validator collects all violations instead of stopping at the first,
//! so a caller can fix a request in one round trip.

use crate::error::{LimitError, LimitResult};
use crate::report::Violation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokenlens_catalog::{ContentType, ModelLimits, Resolution};

/// Speaking rate used when a voice request gives text but no duration
pub const VOICE_CHARS_PER_SECOND: f64 = 15.0;

const QUALITY_KEYS: &[&str] = &["quality", "quality_options", "quality_presets"];
const STYLE_KEYS: &[&str] = &["style", "styles"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct ImageRequest {
    /// `WxH`; takes precedence over `width` and `height`
    pub size: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub quality: Option<String>,
    pub style: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct VideoRequest {
    /// Seconds
    pub duration: Option<f64>,
    pub resolution: Option<String>,
    pub format: Option<String>,
    pub prompt: Option<String>,
    pub script: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct VoiceRequest {
    pub text: Option<String>,
    /// Seconds; estimated from `text` when absent
    pub duration: Option<f64>,
    pub format: Option<String>,
    pub file_size_mb: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct AvatarRequest {
    pub script: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    pub resolution: Option<String>,
}

/// A request to check, by kind
#[derive(Debug, Clone, PartialEq)]
pub enum ContentRequest {
    /// Token-limited content (text, embedding and rerank models)
    Text(String),
    Image(ImageRequest),
    Video(VideoRequest),
    Voice(VoiceRequest),
    Avatar(AvatarRequest),
}

impl ContentRequest {
    /// Build a request from a declared type and JSON content
    ///
    /// Token-limited types take a string. Media types take an object; a plain
    /// string is accepted as the request's main text (image prompt, video or
    /// avatar script, voice text).
    ///
    /// # Errors
    /// Returns `LimitError::InvalidRequest` if the content has the wrong shape
    pub fn from_parts(content_type: ContentType, content: Value) -> LimitResult<Self> {
        if content_type.is_token_limited() {
            return match content {
                Value::String(text) => Ok(Self::Text(text)),
                other => Err(LimitError::invalid_request(format!(
                    "{content_type} content must be a string, got {}",
                    json_kind(&other)
                ))),
            };
        }

        match (content_type, content) {
            (ContentType::Image, Value::String(prompt)) => Ok(Self::Image(ImageRequest {
                prompt: Some(prompt),
                ..ImageRequest::default()
            })),
            (ContentType::Video, Value::String(script)) => Ok(Self::Video(VideoRequest {
                script: Some(script),
                ..VideoRequest::default()
            })),
            (ContentType::Voice, Value::String(text)) => Ok(Self::Voice(VoiceRequest {
                text: Some(text),
                ..VoiceRequest::default()
            })),
            (ContentType::Avatar, Value::String(script)) => Ok(Self::Avatar(AvatarRequest {
                script: Some(script),
                ..AvatarRequest::default()
            })),
            (ContentType::Image, content) => parse_object(content_type, content).map(Self::Image),
            (ContentType::Video, content) => parse_object(content_type, content).map(Self::Video),
            (ContentType::Voice, content) => parse_object(content_type, content).map(Self::Voice),
            (_, content) => parse_object(content_type, content).map(Self::Avatar),
        }
    }

    /// The content type this request is checked as
    pub const fn content_type(&self) -> ContentType {
        match self {
            Self::Text(_) => ContentType::Text,
            Self::Image(_) => ContentType::Image,
            Self::Video(_) => ContentType::Video,
            Self::Voice(_) => ContentType::Voice,
            Self::Avatar(_) => ContentType::Avatar,
        }
    }
}

fn parse_object<T: DeserializeOwned>(content_type: ContentType, content: Value) -> LimitResult<T> {
    if !content.is_object() {
        return Err(LimitError::invalid_request(format!(
            "{content_type} content must be an object, got {}",
            json_kind(&content)
        )));
    }
    serde_json::from_value(content)
        .map_err(|e| LimitError::invalid_request(format!("invalid {content_type} content: {e}")))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn validate_image(limits: &ModelLimits, request: &ImageRequest) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Some(size) = request.size.as_deref() {
        match size.parse::<Resolution>() {
            Ok(resolution) => check_max_resolution(limits, "size", resolution, &mut violations),
            Err(e) => violations.push(Violation::new("size", e.to_string())),
        }
        if let Some(allowed) = limits.constraint_options("size")
            && !allowed.iter().any(|option| option == &size.trim().to_ascii_lowercase())
        {
            violations.push(Violation::new(
                "size",
                format!("size {size} is not one of {}", allowed.join(", ")),
            ));
        }
    } else {
        check_dimensions(limits, request.width, request.height, &mut violations);
    }

    check_format(limits, request.format.as_deref(), &mut violations);
    check_option(limits, "quality", QUALITY_KEYS, request.quality.as_deref(), &mut violations);
    check_option(limits, "style", STYLE_KEYS, request.style.as_deref(), &mut violations);
    check_prompt_length(limits, request.prompt.as_deref(), &mut violations);
    violations
}

pub fn validate_video(limits: &ModelLimits, request: &VideoRequest) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Some(duration) = request.duration {
        check_duration(limits, "duration", duration, &mut violations);
        if let Some((min, max)) = limits.constraint_range("duration_range")
            && !(min..=max).contains(&duration)
        {
            violations.push(Violation::new(
                "duration",
                format!("duration {duration}s is outside the supported range {min}s to {max}s"),
            ));
        }
    }
    if let Some(resolution) = request.resolution.as_deref() {
        match resolution.parse::<Resolution>() {
            Ok(parsed) => check_max_resolution(limits, "resolution", parsed, &mut violations),
            Err(e) => violations.push(Violation::new("resolution", e.to_string())),
        }
    }
    check_format(limits, request.format.as_deref(), &mut violations);
    check_prompt_length(limits, request.prompt.as_deref(), &mut violations);
    check_script(limits, request.script.as_deref(), &mut violations);
    violations
}

pub fn validate_voice(limits: &ModelLimits, request: &VoiceRequest) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_format(limits, request.format.as_deref(), &mut violations);

    let text_chars = request.text.as_deref().map(|text| text.chars().count());
    let max_text = limits
        .max_text_length
        .or_else(|| limits.constraint_usize("max_text_length"));
    if let (Some(chars), Some(max)) = (text_chars, max_text)
        && chars > max
    {
        violations.push(Violation::new(
            "text",
            format!("text has {chars} characters, the limit is {max}"),
        ));
    }

    match (request.duration, text_chars) {
        (Some(duration), _) => check_duration(limits, "duration", duration, &mut violations),
        (None, Some(chars)) => {
            check_duration(limits, "text", estimated_speech_seconds(chars), &mut violations);
        }
        (None, None) => {}
    }

    if let (Some(size), Some(max)) = (request.file_size_mb, limits.max_file_size_mb)
        && size > max
    {
        violations.push(Violation::new(
            "file_size_mb",
            format!("file is {size} MB, the limit is {max} MB"),
        ));
    }
    violations
}

pub fn validate_avatar(limits: &ModelLimits, request: &AvatarRequest) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_script(limits, request.script.as_deref(), &mut violations);
    if let Some(duration) = request.duration {
        check_duration(limits, "duration", duration, &mut violations);
    }

    if let Some(resolution) = request.resolution.as_deref() {
        match resolution.parse::<Resolution>() {
            Ok(parsed) if !limits.supported_resolutions.is_empty() => {
                let supported = limits
                    .supported_resolutions
                    .iter()
                    .any(|option| option.parse::<Resolution>().is_ok_and(|option| option == parsed));
                if !supported {
                    violations.push(Violation::new(
                        "resolution",
                        format!(
                            "resolution {resolution} is not one of {}",
                            limits.supported_resolutions.join(", ")
                        ),
                    ));
                }
            }
            Ok(parsed) => check_max_resolution(limits, "resolution", parsed, &mut violations),
            Err(e) => violations.push(Violation::new("resolution", e.to_string())),
        }
    }
    violations
}

/// Seconds of speech for `chars` characters of text
#[allow(clippy::cast_precision_loss)]
pub fn estimated_speech_seconds(chars: usize) -> f64 {
    chars as f64 / VOICE_CHARS_PER_SECOND
}

fn check_max_resolution(
    limits: &ModelLimits,
    field: &str,
    requested: Resolution,
    violations: &mut Vec<Violation>,
) {
    if let Ok(Some(max)) = limits.parsed_max_resolution()
        && !requested.fits_within(max)
    {
        violations.push(Violation::new(
            field,
            format!("{requested} exceeds the maximum resolution {max}"),
        ));
    }
}

fn check_dimensions(
    limits: &ModelLimits,
    width: Option<u32>,
    height: Option<u32>,
    violations: &mut Vec<Violation>,
) {
    let Ok(Some(max)) = limits.parsed_max_resolution() else {
        return;
    };
    if let Some(width) = width.filter(|&width| width > max.width) {
        violations.push(Violation::new(
            "width",
            format!("width {width} exceeds the maximum {}", max.width),
        ));
    }
    if let Some(height) = height.filter(|&height| height > max.height) {
        violations.push(Violation::new(
            "height",
            format!("height {height} exceeds the maximum {}", max.height),
        ));
    }
}

fn check_format(limits: &ModelLimits, format: Option<&str>, violations: &mut Vec<Violation>) {
    if let Some(format) = format
        && !limits.supports_format(format)
    {
        violations.push(Violation::new(
            "format",
            format!(
                "format {format} is not supported, expected one of {}",
                limits.supported_formats.join(", ")
            ),
        ));
    }
}

/// `value` must appear in the first constraint list found under `keys`
fn check_option(
    limits: &ModelLimits,
    field: &str,
    keys: &[&str],
    value: Option<&str>,
    violations: &mut Vec<Violation>,
) {
    let Some(value) = value else {
        return;
    };
    let Some(allowed) = keys.iter().find_map(|key| limits.constraint_options(key)) else {
        return;
    };
    if !allowed.contains(&value.trim().to_ascii_lowercase()) {
        violations.push(Violation::new(
            field,
            format!("{field} {value} is not one of {}", allowed.join(", ")),
        ));
    }
}

fn check_prompt_length(limits: &ModelLimits, prompt: Option<&str>, violations: &mut Vec<Violation>) {
    let (Some(prompt), Some(max)) = (prompt, limits.constraint_usize("prompt_length")) else {
        return;
    };
    let chars = prompt.chars().count();
    if chars > max {
        violations.push(Violation::new(
            "prompt",
            format!("prompt has {chars} characters, the limit is {max}"),
        ));
    }
}

fn check_script(limits: &ModelLimits, script: Option<&str>, violations: &mut Vec<Violation>) {
    let (Some(script), Some(max)) = (script, limits.max_script_chars) else {
        return;
    };
    let chars = script.chars().count();
    if chars > max {
        violations.push(Violation::new(
            "script",
            format!("script has {chars} characters, the limit is {max}"),
        ));
    }
}

fn check_duration(limits: &ModelLimits, field: &str, seconds: f64, violations: &mut Vec<Violation>) {
    if seconds.is_nan() || seconds < 0.0 {
        violations.push(Violation::new(field, "duration must be a non-negative number"));
        return;
    }
    if let Some(max) = limits.max_duration
        && seconds > max
    {
        violations.push(Violation::new(
            field,
            format!("duration {seconds:.1}s exceeds the maximum {max}s"),
        ));
    }
}
