use crate::models::CANDIDATE_IDS;

pub const MAX_DEVICE_ID_LENGTH: usize = 256;
pub const MAX_VIDEO_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("deviceId is required")]
    MissingDeviceId,
    #[error("deviceId exceeds maximum length of {0}")]
    DeviceIdTooLong(usize),
    #[error("Invalid video choice: {0} (must be 1 or 2)")]
    InvalidChoice(i64),
    #[error("videoUrl is required")]
    MissingVideoUrl,
    #[error("videoUrl exceeds maximum length of {0}")]
    VideoUrlTooLong(usize),
    #[error("videoUrl must be an http(s) URL")]
    InvalidVideoUrl,
}

/// Device ids are opaque: only emptiness and length are checked, the bytes
/// are kept as sent.
pub fn validate_device_id(device_id: &str, max_len: usize) -> Result<&str, ValidationError> {
    if device_id.is_empty() { return Err(ValidationError::MissingDeviceId); }
    if device_id.len() > max_len { return Err(ValidationError::DeviceIdTooLong(max_len)); }
    Ok(device_id)
}

pub fn validate_choice(choice: i64) -> Result<i32, ValidationError> {
    CANDIDATE_IDS
        .iter()
        .copied()
        .find(|&id| i64::from(id) == choice)
        .ok_or(ValidationError::InvalidChoice(choice))
}

pub fn validate_video_url(url: &str, max_len: usize) -> Result<&str, ValidationError> {
    let url = url.trim();
    if url.is_empty() { return Err(ValidationError::MissingVideoUrl); }
    if url.len() > max_len { return Err(ValidationError::VideoUrlTooLong(max_len)); }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ValidationError::InvalidVideoUrl);
    }
    Ok(url)
}
