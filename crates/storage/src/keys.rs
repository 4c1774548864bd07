//! Object key issuance
//!
//! Keys are scoped by booking and batch so a key alone identifies where an
//! asset belongs: `bookings/{bookingId}/batches/{batchId}/{photoId}-{fileName}`.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::{StorageError, StorageResult};

/// Longest sanitized file name kept in a key
pub const MAX_FILE_NAME_LEN: usize = 255;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static pattern compiles"));

/// Reduce a client-supplied file name to a key-safe segment.
///
/// Path separators and anything outside `[A-Za-z0-9._-]` collapse to `_`;
/// leading dots are dropped so the segment can never be `.` or `..`.
pub fn sanitize_file_name(file_name: &str) -> StorageResult<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    let cleaned = UNSAFE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return Err(StorageError::InvalidKey(format!(
            "File name '{}' has no usable characters",
            file_name
        )));
    }

    Ok(cleaned.chars().take(MAX_FILE_NAME_LEN).collect())
}

/// Issue the original-upload key for a photo
pub fn photo_object_key(
    booking_id: Uuid,
    batch_id: Uuid,
    photo_id: Uuid,
    file_name: &str,
) -> StorageResult<String> {
    let name = sanitize_file_name(file_name)?;
    Ok(format!(
        "bookings/{}/batches/{}/{}-{}",
        booking_id, batch_id, photo_id, name
    ))
}

/// Whether `key` lives under the given booking's prefix
pub fn belongs_to_booking(key: &str, booking_id: Uuid) -> bool {
    key.starts_with(&format!("bookings/{}/", booking_id))
}

/// Reject keys that could escape their prefix once joined into a URL path
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return Err(StorageError::InvalidKey(format!("Key '{}' is malformed", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_file_name("IMG_0042.jpg").unwrap(), "IMG_0042.jpg");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            sanitize_file_name("../../etc/passwd").unwrap(),
            "passwd"
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\shot 1.CR2").unwrap(),
            "shot_1.CR2"
        );
    }

    #[test]
    fn test_sanitize_drops_leading_dots() {
        assert_eq!(sanitize_file_name(".hidden.png").unwrap(), "hidden.png");
    }

    #[test]
    fn test_sanitize_rejects_unusable_names() {
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("   ").is_err());
        assert!(sanitize_file_name("???").is_err());
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = format!("{}.jpg", "a".repeat(400));
        assert_eq!(sanitize_file_name(&long).unwrap().len(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn test_photo_object_key_layout() {
        let booking = Uuid::new_v4();
        let batch = Uuid::new_v4();
        let photo = Uuid::new_v4();

        let key = photo_object_key(booking, batch, photo, "wedding day.jpg").unwrap();

        assert_eq!(
            key,
            format!("bookings/{}/batches/{}/{}-wedding_day.jpg", booking, batch, photo)
        );
        assert!(belongs_to_booking(&key, booking));
        assert!(!belongs_to_booking(&key, Uuid::new_v4()));
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("").is_err());
        assert!(validate_key("/abs/key").is_err());
        assert!(validate_key("bookings/../secrets").is_err());
        assert!(validate_key("bookings//double").is_err());
    }
}
