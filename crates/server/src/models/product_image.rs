//! Product image records.
//!
//! Only metadata lives here; the files themselves are stored elsewhere and
//! referenced by `image_url`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdesk_core::{ImageType, ProductId, ProductImageId};

use super::{ValidationError, check_length};

/// MIME types accepted for product images.
pub const ALLOWED_FILE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const IMAGE_URL_MAX: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductImage {
    pub image_id: ProductImageId,
    pub product_id: ProductId,
    pub image_url: String,
    pub image_type: ImageType,
    pub sort_order: i32,
    pub is_primary: bool,
    pub file_size: i64,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /products/{id}/images`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImageInput {
    pub image_url: String,
    #[serde(default)]
    pub image_type: ImageType,
    /// Zero places the image after the product's current last image.
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_primary: bool,
    pub file_size: i64,
    pub file_type: String,
}

impl CreateImageInput {
    /// Validate the payload and normalize `file_type` to lowercase.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for an empty or oversized URL, a
    /// non-positive file size, a negative sort order or an unsupported type.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        check_length("image_url", &self.image_url, 1, IMAGE_URL_MAX)?;
        if self.file_size <= 0 {
            return Err(ValidationError::new("file_size must be greater than 0"));
        }
        if self.sort_order < 0 {
            return Err(ValidationError::new("sort_order cannot be negative"));
        }
        self.file_type = normalize_file_type(&self.file_type)?;
        Ok(self)
    }
}

/// Payload for `PUT /products/{id}/images/{image_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateImageInput {
    pub image_type: Option<ImageType>,
    pub sort_order: Option<i32>,
    pub is_primary: Option<bool>,
}

impl UpdateImageInput {
    /// # Errors
    ///
    /// Returns a `ValidationError` for a negative sort order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sort_order.is_some_and(|s| s < 0) {
            return Err(ValidationError::new("sort_order cannot be negative"));
        }
        Ok(())
    }
}

fn normalize_file_type(file_type: &str) -> Result<String, ValidationError> {
    let lower = file_type.trim().to_ascii_lowercase();
    if ALLOWED_FILE_TYPES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        Err(ValidationError(format!(
            "File type must be one of: {}",
            ALLOWED_FILE_TYPES.join(", ")
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(json: &str) -> CreateImageInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults_and_type_normalization() {
        let image = input(r#"{"image_url":"/uploads/a.png","file_size":10,"file_type":"IMAGE/PNG"}"#)
            .validate()
            .unwrap();
        assert_eq!(image.image_type, ImageType::Gallery);
        assert_eq!(image.sort_order, 0);
        assert!(!image.is_primary);
        assert_eq!(image.file_type, "image/png");
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = input(r#"{"image_url":"/a.bmp","file_size":10,"file_type":"image/bmp"}"#)
            .validate()
            .unwrap_err();
        assert!(err.to_string().starts_with("File type must be one of"));
    }

    #[test]
    fn test_rejects_empty_file() {
        assert!(
            input(r#"{"image_url":"/a.gif","file_size":0,"file_type":"image/gif"}"#)
                .validate()
                .is_err()
        );
    }
}
