use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slot of the product form an upload is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// The single representative image.
    Thumbnail,
    /// Ordered gallery images.
    Gallery,
}

impl UploadKind {
    /// Whether the widget may hand back several images for this slot.
    pub fn allows_multiple(self) -> bool {
        matches!(self, UploadKind::Gallery)
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Thumbnail => f.write_str("thumbnail"),
            UploadKind::Gallery => f.write_str("gallery"),
        }
    }
}

impl FromStr for UploadKind {
    type Err = UploadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "thumbnail" => Ok(UploadKind::Thumbnail),
            "gallery" => Ok(UploadKind::Gallery),
            other => Err(UploadError::UnknownKind(other.to_string())),
        }
    }
}

/// One asset reported by the upload widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadedImage {
    /// Hosted HTTPS URL of the asset.
    pub secure_url: String,
    /// Filename the asset was uploaded from, without extension handling.
    pub original_filename: String,
}

impl UploadedImage {
    pub fn new(secure_url: impl Into<String>, original_filename: impl Into<String>) -> Self {
        Self {
            secure_url: secure_url.into(),
            original_filename: original_filename.into(),
        }
    }
}

/// Images delivered by a single widget completion, in the order received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch(Vec<UploadedImage>);

impl UploadBatch {
    pub fn new(images: Vec<UploadedImage>) -> Self {
        Self(images)
    }

    pub fn single(image: UploadedImage) -> Self {
        Self(vec![image])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.0
    }

    pub fn into_images(self) -> Vec<UploadedImage> {
        self.0
    }
}

/// Upload results that break the widget contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The thumbnail slot received more than one image.
    #[error("thumbnail accepts a single image, received {received}")]
    MultipleThumbnails { received: usize },
    /// The thumbnail slot received no image at all.
    #[error("thumbnail upload contained no image")]
    EmptyThumbnail,
    /// The upload targeted a slot the form does not have.
    #[error("unknown upload slot `{0}`")]
    UnknownKind(String),
}

/// Source the widget may pull images from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadSource {
    Local,
    Url,
    Camera,
}

/// Options handed to the browser when opening the upload widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadWidgetConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub sources: Vec<UploadSource>,
    pub multiple: bool,
}

impl UploadWidgetConfig {
    /// Widget options for the given form slot.
    pub fn for_kind(
        kind: UploadKind,
        cloud_name: impl Into<String>,
        upload_preset: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            sources: vec![UploadSource::Local, UploadSource::Url, UploadSource::Camera],
            multiple: kind.allows_multiple(),
        }
    }
}
