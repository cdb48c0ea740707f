//! Bridge between the browser upload widget and the product form.
//!
//! The widget runs in the browser and reports every lifecycle event through
//! its callback. The page posts those payloads here; only successful uploads
//! with a usable asset description are forwarded, everything else is logged
//! and swallowed.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::upload::{UploadBatch, UploadedImage};

/// One callback invocation of the upload widget.
#[derive(Debug, Deserialize)]
pub struct WidgetEvent {
    /// Widget error object; present when the widget failed.
    #[serde(default)]
    pub error: Option<Value>,
    /// Event name such as `success`, `queues-end` or `close`.
    #[serde(default)]
    pub event: Option<String>,
    /// Event-specific payload; an asset description for `success`.
    #[serde(default)]
    pub info: Option<Value>,
}

impl WidgetEvent {
    fn into_uploaded_image(self) -> Option<UploadedImage> {
        if let Some(error) = self.error.filter(|error| !error.is_null()) {
            log::warn!("Upload widget reported an error: {error}");
            return None;
        }
        if self.event.as_deref() != Some("success") {
            return None;
        }
        let info = self.info?;
        match serde_json::from_value::<UploadedImage>(info) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("Ignoring upload widget success without asset details: {err}");
                None
            }
        }
    }
}

/// Payload posted by the page: a single callback or a batch of callbacks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UploadCallbackPayload {
    Batch(Vec<WidgetEvent>),
    Single(WidgetEvent),
}

impl UploadCallbackPayload {
    /// Successful uploads in the order reported, or `None` when there are none.
    pub fn into_batch(self) -> Option<UploadBatch> {
        let events = match self {
            UploadCallbackPayload::Batch(events) => events,
            UploadCallbackPayload::Single(event) => vec![event],
        };

        let images: Vec<UploadedImage> = events
            .into_iter()
            .filter_map(WidgetEvent::into_uploaded_image)
            .collect();

        if images.is_empty() {
            None
        } else {
            Some(UploadBatch::new(images))
        }
    }
}
