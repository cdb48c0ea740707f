use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::draft::DraftField;

/// Maximum allowed length for a product name.
const NAME_MAX_LEN: u64 = 128;

/// Maximum allowed length for a product description.
const DESCRIPTION_MAX_LEN: u64 = 5000;

/// Maximum allowed length for numeric inputs and filenames.
const SHORT_INPUT_MAX_LEN: u64 = 255;

/// Result type returned by the product form helpers.
pub type ProductFieldsFormResult<T> = Result<T, ProductFieldsFormError>;

/// Errors that can occur while processing the product fields form.
#[derive(Debug, Error)]
pub enum ProductFieldsFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Text fields posted by the create/edit product page.
///
/// Numeric fields stay text here; the draft decides whether they are unset,
/// numbers or garbage.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductFieldsForm {
    #[validate(length(max = NAME_MAX_LEN))]
    #[serde(default)]
    pub product_name: String,
    #[validate(length(max = SHORT_INPUT_MAX_LEN))]
    #[serde(default)]
    pub price: String,
    #[validate(length(max = SHORT_INPUT_MAX_LEN))]
    #[serde(default)]
    pub stock: String,
    #[validate(length(max = DESCRIPTION_MAX_LEN))]
    pub description: Option<String>,
    #[validate(length(max = SHORT_INPUT_MAX_LEN))]
    pub thumbnail_name: Option<String>,
}

impl ProductFieldsForm {
    /// Validates and sanitizes the payload into field edits for the draft.
    ///
    /// Optional inputs that were not posted produce no edit.
    pub fn into_field_edits(self) -> ProductFieldsFormResult<Vec<(DraftField, String)>> {
        self.validate()?;

        let mut edits = vec![
            (
                DraftField::ProductName,
                sanitize_inline_text(&self.product_name),
            ),
            (DraftField::Price, self.price.trim().to_string()),
            (DraftField::Stock, self.stock.trim().to_string()),
        ];

        if let Some(description) = self.description {
            edits.push((DraftField::Description, normalize_line_endings(&description)));
        }

        if let Some(thumbnail_name) = self.thumbnail_name {
            edits.push((
                DraftField::ThumbnailName,
                sanitize_inline_text(&thumbnail_name),
            ));
        }

        Ok(edits)
    }
}

fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

/// Browsers post textarea content with CRLF line breaks.
fn normalize_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n")
}
