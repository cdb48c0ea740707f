use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::product::{Product, ProductImage};
use crate::domain::upload::UploadedImage;
use crate::preview::{PreviewHandle, PreviewId, PreviewStore};

/// Text input for a numeric field, keeping "not entered" apart from zero.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericInput<T> {
    /// Nothing has been entered.
    Unset,
    /// A parsed number.
    Value(T),
    /// Text that is not a number of the expected kind.
    Invalid(String),
}

impl<T> Default for NumericInput<T> {
    fn default() -> Self {
        NumericInput::Unset
    }
}

impl<T: FromStr> NumericInput<T> {
    /// Parse raw input text; empty or whitespace-only text is `Unset`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return NumericInput::Unset;
        }
        match trimmed.parse::<T>() {
            Ok(value) => NumericInput::Value(value),
            Err(_) => NumericInput::Invalid(trimmed.to_string()),
        }
    }
}

impl<T: fmt::Display> NumericInput<T> {
    /// Text to put back into the input element.
    pub fn as_input(&self) -> String {
        match self {
            NumericInput::Unset => String::new(),
            NumericInput::Value(value) => value.to_string(),
            NumericInput::Invalid(raw) => raw.clone(),
        }
    }
}

/// Editable text fields of the product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    ProductName,
    Price,
    Stock,
    Description,
    ThumbnailName,
}

impl DraftField {
    /// Input name used by the form and the wire format.
    pub fn key(self) -> &'static str {
        match self {
            DraftField::ProductName => "productName",
            DraftField::Price => "price",
            DraftField::Stock => "stock",
            DraftField::Description => "description",
            DraftField::ThumbnailName => "thumbnailName",
        }
    }
}

impl FromStr for DraftField {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "productName" => Ok(DraftField::ProductName),
            "price" => Ok(DraftField::Price),
            "stock" => Ok(DraftField::Stock),
            "description" => Ok(DraftField::Description),
            "thumbnailName" => Ok(DraftField::ThumbnailName),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// A field name the product form does not know.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown product field `{0}`")]
pub struct UnknownField(pub String);

/// One problem that keeps a draft from being submitted.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DraftIssue {
    #[error("product name is empty")]
    NameMissing,
    #[error("price has not been entered")]
    PriceUnset,
    #[error("price is not a number")]
    PriceInvalid,
    #[error("price must be greater than zero")]
    PriceNotPositive,
    #[error("stock has not been entered")]
    StockUnset,
    #[error("stock is not a whole number")]
    StockInvalid,
    #[error("stock cannot be negative")]
    StockNegative,
}

impl DraftIssue {
    /// Field the issue should be shown next to.
    pub fn field(self) -> DraftField {
        match self {
            DraftIssue::NameMissing => DraftField::ProductName,
            DraftIssue::PriceUnset | DraftIssue::PriceInvalid | DraftIssue::PriceNotPositive => {
                DraftField::Price
            }
            DraftIssue::StockUnset | DraftIssue::StockInvalid | DraftIssue::StockNegative => {
                DraftField::Stock
            }
        }
    }

    /// Guidance shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            DraftIssue::NameMissing => "상품명을 입력해주세요.",
            DraftIssue::PriceUnset => "가격을 입력해주세요.",
            DraftIssue::PriceInvalid => "가격은 숫자로 입력해주세요.",
            DraftIssue::PriceNotPositive => "가격은 0보다 커야 합니다.",
            DraftIssue::StockUnset => "재고를 입력해주세요.",
            DraftIssue::StockInvalid => "재고는 정수로 입력해주세요.",
            DraftIssue::StockNegative => "재고는 0 이상이어야 합니다.",
        }
    }
}

/// Every issue found while validating a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("draft has {} invalid field(s)", .issues.len())]
pub struct ValidationReport {
    issues: Vec<DraftIssue>,
}

impl ValidationReport {
    pub fn issues(&self) -> &[DraftIssue] {
        &self.issues
    }

    pub fn contains(&self, issue: DraftIssue) -> bool {
        self.issues.contains(&issue)
    }

    /// Issues attached to `field`.
    pub fn for_field(&self, field: DraftField) -> impl Iterator<Item = DraftIssue> + '_ {
        self.issues
            .iter()
            .copied()
            .filter(move |issue| issue.field() == field)
    }
}

/// A gallery image together with the local preview that renders it.
#[derive(Debug)]
pub struct GalleryEntry {
    pub image: ProductImage,
    preview: PreviewHandle,
}

impl GalleryEntry {
    pub fn preview_id(&self) -> PreviewId {
        self.preview.id()
    }
}

/// In-progress product record held by the product form.
///
/// Gallery images live in a single ordered list, so the photo list, the
/// filename list and the preview list are projections that cannot drift apart.
#[derive(Debug, Default)]
pub struct ProductDraft {
    pub product_name: String,
    pub price: NumericInput<f64>,
    pub stock: NumericInput<i64>,
    pub description: String,
    pub thumbnail: String,
    pub thumbnail_name: String,
    gallery: Vec<GalleryEntry>,
}

impl ProductDraft {
    /// Build a draft from a persisted product, acquiring one preview per gallery image.
    pub fn from_product(product: Product, previews: &Arc<dyn PreviewStore>) -> Self {
        let Product {
            product_id,
            product_name,
            price,
            stock,
            description,
            thumbnail,
            thumbnail_name,
            product_photo,
            photo_name,
        } = product;

        let filenames_match = photo_name.len() == product_photo.len()
            && photo_name
                .iter()
                .zip(&product_photo)
                .all(|(name, image)| *name == image.filename);
        if !filenames_match {
            log::warn!(
                "Product {product_id:?} has photo names out of step with its photos; using photo filenames"
            );
        }

        let gallery = product_photo
            .into_iter()
            .map(|image| GalleryEntry {
                preview: PreviewHandle::acquire(previews, &image.url),
                image,
            })
            .collect();

        Self {
            product_name,
            price: NumericInput::Value(price),
            stock: NumericInput::Value(stock),
            description,
            thumbnail,
            thumbnail_name,
            gallery,
        }
    }

    /// Merge raw input text into `field`.
    pub fn set(&mut self, field: DraftField, raw: &str) {
        match field {
            DraftField::ProductName => self.product_name = raw.to_string(),
            DraftField::Price => self.price = NumericInput::parse(raw),
            DraftField::Stock => self.stock = NumericInput::parse(raw),
            DraftField::Description => self.description = raw.to_string(),
            DraftField::ThumbnailName => self.thumbnail_name = raw.to_string(),
        }
    }

    pub fn set_thumbnail(&mut self, image: UploadedImage) {
        self.thumbnail = image.secure_url;
        self.thumbnail_name = image.original_filename;
    }

    /// Append an uploaded image to the end of the gallery.
    pub fn push_gallery_image(&mut self, image: UploadedImage, previews: &Arc<dyn PreviewStore>) {
        let preview = PreviewHandle::acquire(previews, &image.secure_url);
        self.gallery.push(GalleryEntry {
            image: ProductImage::new(image.secure_url, image.original_filename),
            preview,
        });
    }

    /// Remove the gallery image at `index`, releasing its preview.
    pub fn remove_gallery_image(&mut self, index: usize) -> Option<ProductImage> {
        if index >= self.gallery.len() {
            return None;
        }
        let GalleryEntry { image, preview } = self.gallery.remove(index);
        drop(preview);
        Some(image)
    }

    pub fn gallery(&self) -> &[GalleryEntry] {
        &self.gallery
    }

    pub fn product_photo(&self) -> Vec<ProductImage> {
        self.gallery.iter().map(|entry| entry.image.clone()).collect()
    }

    pub fn photo_name(&self) -> Vec<String> {
        self.gallery
            .iter()
            .map(|entry| entry.image.filename.clone())
            .collect()
    }

    pub fn preview_ids(&self) -> Vec<PreviewId> {
        self.gallery.iter().map(GalleryEntry::preview_id).collect()
    }

    /// Check the draft against the submission rules, reporting every issue.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut issues = Vec::new();

        if self.product_name.trim().is_empty() {
            issues.push(DraftIssue::NameMissing);
        }

        match &self.price {
            NumericInput::Unset => issues.push(DraftIssue::PriceUnset),
            NumericInput::Invalid(_) => issues.push(DraftIssue::PriceInvalid),
            NumericInput::Value(price) if !price.is_finite() => {
                issues.push(DraftIssue::PriceInvalid)
            }
            NumericInput::Value(price) if *price <= 0.0 => {
                issues.push(DraftIssue::PriceNotPositive)
            }
            NumericInput::Value(_) => {}
        }

        match &self.stock {
            NumericInput::Unset => issues.push(DraftIssue::StockUnset),
            NumericInput::Invalid(_) => issues.push(DraftIssue::StockInvalid),
            NumericInput::Value(stock) if *stock < 0 => issues.push(DraftIssue::StockNegative),
            NumericInput::Value(_) => {}
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { issues })
        }
    }

    /// Validate the draft and assemble the product payload.
    pub fn to_product(&self, product_id: Option<i64>) -> Result<Product, ValidationReport> {
        self.validate()?;

        let (price, stock) = match (&self.price, &self.stock) {
            (NumericInput::Value(price), NumericInput::Value(stock)) => (*price, *stock),
            _ => return Err(ValidationReport::default()),
        };

        Ok(Product {
            product_id,
            product_name: self.product_name.clone(),
            price,
            stock,
            description: self.description.clone(),
            thumbnail: self.thumbnail.clone(),
            thumbnail_name: self.thumbnail_name.clone(),
            product_photo: self.product_photo(),
            photo_name: self.photo_name(),
        })
    }
}
