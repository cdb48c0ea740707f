use serde::{Deserialize, Serialize};

/// Domain representation of a product record as exchanged with the product API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", from = "ProductRecord")]
pub struct Product {
    /// Server-assigned identifier, absent until the product is created.
    pub product_id: Option<i64>,
    /// Human-readable name of the product.
    pub product_name: String,
    /// Unit price shown in the catalog.
    pub price: f64,
    /// Number of units available.
    pub stock: i64,
    /// Optional longer description shown to customers.
    pub description: String,
    /// URL of the representative image.
    pub thumbnail: String,
    /// Original filename of the representative image.
    pub thumbnail_name: String,
    /// Gallery images in display order.
    pub product_photo: Vec<ProductImage>,
    /// Original filenames of the gallery images, index-aligned with `product_photo`.
    pub photo_name: Vec<String>,
}

/// Product as the API may send it. Older records lack the image metadata and
/// list gallery photos as bare URLs.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    #[serde(default)]
    product_id: Option<i64>,
    product_name: String,
    price: f64,
    stock: i64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    thumbnail_name: String,
    #[serde(default)]
    product_photo: Vec<PhotoRecord>,
    #[serde(default)]
    photo_name: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhotoRecord {
    Url(String),
    Image(ProductImage),
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let ProductRecord {
            product_id,
            product_name,
            price,
            stock,
            description,
            thumbnail,
            thumbnail_name,
            product_photo,
            photo_name,
        } = record;

        // Bare URLs take their filename from the aligned `photoName` entry.
        let product_photo = product_photo
            .into_iter()
            .enumerate()
            .map(|(index, photo)| match photo {
                PhotoRecord::Image(image) => image,
                PhotoRecord::Url(url) => {
                    let filename = photo_name.get(index).cloned().unwrap_or_default();
                    ProductImage { url, filename }
                }
            })
            .collect();

        Self {
            product_id,
            product_name,
            price,
            stock,
            description,
            thumbnail,
            thumbnail_name,
            product_photo,
            photo_name,
        }
    }
}

/// A hosted gallery image together with the filename it was uploaded from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProductImage {
    /// Hosted URL returned by the upload widget.
    pub url: String,
    /// Original filename of the uploaded file.
    #[serde(default)]
    pub filename: String,
}

impl ProductImage {
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }
}

/// Payload required to create a new product; the server assigns the identifier.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub product_name: String,
    pub price: f64,
    pub stock: i64,
    pub description: String,
    pub thumbnail: String,
    pub thumbnail_name: String,
    pub product_photo: Vec<ProductImage>,
    pub photo_name: Vec<String>,
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        let Product {
            product_name,
            price,
            stock,
            description,
            thumbnail,
            thumbnail_name,
            product_photo,
            photo_name,
            ..
        } = product;

        Self {
            product_name,
            price,
            stock,
            description,
            thumbnail,
            thumbnail_name,
            product_photo,
            photo_name,
        }
    }
}
