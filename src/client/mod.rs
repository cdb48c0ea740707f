use async_trait::async_trait;
use thiserror::Error;

use crate::domain::product::{NewProduct, Product};

pub mod http;

#[cfg(test)]
pub mod mock;

pub use http::HttpProductClient;

/// Result type returned by product API calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to the product API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The product API answered with a non-2xx status code.
    #[error("product API error ({status}): {}", .message.as_deref().unwrap_or("<no message>"))]
    Api {
        status: u16,
        /// `message` field of the error body, when the server sent one.
        message: Option<String>,
    },
}

impl ClientError {
    /// Message shown to the user when `operation` fails with this error.
    pub fn user_message(&self, operation: ProductOperation) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => operation.fallback_message().to_string(),
        }
    }

    /// Whether the server reported that the product does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}

/// Calls offered by the product API, used to pick user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOperation {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

impl ProductOperation {
    pub fn fallback_message(self) -> &'static str {
        match self {
            ProductOperation::List => "상품 목록을 불러오지 못했습니다.",
            ProductOperation::Fetch => "상품 정보를 불러오지 못했습니다.",
            ProductOperation::Create => "상품 등록에 실패했습니다.",
            ProductOperation::Update => "상품 수정에 실패했습니다.",
            ProductOperation::Delete => "상품 삭제에 실패했습니다.",
        }
    }
}

/// Remote product catalog.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list_products(&self) -> ClientResult<Vec<Product>>;
    async fn get_product(&self, product_id: i64) -> ClientResult<Product>;
    async fn create_product(&self, new_product: &NewProduct) -> ClientResult<Product>;
    async fn update_product(&self, product_id: i64, product: &Product) -> ClientResult<Product>;
    async fn delete_product(&self, product_id: i64) -> ClientResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_message() {
        let err = ClientError::Api {
            status: 409,
            message: Some("이미 존재하는 상품입니다.".to_string()),
        };

        assert_eq!(
            err.user_message(ProductOperation::Create),
            "이미 존재하는 상품입니다."
        );
    }

    #[test]
    fn user_message_falls_back_per_operation() {
        let err = ClientError::Api {
            status: 500,
            message: None,
        };

        assert_eq!(
            err.user_message(ProductOperation::Delete),
            "상품 삭제에 실패했습니다."
        );
        assert_eq!(
            err.user_message(ProductOperation::Update),
            "상품 수정에 실패했습니다."
        );
    }
}
