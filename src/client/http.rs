//! reqwest-backed client for the remote product API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::client::{ClientError, ClientResult, ProductApi};
use crate::domain::product::{NewProduct, Product};

/// Body returned by the product API alongside error statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
/// HTTP client for the product API. Cheap to clone; clones share the connection pool and cookies.
pub struct HttpProductClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductClient {
    /// Build a client for `base_url` (e.g. `https://host`) with a per-request timeout.
    ///
    /// The client keeps a cookie store so session cookies issued by the API are
    /// sent back on every call.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection_url(&self) -> String {
        format!("{}/api/products", self.base_url)
    }

    fn product_url(&self, product_id: i64) -> String {
        format!("{}/api/products/{product_id}", self.base_url)
    }

    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(err) => {
                log::debug!("Product API error body was not JSON: {err}");
                None
            }
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ProductApi for HttpProductClient {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let response = self
            .client
            .get(self.collection_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_product(&self, product_id: i64) -> ClientResult<Product> {
        let response = self
            .client
            .get(self.product_url(product_id))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn create_product(&self, new_product: &NewProduct) -> ClientResult<Product> {
        let response = self
            .client
            .post(self.collection_url())
            .json(new_product)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_product(&self, product_id: i64, product: &Product) -> ClientResult<Product> {
        let response = self
            .client
            .put(self.product_url(product_id))
            .json(product)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn delete_product(&self, product_id: i64) -> ClientResult<()> {
        let response = self
            .client
            .delete(self.product_url(product_id))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
