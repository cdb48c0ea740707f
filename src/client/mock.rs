use async_trait::async_trait;
use mockall::mock;

use super::{ClientResult, ProductApi};
use crate::domain::product::{NewProduct, Product};

mock! {
    pub ProductApi {}

    #[async_trait]
    impl ProductApi for ProductApi {
        async fn list_products(&self) -> ClientResult<Vec<Product>>;
        async fn get_product(&self, product_id: i64) -> ClientResult<Product>;
        async fn create_product(&self, new_product: &NewProduct) -> ClientResult<Product>;
        async fn update_product(&self, product_id: i64, product: &Product) -> ClientResult<Product>;
        async fn delete_product(&self, product_id: i64) -> ClientResult<()>;
    }
}
