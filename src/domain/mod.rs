pub mod draft;
pub mod product;
pub mod upload;
