use thiserror::Error;

use crate::domain::draft::ValidationReport;
use crate::domain::upload::UploadError;
use crate::services::product_form::FormError;
use crate::services::product_list::ListError;

pub mod product_form;
pub mod product_list;
pub mod products;
pub mod sessions;

/// Result type returned by the service layer.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the service layer to the routes.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Submitted form data was rejected before reaching the state machines.
    #[error("form error: {0}")]
    Form(String),
    /// The draft failed validation; no request was sent.
    #[error(transparent)]
    Validation(ValidationReport),
    /// The upload widget result broke its contract.
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadError),
    /// The product API call failed; carries the message for the user.
    #[error("product API failed: {0}")]
    Upstream(String),
    /// The referenced product or gallery image does not exist.
    #[error("not found")]
    NotFound,
    /// Another operation on the same page is still running.
    #[error("operation conflicts with one in progress")]
    Conflict,
    /// The result arrived after the page moved on and was discarded.
    #[error("result discarded because the page moved on")]
    Stale,
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Busy(_) => ServiceError::Conflict,
            FormError::OutOfRange { .. } => ServiceError::NotFound,
            FormError::Upload(err) => ServiceError::Upload(err),
            FormError::Invalid(report) => ServiceError::Validation(report),
        }
    }
}

impl From<ListError> for ServiceError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::UnknownProduct(_) => ServiceError::NotFound,
            ListError::NoPendingDelete => {
                ServiceError::Form("삭제할 상품을 먼저 선택해주세요.".to_string())
            }
            ListError::DeleteInFlight => ServiceError::Conflict,
        }
    }
}
