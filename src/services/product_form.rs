//! State machine behind the create/edit product page.
//!
//! The form never performs I/O itself. Operations that need the product API
//! hand out a ticket; the caller performs the call and returns the ticket with
//! the outcome. Tickets carry the form generation, which `initialize` and
//! `cancel` advance, so results that arrive after the user moved on are
//! dropped instead of overwriting the current draft.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::draft::{DraftField, ProductDraft, ValidationReport};
use crate::domain::product::{NewProduct, Product, ProductImage};
use crate::domain::upload::{UploadBatch, UploadError, UploadKind};
use crate::preview::PreviewStore;

/// Banner shown when a submission is rejected by validation.
pub const INVALID_DRAFT_MESSAGE: &str = "모든 필드를 올바르게 입력해주세요.";

/// Whether the form creates a new product or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

impl FormMode {
    pub fn product_id(self) -> Option<i64> {
        match self {
            FormMode::Create => None,
            FormMode::Edit(product_id) => Some(product_id),
        }
    }
}

/// Lifecycle of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// Fresh create-mode draft.
    Empty,
    /// Waiting for the product being edited.
    Hydrating,
    /// Fields are being edited.
    Editing,
    /// Waiting for the create/update call.
    Submitting,
    /// The product was saved; the caller leaves the page.
    Succeeded,
}

/// Outcome of handing an async result back to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was applied to the form.
    Applied,
    /// The ticket belongs to a draft that no longer exists; nothing changed.
    Stale,
}

/// Permission to fetch the product being edited.
#[derive(Debug)]
pub struct HydrationTicket {
    generation: u64,
    pub product_id: i64,
}

/// Call the caller must issue to persist the draft.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    Create(NewProduct),
    Update { product_id: i64, product: Product },
}

/// Permission to persist the draft.
#[derive(Debug)]
pub struct SubmitTicket {
    generation: u64,
    pub request: SubmitRequest,
}

/// Errors returned by form operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// The operation is not allowed while the form is in this state.
    #[error("form cannot be changed while {0:?}")]
    Busy(FormState),
    /// A gallery index outside the current gallery.
    #[error("gallery index {index} out of range for {len} image(s)")]
    OutOfRange { index: usize, len: usize },
    /// The upload widget returned something the slot cannot take.
    #[error(transparent)]
    Upload(#[from] UploadError),
    /// The draft failed validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationReport),
}

/// Product form: the draft plus the state needed to drive it.
pub struct ProductForm {
    previews: Arc<dyn PreviewStore>,
    mode: FormMode,
    state: FormState,
    draft: ProductDraft,
    error: Option<String>,
    issues: Option<ValidationReport>,
    generation: u64,
}

impl ProductForm {
    /// Create an empty create-mode form drawing previews from `previews`.
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            previews,
            mode: FormMode::Create,
            state: FormState::Empty,
            draft: ProductDraft::default(),
            error: None,
            issues: None,
            generation: 0,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    /// Error banner to show, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Field-level problems found by the last submission attempt.
    pub fn issues(&self) -> Option<&ValidationReport> {
        self.issues.as_ref()
    }

    /// Start over in `mode`. Edit mode returns the fetch the caller must perform.
    pub fn initialize(&mut self, mode: FormMode) -> Option<HydrationTicket> {
        self.reset(mode);
        match mode {
            FormMode::Create => None,
            FormMode::Edit(product_id) => {
                self.state = FormState::Hydrating;
                Some(HydrationTicket {
                    generation: self.generation,
                    product_id,
                })
            }
        }
    }

    /// Apply the result of the fetch started by [`ProductForm::initialize`].
    ///
    /// A failed fetch leaves an empty draft and surfaces `Err`'s message.
    pub fn finish_hydration(
        &mut self,
        ticket: HydrationTicket,
        result: Result<Product, String>,
    ) -> Completion {
        if ticket.generation != self.generation || self.state != FormState::Hydrating {
            log::debug!(
                "Dropping stale hydration of product {} (generation {})",
                ticket.product_id,
                ticket.generation
            );
            return Completion::Stale;
        }

        match result {
            Ok(product) => {
                self.draft = ProductDraft::from_product(product, &self.previews);
            }
            Err(message) => {
                self.draft = ProductDraft::default();
                self.error = Some(message);
            }
        }
        self.state = FormState::Editing;
        Completion::Applied
    }

    /// Merge raw input text into a draft field.
    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.draft.set(field, value);
        self.issues = None;
        self.state = FormState::Editing;
        Ok(())
    }

    /// Accept images reported by the upload widget for `kind`.
    ///
    /// The thumbnail slot takes exactly one image; any other batch is rejected
    /// and the draft is left as it was. Gallery images are appended in order.
    /// Returns how many images were added.
    pub fn receive_upload(&mut self, kind: UploadKind, batch: UploadBatch) -> Result<usize, FormError> {
        self.ensure_editable()?;

        let added = match kind {
            UploadKind::Thumbnail => {
                let mut images = batch.into_images();
                match images.len() {
                    0 => return Err(UploadError::EmptyThumbnail.into()),
                    1 => {}
                    received => {
                        return Err(UploadError::MultipleThumbnails { received }.into());
                    }
                }
                if let Some(image) = images.pop() {
                    self.draft.set_thumbnail(image);
                }
                1
            }
            UploadKind::Gallery => {
                let added = batch.len();
                for image in batch.into_images() {
                    self.draft.push_gallery_image(image, &self.previews);
                }
                added
            }
        };

        self.state = FormState::Editing;
        Ok(added)
    }

    /// Remove the gallery image at `index`, releasing its preview.
    pub fn remove_gallery_image(&mut self, index: usize) -> Result<ProductImage, FormError> {
        self.ensure_editable()?;
        let len = self.draft.gallery().len();
        let removed = self
            .draft
            .remove_gallery_image(index)
            .ok_or(FormError::OutOfRange { index, len })?;
        self.state = FormState::Editing;
        Ok(removed)
    }

    pub fn validate(&self) -> Result<(), ValidationReport> {
        self.draft.validate()
    }

    /// Validate the draft and, when it passes, hand out the create/update call.
    ///
    /// On validation failure the form stays editable with the issues recorded
    /// and no ticket is issued.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, FormError> {
        self.ensure_editable()?;

        let product = match self.draft.to_product(self.mode.product_id()) {
            Ok(product) => product,
            Err(report) => {
                self.state = FormState::Editing;
                self.error = Some(INVALID_DRAFT_MESSAGE.to_string());
                self.issues = Some(report.clone());
                return Err(FormError::Invalid(report));
            }
        };

        let request = match self.mode {
            FormMode::Create => SubmitRequest::Create(NewProduct::from(product)),
            FormMode::Edit(product_id) => SubmitRequest::Update {
                product_id,
                product,
            },
        };

        self.state = FormState::Submitting;
        self.error = None;
        self.issues = None;
        Ok(SubmitTicket {
            generation: self.generation,
            request,
        })
    }

    /// Apply the outcome of the call issued for `ticket`.
    ///
    /// Success discards the draft. Failure keeps it so the user can retry.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<Product, String>,
    ) -> Completion {
        if ticket.generation != self.generation || self.state != FormState::Submitting {
            log::debug!(
                "Dropping stale submit result (generation {})",
                ticket.generation
            );
            return Completion::Stale;
        }

        match result {
            Ok(_) => {
                self.draft = ProductDraft::default();
                self.state = FormState::Succeeded;
            }
            Err(message) => {
                self.error = Some(message);
                self.state = FormState::Editing;
            }
        }
        Completion::Applied
    }

    /// Drop the draft and any message, whatever the form is doing.
    pub fn cancel(&mut self) {
        self.reset(FormMode::Create);
    }

    fn reset(&mut self, mode: FormMode) {
        self.generation += 1;
        self.mode = mode;
        self.state = FormState::Empty;
        self.draft = ProductDraft::default();
        self.error = None;
        self.issues = None;
    }

    fn ensure_editable(&self) -> Result<(), FormError> {
        match self.state {
            FormState::Empty | FormState::Editing => Ok(()),
            state => Err(FormError::Busy(state)),
        }
    }
}
