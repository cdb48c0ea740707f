//! State behind the product list page.

use thiserror::Error;

use crate::domain::product::Product;

/// Errors returned by list operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListError {
    /// The product is not part of the loaded collection.
    #[error("product {0} is not in the list")]
    UnknownProduct(i64),
    /// A delete was confirmed without being requested first.
    #[error("no delete is waiting for confirmation")]
    NoPendingDelete,
    /// A delete call is already running.
    #[error("a delete is already in progress")]
    DeleteInFlight,
}

/// Outcome of handing an async result back to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCompletion {
    Applied,
    Stale,
}

/// Permission to fetch the collection.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
}

/// Permission to delete one product.
#[derive(Debug)]
pub struct DeleteTicket {
    generation: u64,
    pub product_id: i64,
}

/// Where the confirmation prompt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingDelete {
    Requested(i64),
    InFlight(i64),
}

/// Locally held product collection with its delete confirmation prompt.
#[derive(Debug, Default)]
pub struct ProductListView {
    products: Option<Vec<Product>>,
    error: Option<String>,
    pending_delete: Option<PendingDelete>,
    generation: u64,
}

impl ProductListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded products; `None` until a load succeeds or after a failed load.
    pub fn products(&self) -> Option<&[Product]> {
        self.products.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Product waiting in the confirmation prompt.
    pub fn pending_delete(&self) -> Option<&Product> {
        let product_id = match self.pending_delete? {
            PendingDelete::Requested(id) | PendingDelete::InFlight(id) => id,
        };
        self.find(product_id)
    }

    /// Start a fresh load; results of older loads and deletes become stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.pending_delete = None;
        self.error = None;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply a load result. A failure hides the whole collection.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Product>, String>,
    ) -> ListCompletion {
        if ticket.generation != self.generation {
            return ListCompletion::Stale;
        }

        match result {
            Ok(products) => {
                self.products = Some(products);
                self.error = None;
            }
            Err(message) => {
                self.products = None;
                self.error = Some(message);
            }
        }
        ListCompletion::Applied
    }

    /// Open the confirmation prompt for `product_id`.
    pub fn request_delete(&mut self, product_id: i64) -> Result<(), ListError> {
        if matches!(self.pending_delete, Some(PendingDelete::InFlight(_))) {
            return Err(ListError::DeleteInFlight);
        }
        if self.find(product_id).is_none() {
            return Err(ListError::UnknownProduct(product_id));
        }
        self.error = None;
        self.pending_delete = Some(PendingDelete::Requested(product_id));
        Ok(())
    }

    /// Confirm the requested delete and hand out the call to perform.
    pub fn confirm_delete(&mut self) -> Result<DeleteTicket, ListError> {
        match self.pending_delete {
            Some(PendingDelete::Requested(product_id)) => {
                self.pending_delete = Some(PendingDelete::InFlight(product_id));
                Ok(DeleteTicket {
                    generation: self.generation,
                    product_id,
                })
            }
            Some(PendingDelete::InFlight(_)) => Err(ListError::DeleteInFlight),
            None => Err(ListError::NoPendingDelete),
        }
    }

    /// Apply a delete result; the prompt closes either way.
    ///
    /// Success removes the product locally without a reload.
    pub fn finish_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<(), String>,
    ) -> ListCompletion {
        if ticket.generation != self.generation
            || self.pending_delete != Some(PendingDelete::InFlight(ticket.product_id))
        {
            return ListCompletion::Stale;
        }

        self.pending_delete = None;
        match result {
            Ok(()) => {
                if let Some(products) = self.products.as_mut() {
                    products.retain(|product| product.product_id != Some(ticket.product_id));
                }
            }
            Err(message) => self.error = Some(message),
        }
        ListCompletion::Applied
    }

    /// Close the prompt without touching the collection.
    pub fn cancel_delete(&mut self) {
        if matches!(self.pending_delete, Some(PendingDelete::Requested(_))) {
            self.pending_delete = None;
        }
    }

    fn find(&self, product_id: i64) -> Option<&Product> {
        self.products
            .as_deref()?
            .iter()
            .find(|product| product.product_id == Some(product_id))
    }
}
