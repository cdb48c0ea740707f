use std::collections::BTreeMap;

use serde::Serialize;

use crate::client::{ProductApi, ProductOperation};
use crate::domain::draft::DraftField;
use crate::domain::product::{Product, ProductImage};
use crate::domain::upload::UploadKind;
use crate::forms::products::ProductFieldsForm;
use crate::forms::uploads::UploadCallbackPayload;
use crate::preview::PreviewId;
use crate::services::product_form::{
    Completion, FormMode, FormState, ProductForm, SubmitRequest, SubmitTicket,
};
use crate::services::product_list::{ListCompletion, ProductListView};
use crate::services::sessions::{ConsoleSessions, SessionKey};
use crate::services::{ServiceError, ServiceResult};

/// Row of the products table.
#[derive(Debug, Serialize)]
pub struct ProductRow {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub price: f64,
    pub price_formatted: String,
    pub stock: i64,
    /// Thumbnail, or the first gallery image when there is no thumbnail.
    pub image: Option<String>,
}

impl ProductRow {
    fn from_product(product: &Product) -> Self {
        let image = if product.thumbnail.is_empty() {
            product.product_photo.first().map(|photo| photo.url.clone())
        } else {
            Some(product.thumbnail.clone())
        };

        Self {
            product_id: product.product_id,
            product_name: product.product_name.clone(),
            price: product.price,
            price_formatted: format_price(product.price),
            stock: product.stock,
            image,
        }
    }
}

/// Data required to render the products index template.
#[derive(Debug, Serialize)]
pub struct ProductsPageData {
    /// Products to show; `None` hides the table.
    pub products: Option<Vec<ProductRow>>,
    /// Collection-level error banner.
    pub error: Option<String>,
    /// Product shown in the delete confirmation prompt.
    pub pending_delete: Option<ProductRow>,
}

impl ProductsPageData {
    fn from_view(view: &ProductListView) -> Self {
        Self {
            products: view
                .products()
                .map(|products| products.iter().map(ProductRow::from_product).collect()),
            error: view.error().map(str::to_string),
            pending_delete: view.pending_delete().map(ProductRow::from_product),
        }
    }
}

/// Result of a confirmed delete.
#[derive(Debug)]
pub struct DeleteOutcome {
    /// Whether the product was removed from the catalog.
    pub deleted: bool,
    pub page: ProductsPageData,
}

/// Current input values of the product form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValues {
    pub product_name: String,
    pub price: String,
    pub stock: String,
    pub description: String,
    pub thumbnail: String,
    pub thumbnail_name: String,
}

/// One gallery image as rendered by the form.
#[derive(Debug, Serialize)]
pub struct GalleryItem {
    pub index: usize,
    pub url: String,
    pub filename: String,
    pub preview_id: PreviewId,
}

/// Data required to render the product form template.
#[derive(Debug, Serialize)]
pub struct FormPageData {
    pub is_edit: bool,
    pub product_id: Option<i64>,
    pub busy: bool,
    pub succeeded: bool,
    pub fields: FieldValues,
    pub gallery: Vec<GalleryItem>,
    pub error: Option<String>,
    /// Guidance per input name.
    pub field_errors: BTreeMap<&'static str, Vec<&'static str>>,
}

impl FormPageData {
    fn from_form(form: &ProductForm) -> Self {
        let draft = form.draft();
        let mode = form.mode();

        let gallery = draft
            .gallery()
            .iter()
            .enumerate()
            .map(|(index, entry)| GalleryItem {
                index,
                url: entry.image.url.clone(),
                filename: entry.image.filename.clone(),
                preview_id: entry.preview_id(),
            })
            .collect();

        let mut field_errors: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
        if let Some(report) = form.issues() {
            for issue in report.issues() {
                field_errors
                    .entry(issue.field().key())
                    .or_default()
                    .push(issue.message());
            }
        }

        Self {
            is_edit: matches!(mode, FormMode::Edit(_)),
            product_id: mode.product_id(),
            busy: matches!(
                form.state(),
                FormState::Hydrating | FormState::Submitting
            ),
            succeeded: form.state() == FormState::Succeeded,
            fields: FieldValues {
                product_name: draft.product_name.clone(),
                price: draft.price.as_input(),
                stock: draft.stock.as_input(),
                description: draft.description.clone(),
                thumbnail: draft.thumbnail.clone(),
                thumbnail_name: draft.thumbnail_name.clone(),
            },
            gallery,
            error: form.error().map(str::to_string),
            field_errors,
        }
    }
}

/// Message and destination after a successful submission.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub message: &'static str,
    pub redirect_to: &'static str,
}

/// Fetches the whole collection into the session's list view.
pub async fn load_products<A>(api: &A, sessions: &ConsoleSessions, key: SessionKey) -> ProductsPageData
where
    A: ProductApi + ?Sized,
{
    let ticket = sessions.with(key, |session| session.list.begin_load());

    let result = api.list_products().await.map_err(|err| {
        log::error!("Failed to list products: {err}");
        err.user_message(ProductOperation::List)
    });

    sessions.with(key, |session| {
        if session.list.finish_load(ticket, result) == ListCompletion::Stale {
            log::debug!("Dropping stale product list for session {key}");
        }
        ProductsPageData::from_view(&session.list)
    })
}

/// Fetches the collection for a visitor without a console session.
///
/// Nothing is stored; the list is rendered and forgotten.
pub async fn fetch_products<A>(api: &A) -> ProductsPageData
where
    A: ProductApi + ?Sized,
{
    let mut view = ProductListView::new();
    let ticket = view.begin_load();
    let result = api.list_products().await.map_err(|err| {
        log::error!("Failed to list products: {err}");
        err.user_message(ProductOperation::List)
    });
    view.finish_load(ticket, result);
    ProductsPageData::from_view(&view)
}

/// Opens the delete confirmation prompt for `product_id`.
///
/// A session that has not loaded the list yet fetches it first.
pub async fn request_product_delete<A>(
    api: &A,
    sessions: &ConsoleSessions,
    key: SessionKey,
    product_id: i64,
) -> ServiceResult<ProductsPageData>
where
    A: ProductApi + ?Sized,
{
    let loaded = sessions.with(key, |session| session.list.products().is_some());
    if !loaded {
        load_products(api, sessions, key).await;
    }

    sessions.with(key, |session| -> ServiceResult<ProductsPageData> {
        session.list.request_delete(product_id)?;
        Ok(ProductsPageData::from_view(&session.list))
    })
}

/// Deletes the product waiting in the confirmation prompt.
pub async fn confirm_product_delete<A>(
    api: &A,
    sessions: &ConsoleSessions,
    key: SessionKey,
) -> ServiceResult<DeleteOutcome>
where
    A: ProductApi + ?Sized,
{
    let ticket = sessions.with(key, |session| session.list.confirm_delete())?;
    let product_id = ticket.product_id;

    let result = api.delete_product(product_id).await.map_err(|err| {
        log::error!("Failed to delete product {product_id}: {err}");
        err.user_message(ProductOperation::Delete)
    });
    let deleted = result.is_ok();

    sessions.with(key, |session| match session.list.finish_delete(ticket, result) {
        ListCompletion::Applied => Ok(DeleteOutcome {
            deleted,
            page: ProductsPageData::from_view(&session.list),
        }),
        ListCompletion::Stale => Err(ServiceError::Stale),
    })
}

/// Closes the delete confirmation prompt.
pub fn cancel_product_delete(sessions: &ConsoleSessions, key: SessionKey) -> ProductsPageData {
    sessions.with(key, |session| {
        session.list.cancel_delete();
        ProductsPageData::from_view(&session.list)
    })
}

/// Starts the product form in `mode`, fetching the product in edit mode.
pub async fn open_product_form<A>(
    api: &A,
    sessions: &ConsoleSessions,
    key: SessionKey,
    mode: FormMode,
) -> ServiceResult<FormPageData>
where
    A: ProductApi + ?Sized,
{
    let ticket = sessions.with(key, |session| session.form.initialize(mode));

    if let Some(ticket) = ticket {
        let product_id = ticket.product_id;
        let result = api.get_product(product_id).await.map_err(|err| {
            log::error!("Failed to fetch product {product_id}: {err}");
            err.user_message(ProductOperation::Fetch)
        });

        let completion =
            sessions.with(key, |session| session.form.finish_hydration(ticket, result));
        if completion == Completion::Stale {
            return Err(ServiceError::Stale);
        }
    }

    Ok(current_form(sessions, key))
}

/// Renders the session's form as it currently is.
pub fn current_form(sessions: &ConsoleSessions, key: SessionKey) -> FormPageData {
    sessions.with(key, |session| FormPageData::from_form(&session.form))
}

/// Merges posted field values into the draft.
pub fn update_product_fields(
    sessions: &ConsoleSessions,
    key: SessionKey,
    fields: ProductFieldsForm,
) -> ServiceResult<()> {
    let edits = fields
        .into_field_edits()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    sessions.with(key, |session| apply_edits(&mut session.form, &edits))
}

/// Merges posted field values, validates the draft and saves it.
///
/// Validation failures never reach the product API. A failed call keeps the
/// draft so the user can retry.
pub async fn submit_product_form<A>(
    api: &A,
    sessions: &ConsoleSessions,
    key: SessionKey,
    fields: ProductFieldsForm,
) -> ServiceResult<SubmitOutcome>
where
    A: ProductApi + ?Sized,
{
    let edits = fields
        .into_field_edits()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let ticket = sessions.with(key, |session| -> ServiceResult<SubmitTicket> {
        apply_edits(&mut session.form, &edits)?;
        Ok(session.form.begin_submit()?)
    })?;

    let (operation, result) = match &ticket.request {
        SubmitRequest::Create(new_product) => (
            ProductOperation::Create,
            api.create_product(new_product).await,
        ),
        SubmitRequest::Update {
            product_id,
            product,
        } => (
            ProductOperation::Update,
            api.update_product(*product_id, product).await,
        ),
    };
    let result = result.map_err(|err| {
        log::error!("Product {operation:?} failed: {err}");
        err.user_message(operation)
    });
    let failure = result.as_ref().err().cloned();

    let completion = sessions.with(key, |session| session.form.finish_submit(ticket, result));

    match (completion, failure) {
        (Completion::Stale, _) => Err(ServiceError::Stale),
        (Completion::Applied, Some(message)) => Err(ServiceError::Upstream(message)),
        (Completion::Applied, None) => Ok(SubmitOutcome {
            message: match operation {
                ProductOperation::Update => "상품이 성공적으로 수정되었습니다.",
                _ => "상품이 성공적으로 등록되었습니다.",
            },
            redirect_to: "/products",
        }),
    }
}

/// Forwards an upload widget callback to the form. Returns how many images were added.
pub fn receive_product_upload(
    sessions: &ConsoleSessions,
    key: SessionKey,
    kind: UploadKind,
    payload: UploadCallbackPayload,
) -> ServiceResult<usize> {
    let Some(batch) = payload.into_batch() else {
        return Ok(0);
    };

    sessions
        .with(key, |session| session.form.receive_upload(kind, batch))
        .map_err(ServiceError::from)
}

/// Removes one gallery image from the draft.
pub fn remove_product_image(
    sessions: &ConsoleSessions,
    key: SessionKey,
    index: usize,
) -> ServiceResult<ProductImage> {
    sessions
        .with(key, |session| session.form.remove_gallery_image(index))
        .map_err(ServiceError::from)
}

/// Discards the draft whatever state the form is in.
pub fn cancel_product_form(sessions: &ConsoleSessions, key: SessionKey) {
    sessions.with(key, |session| session.form.cancel());
}

fn apply_edits(form: &mut ProductForm, edits: &[(DraftField, String)]) -> ServiceResult<()> {
    for (field, value) in edits {
        form.set_field(*field, value)?;
    }
    Ok(())
}

/// Price with thousands separators, e.g. `9,900` or `1,250.5`.
pub fn format_price(price: f64) -> String {
    let negative = price < 0.0;
    let rounded = (price.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, ch) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut formatted = if negative {
        format!("-{grouped}")
    } else {
        grouped
    };
    if cents > 0 {
        let fraction = format!("{cents:02}");
        formatted.push('.');
        formatted.push_str(fraction.trim_end_matches('0'));
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mockall::Sequence;
    use serde_json::json;

    use crate::client::ClientError;
    use crate::client::mock::MockProductApi;
    use crate::domain::draft::DraftIssue;
    use crate::domain::product::NewProduct;
    use crate::preview::PreviewRegistry;

    fn sessions() -> (ConsoleSessions, Arc<PreviewRegistry>) {
        let registry = Arc::new(PreviewRegistry::new());
        (ConsoleSessions::new(registry.clone()), registry)
    }

    fn sample_product(product_id: i64, name: &str) -> Product {
        Product {
            product_id: Some(product_id),
            product_name: name.to_string(),
            price: 12000.0,
            stock: 4,
            ..Product::default()
        }
    }

    fn mug_fields() -> ProductFieldsForm {
        ProductFieldsForm {
            product_name: "Mug".to_string(),
            price: "9900".to_string(),
            stock: "5".to_string(),
            description: Some(String::new()),
            thumbnail_name: None,
        }
    }

    fn success_event(url: &str, filename: &str) -> UploadCallbackPayload {
        serde_json::from_value(json!({
            "event": "success",
            "info": { "secure_url": url, "original_filename": filename }
        }))
        .expect("valid payload")
    }

    async fn loaded_list(api: &MockProductApi, sessions: &ConsoleSessions) -> SessionKey {
        let key = sessions.create_key();
        load_products(api, sessions, key).await;
        key
    }

    #[test]
    fn format_price_groups_thousands() {
        assert_eq!(format_price(9900.0), "9,900");
        assert_eq!(format_price(1234567.0), "1,234,567");
        assert_eq!(format_price(999.0), "999");
        assert_eq!(format_price(1250.5), "1,250.5");
        assert_eq!(format_price(0.99), "0.99");
    }

    #[actix_web::test]
    async fn create_scenario_sends_single_create_and_resets() {
        let (sessions, registry) = sessions();
        let key = sessions.create_key();
        let mut api = MockProductApi::new();

        api.expect_create_product()
            .times(1)
            .withf(|new_product: &NewProduct| {
                assert_eq!(new_product.product_name, "Mug");
                assert_eq!(new_product.price, 9900.0);
                assert_eq!(new_product.stock, 5);
                assert_eq!(
                    new_product.product_photo,
                    vec![ProductImage::new("https://img/1.png", "mug.png")]
                );
                assert_eq!(new_product.photo_name, vec!["mug.png"]);
                true
            })
            .returning(|_| Ok(sample_product(1, "Mug")));
        api.expect_update_product().never();

        open_product_form(&api, &sessions, key, FormMode::Create)
            .await
            .expect("create form");
        update_product_fields(&sessions, key, mug_fields()).expect("fields");
        let added = receive_product_upload(
            &sessions,
            key,
            UploadKind::Gallery,
            success_event("https://img/1.png", "mug.png"),
        )
        .expect("upload accepted");
        assert_eq!(added, 1);
        assert_eq!(registry.live_count(), 1);

        let outcome = submit_product_form(&api, &sessions, key, mug_fields())
            .await
            .expect("submit succeeds");

        assert_eq!(outcome.redirect_to, "/products");
        assert_eq!(outcome.message, "상품이 성공적으로 등록되었습니다.");
        let page = current_form(&sessions, key);
        assert!(page.succeeded);
        assert!(page.fields.product_name.is_empty());
        assert!(page.gallery.is_empty());
        assert_eq!(registry.live_count(), 0);
    }

    #[actix_web::test]
    async fn invalid_submit_makes_no_network_call() {
        let (sessions, _) = sessions();
        let key = sessions.create_key();
        let mut api = MockProductApi::new();
        api.expect_create_product().never();

        let fields = ProductFieldsForm {
            price: "0".to_string(),
            ..mug_fields()
        };
        let result = submit_product_form(&api, &sessions, key, fields).await;

        match result {
            Err(ServiceError::Validation(report)) => {
                assert_eq!(report.issues(), &[DraftIssue::PriceNotPositive]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let page = current_form(&sessions, key);
        assert_eq!(
            page.field_errors.get("price"),
            Some(&vec!["가격은 0보다 커야 합니다."])
        );
        assert_eq!(page.fields.price, "0");
    }

    #[actix_web::test]
    async fn failed_submit_surfaces_server_message_and_keeps_draft() {
        let (sessions, _) = sessions();
        let key = sessions.create_key();
        let mut api = MockProductApi::new();
        api.expect_create_product().times(1).returning(|_| {
            Err(ClientError::Api {
                status: 400,
                message: Some("중복된 상품명입니다.".to_string()),
            })
        });

        let result = submit_product_form(&api, &sessions, key, mug_fields()).await;

        assert!(matches!(
            result,
            Err(ServiceError::Upstream(message)) if message == "중복된 상품명입니다."
        ));
        let page = current_form(&sessions, key);
        assert_eq!(page.fields.product_name, "Mug");
        assert_eq!(page.error.as_deref(), Some("중복된 상품명입니다."));
    }

    #[actix_web::test]
    async fn edit_round_trip_updates_with_fetched_product() {
        let (sessions, _) = sessions();
        let key = sessions.create_key();
        let fetched = Product {
            description: "Tall".to_string(),
            thumbnail: "https://img/t.png".to_string(),
            thumbnail_name: "t.png".to_string(),
            product_photo: vec![ProductImage::new("https://img/a.png", "a.png")],
            photo_name: vec!["a.png".to_string()],
            ..sample_product(7, "Vase")
        };
        let expected = fetched.clone();
        let mut api = MockProductApi::new();
        let mut seq = Sequence::new();

        api.expect_get_product()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|product_id| *product_id == 7)
            .returning(move |_| Ok(fetched.clone()));
        api.expect_update_product()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |product_id, product| *product_id == 7 && *product == expected)
            .returning(|_, product| Ok(product.clone()));

        let page = open_product_form(&api, &sessions, key, FormMode::Edit(7))
            .await
            .expect("edit form");
        assert!(page.is_edit);
        assert_eq!(page.fields.price, "12000");

        let fields = ProductFieldsForm {
            product_name: page.fields.product_name.clone(),
            price: page.fields.price.clone(),
            stock: page.fields.stock.clone(),
            description: Some(page.fields.description.clone()),
            thumbnail_name: Some(page.fields.thumbnail_name.clone()),
        };
        let outcome = submit_product_form(&api, &sessions, key, fields)
            .await
            .expect("update succeeds");

        assert_eq!(outcome.message, "상품이 성공적으로 수정되었습니다.");
    }

    #[actix_web::test]
    async fn failed_fetch_opens_empty_form_with_error() {
        let (sessions, _) = sessions();
        let key = sessions.create_key();
        let mut api = MockProductApi::new();
        api.expect_get_product().times(1).returning(|_| {
            Err(ClientError::Api {
                status: 404,
                message: None,
            })
        });

        let page = open_product_form(&api, &sessions, key, FormMode::Edit(3))
            .await
            .expect("form still opens");

        assert!(page.fields.product_name.is_empty());
        assert_eq!(page.error.as_deref(), Some("상품 정보를 불러오지 못했습니다."));
        assert!(!page.busy);
    }

    #[actix_web::test]
    async fn thumbnail_upload_with_many_images_is_rejected() {
        let (sessions, _) = sessions();
        let key = sessions.create_key();
        let payload: UploadCallbackPayload = serde_json::from_value(json!([
            { "event": "success", "info": { "secure_url": "https://img/1.png", "original_filename": "1" } },
            { "event": "success", "info": { "secure_url": "https://img/2.png", "original_filename": "2" } }
        ]))
        .expect("valid payload");

        let result = receive_product_upload(&sessions, key, UploadKind::Thumbnail, payload);

        assert!(matches!(result, Err(ServiceError::Upload(_))));
        assert!(current_form(&sessions, key).fields.thumbnail.is_empty());
    }

    #[actix_web::test]
    async fn failed_delete_keeps_both_products() {
        let (sessions, _) = sessions();
        let mut api = MockProductApi::new();
        api.expect_list_products()
            .times(1)
            .returning(|| Ok(vec![sample_product(1, "Mug"), sample_product(2, "Plate")]));
        api.expect_delete_product()
            .times(1)
            .withf(|product_id| *product_id == 2)
            .returning(|_| {
                Err(ClientError::Api {
                    status: 500,
                    message: None,
                })
            });
        let key = loaded_list(&api, &sessions).await;

        let page = request_product_delete(&api, &sessions, key, 2)
            .await
            .expect("known product");
        assert_eq!(
            page.pending_delete.map(|row| row.product_name),
            Some("Plate".to_string())
        );

        let outcome = confirm_product_delete(&api, &sessions, key)
            .await
            .expect("delete applied");

        assert!(!outcome.deleted);
        assert_eq!(outcome.page.products.map(|rows| rows.len()), Some(2));
        assert_eq!(outcome.page.error.as_deref(), Some("상품 삭제에 실패했습니다."));
        assert!(outcome.page.pending_delete.is_none());
    }

    #[actix_web::test]
    async fn successful_delete_patches_without_refetch() {
        let (sessions, _) = sessions();
        let mut api = MockProductApi::new();
        api.expect_list_products()
            .times(1)
            .returning(|| Ok(vec![sample_product(1, "Mug"), sample_product(2, "Plate")]));
        api.expect_delete_product().times(1).returning(|_| Ok(()));
        let key = loaded_list(&api, &sessions).await;

        request_product_delete(&api, &sessions, key, 1)
            .await
            .expect("known product");
        let outcome = confirm_product_delete(&api, &sessions, key)
            .await
            .expect("delete applied");

        assert!(outcome.deleted);
        let names: Vec<String> = outcome
            .page
            .products
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.product_name)
            .collect();
        assert_eq!(names, vec!["Plate"]);
    }

    #[actix_web::test]
    async fn cancel_delete_makes_no_call() {
        let (sessions, _) = sessions();
        let mut api = MockProductApi::new();
        api.expect_list_products()
            .times(1)
            .returning(|| Ok(vec![sample_product(1, "Mug")]));
        api.expect_delete_product().never();
        let key = loaded_list(&api, &sessions).await;

        request_product_delete(&api, &sessions, key, 1)
            .await
            .expect("known product");
        let page = cancel_product_delete(&sessions, key);

        assert!(page.pending_delete.is_none());
        assert!(matches!(
            confirm_product_delete(&api, &sessions, key).await,
            Err(ServiceError::Form(_))
        ));
    }

    #[actix_web::test]
    async fn delete_prompt_loads_list_for_fresh_session() {
        let (sessions, _) = sessions();
        let key = sessions.create_key();
        let mut api = MockProductApi::new();
        api.expect_list_products()
            .times(1)
            .returning(|| Ok(vec![sample_product(1, "Mug"), sample_product(2, "Plate")]));

        let page = request_product_delete(&api, &sessions, key, 2)
            .await
            .expect("known product");

        assert_eq!(page.products.map(|rows| rows.len()), Some(2));
        assert_eq!(
            page.pending_delete.map(|row| row.product_name),
            Some("Plate".to_string())
        );
    }

    #[actix_web::test]
    async fn fetch_products_renders_without_a_session() {
        let mut api = MockProductApi::new();
        api.expect_list_products()
            .times(1)
            .returning(|| Ok(vec![sample_product(1, "Mug")]));

        let page = fetch_products(&api).await;

        let rows = page.products.expect("rows");
        assert_eq!(rows[0].product_name, "Mug");
        assert_eq!(rows[0].price_formatted, "12,000");
        assert!(page.error.is_none());
        assert!(page.pending_delete.is_none());
    }

    #[actix_web::test]
    async fn submit_cancelled_during_call_is_stale() {
        let sessions = Arc::new(ConsoleSessions::new(Arc::new(PreviewRegistry::new())));
        let key = sessions.create_key();
        let mut api = MockProductApi::new();
        let in_call = Arc::clone(&sessions);
        api.expect_create_product().times(1).returning(move |_| {
            in_call.with(key, |session| session.form.cancel());
            Ok(sample_product(1, "Mug"))
        });

        let result = submit_product_form(&api, &sessions, key, mug_fields()).await;

        assert!(matches!(result, Err(ServiceError::Stale)));
        let page = current_form(&sessions, key);
        assert!(!page.succeeded);
        assert!(page.error.is_none());
        assert!(page.fields.product_name.is_empty());
    }

    #[actix_web::test]
    async fn failed_load_hides_table() {
        let (sessions, _) = sessions();
        let key = sessions.create_key();
        let mut api = MockProductApi::new();
        api.expect_list_products().times(1).returning(|| {
            Err(ClientError::Api {
                status: 503,
                message: Some("점검 중입니다.".to_string()),
            })
        });

        let page = load_products(&api, &sessions, key).await;

        assert!(page.products.is_none());
        assert_eq!(page.error.as_deref(), Some("점검 중입니다."));
    }
}
