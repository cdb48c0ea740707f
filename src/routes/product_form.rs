use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde_json::json;
use tera::Tera;

use crate::client::HttpProductClient;
use crate::config::ServerConfig;
use crate::domain::upload::{UploadKind, UploadWidgetConfig};
use crate::forms::products::ProductFieldsForm;
use crate::forms::uploads::UploadCallbackPayload;
use crate::preview::{PreviewId, PreviewRegistry};
use crate::routes::{base_context, redirect, render_template, session_key};
use crate::services::ServiceError;
use crate::services::product_form::FormMode;
use crate::services::products::{
    FormPageData, cancel_product_form, current_form, open_product_form, receive_product_upload,
    remove_product_image, submit_product_form, update_product_fields,
};
use crate::services::sessions::ConsoleSessions;

const FORM_PATH: &str = "/products/form";
const BUSY_MESSAGE: &str = "처리 중입니다. 잠시 후 다시 시도해주세요.";
const STALE_SUBMIT_MESSAGE: &str =
    "이전 요청이 취소되었습니다. 저장 여부는 상품 목록에서 확인해주세요.";

fn render_form(
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    config: &ServerConfig,
    data: &FormPageData,
) -> HttpResponse {
    let widget = |kind| {
        UploadWidgetConfig::for_kind(
            kind,
            config.cloudinary_cloud_name.as_str(),
            config.cloudinary_upload_preset.as_str(),
        )
    };

    let mut context = base_context(flash_messages, "products");
    context.insert("form", data);
    context.insert("thumbnail_widget", &widget(UploadKind::Thumbnail));
    context.insert("gallery_widget", &widget(UploadKind::Gallery));
    render_template(tera, "products/form.html", &context)
}

#[get("/products/add")]
pub async fn add_product(
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    api: web::Data<HttpProductClient>,
) -> impl Responder {
    let key = session_key(&session, sessions.get_ref());

    match open_product_form(api.get_ref(), sessions.get_ref(), key, FormMode::Create).await {
        Ok(_) => redirect(FORM_PATH),
        Err(err) => {
            log::error!("Failed to open the create form: {err}");
            redirect("/products")
        }
    }
}

#[get("/products/edit/{product_id}")]
pub async fn edit_product(
    path: web::Path<i64>,
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    api: web::Data<HttpProductClient>,
) -> impl Responder {
    let product_id = path.into_inner();
    let key = session_key(&session, sessions.get_ref());

    match open_product_form(
        api.get_ref(),
        sessions.get_ref(),
        key,
        FormMode::Edit(product_id),
    )
    .await
    {
        Ok(_) | Err(ServiceError::Stale) => redirect(FORM_PATH),
        Err(err) => {
            log::error!("Failed to open product {product_id} for editing: {err}");
            redirect("/products")
        }
    }
}

#[get("/products/form")]
pub async fn show_form(
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    server_config: web::Data<ServerConfig>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let key = session_key(&session, sessions.get_ref());
    let data = current_form(sessions.get_ref(), key);

    if data.succeeded {
        return redirect("/products");
    }
    render_form(&tera, &flash_messages, &server_config, &data)
}

#[post("/products/form/fields")]
pub async fn save_fields(
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    web::Form(form): web::Form<ProductFieldsForm>,
) -> impl Responder {
    let key = session_key(&session, sessions.get_ref());

    match update_product_fields(sessions.get_ref(), key, form) {
        Ok(()) => {}
        Err(ServiceError::Form(message)) => FlashMessage::error(message).send(),
        Err(ServiceError::Conflict) => FlashMessage::warning(BUSY_MESSAGE).send(),
        Err(err) => log::error!("Failed to save product fields: {err}"),
    }
    redirect(FORM_PATH)
}

#[post("/products/form/submit")]
pub async fn submit_form(
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    api: web::Data<HttpProductClient>,
    web::Form(form): web::Form<ProductFieldsForm>,
) -> impl Responder {
    let key = session_key(&session, sessions.get_ref());

    match submit_product_form(api.get_ref(), sessions.get_ref(), key, form).await {
        Ok(outcome) => {
            FlashMessage::success(outcome.message).send();
            redirect(outcome.redirect_to)
        }
        Err(err) => {
            if let Some(notice) = submit_failure_notice(&err) {
                notice.send();
            }
            redirect(FORM_PATH)
        }
    }
}

/// Flash shown after a failed submission. The form itself carries the
/// banner and field guidance for validation and upstream failures.
fn submit_failure_notice(err: &ServiceError) -> Option<FlashMessage> {
    match err {
        ServiceError::Validation(_) | ServiceError::Upstream(_) => None,
        // The call may still have reached the server.
        ServiceError::Stale => Some(FlashMessage::info(STALE_SUBMIT_MESSAGE)),
        ServiceError::Form(message) => Some(FlashMessage::error(message.clone())),
        ServiceError::Conflict => Some(FlashMessage::warning(BUSY_MESSAGE)),
        err => {
            log::error!("Failed to submit product form: {err}");
            Some(FlashMessage::error("상품 저장에 실패했습니다."))
        }
    }
}

#[post("/products/form/upload/{kind}")]
pub async fn receive_upload(
    path: web::Path<String>,
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    payload: web::Json<UploadCallbackPayload>,
) -> impl Responder {
    let kind = match path.parse::<UploadKind>() {
        Ok(kind) => kind,
        Err(err) => return HttpResponse::NotFound().json(json!({ "message": err.to_string() })),
    };
    let key = session_key(&session, sessions.get_ref());

    match receive_product_upload(sessions.get_ref(), key, kind, payload.into_inner()) {
        Ok(added) => HttpResponse::Ok().json(json!({ "added": added })),
        Err(ServiceError::Upload(err)) => {
            log::warn!("Rejected {kind} upload: {err}");
            HttpResponse::UnprocessableEntity().json(json!({ "message": err.to_string() }))
        }
        Err(ServiceError::Conflict) => {
            HttpResponse::Conflict().json(json!({ "message": BUSY_MESSAGE }))
        }
        Err(err) => {
            log::error!("Failed to accept {kind} upload: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/products/form/gallery/{index}/remove")]
pub async fn remove_image(
    path: web::Path<usize>,
    session: Session,
    sessions: web::Data<ConsoleSessions>,
) -> impl Responder {
    let index = path.into_inner();
    let key = session_key(&session, sessions.get_ref());

    match remove_product_image(sessions.get_ref(), key, index) {
        Ok(image) => log::debug!("Removed gallery image {}", image.url),
        Err(ServiceError::NotFound) => FlashMessage::error("이미지를 찾을 수 없습니다.").send(),
        Err(ServiceError::Conflict) => FlashMessage::warning(BUSY_MESSAGE).send(),
        Err(err) => log::error!("Failed to remove gallery image {index}: {err}"),
    }
    redirect(FORM_PATH)
}

#[post("/products/form/cancel")]
pub async fn cancel_form(session: Session, sessions: web::Data<ConsoleSessions>) -> impl Responder {
    let key = session_key(&session, sessions.get_ref());
    cancel_product_form(sessions.get_ref(), key);
    redirect("/products")
}

#[get("/products/form/previews/{preview_id}")]
pub async fn show_preview(
    path: web::Path<PreviewId>,
    previews: web::Data<PreviewRegistry>,
) -> impl Responder {
    match previews.resolve(path.into_inner()) {
        Some(url) => redirect(&url),
        None => HttpResponse::NotFound().finish(),
    }
}
