use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::client::HttpProductClient;
use crate::routes::{base_context, existing_session_key, redirect, render_template, session_key};
use crate::services::ServiceError;
use crate::services::products::{
    ProductsPageData, cancel_product_delete, confirm_product_delete, fetch_products,
    load_products, request_product_delete,
};
use crate::services::sessions::ConsoleSessions;

fn render_products(
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    data: &ProductsPageData,
    notice: Option<&str>,
) -> HttpResponse {
    let mut context = base_context(flash_messages, "products");
    context.insert("products", &data.products);
    context.insert("error", &data.error);
    context.insert("pending_delete", &data.pending_delete);
    context.insert("notice", &notice);
    render_template(tera, "products/index.html", &context)
}

#[get("/products")]
pub async fn show_products(
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    api: web::Data<HttpProductClient>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    // Visitors without a console session get the list without one being created.
    let data = match existing_session_key(&session) {
        Some(key) => load_products(api.get_ref(), sessions.get_ref(), key).await,
        None => fetch_products(api.get_ref()).await,
    };
    render_products(&tera, &flash_messages, &data, None)
}

#[post("/products/{product_id}/delete")]
pub async fn request_delete(
    path: web::Path<i64>,
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    api: web::Data<HttpProductClient>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let product_id = path.into_inner();
    let key = session_key(&session, sessions.get_ref());

    match request_product_delete(api.get_ref(), sessions.get_ref(), key, product_id).await {
        Ok(data) => render_products(&tera, &flash_messages, &data, None),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("상품을 찾을 수 없습니다.").send();
            redirect("/products")
        }
        Err(ServiceError::Conflict) => {
            FlashMessage::warning("삭제 요청을 처리하는 중입니다.").send();
            redirect("/products")
        }
        Err(err) => {
            log::error!("Failed to open delete prompt for product {product_id}: {err}");
            redirect("/products")
        }
    }
}

#[post("/products/delete/confirm")]
pub async fn confirm_delete(
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    api: web::Data<HttpProductClient>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let key = session_key(&session, sessions.get_ref());

    match confirm_product_delete(api.get_ref(), sessions.get_ref(), key).await {
        Ok(outcome) => {
            let notice = outcome.deleted.then_some("상품이 삭제되었습니다.");
            render_products(&tera, &flash_messages, &outcome.page, notice)
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/products")
        }
        Err(ServiceError::Conflict) => {
            FlashMessage::warning("삭제 요청을 처리하는 중입니다.").send();
            redirect("/products")
        }
        Err(ServiceError::Stale) => redirect("/products"),
        Err(err) => {
            log::error!("Failed to confirm delete: {err}");
            FlashMessage::error("상품 삭제에 실패했습니다.").send();
            redirect("/products")
        }
    }
}

#[post("/products/delete/cancel")]
pub async fn cancel_delete(
    session: Session,
    sessions: web::Data<ConsoleSessions>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let key = session_key(&session, sessions.get_ref());
    let data = cancel_product_delete(sessions.get_ref(), key);
    render_products(&tera, &flash_messages, &data, None)
}
