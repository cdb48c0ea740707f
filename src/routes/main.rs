use actix_web::{Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use crate::routes::{base_context, render_template};

#[get("/")]
pub async fn show_index(flash_messages: IncomingFlashMessages, tera: web::Data<Tera>) -> impl Responder {
    let context = base_context(&flash_messages, "index");
    render_template(&tera, "main/index.html", &context)
}
