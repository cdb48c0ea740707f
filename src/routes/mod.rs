use actix_session::Session;
use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use serde::Serialize;
use tera::{Context, Tera};

use crate::services::sessions::{ConsoleSessions, SessionKey};

pub mod main;
pub mod product_form;
pub mod products;

const SESSION_KEY_NAME: &str = "console";

/// Flash message prepared for the templates.
#[derive(Debug, Serialize)]
struct Alert {
    level: &'static str,
    message: String,
}

fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

/// Context shared by every page: flash alerts and the active navigation entry.
pub fn base_context(flash_messages: &IncomingFlashMessages, current_page: &str) -> Context {
    let alerts: Vec<Alert> = flash_messages
        .iter()
        .map(|message| Alert {
            level: alert_level_to_str(&message.level()),
            message: message.content().to_string(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_page", current_page);
    context
}

/// Render `template` or answer 500 when rendering fails.
pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Post/redirect/get redirect to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Console session key carried by the request's cookie, if any.
pub fn existing_session_key(session: &Session) -> Option<SessionKey> {
    match session.get::<SessionKey>(SESSION_KEY_NAME) {
        Ok(key) => key,
        Err(err) => {
            log::warn!("Discarding unreadable console session key: {err}");
            None
        }
    }
}

/// Console session key of the current browser, allocating one on first visit.
pub fn session_key(session: &Session, sessions: &ConsoleSessions) -> SessionKey {
    existing_session_key(session).unwrap_or_else(|| issue_session_key(session, sessions))
}

fn issue_session_key(session: &Session, sessions: &ConsoleSessions) -> SessionKey {
    let key = sessions.create_key();
    if let Err(err) = session.insert(SESSION_KEY_NAME, key) {
        log::error!("Failed to store console session key: {err}");
    }
    key
}
