use std::sync::Arc;

use actix_files::Files;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use tera::Tera;

use catalog_admin::client::HttpProductClient;
use catalog_admin::config::ServerConfig;
use catalog_admin::preview::PreviewRegistry;
use catalog_admin::routes::main::show_index;
use catalog_admin::routes::product_form::{
    add_product, cancel_form, edit_product, receive_upload, remove_image, save_fields,
    show_form, show_preview, submit_form,
};
use catalog_admin::routes::products::{
    cancel_delete, confirm_delete, request_delete, show_products,
};
use catalog_admin::services::sessions::ConsoleSessions;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let secret_key = match &server_config.secret {
        Some(key) => Key::from(key.as_bytes()),
        None => Key::generate(),
    };

    let api = match HttpProductClient::new(
        &server_config.product_api_url,
        server_config.product_api_timeout,
    ) {
        Ok(api) => api,
        Err(e) => {
            log::error!("Failed to build the product API client: {e}");
            std::process::exit(1);
        }
    };

    let previews = Arc::new(PreviewRegistry::new());
    let sessions = web::Data::new(ConsoleSessions::with_idle_timeout(
        previews.clone(),
        server_config.session_idle_timeout,
    ));
    let previews = web::Data::from(previews);

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    let address = server_config.address.clone();
    let port = server_config.port;
    let domain = server_config.domain.clone();

    log::info!(
        "Serving the catalog console on {address}:{port} against {}",
        server_config.product_api_url
    );

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(domain.clone())
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(show_index)
            .service(show_products)
            .service(request_delete)
            .service(confirm_delete)
            .service(cancel_delete)
            .service(add_product)
            .service(edit_product)
            .service(show_form)
            .service(save_fields)
            .service(submit_form)
            .service(receive_upload)
            .service(remove_image)
            .service(cancel_form)
            .service(show_preview)
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(api.clone()))
            .app_data(sessions.clone())
            .app_data(previews.clone())
            .app_data(web::Data::new(server_config.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}
