//! Helpers for integration tests.

use std::net::TcpListener;
use std::sync::Mutex;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

use catalog_admin::domain::product::Product;

/// Records kept by the fake product API.
#[derive(Default)]
pub struct ApiState {
    pub products: Vec<Product>,
    /// Raw JSON bodies received by `POST /api/products`.
    pub created_bodies: Vec<Value>,
    pub deleted: Vec<i64>,
    /// Body served by `GET /api/products` instead of `products`, for records
    /// in shapes the domain type does not produce.
    pub raw_list: Option<Value>,
    /// When set, every request answers 500 with a plain text body.
    pub broken: bool,
}

type SharedState = web::Data<Mutex<ApiState>>;

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "상품을 찾을 수 없습니다." }))
}

fn broken() -> HttpResponse {
    HttpResponse::InternalServerError().body("upstream exploded")
}

async fn list(state: SharedState) -> HttpResponse {
    let state = state.lock().unwrap();
    if state.broken {
        return broken();
    }
    match &state.raw_list {
        Some(raw) => HttpResponse::Ok().json(raw),
        None => HttpResponse::Ok().json(&state.products),
    }
}

async fn fetch(path: web::Path<i64>, state: SharedState) -> HttpResponse {
    let state = state.lock().unwrap();
    if state.broken {
        return broken();
    }
    let product_id = path.into_inner();
    match state
        .products
        .iter()
        .find(|product| product.product_id == Some(product_id))
    {
        Some(product) => HttpResponse::Ok().json(product),
        None => not_found(),
    }
}

async fn create(body: web::Json<Value>, state: SharedState) -> HttpResponse {
    let mut state = state.lock().unwrap();
    if state.broken {
        return broken();
    }
    let body = body.into_inner();
    let mut product: Product = match serde_json::from_value(body.clone()) {
        Ok(product) => product,
        Err(err) => {
            return HttpResponse::BadRequest().json(json!({ "message": err.to_string() }));
        }
    };
    if product.product_name.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "message": "상품명이 필요합니다." }));
    }
    let next_id = state
        .products
        .iter()
        .filter_map(|product| product.product_id)
        .max()
        .unwrap_or(0)
        + 1;
    product.product_id = Some(next_id);
    state.created_bodies.push(body);
    state.products.push(product.clone());
    HttpResponse::Created().json(product)
}

async fn update(
    path: web::Path<i64>,
    body: web::Json<Product>,
    state: SharedState,
) -> HttpResponse {
    let mut state = state.lock().unwrap();
    if state.broken {
        return broken();
    }
    let product_id = path.into_inner();
    let Some(slot) = state
        .products
        .iter_mut()
        .find(|product| product.product_id == Some(product_id))
    else {
        return not_found();
    };
    *slot = body.into_inner();
    slot.product_id = Some(product_id);
    HttpResponse::Ok().json(slot.clone())
}

async fn remove(path: web::Path<i64>, state: SharedState) -> HttpResponse {
    let mut state = state.lock().unwrap();
    if state.broken {
        return broken();
    }
    let product_id = path.into_inner();
    let before = state.products.len();
    state
        .products
        .retain(|product| product.product_id != Some(product_id));
    if state.products.len() == before {
        return not_found();
    }
    state.deleted.push(product_id);
    HttpResponse::NoContent().finish()
}

/// Product API served on an ephemeral local port.
pub struct TestApi {
    base_url: String,
    state: SharedState,
    handle: ServerHandle,
}

impl TestApi {
    /// Start the fake API seeded with `products`. Must run inside an actix runtime.
    pub fn start(products: Vec<Product>) -> Self {
        let state = web::Data::new(Mutex::new(ApiState {
            products,
            ..ApiState::default()
        }));
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let port = listener.local_addr().expect("listener address").port();

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new().app_data(app_state.clone()).service(
                web::scope("/api/products")
                    .route("", web::get().to(list))
                    .route("", web::post().to(create))
                    .route("/{product_id}", web::get().to(fetch))
                    .route("/{product_id}", web::put().to(update))
                    .route("/{product_id}", web::delete().to(remove)),
            )
        })
        .workers(1)
        .listen(listener)
        .expect("listen on test listener")
        .run();

        let handle = server.handle();
        actix_web::rt::spawn(server);

        TestApi {
            base_url: format!("http://127.0.0.1:{port}"),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Inspect or change the fake API's records.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut ApiState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// Product as stored by the remote API.
pub fn product(product_id: i64, name: &str, price: f64, stock: i64) -> Product {
    Product {
        product_id: Some(product_id),
        product_name: name.to_string(),
        price,
        stock,
        ..Product::default()
    }
}
