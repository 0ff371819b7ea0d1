//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Cart (session required)
//! GET  /api/cart/get           - Current cart
//! POST /api/cart/add           - Add a product
//! POST /api/cart/update        - Set a line quantity (<= 0 removes)
//! POST /api/cart/remove        - Remove a line
//! POST /api/cart/clear         - Empty the cart
//! POST /api/cart/merge         - Fold a guest cart into the user's cart
//! POST /api/cart/sync          - Overwrite the cart
//! GET  /api/cart/events        - Cart change stream (SSE)
//!
//! # Auth (rate limited)
//! POST /api/auth/register      - Create account and log in
//! POST /api/auth/login         - Log in
//! POST /api/auth/logout        - Log out
//! GET  /api/auth/me            - Current user
//!
//! # Catalog
//! GET  /api/products           - Product listing (?category=&lang=)
//! GET  /api/products/{id}      - Product detail
//!
//! # Checkout and orders (session required)
//! POST /api/checkout           - Place an order from the cart
//! GET  /api/orders             - Own orders
//! GET  /api/orders/{id}        - One own order
//!
//! # Forms (rate limited)
//! POST /api/contact            - Contact form
//! POST /api/newsletter         - Newsletter sign-up
//!
//! # Admin (admin role required)
//! GET  /api/admin/summary      - Dashboard counters
//! GET  /api/admin/orders       - Recent orders (?status=)
//! GET  /api/admin/messages     - Contact messages
//! GET  /api/admin/subscribers  - Newsletter subscribers
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod contact;
pub mod newsletter;
pub mod orders;
pub mod products;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::{Level, Span};

use crate::middleware::{auth_rate_limiter, form_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/get", get(cart::get))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/merge", post(cart::merge))
        .route("/sync", post(cart::sync))
        .route("/events", get(cart::events))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the checkout and order history routes.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
}

/// Create the public form routes.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit))
        .route("/newsletter", post(newsletter::subscribe))
}

/// Create the admin dashboard routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(admin::summary))
        .route("/orders", get(admin::orders))
        .route("/messages", get(admin::messages))
        .route("/subscribers", get(admin::subscribers))
}

/// Create all `/api` routes. Rate limits apply when enabled in config.
pub fn api_routes(rate_limit: bool) -> Router<AppState> {
    let (auth, forms) = if rate_limit {
        (
            auth_routes().layer(auth_rate_limiter()),
            form_routes().layer(form_rate_limiter()),
        )
    } else {
        (auth_routes(), form_routes())
    };

    Router::new()
        .nest("/cart", cart_routes())
        .nest("/auth", auth)
        .nest("/products", product_routes())
        .nest("/admin", admin_routes())
        .merge(order_routes())
        .merge(forms)
}

/// Build the complete application.
///
/// Layer order, outermost first: Sentry, request tracing, request id,
/// sessions.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let rate_limit = state.config().rate_limit;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes(rate_limit))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK. Always ready when
/// running on in-memory stores.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use brana_core::{LocalizedText, ProductId, UserRole};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::db::Stores;
    use crate::middleware::create_session_layer;
    use crate::models::Product;
    use crate::services::auth::AuthService;

    const PASSWORD: &str = "correct horse battery";

    struct TestApp {
        router: Router,
        state: AppState,
    }

    async fn test_app() -> TestApp {
        let config = StorefrontConfig::in_memory(SecretString::from(
            "k8Fz2Qw9Lm4Xp7Rt1Vb6Nc3Hj5Yd0Ga8Se2Uo9Ki4Mn7",
        ));
        let stores = Stores::memory();
        stores
            .products
            .upsert(&Product {
                id: ProductId::from("p1"),
                name: LocalizedText::new("Psalter facsimile", "የዳዊት መዝሙር ቅጂ"),
                description: LocalizedText::default(),
                price: Decimal::new(450, 0),
                image: None,
                category: "facsimiles".to_string(),
                stock: 5,
                active: true,
            })
            .await
            .unwrap();

        let state = AppState::new(config, stores, None);
        let session_layer =
            create_session_layer(tower_sessions::MemoryStore::default(), state.config());
        TestApp {
            router: app(state.clone(), session_layer),
            state,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: &str,
            uri: &str,
            cookie: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Option<String>, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            let request = match body {
                Some(body) => builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let set_cookie = response
                .headers()
                .get(SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .map(str::to_owned);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, set_cookie, json)
        }

        /// Register an account and return its session cookie.
        async fn register(&self, email: &str) -> String {
            let (status, cookie, _) = self
                .send(
                    "POST",
                    "/api/auth/register",
                    None,
                    Some(json!({ "email": email, "password": PASSWORD })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            cookie.unwrap()
        }

        async fn admin(&self, email: &str) -> String {
            AuthService::new(self.state.stores().users.as_ref())
                .register_with_role(email, PASSWORD, UserRole::Admin)
                .await
                .unwrap();
            let (status, cookie, _) = self
                .send(
                    "POST",
                    "/api/auth/login",
                    None,
                    Some(json!({ "email": email, "password": PASSWORD })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            cookie.unwrap()
        }
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = test_app().await;
        let response = app
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _, _) = app.send("GET", "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_anonymous_cart_calls_are_unauthorized() {
        let app = test_app().await;

        let (status, _, body) = app.send("GET", "/api/cart/get", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/cart/add",
                None,
                Some(json!({ "productId": "p1", "quantity": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_add_same_product_twice_accumulates() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;

        for quantity in [2, 3] {
            let (status, _, body) = app
                .send(
                    "POST",
                    "/api/cart/add",
                    Some(&cookie),
                    Some(json!({ "productId": "p1", "quantity": quantity })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
        }

        let (status, _, body) = app.send("GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["productId"], "p1");
        assert_eq!(items[0]["quantity"], 5);
    }

    #[tokio::test]
    async fn test_add_validation() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;

        let (status, _, _) = app
            .send(
                "POST",
                "/api/cart/add",
                Some(&cookie),
                Some(json!({ "productId": "missing", "quantity": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/cart/add",
                Some(&cookie),
                Some(json!({ "productId": "p1", "quantity": 0 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/cart/add",
                Some(&cookie),
                Some(json!({ "productId": "p1" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_json_bad_requests() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;

        let (status, _, body) = app
            .send(
                "POST",
                "/api/cart/add",
                Some(&cookie),
                Some(json!({ "productId": "p1", "quantity": "two" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());

        let (status, _, body) = app
            .send(
                "POST",
                "/api/cart/merge",
                Some(&cookie),
                Some(json!({ "items": [{ "productId": "p1", "quantity": -1 }] })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (_, _, body) = app.send("GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;
        app.send(
            "POST",
            "/api/cart/add",
            Some(&cookie),
            Some(json!({ "productId": "p1", "quantity": 2 })),
        )
        .await;

        let (status, _, body) = app
            .send(
                "POST",
                "/api/cart/update",
                Some(&cookie),
                Some(json!({ "productId": "p1", "quantity": 0 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["items"], json!([]));
        assert_eq!(body["cart"]["itemCount"], 0);
    }

    #[tokio::test]
    async fn test_remove_absent_product_succeeds() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;
        app.send(
            "POST",
            "/api/cart/add",
            Some(&cookie),
            Some(json!({ "productId": "p1", "quantity": 1 })),
        )
        .await;

        let (status, _, body) = app
            .send(
                "POST",
                "/api/cart/remove",
                Some(&cookie),
                Some(json!({ "productId": "not-there" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_adds_quantities() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;
        app.send(
            "POST",
            "/api/cart/add",
            Some(&cookie),
            Some(json!({ "productId": "p1", "quantity": 1 })),
        )
        .await;

        let (status, _, body) = app
            .send(
                "POST",
                "/api/cart/merge",
                Some(&cookie),
                Some(json!({
                    "items": [
                        { "productId": "p1", "name": "Psalter facsimile", "price": "450", "quantity": 2 },
                        { "productId": "p2", "name": "Gospel leaf", "quantity": 1 }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());

        let (_, _, body) = app.send("GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(
            body["items"]
                .as_array()
                .unwrap()
                .iter()
                .map(|i| (i["productId"].as_str().unwrap(), i["quantity"].as_u64().unwrap()))
                .collect::<Vec<_>>(),
            vec![("p1", 3), ("p2", 1)]
        );
    }

    #[tokio::test]
    async fn test_mismatched_user_id_is_forbidden() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;

        let (status, _, _) = app
            .send("GET", "/api/cart/get?userId=999", Some(&cookie), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/cart/merge",
                Some(&cookie),
                Some(json!({ "userId": 999, "items": [] })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sync_overwrites_and_clear_empties() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;
        app.send(
            "POST",
            "/api/cart/add",
            Some(&cookie),
            Some(json!({ "productId": "p1", "quantity": 4 })),
        )
        .await;

        let (status, _, _) = app
            .send(
                "POST",
                "/api/cart/sync",
                Some(&cookie),
                Some(json!({ "items": [{ "productId": "p9", "name": "Map", "quantity": 1 }] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, _, body) = app.send("GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(body["items"][0]["productId"], "p9");
        assert_eq!(body["items"].as_array().unwrap().len(), 1);

        let (status, _, body) = app
            .send("POST", "/api/cart/clear", Some(&cookie), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let (_, _, body) = app.send("GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn test_carts_are_isolated_between_users() {
        let app = test_app().await;
        let first = app.register("abebe@example.com").await;
        let second = app.register("tigist@example.com").await;

        app.send(
            "POST",
            "/api/cart/add",
            Some(&first),
            Some(json!({ "productId": "p1", "quantity": 1 })),
        )
        .await;

        let (_, _, body) = app.send("GET", "/api/cart/get", Some(&second), None).await;
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn test_messages_follow_lang_parameter() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;

        let (_, _, body) = app
            .send("POST", "/api/cart/clear?lang=am", Some(&cookie), None)
            .await;
        assert_eq!(
            body["message"],
            crate::i18n::Message::CartCleared.text(brana_core::Locale::Am)
        );
    }

    #[tokio::test]
    async fn test_auth_flow() {
        let app = test_app().await;

        let (status, _, _) = app.send("GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let cookie = app.register("Abebe@Example.com").await;
        let (status, _, body) = app.send("GET", "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "abebe@example.com");
        assert_eq!(body["user"]["role"], "customer");

        let (status, _, _) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "email": "abebe@example.com", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": "abebe@example.com", "password": "wrong password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, body) = app
            .send("POST", "/api/auth/logout", Some(&cookie), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _, _) = app.send("GET", "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_products_are_localized() {
        let app = test_app().await;

        let (status, _, body) = app.send("GET", "/api/products?lang=am", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"][0]["name"], "የዳዊት መዝሙር ቅጂ");

        let (status, _, body) = app.send("GET", "/api/products/p1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["product"]["name"], "Psalter facsimile");
        assert_eq!(body["product"]["inStock"], true);

        let (status, _, _) = app.send("GET", "/api/products/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, _, body) = app
            .send("GET", "/api/products?category=maps", None, None)
            .await;
        assert_eq!(body["products"], json!([]));
    }

    fn shipping() -> Value {
        json!({
            "shippingAddress": {
                "fullName": "Abebe Kebede",
                "phone": "+251911000000",
                "street": "Churchill Road",
                "city": "Addis Ababa",
                "country": "Ethiopia"
            },
            "paymentMethod": "cash_on_delivery"
        })
    }

    #[tokio::test]
    async fn test_checkout_places_order_and_clears_cart() {
        let app = test_app().await;
        let cookie = app.register("abebe@example.com").await;

        let (status, _, _) = app
            .send("POST", "/api/checkout", Some(&cookie), Some(shipping()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        app.send(
            "POST",
            "/api/cart/add",
            Some(&cookie),
            Some(json!({ "productId": "p1", "quantity": 2 })),
        )
        .await;
        let (status, _, body) = app
            .send("POST", "/api/checkout", Some(&cookie), Some(shipping()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order"]["status"], "pending");
        assert_eq!(body["order"]["items"][0]["quantity"], 2);
        let order_id = body["order"]["id"].as_i64().unwrap();

        let (_, _, body) = app.send("GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(body["items"], json!([]));

        let (status, _, body) = app.send("GET", "/api/orders", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orders"].as_array().unwrap().len(), 1);

        let (status, _, _) = app
            .send("GET", &format!("/api/orders/{order_id}"), Some(&cookie), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let other = app.register("tigist@example.com").await;
        let (status, _, _) = app
            .send("GET", &format!("/api/orders/{order_id}"), Some(&other), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forms() {
        let app = test_app().await;

        let (status, _, body) = app
            .send(
                "POST",
                "/api/contact",
                None,
                Some(json!({
                    "name": "Tigist",
                    "email": "tigist@example.com",
                    "message": "Do you ship to Gondar?"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/contact",
                None,
                Some(json!({ "name": "Tigist", "email": "not-an-email", "message": "Hi" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let subscribe = json!({ "email": "tigist@example.com" });
        let (status, _, first) = app
            .send("POST", "/api/newsletter", None, Some(subscribe.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, second) = app
            .send("POST", "/api/newsletter", None, Some(subscribe))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(first["message"], second["message"]);
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin_role() {
        let app = test_app().await;

        let (status, _, _) = app.send("GET", "/api/admin/summary", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let customer = app.register("abebe@example.com").await;
        let (status, _, _) = app
            .send("GET", "/api/admin/summary", Some(&customer), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = app.admin("admin@example.com").await;
        let (status, _, body) = app
            .send("GET", "/api/admin/summary", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["customers"], 1);
        assert_eq!(body["products"], 1);

        let (status, _, _) = app
            .send("GET", "/api/admin/orders?status=bogus", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = app
            .send("GET", "/api/admin/orders?status=pending", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orders"], json!([]));

        for path in ["/api/admin/messages", "/api/admin/subscribers"] {
            let (status, _, _) = app.send("GET", path, Some(&admin), None).await;
            assert_eq!(status, StatusCode::OK);
        }
    }
}
