//! Integration tests for Brana.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p brana-integration-tests
//! ```
//!
//! Each test starts its own storefront on an ephemeral port, backed by
//! in-memory stores and sessions, so no database is needed.

use std::net::SocketAddr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::task::JoinHandle;

use brana_core::{LocalizedText, ProductId};
use brana_storefront::config::StorefrontConfig;
use brana_storefront::db::{ProductStore, Stores};
use brana_storefront::middleware::create_session_layer;
use brana_storefront::models::Product;
use brana_storefront::routes;
use brana_storefront::state::AppState;

/// Password used for every test account.
pub const PASSWORD: &str = "manuscripts-are-forever";

/// A storefront running in the background of a test.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Catalog every test server starts with.
#[must_use]
pub fn catalog() -> Vec<Product> {
    vec![
        product("p1", "Psalter facsimile", "የዳዊት መዝሙር ቅጂ", 450),
        product("p2", "Gospel leaf print", "የወንጌል ገጽ ሕትመት", 180),
    ]
}

fn product(id: &str, en: &str, am: &str, price: i64) -> Product {
    Product {
        id: ProductId::from(id),
        name: LocalizedText::new(en, am),
        description: LocalizedText::default(),
        price: Decimal::new(price, 0),
        image: None,
        category: "facsimiles".to_string(),
        stock: 10,
        active: true,
    }
}

impl TestServer {
    /// Start a storefront on `127.0.0.1` with a fresh in-memory store.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or the catalog cannot be seeded.
    #[allow(clippy::unwrap_used)]
    pub async fn spawn() -> Self {
        let config = StorefrontConfig::in_memory(SecretString::from(
            "Zq7Lx2Vw9Pn4Ks8Hd3Mb6Tr1Gy5Fc0Ja7Ue2Wo9Ri4",
        ));
        let stores = Stores::memory();
        for product in catalog() {
            stores.products.upsert(&product).await.unwrap();
        }

        let state = AppState::new(config, stores, None);
        let session_layer =
            create_session_layer(tower_sessions::MemoryStore::default(), state.config());
        let app = routes::app(state.clone(), session_layer);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A plain HTTP client that keeps cookies.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder().cookie_store(true).build().unwrap()
    }
}
