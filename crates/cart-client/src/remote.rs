//! The signed-in cart, kept by the storefront API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use brana_core::{CartLineItem, Email, ProductId, UserId, UserRole};

use crate::error::ClientError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cart operations against the server-side cart of the signed-in user.
///
/// Mutations return the cart as the server sees it afterwards, where the
/// route reports it.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Current items.
    async fn fetch(&self) -> Result<Vec<CartLineItem>, ClientError>;

    /// Add `quantity` of a product. The server snapshots name and price.
    async fn add(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLineItem>, ClientError>;

    /// Set a line's quantity; zero or less removes it.
    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Vec<CartLineItem>, ClientError>;

    /// Remove a line.
    async fn remove(&self, product_id: &ProductId) -> Result<Vec<CartLineItem>, ClientError>;

    /// Remove every line.
    async fn clear(&self) -> Result<(), ClientError>;

    /// Add `items` to the server cart, summing quantities per product.
    async fn merge(&self, items: &[CartLineItem]) -> Result<(), ClientError>;

    /// Overwrite the server cart with `items`.
    async fn sync(&self, items: &[CartLineItem]) -> Result<(), ClientError>;
}

/// The account a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Email,
    pub role: UserRole,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: SessionUser,
}

#[derive(Deserialize)]
struct ItemsEnvelope {
    items: Vec<CartLineItem>,
}

#[derive(Deserialize)]
struct CartEnvelope {
    cart: ItemsEnvelope,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`RemoteCart`] over HTTP.
///
/// Holds the session cookie, so the same client must be used for
/// [`HttpRemoteCart::login`] and the cart calls that follow.
#[derive(Debug, Clone)]
pub struct HttpRemoteCart {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRemoteCart {
    /// Create a client for the storefront at `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request and decode a success body as `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| body.chars().take(200).collect(), |e| e.message);
            tracing::debug!(status = %status, %message, "Storefront rejected request");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ClientError> {
        self.send(self.client.post(self.url(path)?).json(&body))
            .await
    }

    /// Create an account. The session is logged in afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 409 if the email is taken.
    pub async fn register(&self, email: &str, password: &str) -> Result<SessionUser, ClientError> {
        let envelope: UserEnvelope = self
            .post(
                "/api/auth/register",
                json!({ "email": email, "password": password }),
            )
            .await?;
        Ok(envelope.user)
    }

    /// Log in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` for wrong credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ClientError> {
        let envelope: UserEnvelope = self
            .post(
                "/api/auth/login",
                json!({ "email": email, "password": password }),
            )
            .await?;
        Ok(envelope.user)
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post("/api/auth/logout", json!({})).await?;
        Ok(())
    }

    /// The session's account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if nobody is logged in.
    pub async fn me(&self) -> Result<SessionUser, ClientError> {
        let envelope: UserEnvelope = self
            .send(self.client.get(self.url("/api/auth/me")?))
            .await?;
        Ok(envelope.user)
    }
}

#[async_trait]
impl RemoteCart for HttpRemoteCart {
    async fn fetch(&self) -> Result<Vec<CartLineItem>, ClientError> {
        let envelope: ItemsEnvelope = self
            .send(self.client.get(self.url("/api/cart/get")?))
            .await?;
        Ok(envelope.items)
    }

    async fn add(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLineItem>, ClientError> {
        let envelope: CartEnvelope = self
            .post(
                "/api/cart/add",
                json!({ "productId": product_id, "quantity": quantity }),
            )
            .await?;
        Ok(envelope.cart.items)
    }

    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Vec<CartLineItem>, ClientError> {
        let envelope: CartEnvelope = self
            .post(
                "/api/cart/update",
                json!({ "productId": product_id, "quantity": quantity }),
            )
            .await?;
        Ok(envelope.cart.items)
    }

    async fn remove(&self, product_id: &ProductId) -> Result<Vec<CartLineItem>, ClientError> {
        let envelope: ItemsEnvelope = self
            .post("/api/cart/remove", json!({ "productId": product_id }))
            .await?;
        Ok(envelope.items)
    }

    async fn clear(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post("/api/cart/clear", json!({})).await?;
        Ok(())
    }

    async fn merge(&self, items: &[CartLineItem]) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .post("/api/cart/merge", json!({ "items": items }))
            .await?;
        Ok(())
    }

    async fn sync(&self, items: &[CartLineItem]) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .post("/api/cart/sync", json!({ "items": items }))
            .await?;
        Ok(())
    }
}
