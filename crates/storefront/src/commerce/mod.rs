//! Commerce backend REST client.
//!
//! Uses `reqwest` against the remote commerce API. Catalog reads are cached
//! with `moka` (5-minute TTL); cart and order endpoints are never cached.
//! Read queries get a single retry on transport errors; mutations are
//! attempted exactly once.

mod cache;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use velora_core::{CartItemId, ProductId};

use crate::config::CommerceApiConfig;
use cache::CacheValue;
use types::{
    AddCartItemRequest, CreateOrderRequest, CreatedOrder, OrderPage, Product, ProductPage,
    ProductResponse, RemoteCart, UpdateCartItemRequest,
};

/// Single retry on read queries; mirrors the storefront's low-count retry
/// policy for initial fetches.
const READ_RETRIES: u32 = 1;

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, thiserror::Error)]
pub enum CommerceError {
    /// HTTP request failed (transport-level).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the session token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The backend returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl CommerceError {
    /// Whether a read query may be retried after this error.
    ///
    /// Only transport-level failures are retried; the backend's own error
    /// responses are final.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Client for the commerce backend REST API.
///
/// Cheaply cloneable; all clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    #[must_use]
    pub fn new(config: &CommerceApiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Issue one request and decode the JSON response.
    async fn request_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
        let response = request.send().await?;
        let status = response.status();
        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(
                body.chars().take(200).collect::<String>(),
            ));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CommerceError::Unauthorized);
        }
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "commerce API returned non-success status"
            );
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "failed to parse commerce API response"
                );
                Err(CommerceError::Parse(e))
            }
        }
    }

    /// GET with a single retry on transport errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, CommerceError> {
        let mut attempt = 0;
        loop {
            let mut request = self.inner.client.get(self.url(path));
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }

            match self.request_json(request).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < READ_RETRIES && e.is_retryable() => {
                    attempt += 1;
                    debug!(error = %e, attempt, path, "retrying read query");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send a JSON body with the given method; no retry.
    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<T, CommerceError> {
        let mut request = self
            .inner
            .client
            .request(method, self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.request_json(request).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product, CommerceError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response: ProductResponse = self
            .get_json(&format!("/products/{product_id}"), None)
            .await?;

        let product = response
            .product
            .ok_or_else(|| CommerceError::NotFound(format!("Product not found: {product_id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a paginated list of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, page: u32, limit: u32) -> Result<ProductPage, CommerceError> {
        let cache_key = format!("products:{page}:{limit}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(*products);
        }

        let products: ProductPage = self
            .get_json(&format!("/products?page={page}&limit={limit}"), None)
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Box::new(products.clone())))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get the authenticated user's server-persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &str) -> Result<RemoteCart, CommerceError> {
        self.get_json("/cart", Some(token)).await
    }

    /// Add an item to the server-persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, item))]
    pub async fn add_cart_item(
        &self,
        token: &str,
        item: &AddCartItemRequest,
    ) -> Result<RemoteCart, CommerceError> {
        self.send_json(reqwest::Method::POST, "/cart/items", token, Some(item))
            .await
    }

    /// Set the quantity of a cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<RemoteCart, CommerceError> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("/cart/items/{item_id}"),
            token,
            Some(&UpdateCartItemRequest { quantity }),
        )
        .await
    }

    /// Remove an item from the server-persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
    ) -> Result<RemoteCart, CommerceError> {
        self.send_json::<(), _>(
            reqwest::Method::DELETE,
            &format!("/cart/items/{item_id}"),
            token,
            None,
        )
        .await
    }

    /// Clear the server-persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &str) -> Result<RemoteCart, CommerceError> {
        self.send_json::<(), _>(reqwest::Method::DELETE, "/cart", token, None)
            .await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Create an order from a cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, order))]
    pub async fn create_order(
        &self,
        token: &str,
        order: &CreateOrderRequest,
    ) -> Result<CreatedOrder, CommerceError> {
        self.send_json(reqwest::Method::POST, "/orders", token, Some(order))
            .await
    }

    /// Get a page of the authenticated user's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_orders(
        &self,
        token: &str,
        page: u32,
        limit: u32,
        sort_by: &str,
    ) -> Result<OrderPage, CommerceError> {
        self.get_json(
            &format!("/orders?page={page}&limit={limit}&sortBy={sort_by}"),
            Some(token),
        )
        .await
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, product_id: &ProductId) {
        let cache_key = format!("product:{product_id}");
        self.inner.cache.invalidate(&cache_key).await;
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = CommerceError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(!CommerceError::NotFound("x".to_string()).is_retryable());
        assert!(!CommerceError::Unauthorized.is_retryable());
        assert!(
            !CommerceError::Api {
                status: 500,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_client_url_joins_path() {
        let client = CommerceClient::new(&crate::config::CommerceApiConfig {
            base_url: "http://localhost:8000/v1".to_string(),
        });
        assert_eq!(client.url("/cart"), "http://localhost:8000/v1/cart");
    }
}
