//! Wire types for the commerce backend REST API.
//!
//! Field names mirror the backend's JSON (camelCase, Mongo-style `_id` on
//! catalog documents).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use velora_core::{CartItemId, Email, OrderNumber, OrderStatus, PaymentStatus, ProductId};

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub images: ImageSet,
    /// Units in stock.
    pub quantity: u32,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate product rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: Decimal,
    pub count: u32,
}

/// Product images: the backend returns either a single URL or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSet {
    Many(Vec<String>),
    One(String),
}

impl ImageSet {
    /// The primary image, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Many(urls) => urls.first().map(String::as_str),
            Self::One(url) => Some(url.as_str()),
        }
    }

    /// All image URLs in order.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Self::Many(urls) => urls.iter().map(String::as_str).collect(),
            Self::One(url) => vec![url.as_str()],
        }
    }
}

impl Default for ImageSet {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Envelope for single-product responses: `{ message, product }`.
#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub product: Option<Product>,
}

/// A page of catalog products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

// =============================================================================
// Cart
// =============================================================================

/// The server-persisted cart, returned in full by every cart endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    pub total_items: u32,
    pub total_amount: Decimal,
}

/// One item in the server-persisted cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCartItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    pub product: RemoteCartProduct,
    /// Unit price captured when the item was added.
    pub price: Decimal,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

/// Product summary embedded in cart items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCartProduct {
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub images: ImageSet,
}

/// Payload for `POST /cart/items`.
#[derive(Debug, Clone, Serialize)]
pub struct AddCartItemRequest {
    pub product: ProductId,
    pub quantity: u32,
    pub price: Decimal,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Payload for `PATCH /cart/items/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

// =============================================================================
// Orders
// =============================================================================

/// Contact details attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderContact {
    pub name: String,
    pub email: Email,
    pub phone: String,
}

/// Shipping address attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// One line of an order, as submitted.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemInput {
    pub product: ProductId,
    pub quantity: u32,
    pub price: Decimal,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Payload for `POST /orders`: an order built from the local cart snapshot.
///
/// `payment_status` is client-selected (development/testing affordance); the
/// backend records it as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub contact: OrderContact,
    pub items: Vec<OrderItemInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
}

/// Response for `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_number: OrderNumber,
    #[serde(default)]
    pub message: Option<String>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: RemoteCartProduct,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// A placed order as returned by the order history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub contact: OrderContact,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

/// A page of order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_backend_shape() {
        let json = r#"{
            "_id": "68375b8b267d791401c6a084",
            "title": "Classic Tee",
            "brand": "Velora",
            "price": 24.99,
            "description": "A classic tee.",
            "category": "shirts",
            "images": ["https://cdn.example.com/tee.jpg"],
            "quantity": 12,
            "colors": ["red", "blue"],
            "sizes": ["s", "m", "l"],
            "rating": { "rate": 4.5, "count": 19 },
            "createdAt": "2026-01-04T10:00:00Z",
            "updatedAt": "2026-01-05T10:00:00Z"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "68375b8b267d791401c6a084");
        assert_eq!(product.images.first(), Some("https://cdn.example.com/tee.jpg"));
        assert_eq!(product.colors.len(), 2);
        assert_eq!(product.quantity, 12);
    }

    #[test]
    fn test_image_set_single_string() {
        let json = r#""https://cdn.example.com/one.jpg""#;
        let images: ImageSet = serde_json::from_str(json).unwrap();
        assert_eq!(images.first(), Some("https://cdn.example.com/one.jpg"));
        assert_eq!(images.urls().len(), 1);
    }

    #[test]
    fn test_image_set_empty_list() {
        let images: ImageSet = serde_json::from_str("[]").unwrap();
        assert_eq!(images.first(), None);
    }

    #[test]
    fn test_remote_cart_deserializes() {
        let json = r#"{
            "items": [{
                "_id": "item-1",
                "product": {
                    "id": "prod-1",
                    "title": "Classic Tee",
                    "brand": "Velora",
                    "category": "shirts",
                    "images": ["https://cdn.example.com/tee.jpg"]
                },
                "price": 24.99,
                "color": "red",
                "size": "m",
                "quantity": 2
            }],
            "totalItems": 2,
            "totalAmount": 49.98
        }"#;

        let cart: RemoteCart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_items, 2);
        let item = cart.items.first().unwrap();
        assert_eq!(item.id.as_str(), "item-1");
        assert_eq!(item.color.as_deref(), Some("red"));
    }

    #[test]
    fn test_remote_cart_empty() {
        let json = r#"{ "items": [], "totalItems": 0, "totalAmount": 0 }"#;
        let cart: RemoteCart = serde_json::from_str(json).unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_create_order_request_serializes_camel_case() {
        let request = CreateOrderRequest {
            contact: OrderContact {
                name: "Dana Example".to_string(),
                email: Email::parse("dana@example.com").unwrap(),
                phone: "+15550100200".to_string(),
            },
            items: vec![OrderItemInput {
                product: ProductId::new("prod-1"),
                quantity: 1,
                price: Decimal::new(2499, 2),
                color: Some("red".to_string()),
                size: None,
            }],
            shipping_address: ShippingAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip_code: "62701".to_string(),
                country: "us".to_string(),
            },
            payment_method: "credit_card".to_string(),
            payment_status: PaymentStatus::Paid,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["paymentStatus"], "paid");
        assert_eq!(value["shippingAddress"]["zipCode"], "62701");
        assert_eq!(value["items"][0]["product"], "prod-1");
    }

    #[test]
    fn test_created_order_deserializes() {
        let json = r#"{ "orderNumber": "ORD-2026-0042", "message": "Order created" }"#;
        let created: CreatedOrder = serde_json::from_str(json).unwrap();
        assert_eq!(created.order_number.as_str(), "ORD-2026-0042");
    }

    #[test]
    fn test_order_page_deserializes() {
        let json = r#"{
            "orders": [{
                "orderNumber": "ORD-2026-0042",
                "status": "confirmed",
                "paymentStatus": "paid",
                "items": [],
                "totalAmount": 49.98,
                "contact": { "name": "Dana", "email": "dana@example.com", "phone": "+15550100200" },
                "shippingAddress": {
                    "street": "1 Main St", "city": "Springfield", "state": "IL",
                    "zipCode": "62701", "country": "us"
                },
                "createdAt": "2026-02-01T09:30:00Z"
            }],
            "page": 1,
            "totalPages": 1,
            "total": 1
        }"#;

        let page: OrderPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.orders.len(), 1);
        let order = page.orders.first().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.payment_status.completes_checkout());
    }
}
