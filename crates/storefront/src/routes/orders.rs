//! Order history route handlers.
//!
//! Requires authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use velora_core::{CurrencyCode, Price};

use crate::commerce::types::Order;
use crate::filters;
use crate::middleware::{RequireAuth, auth_token};
use crate::state::AppState;

/// Orders per page.
const PAGE_SIZE: u32 = 10;

/// Sort order for the history listing: newest first.
const SORT_BY: &str = "createdAt:desc";

/// Order line display data.
#[derive(Clone)]
pub struct OrderItemView {
    pub title: String,
    pub brand: String,
    pub quantity: u32,
    pub price: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub image: Option<String>,
}

/// Order display data.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    /// RFC 3339; formatted with the `long_date` filter in templates.
    pub placed_at: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub total: String,
    pub items: Vec<OrderItemView>,
}

fn format_price(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.order_number.to_string(),
            placed_at: order.created_at.to_rfc3339(),
            status: order.status.label(),
            payment_status: order.payment_status.label(),
            total: format_price(order.total_amount),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    title: item.product.title.clone(),
                    brand: item.product.brand.clone(),
                    quantity: item.quantity,
                    price: format_price(item.price),
                    color: item.color.clone(),
                    size: item.size.clone(),
                    image: item.product.images.first().map(String::from),
                })
                .collect(),
        }
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_page: u32,
    pub next_page: u32,
    pub error: Option<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/confirmation.html")]
pub struct OrderConfirmationTemplate {
    pub order_number: String,
}

/// Display the order history page.
///
/// A backend failure renders the dedicated error state; an empty history
/// renders the empty state.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let current_page = query.page.unwrap_or(1).max(1);

    let Some(token) = auth_token(&session).await else {
        return OrdersIndexTemplate {
            orders: Vec::new(),
            current_page: 1,
            total_pages: 1,
            has_prev: false,
            has_next: false,
            prev_page: 1,
            next_page: 1,
            error: Some("Please sign in to see your orders.".to_string()),
        };
    };

    match state
        .commerce()
        .get_orders(&token, current_page, PAGE_SIZE, SORT_BY)
        .await
    {
        Ok(page) => OrdersIndexTemplate {
            orders: page.orders.iter().map(OrderView::from).collect(),
            current_page: page.page,
            total_pages: page.total_pages,
            has_prev: page.page > 1,
            has_next: page.page < page.total_pages,
            prev_page: page.page.saturating_sub(1).max(1),
            next_page: page.page + 1,
            error: None,
        },
        Err(e) => {
            tracing::warn!("Failed to load orders: {e}");
            OrdersIndexTemplate {
                orders: Vec::new(),
                current_page,
                total_pages: 1,
                has_prev: false,
                has_next: false,
                prev_page: 1,
                next_page: 1,
                error: Some("Failed to load your orders. Please try again.".to_string()),
            }
        }
    }
}

/// Display the order confirmation page.
#[instrument(skip_all, fields(order_number = %order_number))]
pub async fn confirmation(
    RequireAuth(_user): RequireAuth,
    Path(order_number): Path<String>,
) -> impl IntoResponse {
    OrderConfirmationTemplate { order_number }
}
