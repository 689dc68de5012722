//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use velora_core::{CurrencyCode, Price, ProductId};

use crate::commerce::CommerceError;
use crate::commerce::types::Product;
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Product card display data for listing grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub price: String,
    pub image: Option<String>,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub stock: u32,
    pub in_stock: bool,
    pub rating_rate: String,
    pub rating_count: u32,
}

fn format_price(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            brand: product.brand.clone(),
            price: format_price(product.price),
            image: product.images.first().map(String::from),
        }
    }
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price: format_price(product.price),
            images: product.images.urls().iter().map(ToString::to_string).collect(),
            colors: product.colors.clone(),
            sizes: product.sizes.clone(),
            stock: product.quantity,
            in_stock: product.quantity > 0,
            rating_rate: format!("{:.1}", product.rating.rate),
            rating_count: product.rating.count,
        }
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_more_pages: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
}

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub message: String,
}

/// Number of products per listing page.
const PAGE_SIZE: u32 = 12;

/// Display product listing page.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let current_page = query.page.unwrap_or(1).max(1);

    let page = state.commerce().get_products(current_page, PAGE_SIZE).await?;

    Ok(ProductsIndexTemplate {
        products: page.products.iter().map(ProductCardView::from).collect(),
        current_page: page.page,
        total_pages: page.total_pages,
        has_more_pages: page.page < page.total_pages,
    })
}

/// Display product detail page.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state.commerce().get_product(&ProductId::new(id)).await {
        Ok(product) => Ok(ProductShowTemplate {
            product: ProductDetailView::from(&product),
        }
        .into_response()),
        Err(CommerceError::NotFound(_)) => Ok((
            StatusCode::NOT_FOUND,
            NotFoundTemplate {
                message: "We couldn't find that product.".to_string(),
            },
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}
