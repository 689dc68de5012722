//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; for signed-in users every
//! network-backed mutation is reconciled against the server-persisted cart.
//!
//! The cart page is behind the auth guard; the fragment endpoints (add,
//! update, remove, clear, count) also serve anonymous visitors, whose carts
//! are session-only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use velora_core::{CurrencyCode, Price, ProductId};

use crate::cart::sync::CartSync;
use crate::cart::{CartState, LineKey};
use crate::filters;
use crate::middleware::{RequireAuth, auth_token};
use crate::models::session_keys;
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    /// Form values identifying the line (empty string when unselected).
    pub product_id: String,
    pub color: String,
    pub size: String,
    pub color_label: Option<String>,
    pub size_label: Option<String>,
    pub title: String,
    pub brand: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal: format_price(Decimal::ZERO),
        }
    }
}

fn format_price(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

impl From<&CartState> for CartView {
    fn from(cart: &CartState) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView {
                    product_id: line.key.product_id.to_string(),
                    color: line.key.color.clone().unwrap_or_default(),
                    size: line.key.size.clone().unwrap_or_default(),
                    color_label: line.key.color.clone(),
                    size_label: line.key.size.clone(),
                    title: line.title.clone(),
                    brand: line.brand.clone(),
                    quantity: line.quantity,
                    unit_price: format_price(line.unit_price),
                    line_total: format_price(line.line_total()),
                    image: line.image.clone(),
                })
                .collect(),
            item_count: cart.total_items(),
            subtotal: format_price(cart.total_amount()),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, defaulting to an empty cart.
pub async fn load_cart(session: &Session) -> CartState {
    session
        .get::<CartState>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
pub async fn save_cart(
    session: &Session,
    cart: &CartState,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<u32>,
}

/// Update quantity form data; identifies the line by its composite key.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    pub color: Option<String>,
    pub size: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
///
/// For signed-in users the server cart is fetched first and the session cart
/// is replaced with the server-canonical state.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_user): RequireAuth,
) -> impl IntoResponse {
    let mut cart = load_cart(&session).await;
    let mut error = None;

    if let Some(token) = auth_token(&session).await {
        match CartSync::new(state.commerce(), &token).fetch().await {
            Ok(reconciled) => {
                cart = reconciled;
                if let Err(e) = save_cart(&session, &cart).await {
                    tracing::error!("Failed to save cart to session: {e}");
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch server cart: {e}");
                error = Some("Could not load your saved cart. Please try again.".to_string());
            }
        }
    }

    CartShowTemplate {
        cart: CartView::from(&cart),
        error,
    }
}

/// Add item to cart (HTMX).
///
/// The local add is optimistic and always applies. For signed-in users the
/// added quantity is also pushed to the server and the session cart is
/// replaced with the response.
///
/// Returns the cart count badge with an HTMX trigger to update other
/// elements.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let product = match state.commerce().get_product(&product_id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::error!("Failed to load product for cart add: {e}");
            return (
                StatusCode::BAD_GATEWAY,
                Html("<span class=\"toast toast-error\">Error adding to cart</span>"),
            )
                .into_response();
        }
    };

    let quantity = form
        .quantity
        .unwrap_or(1)
        .clamp(1, product.quantity.max(1));

    let mut cart = load_cart(&session).await;
    cart.add(&product, form.color.clone(), form.size.clone(), quantity);

    if let Some(token) = auth_token(&session).await {
        let key = LineKey::new(product.id.clone(), form.color, form.size);
        match CartSync::new(state.commerce(), &token)
            .add(&key, product.price, quantity)
            .await
        {
            Ok(reconciled) => cart = reconciled,
            // The optimistic local add stays in place
            Err(e) => tracing::warn!("Failed to push cart add to server: {e}"),
        }
    }

    if let Err(e) = save_cart(&session, &cart).await {
        tracing::error!("Failed to save cart to session: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.total_items(),
        },
    )
        .into_response()
}

/// Update cart item quantity (HTMX).
///
/// For signed-in users the mutation is server-first: the session cart is
/// only updated after the server confirms, and a failure leaves local state
/// unchanged. Anonymous carts mutate in place.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let key = LineKey::new(ProductId::new(form.product_id), form.color, form.size);
    let mut cart = load_cart(&session).await;
    let mut error = None;

    match auth_token(&session).await {
        Some(token) => {
            let remote_id = cart.line(&key).and_then(|line| line.remote_id.clone());
            if let Some(item_id) = remote_id {
                let sync = CartSync::new(state.commerce(), &token);
                let result = if form.quantity <= 0 {
                    sync.remove(&item_id).await
                } else {
                    let quantity = u32::try_from(form.quantity).unwrap_or(u32::MAX);
                    sync.set_quantity(&item_id, quantity).await
                };
                match result {
                    Ok(reconciled) => cart = reconciled,
                    Err(e) => {
                        tracing::error!("Failed to update cart item: {e}");
                        error =
                            Some("Failed to update quantity. Please try again.".to_string());
                    }
                }
            } else {
                // Line not yet reconciled with the server; mutate locally
                cart.set_quantity(&key, form.quantity);
            }
        }
        None => cart.set_quantity(&key, form.quantity),
    }

    if error.is_none()
        && let Err(e) = save_cart(&session, &cart).await
    {
        tracing::error!("Failed to save cart to session: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
            error,
        },
    )
        .into_response()
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let key = LineKey::new(ProductId::new(form.product_id), form.color, form.size);
    let mut cart = load_cart(&session).await;
    let mut error = None;

    match auth_token(&session).await {
        Some(token) => {
            let remote_id = cart.line(&key).and_then(|line| line.remote_id.clone());
            if let Some(item_id) = remote_id {
                match CartSync::new(state.commerce(), &token).remove(&item_id).await {
                    Ok(reconciled) => cart = reconciled,
                    Err(e) => {
                        tracing::error!("Failed to remove cart item: {e}");
                        error = Some("Failed to remove item. Please try again.".to_string());
                    }
                }
            } else {
                cart.remove(&key);
            }
        }
        None => cart.remove(&key),
    }

    if error.is_none()
        && let Err(e) = save_cart(&session, &cart).await
    {
        tracing::error!("Failed to save cart to session: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
            error,
        },
    )
        .into_response()
}

/// Clear the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Response {
    let mut cart = load_cart(&session).await;
    let mut error = None;

    match auth_token(&session).await {
        Some(token) => match CartSync::new(state.commerce(), &token).clear().await {
            Ok(reconciled) => cart = reconciled,
            Err(e) => {
                tracing::error!("Failed to clear cart: {e}");
                error = Some("Failed to clear cart. Please try again.".to_string());
            }
        },
        None => cart.clear(),
    }

    if error.is_none()
        && let Err(e) = save_cart(&session, &cart).await
    {
        tracing::error!("Failed to save cart to session: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
            error,
        },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    CartCountTemplate {
        count: cart.total_items(),
    }
}
