//! Checkout route handlers.
//!
//! Checkout consumes the session cart: it posts an order built from the cart
//! snapshot and clears the cart on completion. Payment is simulated - the
//! payment status is selected on the form (development/testing affordance)
//! rather than derived from a gateway.
//!
//! Requires authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use velora_core::{Email, PaymentStatus};

use crate::cart::CartState;
use crate::cart::sync::CartSync;
use crate::commerce::types::{
    CreateOrderRequest, OrderContact, OrderItemInput, ShippingAddress,
};
use crate::filters;
use crate::middleware::{RequireAuth, auth_token};
use crate::models::CurrentUser;
use crate::routes::cart::{CartView, load_cart, save_cart};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub cvv: String,
    /// Simulated payment outcome: paid | pending | failed.
    #[serde(default)]
    pub payment_status: Option<String>,
}

/// Per-field validation errors, rendered inline under each field.
#[derive(Debug, Clone, Default)]
pub struct CheckoutErrors {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub card_number: Option<String>,
    pub expiry_date: Option<String>,
    pub cvv: Option<String>,
}

impl CheckoutErrors {
    /// True when no field has an error.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.card_number.is_none()
            && self.expiry_date.is_none()
            && self.cvv.is_none()
    }
}

/// Validate the checkout form.
///
/// Validation is presence-level plus a structural email check; a blocked
/// submission re-renders the form with errors inline.
fn validate(form: &CheckoutForm) -> (CheckoutErrors, Option<Email>) {
    let mut errors = CheckoutErrors::default();

    fn required(value: &str, label: &str) -> Option<String> {
        if value.trim().is_empty() {
            Some(format!("{label} is required"))
        } else {
            None
        }
    }

    errors.full_name = required(&form.full_name, "Full name");
    errors.phone = required(&form.phone, "Phone number");
    errors.address = required(&form.address, "Address");
    errors.city = required(&form.city, "City");
    errors.state = required(&form.state, "State");
    errors.zip_code = required(&form.zip_code, "Zip code");
    errors.card_number = required(&form.card_number, "Card number");
    errors.expiry_date = required(&form.expiry_date, "Expiry date");
    errors.cvv = required(&form.cvv, "CVV");

    let email = if form.email.trim().is_empty() {
        errors.email = Some("Email is required".to_string());
        None
    } else {
        match Email::parse(form.email.trim()) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.email = Some("Please enter a valid email address".to_string());
                None
            }
        }
    };

    (errors, email)
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub cart_empty: bool,
    pub form: CheckoutForm,
    pub errors: CheckoutErrors,
    pub error: Option<String>,
}

fn prefilled_form(user: &CurrentUser) -> CheckoutForm {
    CheckoutForm {
        full_name: user.name.clone().unwrap_or_default(),
        email: user.email.to_string(),
        ..CheckoutForm::default()
    }
}

/// Display the checkout page.
///
/// Name and email are pre-filled from the authenticated session. An empty
/// cart renders the dedicated empty state instead of the form.
#[instrument(skip_all)]
pub async fn show(
    State(_state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let cart = load_cart(&session).await;

    CheckoutTemplate {
        cart_empty: cart.is_empty(),
        cart: CartView::from(&cart),
        form: prefilled_form(&user),
        errors: CheckoutErrors::default(),
        error: None,
    }
}

/// Handle checkout submission.
///
/// Creates an order from the session cart snapshot. On completion the local
/// cart is cleared and the server cart is cleared as well; the user is
/// redirected to the order confirmation page.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let mut cart = load_cart(&session).await;

    if cart.is_empty() {
        return CheckoutTemplate {
            cart_empty: true,
            cart: CartView::from(&cart),
            form,
            errors: CheckoutErrors::default(),
            error: Some("Your cart is empty. Please add items before checking out.".to_string()),
        }
        .into_response();
    }

    let (errors, email) = validate(&form);
    let Some(email) = email else {
        return render_with_errors(&cart, form, errors, None);
    };
    if !errors.is_empty() {
        return render_with_errors(&cart, form, errors, None);
    }

    let payment_status = form
        .payment_status
        .as_deref()
        .and_then(|s| s.parse::<PaymentStatus>().ok())
        .unwrap_or_default();

    let request = CreateOrderRequest {
        contact: OrderContact {
            name: form.full_name.trim().to_string(),
            email,
            phone: form.phone.trim().to_string(),
        },
        items: cart
            .lines()
            .iter()
            .map(|line| OrderItemInput {
                product: line.key.product_id.clone(),
                quantity: line.quantity,
                price: line.unit_price,
                color: line.key.color.clone(),
                size: line.key.size.clone(),
            })
            .collect(),
        shipping_address: ShippingAddress {
            street: form.address.trim().to_string(),
            city: form.city.trim().to_string(),
            state: form.state.trim().to_string(),
            zip_code: form.zip_code.trim().to_string(),
            country: "us".to_string(),
        },
        payment_method: "credit_card".to_string(),
        payment_status,
    };

    let Some(token) = auth_token(&session).await else {
        return Redirect::to("/auth/sign-in").into_response();
    };

    match state.commerce().create_order(&token, &request).await {
        Ok(created) if payment_status.completes_checkout() => {
            // Checkout consumes the cart: clear locally, then remotely
            cart.clear();
            if let Err(e) = save_cart(&session, &cart).await {
                tracing::error!("Failed to save cleared cart to session: {e}");
            }
            if let Err(e) = CartSync::new(state.commerce(), &token).clear().await {
                tracing::warn!("Failed to clear server cart after checkout: {e}");
            }

            Redirect::to(&format!("/orders/confirmation/{}", created.order_number))
                .into_response()
        }
        Ok(_) => {
            // Simulated failed payment: the order was recorded but checkout
            // does not complete
            render_with_errors(
                &cart,
                form,
                CheckoutErrors::default(),
                Some("Payment failed. Please check your payment method.".to_string()),
            )
        }
        Err(e) => {
            tracing::error!("Failed to create order: {e}");
            render_with_errors(
                &cart,
                form,
                CheckoutErrors::default(),
                Some("Payment failed. Please check your payment method.".to_string()),
            )
        }
    }
}

fn render_with_errors(
    cart: &CartState,
    form: CheckoutForm,
    errors: CheckoutErrors,
    error: Option<String>,
) -> Response {
    CheckoutTemplate {
        cart_empty: cart.is_empty(),
        cart: CartView::from(cart),
        form,
        errors,
        error,
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            full_name: "Dana Example".to_string(),
            email: "dana@example.com".to_string(),
            phone: "+15550100200".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            card_number: "4242424242424242".to_string(),
            expiry_date: "12/29".to_string(),
            cvv: "123".to_string(),
            payment_status: Some("paid".to_string()),
        }
    }

    #[test]
    fn test_validate_accepts_filled_form() {
        let (errors, email) = validate(&filled_form());
        assert!(errors.is_empty());
        assert_eq!(email.unwrap().as_str(), "dana@example.com");
    }

    #[test]
    fn test_validate_requires_every_field() {
        let (errors, email) = validate(&CheckoutForm::default());
        assert!(email.is_none());
        assert!(errors.full_name.is_some());
        assert!(errors.email.is_some());
        assert!(errors.phone.is_some());
        assert!(errors.address.is_some());
        assert!(errors.city.is_some());
        assert!(errors.state.is_some());
        assert!(errors.zip_code.is_some());
        assert!(errors.card_number.is_some());
        assert!(errors.expiry_date.is_some());
        assert!(errors.cvv.is_some());
    }

    #[test]
    fn test_validate_rejects_malformed_email() {
        let form = CheckoutForm {
            email: "not-an-email".to_string(),
            ..filled_form()
        };
        let (errors, email) = validate(&form);
        assert!(email.is_none());
        assert_eq!(
            errors.email.as_deref(),
            Some("Please enter a valid email address")
        );
    }

    #[test]
    fn test_validate_whitespace_is_not_presence() {
        let form = CheckoutForm {
            city: "   ".to_string(),
            ..filled_form()
        };
        let (errors, _) = validate(&form);
        assert!(errors.city.is_some());
    }
}
