//! Authentication route handlers.
//!
//! Sign-in, sign-up, and sign-out against the external auth provider; the
//! storefront never issues tokens itself. Signed-in visitors are redirected
//! away from the auth pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use velora_core::Email;

use crate::cart::CartState;
use crate::cart::sync::CartSync;
use crate::filters;
use crate::middleware::{OptionalAuth, auth_token, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::routes::cart::save_cart;
use crate::services::auth::AuthError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "email_taken" => "An account with this email already exists.",
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Password must be at least 8 characters.",
        "session" => "Session expired, please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "account_created" => "Account created. Please sign in.",
        _ => "Done.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub error: Option<&'static str>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the sign-in page. Signed-in visitors are sent home.
pub async fn sign_in_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    SignInTemplate {
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
    }
    .into_response()
}

/// Handle sign-in form submission.
///
/// On success the provider's token and user are stored in the session and
/// the server cart is reconciled into the session cart.
#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Response {
    let auth_session = match state.auth().sign_in(&form.email, &form.password).await {
        Ok(auth_session) => auth_session,
        Err(AuthError::InvalidCredentials) => {
            return Redirect::to("/auth/sign-in?error=credentials").into_response();
        }
        Err(e) => {
            tracing::warn!("Sign in failed: {e}");
            return Redirect::to("/auth/sign-in?error=failed").into_response();
        }
    };

    let email = match Email::parse(&auth_session.user.email) {
        Ok(email) => email,
        Err(e) => {
            tracing::error!("Auth provider returned malformed email: {e}");
            return Redirect::to("/auth/sign-in?error=failed").into_response();
        }
    };

    let user = CurrentUser {
        id: auth_session.user.id,
        email,
        name: auth_session.user.name,
    };

    if let Err(e) = set_current_user(&session, &user, &auth_session.token).await {
        tracing::error!("Failed to set session: {e}");
        return Redirect::to("/auth/sign-in?error=session").into_response();
    }

    // Initial reconciliation: pull the server-persisted cart into the session
    match CartSync::new(state.commerce(), &auth_session.token)
        .fetch()
        .await
    {
        Ok(cart) => {
            if let Err(e) = save_cart(&session, &cart).await {
                tracing::error!("Failed to save cart to session: {e}");
            }
        }
        Err(e) => tracing::warn!("Failed to fetch server cart after sign-in: {e}"),
    }

    Redirect::to("/").into_response()
}

/// Display the sign-up page. Signed-in visitors are sent home.
pub async fn sign_up_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    SignUpTemplate {
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// Handle sign-up form submission.
#[instrument(skip_all)]
pub async fn sign_up(State(state): State<AppState>, Form(form): Form<SignUpForm>) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/sign-up?error=password_mismatch").into_response();
    }

    if form.password.len() < 8 {
        return Redirect::to("/auth/sign-up?error=password_too_short").into_response();
    }

    match state
        .auth()
        .sign_up(&form.name, &form.email, &form.password)
        .await
    {
        Ok(_) => Redirect::to("/auth/sign-in?success=account_created").into_response(),
        Err(AuthError::EmailTaken) => {
            Redirect::to("/auth/sign-up?error=email_taken").into_response()
        }
        Err(e) => {
            tracing::warn!("Sign up failed: {e}");
            Redirect::to("/auth/sign-up?error=failed").into_response()
        }
    }
}

/// Handle sign-out.
///
/// Invalidates the provider token, then clears the session user and the
/// session cart.
#[instrument(skip_all)]
pub async fn sign_out(State(state): State<AppState>, session: Session) -> Response {
    if let Some(token) = auth_token(&session).await
        && let Err(e) = state.auth().sign_out(&token).await
    {
        tracing::warn!("Sign out against auth provider failed: {e}");
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session user: {e}");
    }
    if let Err(e) = session.remove::<CartState>(session_keys::CART).await {
        tracing::error!("Failed to clear session cart: {e}");
    }

    Redirect::to("/").into_response()
}
