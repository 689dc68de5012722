//! Authentication extractors and session helpers.
//!
//! `RequireAuth` is the request-time guard for the cart, checkout, and order
//! routes: it validates the session's bearer token against the external auth
//! provider's session endpoint and redirects unauthenticated visitors to the
//! sign-in page.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// Consults the external session endpoint on every request; an expired or
/// revoked token redirects to the sign-in page even if the session still
/// holds a stale user record.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for `RequireAuth`: redirect to the sign-in page.
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/auth/sign-in").into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(AuthRedirect)?;

        let token: String = session
            .get(session_keys::AUTH_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRedirect)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRedirect)?;

        // Request-time check against the auth provider; a provider outage is
        // treated the same as a missing session
        match state.auth().get_session(&token).await {
            Ok(Some(_)) => Ok(Self(user)),
            Ok(None) => Err(AuthRedirect),
            Err(e) => {
                tracing::warn!("Session validation failed: {e}");
                Err(AuthRedirect)
            }
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request and does not call
/// the auth provider; it only reads the session-stored user record.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(user): OptionalAuth,
/// ) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.email),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Get the auth provider's bearer token from the session, if signed in.
pub async fn auth_token(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::AUTH_TOKEN)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in user and token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
    token: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await?;
    session.insert(session_keys::AUTH_TOKEN, token).await
}

/// Clear the signed-in user and token from the session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.remove::<String>(session_keys::AUTH_TOKEN).await?;
    Ok(())
}
