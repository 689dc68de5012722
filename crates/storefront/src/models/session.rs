//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use velora_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User id issued by the auth provider.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name, if the provider has one.
    pub name: Option<String>,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the auth provider's bearer token.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Key for the session cart state.
    pub const CART: &str = "cart";
}
