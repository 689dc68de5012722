//! Session cart state.
//!
//! The cart lives in the visitor's session and is the single source of truth
//! for anonymous visitors. For authenticated users it acts as a cache of the
//! server-persisted cart and is overwritten with server-canonical state after
//! every reconciliation (see [`sync`]).
//!
//! Totals are derived: they are recomputed from the line list after every
//! local mutation and never mutated independently. The one exception is
//! [`CartState::replace_from_server`], which takes the server's totals
//! verbatim.

pub mod sync;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use velora_core::{CartItemId, ProductId};

use crate::commerce::types::{Product, RemoteCart};

/// Composite identity key for a cart line.
///
/// Two lines are the same entry if and only if product, color, and size all
/// match. Empty selections normalize to `None` so that "no color" compares
/// equal regardless of how the form encoded it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl LineKey {
    /// Build a key, normalizing empty color/size selections to `None`.
    #[must_use]
    pub fn new(product_id: ProductId, color: Option<String>, size: Option<String>) -> Self {
        Self {
            product_id,
            color: normalize_option(color),
            size: normalize_option(size),
        }
    }
}

fn normalize_option(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// One distinct (product, color, size) entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub key: LineKey,
    pub title: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
    pub brand: String,
    pub category: String,
    /// Always positive; a quantity of zero removes the line instead.
    pub quantity: u32,
    /// Server-side item id, present only after reconciliation.
    pub remote_id: Option<CartItemId>,
}

impl CartLine {
    /// Line subtotal (unit price x quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The cart: an ordered list of lines plus derived totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    lines: Vec<CartLine>,
    total_items: u32,
    total_amount: Decimal,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub const fn total_items(&self) -> u32 {
        self.total_items
    }

    /// Sum of unit price x quantity across all lines.
    #[must_use]
    pub const fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line with the given key.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    /// Add `quantity` units of a product with the chosen color/size.
    ///
    /// If a line with the same key already exists its quantity is
    /// incremented; otherwise a new line is appended. A quantity of zero is
    /// a no-op.
    pub fn add(
        &mut self,
        product: &Product,
        color: Option<String>,
        size: Option<String>,
        quantity: u32,
    ) {
        if quantity == 0 {
            return;
        }

        let key = LineKey::new(product.id.clone(), color, size);

        if let Some(line) = self.lines.iter_mut().find(|line| line.key == key) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                key,
                title: product.title.clone(),
                unit_price: product.price,
                image: product.images.first().map(String::from),
                brand: product.brand.clone(),
                category: product.category.clone(),
                quantity,
                remote_id: None,
            });
        }

        self.recompute_totals();
    }

    /// Remove the line with the given key. No-op if absent.
    pub fn remove(&mut self, key: &LineKey) {
        self.lines.retain(|line| &line.key != key);
        self.recompute_totals();
    }

    /// Set the quantity of the line with the given key.
    ///
    /// A quantity of zero or less removes the line (equivalent to
    /// [`Self::remove`]). No-op if the key is absent.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: i64) {
        if quantity <= 0 {
            self.remove(key);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| &line.key == key) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }

        self.recompute_totals();
    }

    /// Reset to the empty state.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute_totals();
    }

    /// Replace the entire cart with the server-canonical representation.
    ///
    /// Lines are rebuilt from the server's item list using the same key
    /// derivation as local adds; each line remembers its server item id for
    /// later mutations. Totals are taken from the server response verbatim;
    /// a divergence from the locally recomputed values is logged but not
    /// corrected.
    pub fn replace_from_server(&mut self, cart: &RemoteCart) {
        self.lines = cart
            .items
            .iter()
            .map(|item| CartLine {
                key: LineKey::new(
                    item.product.id.clone(),
                    item.color.clone(),
                    item.size.clone(),
                ),
                title: item.product.title.clone(),
                unit_price: item.price,
                image: item.product.images.first().map(String::from),
                brand: item.product.brand.clone(),
                category: item.product.category.clone(),
                quantity: item.quantity,
                remote_id: Some(item.id.clone()),
            })
            .collect();

        let (recomputed_items, recomputed_amount) = self.derived_totals();
        if recomputed_items != cart.total_items || recomputed_amount != cart.total_amount {
            tracing::warn!(
                server_items = cart.total_items,
                server_amount = %cart.total_amount,
                recomputed_items,
                recomputed_amount = %recomputed_amount,
                "server cart totals diverge from its line items"
            );
        }

        self.total_items = cart.total_items;
        self.total_amount = cart.total_amount;
    }

    fn derived_totals(&self) -> (u32, Decimal) {
        let items = self.lines.iter().map(|line| line.quantity).sum();
        let amount = self.lines.iter().map(CartLine::line_total).sum();
        (items, amount)
    }

    fn recompute_totals(&mut self) {
        let (items, amount) = self.derived_totals();
        self.total_items = items;
        self.total_amount = amount;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commerce::types::{ImageSet, Rating, RemoteCartItem, RemoteCartProduct};
    use chrono::Utc;

    fn product(id: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            brand: "Velora".to_string(),
            price: price.parse().unwrap(),
            description: String::new(),
            category: "shirts".to_string(),
            images: ImageSet::Many(vec![format!("https://cdn.example.com/{id}.jpg")]),
            quantity: 10,
            colors: vec!["red".to_string(), "blue".to_string()],
            sizes: vec!["s".to_string(), "m".to_string()],
            rating: Rating {
                rate: "4.5".parse().unwrap(),
                count: 3,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn key(id: &str, color: &str, size: &str) -> LineKey {
        LineKey::new(
            ProductId::new(id),
            Some(color.to_string()),
            Some(size.to_string()),
        )
    }

    fn assert_totals_consistent(cart: &CartState) {
        let expected_items: u32 = cart.lines().iter().map(|l| l.quantity).sum();
        let expected_amount: Decimal = cart.lines().iter().map(CartLine::line_total).sum();
        assert_eq!(cart.total_items(), expected_items);
        assert_eq!(cart.total_amount(), expected_amount);
    }

    #[test]
    fn test_add_same_key_merges_into_one_line() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");

        cart.add(&p, Some("red".into()), Some("m".into()), 2);
        cart.add(&p, Some("red".into()), Some("m".into()), 3);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_amount(), "50.00".parse::<Decimal>().unwrap());
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_add_distinct_colors_make_distinct_lines() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");

        cart.add(&p, Some("red".into()), Some("m".into()), 1);
        cart.add(&p, Some("blue".into()), Some("m".into()), 1);

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total_items(), 2);
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_totals_recomputed_after_every_mutation() {
        let mut cart = CartState::new();
        let a = product("a", "10.00");
        let b = product("b", "3.50");

        cart.add(&a, Some("red".into()), None, 2);
        assert_totals_consistent(&cart);

        cart.add(&b, None, Some("s".into()), 4);
        assert_totals_consistent(&cart);
        assert_eq!(cart.total_items(), 6);
        assert_eq!(cart.total_amount(), "34.00".parse::<Decimal>().unwrap());

        cart.set_quantity(&LineKey::new(ProductId::new("b"), None, Some("s".into())), 1);
        assert_totals_consistent(&cart);
        assert_eq!(cart.total_amount(), "23.50".parse::<Decimal>().unwrap());

        cart.remove(&LineKey::new(ProductId::new("a"), Some("red".into()), None));
        assert_totals_consistent(&cart);
        assert_eq!(cart.total_amount(), "3.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_set_quantity_sets_exactly_not_increments() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, Some("red".into()), Some("m".into()), 2);

        cart.set_quantity(&key("a", "red", "m"), 7);
        assert_eq!(cart.lines()[0].quantity, 7);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, Some("red".into()), Some("m".into()), 2);

        cart.set_quantity(&key("a", "red", "m"), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_set_quantity_negative_removes() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, Some("red".into()), Some("m".into()), 2);

        cart.set_quantity(&key("a", "red", "m"), -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, Some("red".into()), Some("m".into()), 2);
        let before = cart.clone();

        cart.remove(&key("a", "green", "m"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, None, None, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, Some("red".into()), Some("m".into()), 2);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_empty_selection_normalizes_to_none() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");

        cart.add(&p, Some(String::new()), None, 1);
        cart.add(&p, None, Some(String::new()), 1);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[0].key.color, None);
        assert_eq!(cart.lines()[0].key.size, None);
    }

    #[test]
    fn test_replace_from_server_rebuilds_lines_and_trusts_totals() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, Some("red".into()), Some("m".into()), 1);

        let remote = RemoteCart {
            items: vec![RemoteCartItem {
                id: CartItemId::new("item-1"),
                product: RemoteCartProduct {
                    id: ProductId::new("b"),
                    title: "Server Product".to_string(),
                    brand: "Velora".to_string(),
                    category: "shirts".to_string(),
                    images: ImageSet::One("https://cdn.example.com/b.jpg".to_string()),
                },
                price: "12.00".parse().unwrap(),
                color: Some("blue".to_string()),
                size: None,
                quantity: 3,
            }],
            // Server totals are canonical even when they diverge
            total_items: 3,
            total_amount: "36.00".parse().unwrap(),
        };

        cart.replace_from_server(&remote);

        assert_eq!(cart.lines().len(), 1);
        let line = &cart.lines()[0];
        assert_eq!(line.key.product_id, ProductId::new("b"));
        assert_eq!(line.key.color.as_deref(), Some("blue"));
        assert_eq!(line.remote_id, Some(CartItemId::new("item-1")));
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_amount(), "36.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_replace_from_server_empty_yields_empty_cart() {
        let mut cart = CartState::new();
        let p = product("a", "10.00");
        cart.add(&p, Some("red".into()), Some("m".into()), 2);

        let remote = RemoteCart {
            items: Vec::new(),
            total_items: 0,
            total_amount: Decimal::ZERO,
        };
        cart.replace_from_server(&remote);

        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_replace_from_server_keeps_divergent_totals_verbatim() {
        let mut cart = CartState::new();

        let remote = RemoteCart {
            items: vec![RemoteCartItem {
                id: CartItemId::new("item-1"),
                product: RemoteCartProduct {
                    id: ProductId::new("a"),
                    title: "Product".to_string(),
                    brand: "Velora".to_string(),
                    category: "shirts".to_string(),
                    images: ImageSet::default(),
                },
                price: "10.00".parse().unwrap(),
                color: None,
                size: None,
                quantity: 1,
            }],
            // Deliberately inconsistent with the item list
            total_items: 5,
            total_amount: "99.00".parse().unwrap(),
        };
        cart.replace_from_server(&remote);

        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_amount(), "99.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_local_add_after_replace_has_no_remote_id() {
        let mut cart = CartState::new();
        let remote = RemoteCart {
            items: Vec::new(),
            total_items: 0,
            total_amount: Decimal::ZERO,
        };
        cart.replace_from_server(&remote);

        let p = product("a", "10.00");
        cart.add(&p, None, None, 1);
        assert_eq!(cart.lines()[0].remote_id, None);
    }
}
