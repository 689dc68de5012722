//! Cache value types for the commerce client.

use super::types::{Product, ProductPage};

/// Values stored in the commerce client's read cache.
///
/// Only catalog reads are cached; the cart is mutable state and is never
/// cached here.
#[derive(Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Box<ProductPage>),
}
