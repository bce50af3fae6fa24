//! Cart error types.

use thiserror::Error;

/// Errors that can occur while executing cart commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },

    /// Item not found in cart.
    #[error("Item not found: {product_id}")]
    ItemNotFound { product_id: String },

    /// The catalog does not know the product.
    #[error("Unknown product: {product_id}")]
    UnknownProduct { product_id: String },

    /// The cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// The coupon cannot be applied.
    #[error("Invalid coupon '{code}': {reason}")]
    InvalidCoupon { code: String, reason: &'static str },

    /// Customer name is required.
    #[error("Customer name is required")]
    CustomerNameRequired,

    /// A quantity or amount no longer fits after the change.
    #[error("Amount overflow for {product_id}: quantity or total too large")]
    AmountOverflow { product_id: String },

    /// The catalog could not be reached.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
}
