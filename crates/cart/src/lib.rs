//! Shopping cart driven by a serial command queue.
//!
//! This crate provides:
//! - [`Cart`] state with immutable, revision-counted transitions
//! - Cart commands (add, remove, quantity, customer, coupon, clear)
//! - [`Catalog`] trait for asynchronous price lookups
//! - [`CartOperator`] which runs cart commands one at a time

pub mod cart;
pub mod catalog;
pub mod commands;
pub mod error;
pub mod operator;
pub mod value_objects;

pub use cart::Cart;
pub use catalog::{Catalog, CatalogEntry, InMemoryCatalog};
pub use commands::{
    AddItem, AddProduct, ApplyCoupon, ApplyCustomer, ClearCart, RemoveCoupon, RemoveItem,
    UpdateItemQuantity,
};
pub use error::CartError;
pub use operator::{CART_QUEUE_NAME, CartOperator};
pub use value_objects::{CartItem, Coupon, CustomerInfo, Discount, Money, ProductId};
