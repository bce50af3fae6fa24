//! Cart commands.
//!
//! Each command takes the current cart snapshot and returns the next one.
//! None of them touch shared state; the queue publishes what they return.

use std::sync::Arc;

use async_trait::async_trait;
use command_queue::Command;

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::error::CartError;
use crate::value_objects::{CartItem, Coupon, CustomerInfo, Money, ProductId};

/// Command to add an item with a known price.
#[derive(Debug, Clone)]
pub struct AddItem {
    pub item: CartItem,
}

impl AddItem {
    /// Creates a new AddItem command.
    pub fn new(item: CartItem) -> Self {
        Self { item }
    }

    /// Creates a new AddItem command from individual fields.
    pub fn with_details(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            item: CartItem::new(product_id, product_name, quantity, unit_price),
        }
    }
}

#[async_trait]
impl Command<Cart, CartError> for AddItem {
    fn name(&self) -> &str {
        "AddItem"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        cart.with_item(self.item.clone())
    }
}

/// Command to add a product whose name and price come from a catalog.
///
/// The lookup is asynchronous, so this command can be in flight for a while;
/// the queue holds every later command back until it resolves.
#[derive(Clone)]
pub struct AddProduct {
    pub product_id: ProductId,
    pub quantity: u32,
    catalog: Arc<dyn Catalog>,
}

impl AddProduct {
    /// Creates a new AddProduct command.
    pub fn new(catalog: Arc<dyn Catalog>, product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            catalog,
        }
    }
}

impl std::fmt::Debug for AddProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddProduct")
            .field("product_id", &self.product_id)
            .field("quantity", &self.quantity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Command<Cart, CartError> for AddProduct {
    fn name(&self) -> &str {
        "AddProduct"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        if self.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: self.quantity,
            });
        }

        metrics::counter!("cart_catalog_lookups_total").increment(1);
        let entry = self.catalog.lookup(&self.product_id).await?;
        tracing::debug!(
            product_id = %entry.product_id,
            price = %entry.unit_price,
            "catalog price resolved"
        );

        cart.with_item(CartItem::new(
            entry.product_id,
            entry.name,
            self.quantity,
            entry.unit_price,
        ))
    }
}

/// Command to remove an item from the cart.
#[derive(Debug, Clone)]
pub struct RemoveItem {
    pub product_id: ProductId,
}

impl RemoveItem {
    /// Creates a new RemoveItem command.
    pub fn new(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: product_id.into(),
        }
    }
}

#[async_trait]
impl Command<Cart, CartError> for RemoveItem {
    fn name(&self) -> &str {
        "RemoveItem"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        cart.without_item(&self.product_id)
    }
}

/// Command to change the quantity of an item. Zero removes it.
#[derive(Debug, Clone)]
pub struct UpdateItemQuantity {
    pub product_id: ProductId,
    pub new_quantity: u32,
}

impl UpdateItemQuantity {
    /// Creates a new UpdateItemQuantity command.
    pub fn new(product_id: impl Into<ProductId>, new_quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            new_quantity,
        }
    }
}

#[async_trait]
impl Command<Cart, CartError> for UpdateItemQuantity {
    fn name(&self) -> &str {
        "UpdateItemQuantity"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        cart.with_quantity(&self.product_id, self.new_quantity)
    }
}

/// Command to attach customer details to the cart.
#[derive(Debug, Clone)]
pub struct ApplyCustomer {
    pub customer: CustomerInfo,
}

impl ApplyCustomer {
    /// Creates a new ApplyCustomer command.
    pub fn new(customer: CustomerInfo) -> Self {
        Self { customer }
    }
}

#[async_trait]
impl Command<Cart, CartError> for ApplyCustomer {
    fn name(&self) -> &str {
        "ApplyCustomer"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        cart.with_customer(self.customer.clone())
    }
}

/// Command to apply a coupon.
#[derive(Debug, Clone)]
pub struct ApplyCoupon {
    pub coupon: Coupon,
}

impl ApplyCoupon {
    /// Creates a new ApplyCoupon command.
    pub fn new(coupon: Coupon) -> Self {
        Self { coupon }
    }
}

#[async_trait]
impl Command<Cart, CartError> for ApplyCoupon {
    fn name(&self) -> &str {
        "ApplyCoupon"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        cart.with_coupon(self.coupon.clone())
    }
}

/// Command to drop the current coupon.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveCoupon;

#[async_trait]
impl Command<Cart, CartError> for RemoveCoupon {
    fn name(&self) -> &str {
        "RemoveCoupon"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        Ok(cart.without_coupon())
    }
}

/// Command to empty the cart.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearCart;

#[async_trait]
impl Command<Cart, CartError> for ClearCart {
    fn name(&self) -> &str {
        "ClearCart"
    }

    async fn execute(&self, cart: Cart) -> Result<Cart, CartError> {
        Ok(cart.cleared())
    }
}
