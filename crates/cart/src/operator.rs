//! Cart operator: one serial command queue per cart.

use std::sync::Arc;

use command_queue::{
    Command, CommandId, QueueConfig, QueueError, QueueHandle, SerialCommandQueue, Subscription,
};

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::commands::{
    AddItem, AddProduct, ApplyCoupon, ApplyCustomer, ClearCart, RemoveCoupon, RemoveItem,
    UpdateItemQuantity,
};
use crate::error::CartError;
use crate::value_objects::{CartItem, Coupon, CustomerInfo, ProductId};

/// Queue name used by [`CartOperator::new`].
pub const CART_QUEUE_NAME: &str = "cart";

/// Handles every operation on one cart.
///
/// Commands are executed one at a time, in the order they were submitted,
/// so a slow catalog lookup never races a later quantity change. Cart updates
/// and failures are observed through [`CartOperator::cart_updates`] and
/// [`CartOperator::errors`].
#[derive(Debug)]
pub struct CartOperator {
    queue: SerialCommandQueue<Cart, CartError>,
}

impl CartOperator {
    /// Creates an operator for a new, empty cart.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::from_cart(Cart::default(), QueueConfig::named(CART_QUEUE_NAME))
    }

    /// Creates an operator starting from an existing cart.
    pub fn from_cart(cart: Cart, config: QueueConfig) -> Self {
        Self {
            queue: SerialCommandQueue::with_config(cart, config),
        }
    }

    /// Submits any cart command.
    pub fn execute<C>(&self, command: C) -> CommandId
    where
        C: Command<Cart, CartError> + 'static,
    {
        self.queue.submit(command)
    }

    /// Adds an item with a known price.
    #[tracing::instrument(skip(self))]
    pub fn add_item(&self, item: CartItem) -> CommandId {
        self.execute(AddItem::new(item))
    }

    /// Adds a product priced by `catalog`.
    #[tracing::instrument(skip(self, catalog))]
    pub fn add_product(
        &self,
        catalog: Arc<dyn Catalog>,
        product_id: ProductId,
        quantity: u32,
    ) -> CommandId {
        self.execute(AddProduct::new(catalog, product_id, quantity))
    }

    /// Removes an item.
    #[tracing::instrument(skip(self))]
    pub fn remove_item(&self, product_id: ProductId) -> CommandId {
        self.execute(RemoveItem::new(product_id))
    }

    /// Changes the quantity of an item.
    #[tracing::instrument(skip(self))]
    pub fn update_item_quantity(&self, product_id: ProductId, new_quantity: u32) -> CommandId {
        self.execute(UpdateItemQuantity::new(product_id, new_quantity))
    }

    /// Attaches customer details.
    #[tracing::instrument(skip(self))]
    pub fn apply_customer(&self, customer: CustomerInfo) -> CommandId {
        self.execute(ApplyCustomer::new(customer))
    }

    /// Applies a coupon.
    #[tracing::instrument(skip(self))]
    pub fn apply_coupon(&self, coupon: Coupon) -> CommandId {
        self.execute(ApplyCoupon::new(coupon))
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_coupon(&self) -> CommandId {
        self.execute(RemoveCoupon)
    }

    #[tracing::instrument(skip(self))]
    pub fn clear(&self) -> CommandId {
        self.execute(ClearCart)
    }

    /// Subscribes to cart snapshots, starting with the current one.
    pub fn cart_updates(&self) -> Subscription<Cart> {
        self.queue.observe_state()
    }

    /// Subscribes to command failures.
    pub fn errors(&self) -> Subscription<Arc<QueueError<CartError>>> {
        self.queue.observe_errors()
    }

    /// Returns the latest cart snapshot.
    pub fn cart(&self) -> Cart {
        self.queue.current_state()
    }

    /// Returns the number of commands not yet finished.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Waits until every submitted command has finished.
    pub async fn until_idle(&self) {
        self.queue.until_idle().await
    }

    /// Returns a submitter that does not keep the operator alive.
    pub fn handle(&self) -> QueueHandle<Cart, CartError> {
        self.queue.handle()
    }
}

impl Default for CartOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;

    #[tokio::test]
    async fn test_new_operator_starts_empty() {
        let operator = CartOperator::new();
        let mut updates = operator.cart_updates();

        assert_eq!(updates.try_recv(), Some(Cart::new()));
        assert!(operator.cart().is_empty());
        assert_eq!(operator.pending(), 0);
    }

    #[tokio::test]
    async fn test_convenience_methods_submit_in_order() {
        let operator = CartOperator::new();

        operator.add_item(CartItem::new("SKU-001", "Widget", 1, Money::from_cents(1000)));
        operator.update_item_quantity(ProductId::new("SKU-001"), 4);
        operator.apply_customer(CustomerInfo::new("Ada"));
        operator.apply_coupon(Coupon::fixed("FIVE", Money::from_cents(500)));
        operator.until_idle().await;

        let cart = operator.cart();
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.total().cents(), 3500);
        assert_eq!(cart.revision(), 4);

        operator.remove_coupon();
        operator.remove_item(ProductId::new("SKU-001"));
        operator.until_idle().await;
        assert_eq!(operator.cart().total(), Money::zero());

        operator.clear();
        operator.until_idle().await;
        assert_eq!(operator.cart().revision(), 7);
    }

    #[tokio::test]
    async fn test_from_cart_keeps_starting_state() {
        let start = Cart::new()
            .with_item(CartItem::new("SKU-001", "Widget", 2, Money::from_cents(1000)))
            .unwrap();
        let operator = CartOperator::from_cart(start.clone(), QueueConfig::named("restored"));

        assert_eq!(operator.cart(), start);
    }
}
