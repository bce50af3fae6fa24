//! The cart state.

use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::value_objects::{CartItem, Coupon, CustomerInfo, Money, ProductId};

/// A snapshot of a shopping cart.
///
/// Carts are immutable values from the queue's point of view: every
/// transition consumes the snapshot and returns the next one, bumping
/// `revision`. Failed transitions return an error and leave nothing behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    customer: Option<CustomerInfo>,
    coupon: Option<Coupon>,
    revision: u64,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the items in the order they were first added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the line for a product, if present.
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    pub fn customer(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Number of successful changes this cart has been through.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of all line totals.
    ///
    /// Transitions reject any change that would overflow, so this only
    /// saturates at [`Money::MAX`] for carts built some other way, such as by
    /// deserializing.
    pub fn subtotal(&self) -> Money {
        self.checked_subtotal().unwrap_or(Money::MAX)
    }

    /// Amount taken off by the coupon, if any.
    pub fn discount(&self) -> Money {
        self.coupon
            .as_ref()
            .map(|coupon| coupon.amount_off(self.subtotal()))
            .unwrap_or_default()
    }

    pub fn total(&self) -> Money {
        self.subtotal().saturating_sub(self.discount())
    }

    /// Adds a line, or increases the quantity if the product is already in
    /// the cart. The existing unit price is kept in that case.
    pub fn with_item(mut self, item: CartItem) -> Result<Self, CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        if !item.unit_price.is_positive() {
            return Err(CartError::InvalidPrice {
                price: item.unit_price.cents(),
            });
        }

        let overflow = CartError::AmountOverflow {
            product_id: item.product_id.to_string(),
        };
        match self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == item.product_id)
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(overflow.clone())?;
            }
            None => self.items.push(item),
        }

        if self.checked_subtotal().is_none() {
            return Err(overflow);
        }
        Ok(self.bump())
    }

    /// Removes a line.
    pub fn without_item(mut self, product_id: &ProductId) -> Result<Self, CartError> {
        let position = self.position(product_id)?;
        self.items.remove(position);
        Ok(self.bump())
    }

    /// Sets the quantity of a line. A quantity of 0 removes the line.
    pub fn with_quantity(mut self, product_id: &ProductId, quantity: u32) -> Result<Self, CartError> {
        let position = self.position(product_id)?;
        if quantity == 0 {
            self.items.remove(position);
        } else {
            self.items[position].quantity = quantity;
            if self.checked_subtotal().is_none() {
                return Err(CartError::AmountOverflow {
                    product_id: product_id.to_string(),
                });
            }
        }
        Ok(self.bump())
    }

    /// Attaches customer details.
    pub fn with_customer(mut self, customer: CustomerInfo) -> Result<Self, CartError> {
        if customer.name.trim().is_empty() {
            return Err(CartError::CustomerNameRequired);
        }
        self.customer = Some(customer);
        Ok(self.bump())
    }

    /// Applies a coupon, replacing any previous one.
    pub fn with_coupon(mut self, coupon: Coupon) -> Result<Self, CartError> {
        coupon.validate()?;
        if self.is_empty() {
            return Err(CartError::EmptyCart);
        }
        self.coupon = Some(coupon);
        Ok(self.bump())
    }

    /// Drops the coupon, if any.
    pub fn without_coupon(mut self) -> Self {
        self.coupon = None;
        self.bump()
    }

    /// Empties the cart. Customer details are kept.
    pub fn cleared(mut self) -> Self {
        self.items.clear();
        self.coupon = None;
        self.bump()
    }

    fn checked_subtotal(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::zero(), |subtotal, item| {
            subtotal.checked_add(item.line_total()?)
        })
    }

    fn position(&self, product_id: &ProductId) -> Result<usize, CartError> {
        self.items
            .iter()
            .position(|item| &item.product_id == product_id)
            .ok_or_else(|| CartError::ItemNotFound {
                product_id: product_id.to_string(),
            })
    }

    fn bump(mut self) -> Self {
        self.revision += 1;
        self
    }
}
