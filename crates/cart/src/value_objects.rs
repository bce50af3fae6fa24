//! Value objects for the cart domain.

use serde::{Deserialize, Serialize};

use crate::error::CartError;

/// Product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Money amount represented in cents to avoid floating point issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Largest representable amount.
    pub const MAX: Money = Money { cents: i64::MAX };

    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_multiply(self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Subtracts, clamping at the representable range.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money::from_cents(self.cents.saturating_sub(other.cents))
    }

    /// Returns `percent`% of this amount, rounded toward zero.
    pub fn percentage(&self, percent: u8) -> Money {
        let cents = i128::from(self.cents) * i128::from(percent) / 100;
        Money {
            cents: i64::try_from(cents).unwrap_or(if cents < 0 { i64::MIN } else { i64::MAX }),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    /// Creates a new cart item.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns quantity * unit_price, or `None` if it does not fit.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

/// Who the cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: Option<String>,
}

impl CustomerInfo {
    /// Creates customer info with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    /// Adds an email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// How much a coupon takes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the subtotal, 1 to 100.
    Percentage(u8),
    /// Fixed amount, never more than the subtotal.
    Fixed(Money),
}

/// A promotional code applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount: Discount,
}

impl Coupon {
    /// A coupon taking `percent`% off the subtotal.
    pub fn percentage(code: impl Into<String>, percent: u8) -> Self {
        Self {
            code: code.into(),
            discount: Discount::Percentage(percent),
        }
    }

    /// A coupon taking a fixed amount off the subtotal.
    pub fn fixed(code: impl Into<String>, amount: Money) -> Self {
        Self {
            code: code.into(),
            discount: Discount::Fixed(amount),
        }
    }

    /// Checks the coupon is well formed.
    pub fn validate(&self) -> Result<(), CartError> {
        let reason = if self.code.trim().is_empty() {
            Some("code is empty")
        } else {
            match self.discount {
                Discount::Percentage(p) if p == 0 || p > 100 => {
                    Some("percentage must be between 1 and 100")
                }
                Discount::Fixed(amount) if !amount.is_positive() => {
                    Some("amount must be greater than 0")
                }
                _ => None,
            }
        };

        match reason {
            Some(reason) => Err(CartError::InvalidCoupon {
                code: self.code.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Returns the amount taken off `subtotal`, capped at the subtotal.
    pub fn amount_off(&self, subtotal: Money) -> Money {
        let off = match self.discount {
            Discount::Percentage(p) => subtotal.percentage(p),
            Discount::Fixed(amount) => amount,
        };
        off.min(subtotal).max(Money::zero())
    }
}
