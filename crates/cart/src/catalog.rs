//! Product catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CartError;
use crate::value_objects::{Money, ProductId};

/// What the catalog knows about a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
}

/// Looks up product names and prices.
///
/// Lookups may take a while (they usually sit behind a network call), which
/// is what makes [`AddProduct`](crate::AddProduct) a long-running command.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the entry for `product_id`.
    async fn lookup(&self, product_id: &ProductId) -> Result<CatalogEntry, CartError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    entries: HashMap<ProductId, CatalogEntry>,
    latency: Duration,
    unavailable: bool,
    lookups: u64,
}

/// In-memory catalog with configurable latency, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every lookup wait `latency` before answering.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .latency = latency;
        self
    }

    /// Adds or replaces a product.
    pub fn add_product(
        &self,
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
    ) {
        let product_id = product_id.into();
        let entry = CatalogEntry {
            product_id: product_id.clone(),
            name: name.into(),
            unit_price,
        };
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .insert(product_id, entry);
    }

    /// Makes lookups fail with [`CartError::CatalogUnavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unavailable = unavailable;
    }

    /// Returns how many lookups have been made.
    pub fn lookup_count(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookups
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn lookup(&self, product_id: &ProductId) -> Result<CatalogEntry, CartError> {
        let latency = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.lookups += 1;
            state.latency
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(CartError::CatalogUnavailable(
                "catalog is offline".to_string(),
            ));
        }

        state
            .entries
            .get(product_id)
            .cloned()
            .ok_or_else(|| CartError::UnknownProduct {
                product_id: product_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_known_product() {
        let catalog = InMemoryCatalog::new();
        catalog.add_product("SKU-001", "Widget", Money::from_cents(1000));

        let entry = catalog.lookup(&ProductId::new("SKU-001")).await.unwrap();
        assert_eq!(entry.name, "Widget");
        assert_eq!(entry.unit_price.cents(), 1000);
        assert_eq!(catalog.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_product() {
        let catalog = InMemoryCatalog::new();

        let result = catalog.lookup(&ProductId::new("SKU-404")).await;
        assert_eq!(
            result,
            Err(CartError::UnknownProduct {
                product_id: "SKU-404".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_unavailable_catalog() {
        let catalog = InMemoryCatalog::new();
        catalog.add_product("SKU-001", "Widget", Money::from_cents(1000));
        catalog.set_unavailable(true);

        let result = catalog.lookup(&ProductId::new("SKU-001")).await;
        assert!(matches!(result, Err(CartError::CatalogUnavailable(_))));

        catalog.set_unavailable(false);
        assert!(catalog.lookup(&ProductId::new("SKU-001")).await.is_ok());
    }

    #[tokio::test]
    async fn test_latency_delays_answer() {
        let catalog = InMemoryCatalog::new().with_latency(Duration::from_millis(20));
        catalog.add_product("SKU-001", "Widget", Money::from_cents(1000));

        let started = std::time::Instant::now();
        catalog.lookup(&ProductId::new("SKU-001")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
