//! Scripted cart session.

use std::sync::Arc;

use cart::{
    Cart, CartError, CartOperator, Catalog, Coupon, CustomerInfo, InMemoryCatalog, Money,
    ProductId,
};
use command_queue::{QueueConfig, QueueError, Subscription};
use serde::Serialize;

use crate::config::Config;

/// What happened during a session.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    /// The cart after every command finished.
    pub cart: Cart,
    /// Number of snapshots seen on the update channel, initial one included.
    pub updates: usize,
    /// Every failure seen on the error channel, in order.
    pub errors: Vec<String>,
}

fn demo_catalog(config: &Config) -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new().with_latency(config.catalog_latency);
    catalog.add_product("SKU-001", "Widget", Money::from_cents(1000));
    catalog.add_product("SKU-002", "Gadget", Money::from_cents(2500));
    catalog.add_product("SKU-003", "Gizmo", Money::from_cents(450));
    catalog
}

/// Runs a fixed shopping session, including a few commands that are meant
/// to fail, and reports the outcome.
#[tracing::instrument(skip(config), fields(queue = %config.queue_name))]
pub async fn run(config: &Config) -> SessionReport {
    let catalog: Arc<dyn Catalog> = Arc::new(demo_catalog(config));
    let operator = CartOperator::from_cart(Cart::new(), QueueConfig::named(&config.queue_name));

    let update_listener = tokio::spawn(log_updates(operator.cart_updates()));
    let error_listener = tokio::spawn(log_errors(operator.errors()));

    operator.apply_customer(CustomerInfo::new("Ada Lovelace").with_email("ada@example.com"));
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-001"), 2);
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-404"), 1);
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-002"), 1);
    operator.update_item_quantity(ProductId::new("SKU-001"), 3);
    operator.apply_coupon(Coupon::percentage("", 10));
    operator.apply_coupon(Coupon::percentage("WELCOME10", 10));
    operator.remove_item(ProductId::new("SKU-003"));

    tracing::info!(pending = operator.pending(), "session submitted");
    operator.until_idle().await;

    let cart = operator.cart();
    // Releasing the operator ends both subscriptions, which stops the listeners.
    drop(operator);

    let updates = update_listener.await.unwrap_or_default();
    let errors = error_listener.await.unwrap_or_default();

    SessionReport {
        cart,
        updates,
        errors,
    }
}

async fn log_updates(mut updates: Subscription<Cart>) -> usize {
    let mut seen = 0;
    while let Some(cart) = updates.recv().await {
        tracing::info!(
            revision = cart.revision(),
            items = cart.item_count(),
            total = %cart.total(),
            "cart updated"
        );
        seen += 1;
    }
    seen
}

async fn log_errors(mut errors: Subscription<Arc<QueueError<CartError>>>) -> Vec<String> {
    let mut seen = Vec::new();
    while let Some(error) = errors.recv().await {
        tracing::warn!(error = %error, "cart command failed");
        seen.push(error.to_string());
    }
    seen
}
