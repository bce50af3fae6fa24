//! Integration tests: CartOperator → serial queue → cart updates and errors.

use std::sync::Arc;
use std::time::Duration;

use cart::{
    AddProduct, Cart, CartError, CartItem, CartOperator, Catalog, Coupon, CustomerInfo,
    InMemoryCatalog, Money, ProductId,
};
use futures_util::StreamExt;

fn catalog(latency_ms: u64) -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new().with_latency(Duration::from_millis(latency_ms));
    catalog.add_product("SKU-001", "Widget", Money::from_cents(1000));
    catalog.add_product("SKU-002", "Gadget", Money::from_cents(2500));
    catalog
}

#[tokio::test]
async fn test_slow_lookup_is_not_overtaken() {
    let catalog: Arc<dyn Catalog> = Arc::new(catalog(30));
    let operator = CartOperator::new();

    // The quantity update only succeeds if it runs after the slow add.
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-001"), 1);
    operator.update_item_quantity(ProductId::new("SKU-001"), 5);
    let mut errors = operator.errors();
    operator.until_idle().await;

    assert!(errors.drain().is_empty());
    let cart = operator.cart();
    assert_eq!(cart.item(&ProductId::new("SKU-001")).unwrap().quantity, 5);
    assert_eq!(cart.subtotal().cents(), 5000);
}

#[tokio::test]
async fn test_updates_stream_in_submission_order() {
    let catalog: Arc<dyn Catalog> = Arc::new(catalog(5));
    let operator = CartOperator::new();
    let updates = operator.cart_updates();

    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-002"), 1);
    operator.add_item(CartItem::new("SKU-003", "Gizmo", 2, Money::from_cents(300)));
    operator.apply_customer(CustomerInfo::new("Ada"));

    let snapshots: Vec<Cart> = updates.take(4).collect().await;
    let revisions: Vec<u64> = snapshots.iter().map(Cart::revision).collect();
    assert_eq!(revisions, vec![0, 1, 2, 3]);
    assert_eq!(snapshots[1].items()[0].product_id, ProductId::new("SKU-002"));
    assert_eq!(snapshots[2].items()[1].product_id, ProductId::new("SKU-003"));
    assert_eq!(snapshots[3].customer().unwrap().name, "Ada");
}

#[tokio::test]
async fn test_failed_commands_leave_cart_untouched() {
    let catalog_impl = catalog(0);
    let catalog: Arc<dyn Catalog> = Arc::new(catalog_impl.clone());
    let operator = CartOperator::new();
    let mut updates = operator.cart_updates();
    let mut errors = operator.errors();

    operator.apply_coupon(Coupon::percentage("EARLY", 10));
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-404"), 1);
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-001"), 2);
    operator.remove_item(ProductId::new("SKU-999"));
    operator.apply_coupon(Coupon::percentage("TEN", 10));
    operator.until_idle().await;

    let errors: Vec<CartError> = errors
        .drain()
        .iter()
        .map(|err| err.command_error().cloned().unwrap())
        .collect();
    assert_eq!(
        errors,
        vec![
            CartError::EmptyCart,
            CartError::UnknownProduct {
                product_id: "SKU-404".to_string()
            },
            CartError::ItemNotFound {
                product_id: "SKU-999".to_string()
            },
        ]
    );

    let snapshots = updates.drain();
    assert_eq!(snapshots.len(), 3);
    let cart = snapshots.last().unwrap();
    assert_eq!(cart.revision(), 2);
    assert_eq!(cart.total().cents(), 1800);
    assert_eq!(catalog_impl.lookup_count(), 2);
}

#[tokio::test]
async fn test_quantity_overflow_is_a_cart_error() {
    let operator = CartOperator::new();
    let mut errors = operator.errors();
    let bolt = |quantity| CartItem::new("SKU-BOLT", "Bolt", quantity, Money::from_cents(1));

    operator.add_item(bolt(u32::MAX));
    operator.add_item(bolt(2));
    operator.until_idle().await;

    let errors = errors.drain();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].command(), Some("AddItem"));
    assert_eq!(
        errors[0].command_error(),
        Some(&CartError::AmountOverflow {
            product_id: "SKU-BOLT".to_string()
        })
    );

    let cart = operator.cart();
    assert_eq!(cart.revision(), 1);
    assert_eq!(cart.item_count(), u64::from(u32::MAX));
}

#[tokio::test]
async fn test_catalog_outage_recovers() {
    let catalog_impl = catalog(0);
    let catalog: Arc<dyn Catalog> = Arc::new(catalog_impl.clone());
    let operator = CartOperator::new();
    let mut errors = operator.errors();

    catalog_impl.set_unavailable(true);
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-001"), 1);
    operator.until_idle().await;

    catalog_impl.set_unavailable(false);
    operator.add_product(Arc::clone(&catalog), ProductId::new("SKU-001"), 1);
    operator.until_idle().await;

    let errors = errors.drain();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].command(), Some("AddProduct"));
    assert!(matches!(
        errors[0].command_error(),
        Some(CartError::CatalogUnavailable(_))
    ));
    assert_eq!(operator.cart().item_count(), 1);
}

#[tokio::test]
async fn test_dropped_operator_discards_in_flight_lookup() {
    let catalog_impl = catalog(20);
    let operator = CartOperator::new();
    let mut updates = operator.cart_updates();
    let handle = operator.handle();

    operator.execute(AddProduct::new(Arc::new(catalog_impl.clone()), "SKU-001", 1));
    tokio::time::sleep(Duration::from_millis(5)).await;
    drop(operator);
    tokio::time::sleep(Duration::from_millis(40)).await;

    assert_eq!(catalog_impl.lookup_count(), 1);
    assert_eq!(updates.recv().await, Some(Cart::new()));
    assert_eq!(updates.recv().await, None);
    assert!(handle.is_released());
}
