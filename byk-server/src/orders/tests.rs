use super::*;
use crate::core::error::{BookingError, Entity, ValidationError};
use crate::storage::BookingStorage;
use crate::utils::time::FixedClock;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use shared::EventPayload;
use shared::models::{CartItemInput, CheckoutRequest, DeliveryMethod, OrderStatus, PaymentMethod};
use shared::query::Page;
use std::str::FromStr;
use std::sync::Arc;

fn create_test_manager() -> (BookingStorage, OrdersManager) {
    let storage = BookingStorage::open_in_memory().unwrap();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap(),
    ));
    let manager = OrdersManager::new(storage.clone(), clock, chrono_tz::UTC);
    (storage, manager)
}

fn dish(id: &str, price: &str) -> CartItemInput {
    CartItemInput {
        dish_id: id.to_string(),
        dish_name: format!("Dish {}", id),
        unit_price: Decimal::from_str(price).unwrap(),
        restaurant_id: "r".to_string(),
    }
}

/// Scenario cart: A (300 × 2) + B (150 × 1)
fn fill_cart(storage: &BookingStorage, session: &str) -> String {
    let (cart, _) = storage
        .update_cart::<_, BookingError>(session, |cart| {
            cart.add_item(&dish("A", "300"))?;
            cart.add_item(&dish("A", "300"))?;
            cart.add_item(&dish("B", "150"))?;
            Ok(())
        })
        .unwrap();
    cart.cart_id
}

fn pickup() -> CheckoutRequest {
    CheckoutRequest {
        cart_id: None,
        delivery_method: DeliveryMethod::Pickup,
        delivery_address: None,
        payment_method: PaymentMethod::Card,
    }
}

// ========================================================================
// checkout
// ========================================================================

#[test]
fn test_checkout_freezes_lines_and_total() {
    let (storage, manager) = create_test_manager();
    let cart_id = fill_cart(&storage, "s-1");

    let outcome = manager.checkout("s-1", "c-1", pickup()).unwrap();
    let order = outcome.order;

    assert!(!outcome.replayed);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Decimal::from(750));
    assert_eq!(order.lines.len(), 2);
    assert_eq!(order.restaurant_id, "r");
    assert_eq!(order.source_cart_id, cart_id);
    assert_eq!(order.order_number, "ORD-20240601-00001");

    let expected: Decimal = order.lines.iter().map(|l| l.subtotal()).sum();
    assert_eq!(order.total_amount, expected);

    // source cart is gone
    assert!(storage.get_cart("s-1").unwrap().is_none());
}

#[test]
fn test_checkout_empty_cart() {
    let (storage, manager) = create_test_manager();

    let err = manager.checkout("s-1", "c-1", pickup()).unwrap_err();
    assert!(matches!(err, BookingError::Validation(ValidationError::EmptyCart)));

    fill_cart(&storage, "s-1");
    storage
        .update_cart::<_, BookingError>("s-1", |cart| {
            cart.clear();
            Ok(())
        })
        .unwrap();
    let err = manager.checkout("s-1", "c-1", pickup()).unwrap_err();
    assert!(matches!(err, BookingError::Validation(ValidationError::EmptyCart)));
}

#[test]
fn test_checkout_delivery_needs_address() {
    let (storage, manager) = create_test_manager();
    fill_cart(&storage, "s-1");

    let mut request = pickup();
    request.delivery_method = DeliveryMethod::Delivery;
    request.delivery_address = Some("  ".into());
    let err = manager.checkout("s-1", "c-1", request.clone()).unwrap_err();
    assert!(matches!(
        err,
        BookingError::Validation(ValidationError::DeliveryAddressRequired)
    ));
    // nothing consumed
    assert!(storage.get_cart("s-1").unwrap().is_some());

    request.delivery_address = Some("Calle Mayor 1".into());
    let order = manager.checkout("s-1", "c-1", request).unwrap().order;
    assert_eq!(order.delivery_address.as_deref(), Some("Calle Mayor 1"));
}

#[test]
fn test_checkout_retry_returns_same_order() {
    let (storage, manager) = create_test_manager();
    let cart_id = fill_cart(&storage, "s-1");

    let mut request = pickup();
    request.cart_id = Some(cart_id.clone());
    let first = manager.checkout("s-1", "c-1", request.clone()).unwrap();
    let second = manager.checkout("s-1", "c-1", request).unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.order.id, second.order.id);
    assert_eq!(manager.list(None, None, Page::default()).unwrap().total, 1);
}

#[test]
fn test_checkout_retry_by_other_customer_not_found() {
    let (storage, manager) = create_test_manager();
    let cart_id = fill_cart(&storage, "s-1");

    let mut request = pickup();
    request.cart_id = Some(cart_id);
    manager.checkout("s-1", "c-1", request.clone()).unwrap();

    let err = manager.checkout("s-1", "c-2", request).unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: Entity::Order, .. }));
}

#[test]
fn test_order_total_ignores_later_price_changes() {
    let (storage, manager) = create_test_manager();
    fill_cart(&storage, "s-1");
    let order = manager.checkout("s-1", "c-1", pickup()).unwrap().order;

    // catalog raises the price; a new cart picks it up, the order does not
    storage
        .update_cart::<_, BookingError>("s-1", |cart| cart.add_item(&dish("A", "999")).map(|_| ()))
        .unwrap();
    assert_eq!(manager.get(&order.id).unwrap().total_amount, Decimal::from(750));
}

#[test]
fn test_order_numbers_increment() {
    let (storage, manager) = create_test_manager();
    fill_cart(&storage, "s-1");
    fill_cart(&storage, "s-2");

    let a = manager.checkout("s-1", "c-1", pickup()).unwrap().order;
    let b = manager.checkout("s-2", "c-2", pickup()).unwrap().order;
    assert_eq!(a.order_number, "ORD-20240601-00001");
    assert_eq!(b.order_number, "ORD-20240601-00002");
}

// ========================================================================
// advance / cancel
// ========================================================================

fn placed_order(storage: &BookingStorage, manager: &OrdersManager) -> String {
    fill_cart(storage, "s-1");
    manager.checkout("s-1", "c-1", pickup()).unwrap().order.id
}

#[test]
fn test_advance_full_sequence() {
    let (storage, manager) = create_test_manager();
    let id = placed_order(&storage, &manager);
    let mut events = manager.subscribe();

    for next in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ] {
        assert_eq!(manager.advance(&id, next).unwrap().status, next);
        match events.try_recv().unwrap().payload {
            EventPayload::OrderAdvanced { to, .. } => assert_eq!(to, next),
            other => panic!("unexpected event {:?}", other),
        }
    }

    let err = manager.cancel(&id).unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));
}

#[test]
fn test_advance_skip_fails_and_keeps_status() {
    let (storage, manager) = create_test_manager();
    let id = placed_order(&storage, &manager);

    for target in [OrderStatus::Ready, OrderStatus::Pending, OrderStatus::Cancelled] {
        let err = manager.advance(&id, target).unwrap_err();
        assert!(matches!(
            err,
            BookingError::InvalidTransition { entity: Entity::Order, .. }
        ));
        assert_eq!(manager.get(&id).unwrap().status, OrderStatus::Pending);
    }

    manager.advance(&id, OrderStatus::Confirmed).unwrap();
    // stale compare-and-set: confirmed again
    assert!(manager.advance(&id, OrderStatus::Confirmed).is_err());
    assert_eq!(manager.get(&id).unwrap().status, OrderStatus::Confirmed);
}

#[test]
fn test_cancel_rules() {
    let (storage, manager) = create_test_manager();
    let id = placed_order(&storage, &manager);

    manager.advance(&id, OrderStatus::Confirmed).unwrap();
    manager.advance(&id, OrderStatus::Preparing).unwrap();
    assert_eq!(manager.cancel(&id).unwrap().status, OrderStatus::Cancelled);

    let err = manager.cancel(&id).unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));
    let err = manager.advance(&id, OrderStatus::Ready).unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));

    let err = manager.cancel("missing").unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: Entity::Order, .. }));
}

// ========================================================================
// queries
// ========================================================================

#[test]
fn test_customer_scoped_reads() {
    let (storage, manager) = create_test_manager();
    let id = placed_order(&storage, &manager);
    fill_cart(&storage, "s-2");
    manager.checkout("s-2", "c-2", pickup()).unwrap();

    assert!(manager.get_for_customer("c-1", &id).is_ok());
    assert!(manager.get_for_customer("c-2", &id).is_err());

    let mine = manager.list_for_customer("c-1", Page::default()).unwrap();
    assert_eq!(mine.total, 1);
    assert_eq!(mine.data[0].id, id);

    let all = manager.list(Some("r"), None, Page::default()).unwrap();
    assert_eq!(all.total, 2);
    // newest first
    assert_eq!(all.data[1].id, id);

    manager.advance(&id, OrderStatus::Confirmed).unwrap();
    let confirmed = manager
        .list(None, Some(OrderStatus::Confirmed), Page::default())
        .unwrap();
    assert_eq!(confirmed.total, 1);
}
