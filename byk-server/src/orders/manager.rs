//! Order lifecycle manager
//!
//! ```text
//! checkout ──► pending ──► confirmed ──► preparing ──► ready ──► delivered
//!                 │            │             │           │
//!                 └────────────┴─────────────┴───────────┴──► cancelled
//! ```
//!
//! Status changes are compare-and-set on the stored status inside one write
//! transaction: an advance names the target, and only the status right
//! before it is accepted.

use chrono_tz::Tz;
use shared::models::{CheckoutRequest, DeliveryMethod, Order, OrderLine, OrderStatus};
use shared::query::{Page, PaginatedResponse};
use shared::{BookingEvent, EventPayload};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::cart::money;
use crate::core::error::{BookingError, BookingResult, Entity, ValidationError};
use crate::storage::{BookingStorage, StorageError};
use crate::utils::time::{Clock, local_now};

/// Counter backing order numbers
const ORDER_NUMBER_COUNTER: &str = "order_number";

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Result of a checkout
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Order,
    /// `true` when the cart had already been checked out and the existing
    /// order is returned
    pub replayed: bool,
}

pub struct OrdersManager {
    storage: BookingStorage,
    clock: Arc<dyn Clock>,
    tz: Tz,
    event_tx: broadcast::Sender<BookingEvent>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<BookingStorage>")
            .field("tz", &self.tz)
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl OrdersManager {
    pub fn new(storage: BookingStorage, clock: Arc<dyn Clock>, tz: Tz) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            clock,
            tz,
            event_tx,
        }
    }

    /// Subscribe to order events
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.event_tx.subscribe()
    }

    // ========== Commands ==========

    /// Turn the session cart into a pending order and clear the cart
    ///
    /// Order creation, the checkout record and the cart removal commit
    /// together. A retry carrying the `cart_id` of an already checked-out
    /// cart returns the order it produced.
    pub fn checkout(
        &self,
        session_id: &str,
        customer_id: &str,
        request: CheckoutRequest,
    ) -> BookingResult<CheckoutOutcome> {
        let delivery_address = request
            .delivery_address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        if request.delivery_method == DeliveryMethod::Delivery && delivery_address.is_none() {
            return Err(ValidationError::DeliveryAddressRequired.into());
        }

        let txn = self.storage.begin_write()?;

        if let Some(cart_id) = request.cart_id.as_deref()
            && let Some(order_id) = self.storage.checkout_order_id_txn(&txn, cart_id)?
        {
            let order = self
                .storage
                .get_order_txn(&txn, &order_id)?
                .filter(|o| o.customer_id == customer_id)
                .ok_or_else(|| BookingError::not_found(Entity::Order, order_id.as_str()))?;
            tracing::info!(
                order_id = %order.id,
                cart_id = %cart_id,
                "Checkout replayed, returning existing order"
            );
            return Ok(CheckoutOutcome {
                order,
                replayed: true,
            });
        }

        let cart = match self.storage.get_cart_txn(&txn, session_id)? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(ValidationError::EmptyCart.into()),
        };
        let restaurant_id = cart
            .restaurant_id()
            .map(str::to_string)
            .ok_or(ValidationError::EmptyCart)?;

        let lines: Vec<OrderLine> = cart.lines.iter().map(OrderLine::from).collect();
        let total_amount = money::sum_lines(lines.iter().map(|l| (l.quantity, &l.unit_price)));

        let now = self.clock.now();
        let order_id = uuid::Uuid::new_v4().to_string();
        let count = self.storage.next_counter(&txn, ORDER_NUMBER_COUNTER)?;
        let order_number = format!(
            "ORD-{}-{:05}",
            local_now(self.clock.as_ref(), self.tz).format("%Y%m%d"),
            count
        );
        if !self.storage.claim_order_number(&txn, &order_number, &order_id)? {
            return Err(BookingError::Internal(format!(
                "order number {} already issued",
                order_number
            )));
        }

        let order = Order {
            id: order_id,
            order_number,
            customer_id: customer_id.to_string(),
            restaurant_id,
            lines,
            total_amount,
            status: OrderStatus::Pending,
            delivery_method: request.delivery_method,
            delivery_address,
            payment_method: request.payment_method,
            source_cart_id: cart.cart_id.clone(),
            created_at: now,
            updated_at: now,
        };

        self.storage.put_order(&txn, &order)?;
        self.storage.record_checkout(&txn, &cart.cart_id, &order.id)?;
        self.storage.delete_cart(&txn, session_id)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            restaurant_id = %order.restaurant_id,
            total_amount = %order.total_amount,
            line_count = order.lines.len(),
            "Order placed"
        );
        self.emit(EventPayload::OrderPlaced {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            restaurant_id: order.restaurant_id.clone(),
            total_amount: order.total_amount,
        });

        Ok(CheckoutOutcome {
            order,
            replayed: false,
        })
    }

    /// Move the order to `next`, which must directly follow its current status
    pub fn advance(&self, order_id: &str, next: OrderStatus) -> BookingResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Order, order_id))?;

        let from = order.status;
        if next.previous() != Some(from) {
            return Err(BookingError::invalid_transition(
                Entity::Order,
                order_id,
                from,
                next,
            ));
        }

        order.status = next;
        order.updated_at = self.clock.now();
        self.storage.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.id, from = %from, status = %next, "Order advanced");
        self.emit(EventPayload::OrderAdvanced {
            order_id: order.id.clone(),
            from,
            to: next,
        });
        Ok(order)
    }

    /// Cancel from any non-terminal status
    pub fn cancel(&self, order_id: &str) -> BookingResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Order, order_id))?;

        let from = order.status;
        if from.is_terminal() {
            return Err(BookingError::invalid_transition(
                Entity::Order,
                order_id,
                from,
                OrderStatus::Cancelled,
            ));
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = self.clock.now();
        self.storage.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.id, from = %from, "Order cancelled");
        self.emit(EventPayload::OrderCancelled {
            order_id: order.id.clone(),
            from,
        });
        Ok(order)
    }

    // ========== Queries ==========

    pub fn get(&self, order_id: &str) -> BookingResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Order, order_id))
    }

    /// Owner-scoped read; another customer's order reads as not found
    pub fn get_for_customer(&self, customer_id: &str, order_id: &str) -> BookingResult<Order> {
        match self.storage.get_order(order_id)? {
            Some(o) if o.customer_id == customer_id => Ok(o),
            _ => Err(BookingError::not_found(Entity::Order, order_id)),
        }
    }

    /// A customer's orders, newest first
    pub fn list_for_customer(
        &self,
        customer_id: &str,
        page: Page,
    ) -> BookingResult<PaginatedResponse<Order>> {
        self.query(page, |o| o.customer_id == customer_id)
    }

    /// All orders (admin), newest first
    pub fn list(
        &self,
        restaurant_id: Option<&str>,
        status: Option<OrderStatus>,
        page: Page,
    ) -> BookingResult<PaginatedResponse<Order>> {
        self.query(page, |o| {
            restaurant_id.is_none_or(|id| o.restaurant_id == id)
                && status.is_none_or(|s| o.status == s)
        })
    }

    fn query(
        &self,
        page: Page,
        filter: impl Fn(&Order) -> bool,
    ) -> BookingResult<PaginatedResponse<Order>> {
        let mut items: Vec<_> = self
            .storage
            .list_orders()?
            .into_iter()
            .filter(|o| filter(o))
            .collect();
        // order numbers grow with the counter, so they break created_at ties
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_number.cmp(&a.order_number))
        });
        Ok(page.slice(items))
    }

    fn emit(&self, payload: EventPayload) {
        let event = BookingEvent::new(self.clock.now().timestamp_millis(), payload);
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Event broadcast skipped: no active receivers");
        }
    }
}
