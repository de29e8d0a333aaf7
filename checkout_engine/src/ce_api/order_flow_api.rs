use std::fmt::Debug;

use log::*;

use crate::{
    ce_api::order_objects::{OrderUpdate, OrderWithItems},
    db_types::{NewOrder, NewPayment, Order, OrderId, Payment, PaymentStatus},
    events::{EventProducers, PaymentSucceededEvent},
    traits::{CheckoutDatabase, CheckoutError, ReconciliationOutcome},
};

/// `OrderFlowApi` is the primary API for mutating order and payment state in response to storefront requests and
/// gateway webhook events.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: CheckoutDatabase
{
    /// Submit a new order.
    ///
    /// Every line item passes the stock, duplicate and self-purchase checks, or the whole order is rejected and
    /// nothing is persisted.
    pub async fn process_new_order(&self, order: NewOrder) -> Result<OrderWithItems, CheckoutError> {
        let buyer_id = order.buyer_id;
        let (order, items) = self.db.create_order(order).await?;
        debug!("🔄️📦️ Order {} created for buyer #{buyer_id} with {} line(s)", order.id, items.len());
        Ok(OrderWithItems::new(order, items))
    }

    /// Update an open order: replace line items positionally and/or set its addresses. Completed orders reject
    /// mutation.
    pub async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<OrderWithItems, CheckoutError> {
        let (order, items) = self.db.update_order(id, update).await?;
        debug!("🔄️📦️ Order {} updated. It now has {} line(s)", order.id, items.len());
        Ok(OrderWithItems::new(order, items))
    }

    /// Destroy an open order along with its payment and line items, in one transaction.
    pub async fn delete_order(&self, id: OrderId) -> Result<Order, CheckoutError> {
        let order = self.db.delete_order(id).await?;
        info!("🔄️📦️ Order {} for buyer #{} has been deleted", order.id, order.buyer_id);
        Ok(order)
    }

    /// Create the payment record for an order. Each order gets exactly one.
    pub async fn create_payment(&self, payment: NewPayment) -> Result<Payment, CheckoutError> {
        let payment = self.db.create_payment(payment).await?;
        debug!("🔄️💳️ Payment #{} ({}) created for order {}", payment.id, payment.payment_option, payment.order_id);
        Ok(payment)
    }

    /// Check the checkout preconditions for an order and return what a gateway session needs: the order and its
    /// item lines at current prices.
    ///
    /// The preconditions are that a payment exists and is not already `Completed`, and that both the shipping and
    /// the billing address are set. Nothing is mutated here.
    pub async fn prepare_checkout(&self, id: OrderId) -> Result<OrderWithItems, CheckoutError> {
        let order = self.db.fetch_order(id).await?.ok_or(CheckoutError::OrderNotFound(id))?;
        let payment = self.db.fetch_payment_for_order(id).await?.ok_or(CheckoutError::PaymentNotFound(id))?;
        if payment.status == PaymentStatus::Completed {
            return Err(CheckoutError::PaymentAlreadyCompleted(id));
        }
        if order.shipping_address_id.is_none() {
            return Err(CheckoutError::ShippingAddressNotSet(id));
        }
        if order.billing_address_id.is_none() {
            return Err(CheckoutError::BillingAddressNotSet(id));
        }
        let items = self.db.fetch_order_items(id).await?;
        debug!("🔄️💳️ Order {id} passed the checkout preconditions with {} line(s)", items.len());
        Ok(OrderWithItems::new(order, items))
    }

    /// Reconcile a terminal payment result reported by the gateway.
    ///
    /// On the first delivery of a `Completed` result, the payment and order transition together and the
    /// payment-succeeded hook fires, once, after the transaction has committed. Replays and no-ops never re-fire the
    /// hook. A conflicting result surfaces as [`CheckoutError::PaymentAlreadyFinalized`].
    pub async fn process_gateway_event(
        &self,
        order_id: OrderId,
        new_status: PaymentStatus,
        event_id: &str,
        buyer_email: Option<String>,
    ) -> Result<ReconciliationOutcome, CheckoutError> {
        let outcome = match self.db.apply_terminal_status(order_id, new_status, event_id).await {
            Ok(outcome) => outcome,
            Err(e @ CheckoutError::PaymentAlreadyFinalized { .. }) => {
                error!("🔄️💳️ Conflicting gateway event {event_id} for order {order_id}: {e}");
                return Err(e);
            },
            Err(e) => return Err(e),
        };
        match &outcome {
            ReconciliationOutcome::Applied { order, payment } => {
                info!("🔄️💳️ Event {event_id} marked the payment for order {order_id} as {}", payment.status);
                if payment.status == PaymentStatus::Completed {
                    self.call_payment_succeeded_hook(order, buyer_email).await;
                }
            },
            ReconciliationOutcome::Replay { .. } => {
                debug!("🔄️💳️ Event {event_id} for order {order_id} is a replay. Nothing to do");
            },
            ReconciliationOutcome::AlreadySettled { payment } => {
                debug!(
                    "🔄️💳️ Event {event_id} reports {new_status} but the payment for order {order_id} is already \
                     {}. Nothing to do",
                    payment.status
                );
            },
        }
        Ok(outcome)
    }

    async fn call_payment_succeeded_hook(&self, order: &Order, buyer_email: Option<String>) {
        for emitter in &self.producers.payment_succeeded_producer {
            debug!("🔄️💳️ Notifying payment succeeded hook subscribers");
            let event = PaymentSucceededEvent::new(order.clone(), buyer_email.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
