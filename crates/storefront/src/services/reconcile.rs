//! Webhook reconciler.
//!
//! Turns a verified `checkout.session.completed` event into durable records:
//! PaymentRecord, then Order, then OrderItems, then ShippingAddress. The
//! write order is load-bearing — later records hold references to earlier
//! ones and the collection store offers no multi-record transaction, so
//! ordering is the only consistency mechanism.
//!
//! On any persistence failure the remaining sequence is aborted and the
//! error surfaces as a non-2xx response; the gateway's own redelivery is the
//! only retry mechanism. Redelivery is NOT idempotent: an event that failed
//! after the payment write but before the order write will create a duplicate
//! PaymentRecord when redelivered. Known gap, pinned by an integration test,
//! until a dedup key on the gateway event ID is added.

use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;

use sugarplum_core::money::from_cents;
use sugarplum_core::{
    AddressId, OrderId, OrderItemId, OrderPaymentStatus, OrderStatus, PaymentId, PaymentStatus,
};

use crate::datastore::{DataStoreClient, Record, collections};
use crate::error::{AppError, Result};
use crate::models::{OrderItemSummary, ShippingAddress};
use crate::stripe::{
    CompletedSession, EVENT_CHECKOUT_COMPLETED, EVENT_PAYMENT_SUCCEEDED, Event,
};

/// Default shipping method label when the event carries no shipping cost.
const DEFAULT_SHIPPING_METHOD: &str = "Standard Shipping";

/// Records created by a successful reconciliation, in creation order.
#[derive(Debug, Clone)]
pub struct ReconciledOrder {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub order_item_ids: Vec<OrderItemId>,
    pub shipping_address_id: Option<AddressId>,
}

/// Order intent extracted from the event's metadata bag and payload.
#[derive(Debug)]
struct OrderIntent {
    user_id: String,
    items: Vec<OrderItemSummary>,
    /// Total charged, converted back to decimal major units.
    amount: Decimal,
    currency: String,
    method: String,
    gateway_payment_id: String,
    shipping_method: String,
    shipping_cost: Decimal,
    shipping_address: Option<ShippingAddress>,
}

/// Reconciles completed-checkout events into collection-store records.
pub struct ReconcileService<'a> {
    datastore: &'a DataStoreClient,
}

impl<'a> ReconcileService<'a> {
    /// Create a new reconcile service.
    #[must_use]
    pub const fn new(datastore: &'a DataStoreClient) -> Self {
        Self { datastore }
    }

    /// Dispatch a verified event by kind.
    ///
    /// Only `checkout.session.completed` triggers persistence. Recognized
    /// informational kinds are logged; unrecognized kinds are acknowledged
    /// and ignored so the gateway does not redeliver them.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MetadataCorrupt`] when a completed-session event
    /// is missing required order metadata, and [`AppError::Persistence`]
    /// when a collection-store write fails.
    pub async fn handle_event(&self, event: &Event) -> Result<Option<ReconciledOrder>> {
        match event.kind.as_str() {
            EVENT_CHECKOUT_COMPLETED => {
                let session: CompletedSession =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        AppError::MetadataCorrupt(format!("malformed session object: {e}"))
                    })?;
                let reconciled = self.reconcile_session(&session).await?;
                Ok(Some(reconciled))
            }
            EVENT_PAYMENT_SUCCEEDED => {
                let intent_id = event
                    .data
                    .object
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or("<unknown>");
                tracing::info!(payment_intent = intent_id, "payment intent succeeded");
                Ok(None)
            }
            other => {
                tracing::info!(event_kind = other, "unhandled event type");
                Ok(None)
            }
        }
    }

    /// Materialize the records for one completed checkout session.
    #[instrument(skip_all, fields(session_id = %session.id))]
    async fn reconcile_session(&self, session: &CompletedSession) -> Result<ReconciledOrder> {
        let intent = extract_order_intent(session)?;

        // 1. PaymentRecord
        let payment: Record = self
            .datastore
            .create(
                collections::PAYMENTS,
                &json!({
                    "stripePaymentId": intent.gateway_payment_id,
                    "amount": intent.amount,
                    "currency": intent.currency,
                    "method": intent.method,
                    "status": PaymentStatus::Completed,
                }),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "payment write failed"))?;
        let payment_id = PaymentId::new(payment.id);

        // 2. Order, referencing the payment
        let order: Record = self
            .datastore
            .create(
                collections::ORDERS,
                &json!({
                    "user": intent.user_id,
                    "status": OrderStatus::Pending,
                    "total": intent.amount,
                    "paymentId": payment_id,
                    "paymentStatus": OrderPaymentStatus::Paid,
                    "shippingMethod": intent.shipping_method,
                    "shippingCost": intent.shipping_cost,
                }),
            )
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, payment_id = %payment_id, "order write failed");
            })?;
        let order_id = OrderId::new(order.id);

        // 3. OrderItems, concurrently; all must land before success
        let item_writes = intent.items.iter().map(|item| {
            let fields = json!({
                "order": order_id,
                "product": item.id,
                "quantity": item.quantity,
                "price": item.price,
            });
            async move {
                self.datastore
                    .create::<Record>(collections::ORDER_ITEMS, &fields)
                    .await
            }
        });
        let order_item_ids = try_join_all(item_writes)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, order_id = %order_id, "order item write failed");
            })?
            .into_iter()
            .map(|record| OrderItemId::new(record.id))
            .collect();

        // 4. ShippingAddress, when one was resolved
        let shipping_address_id = match &intent.shipping_address {
            Some(address) => {
                let mut fields = serde_json::to_value(address)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                if let Some(map) = fields.as_object_mut() {
                    map.insert("order".to_string(), json!(order_id));
                    map.insert("user".to_string(), json!(intent.user_id));
                }
                let record: Record = self
                    .datastore
                    .create(collections::SHIPPING_ADDRESSES, &fields)
                    .await
                    .inspect_err(|e| {
                        tracing::error!(error = %e, order_id = %order_id, "address write failed");
                    })?;
                Some(AddressId::new(record.id))
            }
            None => None,
        };

        tracing::info!(order_id = %order_id, payment_id = %payment_id, "order created");

        Ok(ReconciledOrder {
            payment_id,
            order_id,
            order_item_ids,
            shipping_address_id,
        })
    }
}

/// Pull the original order intent out of the metadata bag and event payload.
fn extract_order_intent(session: &CompletedSession) -> Result<OrderIntent> {
    let user_id = session
        .metadata
        .get("userId")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::MetadataCorrupt("missing userId".to_string()))?
        .clone();

    let items: Vec<OrderItemSummary> = session
        .metadata
        .get("orderItems")
        .ok_or_else(|| AppError::MetadataCorrupt("missing orderItems".to_string()))
        .and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| AppError::MetadataCorrupt(format!("unparsable orderItems: {e}")))
        })?;

    let amount_total = session
        .amount_total
        .ok_or_else(|| AppError::MetadataCorrupt("missing amount_total".to_string()))?;

    let shipping_address = resolve_shipping_address(session)?;

    Ok(OrderIntent {
        user_id,
        items,
        amount: from_cents(amount_total),
        currency: session.currency.clone().unwrap_or_else(|| "usd".to_string()),
        method: session
            .payment_method_types
            .first()
            .cloned()
            .unwrap_or_else(|| "card".to_string()),
        gateway_payment_id: session.payment_intent.clone().unwrap_or_default(),
        shipping_method: session
            .shipping_cost
            .as_ref()
            .and_then(|cost| cost.display_name.clone())
            .unwrap_or_else(|| DEFAULT_SHIPPING_METHOD.to_string()),
        shipping_cost: from_cents(
            session
                .shipping_cost
                .as_ref()
                .and_then(|cost| cost.amount_total)
                .unwrap_or(0),
        ),
        shipping_address,
    })
}

/// The metadata address wins; otherwise synthesize one from the gateway's
/// collected shipping details. `None` means skip the address write.
fn resolve_shipping_address(session: &CompletedSession) -> Result<Option<ShippingAddress>> {
    if let Some(raw) = session.metadata.get("shippingAddress") {
        let address = serde_json::from_str(raw)
            .map_err(|e| AppError::MetadataCorrupt(format!("unparsable shippingAddress: {e}")))?;
        return Ok(Some(address));
    }

    let Some(details) = &session.shipping_details else {
        return Ok(None);
    };
    let address = details.address.clone().unwrap_or_default();

    Ok(Some(ShippingAddress {
        name: details.name.clone().unwrap_or_default(),
        line1: address.line1.unwrap_or_default(),
        line2: address.line2.unwrap_or_default(),
        city: address.city.unwrap_or_default(),
        state: address.state.unwrap_or_default(),
        postal_code: address.postal_code.unwrap_or_default(),
        country: address.country.unwrap_or_default(),
        phone: details.phone.clone().unwrap_or_default(),
    }))
}
