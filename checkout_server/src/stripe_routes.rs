//----------------------------------------------   Gateway webhooks  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use checkout_engine::{
    db_types::{OrderId, PaymentStatus},
    traits::{CheckoutDatabase, CheckoutError},
    OrderFlowApi,
};
use log::{debug, error, info, trace, warn};
use stripe_tools::{construct_event, StripeApi, WebhookEvent, CHECKOUT_SESSION_COMPLETED, SIGNATURE_HEADER};

use crate::{data_objects::JsonResponse, route};

route!(stripe_webhook => Post "/stripe" impl CheckoutDatabase);
/// Route handler for the payment gateway webhook.
///
/// The gateway reports checkout results here. The raw body is needed for signature verification, so the payload is
/// taken as a `String` and only parsed once the signature checks out. Requests that fail verification are rejected
/// outright. Everything else gets acknowledged with a 200 so the gateway stops redelivering, except backend
/// failures, where a retry can actually succeed later.
pub async fn stripe_webhook<B: CheckoutDatabase>(
    req: HttpRequest,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
    stripe: web::Data<StripeApi>,
) -> HttpResponse {
    trace!("🛍️️ Received webhook request: {}", req.uri());
    let sig_header = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let event = match construct_event(&body, sig_header, stripe.config().webhook_secret.reveal()) {
        Ok(event) => event,
        Err(e) => {
            warn!("🛍️️ Webhook signature verification failed. {e}");
            return HttpResponse::BadRequest().json(JsonResponse::failure("Invalid signature."));
        },
    };
    if !event.is_checkout_event() {
        debug!("🛍️️ Ignoring event {} of type {}.", event.id, event.event_type);
        return HttpResponse::Ok().json(JsonResponse::success("Event ignored."));
    }
    let WebhookEvent { id: event_id, event_type, data } = event;
    let new_status =
        if event_type == CHECKOUT_SESSION_COMPLETED { PaymentStatus::Completed } else { PaymentStatus::Failed };
    let session = data.object;
    let order_id = match session.order_id() {
        Ok(id) => OrderId::from(id),
        Err(e) => {
            warn!("🛍️️ Webhook event {event_id} carries no usable order id. {e}");
            return HttpResponse::BadRequest().json(JsonResponse::failure("Missing order id in session metadata."));
        },
    };
    let buyer_email = session.customer_email().map(String::from);
    let result = match api.process_gateway_event(order_id, new_status, &event_id, buyer_email).await {
        Ok(outcome) if outcome.is_applied() => {
            info!("🛍️️ Payment for order {order_id} reconciled as {new_status} by event {event_id}.");
            JsonResponse::success("Payment reconciled.")
        },
        Ok(_) => {
            info!("🛍️️ Event {event_id} for order {order_id} was already processed.");
            JsonResponse::success("Event already processed.")
        },
        Err(CheckoutError::PaymentAlreadyFinalized { order_id, current, requested }) => {
            warn!("🛍️️ Order {order_id} payment is {current} but event {event_id} reports {requested}.");
            JsonResponse::failure("Conflicting payment result. Manual review required.")
        },
        Err(e @ CheckoutError::PaymentNotFound(_)) | Err(e @ CheckoutError::OrderNotFound(_)) => {
            warn!("🛍️️ Webhook event {event_id} does not match a local order. {e}");
            JsonResponse::failure("Unknown order.")
        },
        Err(CheckoutError::DatabaseError(e)) => {
            error!("🛍️️ Could not reconcile event {event_id}. {e}");
            return HttpResponse::InternalServerError().json(JsonResponse::failure("Temporary failure. Please retry."));
        },
        Err(e) => {
            warn!("🛍️️ Unexpected error while reconciling event {event_id}. {e}");
            JsonResponse::failure("Unexpected error handling event.")
        },
    };
    HttpResponse::Ok().json(result)
}
