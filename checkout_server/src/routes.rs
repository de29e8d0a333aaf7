//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers run on actix worker threads, and each worker processes its requests sequentially. Never block the
//! current thread in a handler. Express all I/O (database calls, gateway requests) as futures so that workers can
//! interleave other requests while waiting.

use actix_web::{get, web, HttpResponse, Responder};
use checkout_engine::{
    db_types::{NewOrder, NewPayment, Order, OrderId, Role},
    order_objects::{OrderQueryFilter, OrderUpdate, OrderWithItems},
    traits::{CheckoutDatabase, OrderManagement},
    OrderFlowApi,
    OrderQueryApi,
};
use log::*;
use serde_json::json;
use stripe_tools::{LineItem, NewCheckoutSession, StripeApi, StripeConfig};

use crate::{
    auth::JwtClaims,
    data_objects::{NewOrderRequest, NewPaymentRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

/// Buyers may only act on their own orders. Admins may act on any order.
fn assert_order_access(claims: &JwtClaims, order: &Order) -> Result<(), ServerError> {
    if order.buyer_id == claims.sub || claims.is_admin() {
        Ok(())
    } else {
        debug!("💻️ Buyer {} may not access order {}", claims.sub, order.id);
        Err(ServerError::InsufficientPermissions(format!("Order {} does not belong to you.", order.id)))
    }
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(new_order => Post "/orders" impl CheckoutDatabase where requires [Role::User]);
/// Route handler for creating a new order.
///
/// The buyer id is taken from the access token, never from the request body, so a buyer can only ever open orders in
/// their own name. Item lines are validated against the live catalog: the products must exist, have enough stock,
/// and not be the buyer's own listings.
pub async fn new_order<B: CheckoutDatabase>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let NewOrderRequest { items } = body.into_inner();
    debug!("💻️ POST new order for buyer {} with {} item line(s)", claims.sub, items.len());
    let order = api.process_new_order(NewOrder::new(claims.sub, items)).await.map_err(|e| {
        debug!("💻️ Order creation failed. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderManagement where requires [Role::User]);
/// Route handler for the orders endpoint
///
/// Authenticated buyers fetch their own orders here. The buyer id comes from the access token. Admins can use the
/// `/orders/search` endpoint to query orders for any buyer.
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for buyer {}", claims.sub);
    let orders = api.orders_for_buyer(claims.sub).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(orders_search => Get "/orders/search" impl OrderManagement where requires [Role::Admin]);
pub async fn orders_search<B: OrderManagement>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders search for [{query}]");
    let query = query.into_inner();
    let orders = api.search_orders(query).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement where requires [Role::User]);
/// Use `/orders/{order_id}` to fetch a specific order, with its item lines and total, by its id.
///
/// Buyers can fetch their own orders. Requesting an order that belongs to someone else returns a 403. Admins can
/// fetch any order.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id})");
    let order = api.fetch_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    assert_order_access(&claims, &order.order)?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order => Put "/orders/{order_id}" impl CheckoutDatabase where requires [Role::User]);
/// Route handler for amending a pending order.
///
/// Buyers can replace the item lines or attach shipping and billing addresses while an order is still pending.
/// Closed orders reject every amendment with a 409.
pub async fn update_order<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<OrderUpdate>,
    api: web::Data<OrderFlowApi<B>>,
    query_api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let update = body.into_inner();
    debug!("💻️ PUT update_order({order_id})");
    let existing = query_api.fetch_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    assert_order_access(&claims, &existing.order)?;
    let order = api.update_order(order_id, update).await.map_err(|e| {
        debug!("💻️ Order update failed. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(delete_order => Delete "/orders/{order_id}" impl CheckoutDatabase where requires [Role::User]);
/// Route handler for cancelling a pending order.
///
/// Cancelling destroys the order together with its payment record and item lines, in one transaction. Orders that
/// have already completed return a 409 instead.
pub async fn delete_order<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
    query_api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ DELETE order({order_id})");
    let existing = query_api.fetch_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    assert_order_access(&claims, &existing.order)?;
    let order = api.delete_order(order_id).await.map_err(|e| {
        debug!("💻️ Order cancellation failed. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(new_payment => Post "/orders/{order_id}/payment" impl CheckoutDatabase where requires [Role::User]);
/// Route handler for attaching a payment to an order.
///
/// An order carries at most one payment. The payment starts out pending and only moves from there when the gateway
/// reports a result via webhook.
pub async fn new_payment<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<NewPaymentRequest>,
    api: web::Data<OrderFlowApi<B>>,
    query_api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let NewPaymentRequest { payment_option } = body.into_inner();
    debug!("💻️ POST new {payment_option} payment for order {order_id}");
    let existing = query_api.fetch_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    assert_order_access(&claims, &existing.order)?;
    let payment = api.create_payment(NewPayment::new(order_id, payment_option)).await.map_err(|e| {
        debug!("💻️ Payment creation failed. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(payment))
}

route!(payment_for_order => Get "/orders/{order_id}/payment" impl OrderManagement where requires [Role::User]);
pub async fn payment_for_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET payment for order {order_id}");
    let order = api.fetch_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    assert_order_access(&claims, &order.order)?;
    let payment = api.fetch_payment_for_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch payment. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(payment))
}

//----------------------------------------------   Checkout  ----------------------------------------------------

route!(checkout_session => Post "/orders/{order_id}/checkout-session" impl CheckoutDatabase where requires [Role::User]);
/// Route handler for opening a hosted checkout session for an order.
///
/// The order must be ready for checkout: pending, with shipping and billing addresses attached, and without a
/// completed payment. The gateway returns the hosted payment page URL and the buyer gets redirected there. Nothing
/// is recorded locally at this point. The payment result arrives later via webhook.
pub async fn checkout_session<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
    query_api: web::Data<OrderQueryApi<B>>,
    stripe: web::Data<StripeApi>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST checkout session for order {order_id}");
    let existing = query_api.fetch_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    assert_order_access(&claims, &existing.order)?;
    let order = api.prepare_checkout(order_id).await.map_err(|e| {
        debug!("💻️ Order {order_id} is not ready for checkout. {e}");
        e
    })?;
    let new_session = new_checkout_session(stripe.config(), &order);
    let session = stripe.create_checkout_session(&new_session).await.map_err(|e| {
        warn!("💻️ Could not create a checkout session for order {order_id}. {e}");
        ServerError::GatewayError(e.to_string())
    })?;
    Ok(HttpResponse::Created().json(json!({ "session_id": session.id, "url": session.url })))
}

fn new_checkout_session(config: &StripeConfig, order: &OrderWithItems) -> NewCheckoutSession {
    let line_items = order
        .items
        .iter()
        .map(|line| LineItem {
            name: line.name.clone(),
            description: line.description.clone(),
            // Catalog images are stored as server-relative paths. The gateway needs absolute URLs.
            image_url: format!("{}{}", config.backend_url, line.image),
            unit_amount: line.price,
            quantity: line.quantity,
        })
        .collect();
    NewCheckoutSession { order_id: order.order.id.value(), line_items }
}
