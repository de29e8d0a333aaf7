use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_engine::{
    events::{EventHandlers, EventProducers},
    sqlite::db::run_migrations,
    OrderFlowApi,
    OrderQueryApi,
    SqliteDatabase,
};
use log::warn;
use stripe_tools::StripeApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    mailer::{payment_hooks, EmailService},
    middleware::JwtAuthMiddlewareFactory,
    routes::{
        health,
        CheckoutSessionRoute,
        DeleteOrderRoute,
        MyOrdersRoute,
        NewOrderRoute,
        NewPaymentRoute,
        OrderByIdRoute,
        OrdersSearchRoute,
        PaymentForOrderRoute,
        UpdateOrderRoute,
    },
    stripe_routes::StripeWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let email = config.email.as_ref().and_then(|email_config| match EmailService::new(email_config) {
        Ok(service) => Some(service),
        Err(e) => {
            warn!("🪛️ Could not initialize the email service. Notifications are disabled. {e}");
            None
        },
    });
    let handlers = EventHandlers::new(25, payment_hooks(email));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let stripe_api = StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let query_api = OrderQueryApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("scs::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(stripe_api.clone()));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtAuthMiddlewareFactory::new(&config.auth))
            .service(NewOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            // Literal paths must be registered ahead of the `/orders/{order_id}` pattern
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderRoute::<SqliteDatabase>::new())
            .service(DeleteOrderRoute::<SqliteDatabase>::new())
            .service(NewPaymentRoute::<SqliteDatabase>::new())
            .service(PaymentForOrderRoute::<SqliteDatabase>::new())
            .service(CheckoutSessionRoute::<SqliteDatabase>::new());
        // Gateway deliveries authenticate with a signature over the raw body, not a bearer token
        let webhook_scope = web::scope("/webhook").service(StripeWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(auth_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
