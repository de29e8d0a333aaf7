use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use checkout_engine::{
    db_types::{Order, OrderId, OrderStatus, Payment, PaymentOption, PaymentStatus},
    events::EventProducers,
    traits::{CheckoutError, ReconciliationOutcome},
    OrderFlowApi,
};
use chrono::{TimeZone, Utc};
use scs_common::Secret;
use stripe_tools::{sign_payload, StripeApi, StripeConfig, SIGNATURE_HEADER};

use crate::{endpoint_tests::mocks::MockCheckoutManager, stripe_routes::StripeWebhookRoute};

const TEST_WEBHOOK_SECRET: &str = "whsec_test_4kuzRemNgrGYcF9MSNTk";

const COMPLETED_PAYLOAD: &str = r#"{
  "id": "evt_1PErdGGHcXbBFGh2ZrfT8Nwi",
  "type": "checkout.session.completed",
  "data": {
    "object": {
      "id": "cs_test_a1VHFUz7aYnsywvmslhFfhiUCCYDmxtI",
      "metadata": { "order_id": "1" },
      "customer_details": { "email": "alice@example.com" }
    }
  }
}"#;

const FAILED_PAYLOAD: &str = r#"{
  "id": "evt_2QFseHGHcXbBFGh2Zs9T2Mxj",
  "type": "checkout.session.async_payment_failed",
  "data": {
    "object": {
      "id": "cs_test_a1VHFUz7aYnsywvmslhFfhiUCCYDmxtI",
      "metadata": { "order_id": "1" },
      "customer_details": { "email": "alice@example.com" }
    }
  }
}"#;

#[actix_web::test]
async fn completed_event_reconciles_payment() {
    let _ = env_logger::try_init().ok();
    let sig = sign_payload(COMPLETED_PAYLOAD, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(COMPLETED_PAYLOAD, &sig, configure_applied).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment reconciled."}"#);
}

#[actix_web::test]
async fn failed_payment_event_reconciles_payment() {
    let _ = env_logger::try_init().ok();
    let sig = sign_payload(FAILED_PAYLOAD, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(FAILED_PAYLOAD, &sig, configure_applied_failed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment reconciled."}"#);
}

#[actix_web::test]
async fn rejects_bad_signature() {
    let _ = env_logger::try_init().ok();
    let sig = sign_payload(COMPLETED_PAYLOAD, "whsec_somebody_else", Utc::now().timestamp());
    let (status, body) = post_webhook(COMPLETED_PAYLOAD, &sig, configure_no_reconcile).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"success":false,"message":"Invalid signature."}"#);
}

#[actix_web::test]
async fn acknowledges_and_ignores_unrelated_events() {
    let _ = env_logger::try_init().ok();
    let payload = COMPLETED_PAYLOAD.replace("checkout.session.completed", "payment_intent.succeeded");
    let sig = sign_payload(&payload, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(&payload, &sig, configure_no_reconcile).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Event ignored."}"#);
}

#[actix_web::test]
async fn rejects_session_without_order_metadata() {
    let _ = env_logger::try_init().ok();
    let payload = COMPLETED_PAYLOAD.replace(r#""metadata": { "order_id": "1" },"#, r#""metadata": {},"#);
    let sig = sign_payload(&payload, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(&payload, &sig, configure_no_reconcile).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"success":false,"message":"Missing order id in session metadata."}"#);
}

#[actix_web::test]
async fn acknowledges_replayed_event() {
    let _ = env_logger::try_init().ok();
    let sig = sign_payload(COMPLETED_PAYLOAD, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(COMPLETED_PAYLOAD, &sig, configure_replay).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Event already processed."}"#);
}

#[actix_web::test]
async fn acknowledges_conflicting_result() {
    let _ = env_logger::try_init().ok();
    let sig = sign_payload(COMPLETED_PAYLOAD, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(COMPLETED_PAYLOAD, &sig, configure_conflict).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Conflicting payment result. Manual review required."}"#);
}

#[actix_web::test]
async fn acknowledges_unknown_order() {
    let _ = env_logger::try_init().ok();
    let sig = sign_payload(COMPLETED_PAYLOAD, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(COMPLETED_PAYLOAD, &sig, configure_unknown_order).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Unknown order."}"#);
}

#[actix_web::test]
async fn backend_failure_asks_for_retry() {
    let _ = env_logger::try_init().ok();
    let sig = sign_payload(COMPLETED_PAYLOAD, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    let (status, body) = post_webhook(COMPLETED_PAYLOAD, &sig, configure_db_error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"success":false,"message":"Temporary failure. Please retry."}"#);
}

async fn post_webhook(payload: &str, sig_header: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = TestRequest::post()
        .uri("/stripe")
        .insert_header((SIGNATURE_HEADER, sig_header))
        .set_payload(payload.to_string())
        .to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::call_service(&service, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

fn register(cfg: &mut ServiceConfig, manager: MockCheckoutManager) {
    let api = OrderFlowApi::new(manager, EventProducers::default());
    let stripe = StripeApi::new(test_stripe_config()).expect("Stripe client should build");
    cfg.service(StripeWebhookRoute::<MockCheckoutManager>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(stripe));
}

fn test_stripe_config() -> StripeConfig {
    StripeConfig { webhook_secret: Secret::new(TEST_WEBHOOK_SECRET.to_string()), ..StripeConfig::default() }
}

fn configure_applied(cfg: &mut ServiceConfig) {
    let mut manager = MockCheckoutManager::new();
    manager.expect_apply_terminal_status().withf(|id, status, event_id| {
        *id == OrderId(1) && *status == PaymentStatus::Completed && event_id == "evt_1PErdGGHcXbBFGh2ZrfT8Nwi"
    }).returning(|_, _, _| {
        Ok(ReconciliationOutcome::Applied {
            order: order_fixture(OrderStatus::Completed),
            payment: payment_fixture(PaymentStatus::Completed),
        })
    });
    register(cfg, manager);
}

fn configure_applied_failed(cfg: &mut ServiceConfig) {
    let mut manager = MockCheckoutManager::new();
    manager
        .expect_apply_terminal_status()
        .withf(|_, status, _| *status == PaymentStatus::Failed)
        .returning(|_, _, _| {
            Ok(ReconciliationOutcome::Applied {
                order: order_fixture(OrderStatus::Pending),
                payment: payment_fixture(PaymentStatus::Failed),
            })
        });
    register(cfg, manager);
}

fn configure_no_reconcile(cfg: &mut ServiceConfig) {
    register(cfg, MockCheckoutManager::new());
}

fn configure_replay(cfg: &mut ServiceConfig) {
    let mut manager = MockCheckoutManager::new();
    manager
        .expect_apply_terminal_status()
        .returning(|_, _, _| Ok(ReconciliationOutcome::Replay { payment: payment_fixture(PaymentStatus::Completed) }));
    register(cfg, manager);
}

fn configure_conflict(cfg: &mut ServiceConfig) {
    let mut manager = MockCheckoutManager::new();
    manager.expect_apply_terminal_status().returning(|_, _, _| {
        Err(CheckoutError::PaymentAlreadyFinalized {
            order_id: OrderId(1),
            current: PaymentStatus::Failed,
            requested: PaymentStatus::Completed,
        })
    });
    register(cfg, manager);
}

fn configure_unknown_order(cfg: &mut ServiceConfig) {
    let mut manager = MockCheckoutManager::new();
    manager.expect_apply_terminal_status().returning(|_, _, _| Err(CheckoutError::PaymentNotFound(OrderId(1))));
    register(cfg, manager);
}

fn configure_db_error(cfg: &mut ServiceConfig) {
    let mut manager = MockCheckoutManager::new();
    manager
        .expect_apply_terminal_status()
        .returning(|_, _, _| Err(CheckoutError::DatabaseError("connection pool exhausted".to_string())));
    register(cfg, manager);
}

fn order_fixture(status: OrderStatus) -> Order {
    Order {
        id: OrderId(1),
        buyer_id: 1,
        status,
        shipping_address_id: Some(7),
        billing_address_id: Some(7),
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 5, 0).unwrap(),
    }
}

fn payment_fixture(status: PaymentStatus) -> Payment {
    Payment {
        id: 1,
        order_id: OrderId(1),
        status,
        payment_option: PaymentOption::Stripe,
        event_id: Some("evt_1PErdGGHcXbBFGh2ZrfT8Nwi".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 5, 0).unwrap(),
    }
}
