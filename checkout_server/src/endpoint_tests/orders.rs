use actix_web::{http::StatusCode, web, web::ServiceConfig};
use checkout_engine::{
    db_types::{Order, OrderId, OrderItemLine, OrderStatus, Payment, PaymentOption, PaymentStatus, Role},
    events::EventProducers,
    OrderFlowApi,
    OrderQueryApi,
};
use chrono::{TimeZone, Utc};
use log::debug;
use scs_common::Money;

use super::helpers::{delete_request, get_request, issue_token, post_request};
use crate::{
    endpoint_tests::mocks::MockCheckoutManager,
    routes::{
        DeleteOrderRoute,
        MyOrdersRoute,
        NewOrderRoute,
        NewPaymentRoute,
        OrderByIdRoute,
        OrdersSearchRoute,
        PaymentForOrderRoute,
    },
};

#[actix_web::test]
async fn fetch_my_orders_no_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/orders", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. No authentication token supplied.");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, vec![Role::User]);
    let (status, body) = get_request(&token, "/orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

#[actix_web::test]
async fn fetch_my_orders_invalid_sig() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token(1, vec![Role::User]);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    debug!("Calling /orders with tampered token {token}");
    let err = get_request(&token, "/orders", configure).await.expect_err("Expected error");
    assert!(err.contains("Access token signature is invalid"), "Unexpected error: {err}");
}

#[actix_web::test]
async fn fetch_order_with_items() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, vec![Role::User]);
    let (status, body) = get_request(&token, "/orders/1", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_WITH_ITEMS_JSON);
}

#[actix_web::test]
async fn fetch_order_belonging_to_another_buyer() {
    let _ = env_logger::try_init().ok();
    // Order 1 belongs to buyer 1
    let token = issue_token(2, vec![Role::User]);
    let (status, body) = get_request(&token, "/orders/1", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_any_order_as_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(99, vec![Role::User, Role::Admin]);
    let (status, body) = get_request(&token, "/orders/1", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_WITH_ITEMS_JSON);
}

#[actix_web::test]
async fn search_orders_needs_admin_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, vec![Role::User]);
    let err = get_request(&token, "/orders/search?buyer_id=1", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn search_orders_as_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(99, vec![Role::User, Role::Admin]);
    let (status, body) = get_request(&token, "/orders/search?buyer_id=1", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, vec![Role::User]);
    let body = r#"{"items":[{"product_id":10,"quantity":2}]}"#.to_string();
    let (status, body) = post_request(&token, "/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, ORDER_WITH_ITEMS_JSON);
}

#[actix_web::test]
async fn cancel_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, vec![Role::User]);
    let (status, body) = delete_request(&token, "/orders/1", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_JSON);
}

#[actix_web::test]
async fn attach_payment_to_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, vec![Role::User]);
    let body = r#"{"payment_option":"Stripe"}"#.to_string();
    let (status, body) = post_request(&token, "/orders/1/payment", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, PAYMENT_JSON);
}

#[actix_web::test]
async fn fetch_payment_for_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, vec![Role::User]);
    let (status, body) = get_request(&token, "/orders/1/payment", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, PAYMENT_JSON);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut manager = MockCheckoutManager::new();
    manager.expect_fetch_orders_for_buyer().returning(|_| Ok(orders_response()));
    manager.expect_search_orders().returning(|_| Ok(orders_response()));
    manager.expect_fetch_order().returning(|id| Ok(Some(order_fixture(id.value(), 1))));
    manager.expect_fetch_order_items().returning(|id| Ok(vec![item_fixture(id.value())]));
    manager.expect_fetch_payment_for_order().returning(|id| Ok(Some(payment_fixture(id.value()))));
    let query_api = OrderQueryApi::new(manager);

    let mut manager = MockCheckoutManager::new();
    manager.expect_create_order().returning(|order| Ok((order_fixture(1, order.buyer_id), vec![item_fixture(1)])));
    manager.expect_delete_order().returning(|id| Ok(order_fixture(id.value(), 1)));
    manager.expect_create_payment().returning(|payment| Ok(payment_fixture(payment.order_id.value())));
    let flow_api = OrderFlowApi::new(manager, EventProducers::default());

    cfg.service(NewOrderRoute::<MockCheckoutManager>::new())
        .service(MyOrdersRoute::<MockCheckoutManager>::new())
        .service(OrdersSearchRoute::<MockCheckoutManager>::new())
        .service(OrderByIdRoute::<MockCheckoutManager>::new())
        .service(DeleteOrderRoute::<MockCheckoutManager>::new())
        .service(NewPaymentRoute::<MockCheckoutManager>::new())
        .service(PaymentForOrderRoute::<MockCheckoutManager>::new())
        .app_data(web::Data::new(query_api))
        .app_data(web::Data::new(flow_api));
}

fn order_fixture(id: i64, buyer_id: i64) -> Order {
    Order {
        id: OrderId(id),
        buyer_id,
        status: OrderStatus::Pending,
        shipping_address_id: None,
        billing_address_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

fn item_fixture(order_id: i64) -> OrderItemLine {
    OrderItemLine {
        id: 1,
        order_id: OrderId(order_id),
        product_id: 10,
        name: "Teapot".to_string(),
        description: "Stout and squat".to_string(),
        image: "/images/teapot.png".to_string(),
        quantity: 2,
        price: Money::from_cents(4800),
        cost: Money::from_cents(9600),
    }
}

fn payment_fixture(order_id: i64) -> Payment {
    Payment {
        id: 1,
        order_id: OrderId(order_id),
        status: PaymentStatus::Pending,
        payment_option: PaymentOption::Stripe,
        event_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 0, 0).unwrap(),
    }
}

// Mock response to `fetch_orders_for_buyer` and `search_orders` calls
fn orders_response() -> Vec<Order> {
    vec![order_fixture(1, 1), Order {
        id: OrderId(2),
        buyer_id: 1,
        status: OrderStatus::Completed,
        shipping_address_id: Some(7),
        billing_address_id: Some(7),
        created_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 16, 11, 20, 0).unwrap(),
    }]
}

const ORDER_JSON: &str = r#"{"id":1,"buyer_id":1,"status":"Pending","shipping_address_id":null,"billing_address_id":null,"created_at":"2024-02-29T13:30:00Z","updated_at":"2024-02-29T13:30:00Z"}"#;

const ORDERS_JSON: &str = r#"[{"id":1,"buyer_id":1,"status":"Pending","shipping_address_id":null,"billing_address_id":null,"created_at":"2024-02-29T13:30:00Z","updated_at":"2024-02-29T13:30:00Z"},{"id":2,"buyer_id":1,"status":"Completed","shipping_address_id":7,"billing_address_id":7,"created_at":"2024-03-15T18:30:00Z","updated_at":"2024-03-16T11:20:00Z"}]"#;

const ORDER_WITH_ITEMS_JSON: &str = r#"{"order":{"id":1,"buyer_id":1,"status":"Pending","shipping_address_id":null,"billing_address_id":null,"created_at":"2024-02-29T13:30:00Z","updated_at":"2024-02-29T13:30:00Z"},"items":[{"id":1,"order_id":1,"product_id":10,"name":"Teapot","description":"Stout and squat","image":"/images/teapot.png","quantity":2,"price":4800,"cost":9600}],"total_cost":9600}"#;

const PAYMENT_JSON: &str = r#"{"id":1,"order_id":1,"status":"Pending","payment_option":"Stripe","event_id":null,"created_at":"2024-02-29T14:00:00Z","updated_at":"2024-02-29T14:00:00Z"}"#;
