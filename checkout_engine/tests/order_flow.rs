use checkout_engine::{
    db_types::*,
    events::EventProducers,
    order_objects::OrderUpdate,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seeds::{seed_address, seed_product, test_address, test_product},
    },
    CheckoutDatabase, CheckoutError, OrderFlowApi, OrderManagement, SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

async fn setup() -> OrderFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    OrderFlowApi::new(db, EventProducers::default())
}

async fn tear_down(mut api: OrderFlowApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

#[test]
fn create_order_totals_and_lines() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(1, "Teapot", 1999, 10), pool).await;
        let cosy = seed_product(&test_product(1, "Tea cosy", 500, 4), pool).await;

        let new_order =
            NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 2), NewOrderItem::new(cosy.id, 1)]);
        let order = api.process_new_order(new_order).await.expect("Error processing order");
        assert_eq!(order.order.buyer_id, 42);
        assert_eq!(order.order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        // 2 x 19.99 + 1 x 5.00
        assert_eq!(order.total_cost, Money::from_cents(4498));
        assert_eq!(order.items[0].cost, Money::from_cents(3998));
        assert_eq!(order.items[1].cost, Money::from_cents(500));
        // Stock is informational. Ordering must not consume it.
        let product = api.db().fetch_product(teapot.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
        tear_down(api).await;
    });
}

#[test]
fn create_order_rejects_excess_quantity() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let scarce = seed_product(&test_product(1, "Limited print", 2500, 3), pool).await;

        let new_order = NewOrder::new(42, vec![NewOrderItem::new(scarce.id, 5)]);
        let err = api.process_new_order(new_order).await.expect_err("Order should have been rejected");
        assert!(matches!(err, CheckoutError::InsufficientStock { requested: 5, in_stock: 3, .. }), "got {err}");
        // All or nothing: the failed order must leave no trace.
        let orders = api.db().fetch_orders_for_buyer(42).await.unwrap();
        assert!(orders.is_empty());
        tear_down(api).await;
    });
}

#[test]
fn create_order_rejects_duplicates_and_self_purchase() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(7, "Teapot", 1999, 10), pool).await;

        let dup = NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 1), NewOrderItem::new(teapot.id, 2)]);
        let err = api.process_new_order(dup).await.expect_err("Duplicate lines should be rejected");
        assert!(matches!(err, CheckoutError::DuplicateLineItem(id) if id == teapot.id), "got {err}");

        // Seller 7 buying their own product.
        let own_goods = NewOrder::new(7, vec![NewOrderItem::new(teapot.id, 1)]);
        let err = api.process_new_order(own_goods).await.expect_err("Self purchase should be rejected");
        assert!(matches!(err, CheckoutError::SelfPurchaseForbidden(id) if id == teapot.id), "got {err}");

        let orders = api.db().fetch_orders_for_buyer(42).await.unwrap();
        assert!(orders.is_empty());
        tear_down(api).await;
    });
}

#[test]
fn update_order_is_positional() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(1, "Teapot", 1999, 10), pool).await;
        let cosy = seed_product(&test_product(1, "Tea cosy", 500, 4), pool).await;
        let strainer = seed_product(&test_product(1, "Strainer", 250, 9), pool).await;

        let new_order =
            NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 2), NewOrderItem::new(cosy.id, 1)]);
        let order = api.process_new_order(new_order).await.expect("Error processing order");
        let id = order.order.id;

        // First supplied item lands on the oldest line.
        let update = OrderUpdate::default().with_items(vec![NewOrderItem::new(strainer.id, 3)]);
        let updated = api.update_order(id, update).await.expect("Error updating order");
        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.items[0].product_id, strainer.id);
        assert_eq!(updated.items[0].quantity, 3);
        assert_eq!(updated.items[1].product_id, cosy.id);
        // 3 x 2.50 + 1 x 5.00
        assert_eq!(updated.total_cost, Money::from_cents(1250));

        // More items than the order has lines.
        let update = OrderUpdate::default().with_items(vec![
            NewOrderItem::new(teapot.id, 1),
            NewOrderItem::new(cosy.id, 1),
            NewOrderItem::new(strainer.id, 1),
        ]);
        let err = api.update_order(id, update).await.expect_err("Update should have been rejected");
        assert!(matches!(err, CheckoutError::TooManyItems { supplied: 3, existing: 2, .. }), "got {err}");

        // Moving a line onto a product another line already holds.
        let update = OrderUpdate::default().with_items(vec![NewOrderItem::new(cosy.id, 1)]);
        let err = api.update_order(id, update).await.expect_err("Duplicate should have been rejected");
        assert!(matches!(err, CheckoutError::DuplicateLineItem(p) if p == cosy.id), "got {err}");
        tear_down(api).await;
    });
}

#[test]
fn update_order_sets_addresses_until_completed() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(1, "Teapot", 1999, 10), pool).await;
        let home = seed_address(&test_address(42), pool).await;

        let order = api
            .process_new_order(NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 1)]))
            .await
            .expect("Error processing order");
        let id = order.order.id;
        assert!(order.order.shipping_address_id.is_none());

        let update = OrderUpdate::default().with_shipping_address(home.id).with_billing_address(home.id);
        let updated = api.update_order(id, update).await.expect("Error updating order");
        assert_eq!(updated.order.shipping_address_id, Some(home.id));
        assert_eq!(updated.order.billing_address_id, Some(home.id));

        let update = OrderUpdate::default().with_shipping_address(9999);
        let err = api.update_order(id, update).await.expect_err("Bogus address should have been rejected");
        assert!(matches!(err, CheckoutError::AddressNotFound(9999)), "got {err}");

        // Completed orders are immutable.
        api.create_payment(NewPayment::new(id, PaymentOption::Stripe)).await.unwrap();
        api.db().apply_terminal_status(id, PaymentStatus::Completed, "evt_1").await.unwrap();
        let update = OrderUpdate::default().with_items(vec![NewOrderItem::new(teapot.id, 2)]);
        let err = api.update_order(id, update).await.expect_err("Completed order should reject updates");
        assert!(matches!(err, CheckoutError::OrderNotPending(oid) if oid == id), "got {err}");
        tear_down(api).await;
    });
}

#[test]
fn delete_order_cascades() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(1, "Teapot", 1999, 10), pool).await;

        let order = api
            .process_new_order(NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 1)]))
            .await
            .expect("Error processing order");
        let id = order.order.id;
        api.create_payment(NewPayment::new(id, PaymentOption::Stripe)).await.unwrap();

        let deleted = api.delete_order(id).await.expect("Error deleting order");
        assert_eq!(deleted.id, id);
        assert!(api.db().fetch_order(id).await.unwrap().is_none());
        assert!(api.db().fetch_payment_for_order(id).await.unwrap().is_none());
        assert!(api.db().fetch_order_items(id).await.unwrap().is_empty());

        // A completed order cannot be deleted.
        let order = api
            .process_new_order(NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 1)]))
            .await
            .expect("Error processing order");
        let id = order.order.id;
        api.create_payment(NewPayment::new(id, PaymentOption::Stripe)).await.unwrap();
        api.db().apply_terminal_status(id, PaymentStatus::Completed, "evt_done").await.unwrap();
        let err = api.delete_order(id).await.expect_err("Completed order should not be deletable");
        assert!(matches!(err, CheckoutError::OrderNotPending(oid) if oid == id), "got {err}");
        tear_down(api).await;
    });
}

#[test]
fn one_payment_per_order() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(1, "Teapot", 1999, 10), pool).await;

        let order = api
            .process_new_order(NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 1)]))
            .await
            .expect("Error processing order");
        let id = order.order.id;

        let payment = api.create_payment(NewPayment::new(id, PaymentOption::Stripe)).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.payment_option, PaymentOption::Stripe);
        assert!(payment.event_id.is_none());

        let err = api
            .create_payment(NewPayment::new(id, PaymentOption::Paypal))
            .await
            .expect_err("Second payment should be rejected");
        assert!(matches!(err, CheckoutError::OrderAlreadyHasPayment(oid) if oid == id), "got {err}");

        let err =
            api.create_payment(NewPayment::new(OrderId::from(999), PaymentOption::Stripe)).await.expect_err("No order");
        assert!(matches!(err, CheckoutError::OrderNotFound(_)), "got {err}");
        tear_down(api).await;
    });
}

#[test]
fn checkout_preconditions() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(1, "Teapot", 1999, 10), pool).await;
        let home = seed_address(&test_address(42), pool).await;

        let order = api
            .process_new_order(NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 1)]))
            .await
            .expect("Error processing order");
        let id = order.order.id;

        let err = api.prepare_checkout(id).await.expect_err("No payment yet");
        assert!(matches!(err, CheckoutError::PaymentNotFound(oid) if oid == id), "got {err}");

        // A pending payment is not enough. Both addresses must be set too.
        api.create_payment(NewPayment::new(id, PaymentOption::Stripe)).await.unwrap();
        let err = api.prepare_checkout(id).await.expect_err("No shipping address yet");
        assert!(matches!(err, CheckoutError::ShippingAddressNotSet(oid) if oid == id), "got {err}");

        let update = OrderUpdate::default().with_shipping_address(home.id);
        api.update_order(id, update).await.expect("Error updating order");
        let err = api.prepare_checkout(id).await.expect_err("No billing address yet");
        assert!(matches!(err, CheckoutError::BillingAddressNotSet(oid) if oid == id), "got {err}");

        let update = OrderUpdate::default().with_billing_address(home.id);
        api.update_order(id, update).await.expect("Error updating order");
        let ready = api.prepare_checkout(id).await.expect("Order should be ready for checkout");
        assert_eq!(ready.items.len(), 1);
        assert_eq!(ready.items[0].name, "Teapot");

        // Paid orders cannot be checked out again.
        api.db().apply_terminal_status(id, PaymentStatus::Completed, "evt_paid").await.unwrap();
        let err = api.prepare_checkout(id).await.expect_err("Completed payment should block checkout");
        assert!(matches!(err, CheckoutError::PaymentAlreadyCompleted(oid) if oid == id), "got {err}");
        tear_down(api).await;
    });
}

#[test]
fn orders_for_buyer_come_newest_first() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let pool = api.db().pool();
        let teapot = seed_product(&test_product(1, "Teapot", 1999, 100), pool).await;

        let mut ids = vec![];
        for _ in 0..3 {
            let order = api
                .process_new_order(NewOrder::new(42, vec![NewOrderItem::new(teapot.id, 1)]))
                .await
                .expect("Error processing order");
            ids.push(order.order.id);
        }
        let orders = api.db().fetch_orders_for_buyer(42).await.unwrap();
        let fetched = orders.iter().map(|o| o.id).collect::<Vec<_>>();
        ids.reverse();
        assert_eq!(fetched, ids);
        tear_down(api).await;
    });
}
