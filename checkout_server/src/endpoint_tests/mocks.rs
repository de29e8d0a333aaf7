use checkout_engine::{
    db_types::{Address, NewOrder, NewPayment, Order, OrderId, OrderItemLine, Payment, PaymentStatus, Product},
    order_objects::{OrderQueryFilter, OrderUpdate},
    traits::{CheckoutDatabase, CheckoutError, OrderManagement, ReconciliationOutcome},
};
use mockall::mock;

mock! {
    pub CheckoutManager {}

    impl Clone for CheckoutManager {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for CheckoutManager {
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, CheckoutError>;
        async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, CheckoutError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CheckoutError>;
        async fn fetch_order_items(&self, id: OrderId) -> Result<Vec<OrderItemLine>, CheckoutError>;
        async fn fetch_payment_for_order(&self, id: OrderId) -> Result<Option<Payment>, CheckoutError>;
        async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CheckoutError>;
        async fn fetch_address(&self, id: i64) -> Result<Option<Address>, CheckoutError>;
    }

    impl CheckoutDatabase for CheckoutManager {
        fn url(&self) -> &str;
        async fn create_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItemLine>), CheckoutError>;
        async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<(Order, Vec<OrderItemLine>), CheckoutError>;
        async fn delete_order(&self, id: OrderId) -> Result<Order, CheckoutError>;
        async fn create_payment(&self, payment: NewPayment) -> Result<Payment, CheckoutError>;
        async fn apply_terminal_status(&self, order_id: OrderId, new_status: PaymentStatus, event_id: &str) -> Result<ReconciliationOutcome, CheckoutError>;
    }
}
