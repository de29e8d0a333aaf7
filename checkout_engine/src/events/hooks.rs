use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PaymentSucceededEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_succeeded_producer: Vec<EventProducer<PaymentSucceededEvent>>,
}

pub struct EventHandlers {
    pub on_payment_succeeded: Option<EventHandler<PaymentSucceededEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_succeeded = hooks.on_payment_succeeded.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_succeeded }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_succeeded {
            result.payment_succeeded_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_succeeded {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_succeeded: Option<Handler<PaymentSucceededEvent>>,
}

impl EventHooks {
    pub fn on_payment_succeeded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentSucceededEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_succeeded = Some(Arc::new(f));
        self
    }
}
