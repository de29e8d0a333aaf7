//! Payment confirmation mail.
//!
//! The engine fires a payment-succeeded event exactly once per reconciled payment. This module subscribes to that
//! event and sends the buyer a confirmation email over SMTP. When no SMTP host is configured the hook is simply not
//! installed and payments reconcile without any mail being sent.

use std::{future::Future, pin::Pin, sync::Arc};

use checkout_engine::events::EventHooks;
use lettre::{
    message::Mailbox,
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
};
use log::{error, info};
use thiserror::Error;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),
    #[error("Could not build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(config.smtp_username.clone(), config.smtp_password.reveal().clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();
        Ok(Self { mailer, from_address: config.from_address.clone() })
    }

    pub async fn send_payment_confirmation(&self, to: &str) -> Result<(), EmailError> {
        let from = self.from_address.parse::<Mailbox>().map_err(|e| EmailError::InvalidAddress(e.to_string()))?;
        let to = to.parse::<Mailbox>().map_err(|e| EmailError::InvalidAddress(e.to_string()))?;
        let email = Message::builder()
            .from(from)
            .to(to)
            .subject("Payment Successful")
            .body("Thank you for purchasing our product!".to_string())?;
        self.mailer.send(email).await?;
        Ok(())
    }
}

/// Build the engine event hooks for this server. With no email service, the hook set is empty and the engine runs
/// without side effects on reconciliation.
pub fn payment_hooks(email: Option<EmailService>) -> EventHooks {
    let mut hooks = EventHooks::default();
    match email {
        Some(service) => {
            let service = Arc::new(service);
            hooks.on_payment_succeeded(move |event| {
                let mailer = Arc::clone(&service);
                Box::pin(async move {
                    match event.buyer_email {
                        Some(address) => match mailer.send_payment_confirmation(&address).await {
                            Ok(()) => {
                                info!("🪝️ Payment confirmation for order {} sent to {address}", event.order.id)
                            },
                            Err(e) => {
                                error!("🪝️ Could not send payment confirmation to {address}. {e}")
                            },
                        },
                        None => info!(
                            "🪝️ Payment for order {} succeeded, but the gateway reported no buyer email",
                            event.order.id
                        ),
                    }
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            });
        },
        None => info!("🪝️ Email notifications are disabled. Payment confirmations will not be sent."),
    }
    hooks
}
