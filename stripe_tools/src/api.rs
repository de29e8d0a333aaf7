use std::sync::Arc;

use log::*;
use reqwest::Client;
use scs_common::USD_CURRENCY_CODE_LOWER;
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{CheckoutSession, NewCheckoutSession},
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Send a form-encoded POST to the Stripe API. Stripe takes `application/x-www-form-urlencoded` bodies with
    /// bracketed keys for nested fields, and the secret key as a basic-auth username with an empty password.
    pub async fn form_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending Stripe query: {url}");
        let response = self
            .client
            .post(url)
            .basic_auth(self.config.secret_key.reveal(), Some(""))
            .form(params)
            .send()
            .await
            .map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Stripe query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Open a hosted checkout session for an order. The order id travels in the session metadata and comes back to
    /// us in the completion webhook. No local state is touched here.
    pub async fn create_checkout_session(
        &self,
        new_session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeApiError> {
        let params = checkout_session_params(&self.config, new_session);
        debug!("Creating checkout session for order #{}", new_session.order_id);
        let session = self.form_query::<CheckoutSession>("/v1/checkout/sessions", &params).await?;
        info!("Created checkout session {} for order #{}", session.id, new_session.order_id);
        Ok(session)
    }
}

/// Flatten a [`NewCheckoutSession`] into Stripe's bracketed form-parameter scheme.
pub fn checkout_session_params(config: &StripeConfig, new_session: &NewCheckoutSession) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("metadata[order_id]".to_string(), new_session.order_id.to_string()),
        ("success_url".to_string(), config.success_url.clone()),
        ("cancel_url".to_string(), config.cancel_url.clone()),
    ];
    for (i, item) in new_session.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        params.push((format!("{prefix}[price_data][currency]"), USD_CURRENCY_CODE_LOWER.to_string()));
        params.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.value().to_string()));
        params.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
        if !item.description.is_empty() {
            params.push((format!("{prefix}[price_data][product_data][description]"), item.description.clone()));
        }
        params.push((format!("{prefix}[price_data][product_data][images][0]"), item.image_url.clone()));
        params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }
    params
}
