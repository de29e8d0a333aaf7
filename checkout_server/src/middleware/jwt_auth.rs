//! Bearer token authentication middleware.
//!
//! The `/api` scope is wrapped with this middleware. It pulls the bearer token out of the `Authorization` header,
//! validates it with [`TokenIssuer`], and stores the resulting [`JwtClaims`](crate::auth::JwtClaims) in the request
//! extensions, where handlers and the ACL middleware pick them up. Requests without a valid token never reach a
//! handler.

use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::debug;

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub struct JwtAuthMiddlewareFactory {
    validator: TokenIssuer,
}

impl JwtAuthMiddlewareFactory {
    pub fn new(config: &AuthConfig) -> Self {
        JwtAuthMiddlewareFactory { validator: TokenIssuer::new(config) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtAuthMiddlewareService { validator: self.validator.clone(), service: Rc::new(service) })
    }
}

pub struct JwtAuthMiddlewareService<S> {
    validator: TokenIssuer,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = self.validator.clone();
        Box::pin(async move {
            let header_value = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
            let token = match header_value.and_then(|v| v.strip_prefix("Bearer ")) {
                Some(token) => token,
                None => {
                    debug!("🔐️ No bearer token attached to {}", req.path());
                    return Err(ServerError::AuthenticationError(AuthError::MissingToken).into());
                },
            };
            let claims = validator.validate_token(token).map_err(|e| {
                debug!("🔐️ Rejecting token for {}. {e}", req.path());
                ServerError::from(e)
            })?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
