use actix_web::{
    body::MessageBody,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use checkout_engine::db_types::Roles;
use chrono::Duration;
use log::debug;
use scs_common::Secret;

use crate::{auth::TokenIssuer, config::AuthConfig, middleware::JwtAuthMiddlewareFactory};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this key anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("e9e767cc94a87f6d67db54f709550e1e1e3d6a29b6b1909ab3c0cc5a439288d4".to_string()),
    }
}

pub fn issue_token(sub: i64, roles: Roles) -> String {
    let signer = TokenIssuer::new(&get_auth_config());
    signer.issue_token(sub, roles, Some(Duration::days(1))).expect("Failed to sign token")
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_auth_header(TestRequest::get().uri(path), auth_header);
    send_request(req, configure).await
}

pub async fn post_request(
    auth_header: &str,
    path: &str,
    body: String,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_auth_header(TestRequest::post().uri(path), auth_header)
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(body);
    send_request(req, configure).await
}

pub async fn delete_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_auth_header(TestRequest::delete().uri(path), auth_header);
    send_request(req, configure).await
}

fn with_auth_header(req: TestRequest, auth_header: &str) -> TestRequest {
    if auth_header.is_empty() {
        req
    } else {
        req.insert_header((header::AUTHORIZATION, format!("Bearer {auth_header}")))
    }
}

async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = req.to_request();
    let config = get_auth_config();
    let app = App::new().wrap(JwtAuthMiddlewareFactory::new(&config)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
