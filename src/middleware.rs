use crate::auth::{Identity, TokenKeys};
use crate::error::ApiError;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    middleware::Next,
    web, Error, HttpMessage, ResponseError,
};
use log::debug;

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Identity, ApiError> {
    let keys = req
        .app_data::<web::Data<TokenKeys>>()
        .ok_or(ApiError::Internal("Token keys not configured"))?;
    let token = bearer_token(req).ok_or_else(|| {
        debug!("no bearer token on {}", req.path());
        ApiError::Unauthorized
    })?;
    let claims = keys.validate(token).map_err(|err| {
        debug!("rejected token on {}: {}", req.path(), err);
        ApiError::Unauthorized
    })?;
    Ok(claims.into())
}

/// Gate for protected routes: the request only reaches its handler with a
/// valid bearer token, and the handler finds the caller's `Identity` in the
/// request extensions.
pub async fn require_bearer(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    match authenticate(&req) {
        Ok(identity) => {
            debug!("{} (#{}) on {}", identity.username, identity.user_id, req.path());
            req.extensions_mut().insert(identity);
            Ok(next.call(req).await?.map_into_left_body())
        }
        Err(err) => Ok(req.into_response(err.error_response()).map_into_right_body()),
    }
}
