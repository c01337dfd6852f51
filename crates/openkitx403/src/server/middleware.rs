/*
[INPUT]:  Incoming axum requests and a shared Authenticator
[OUTPUT]: 403 challenges, 401 rejections, or requests carrying OpenKitUser
[POS]:    Server layer - axum integration
[UPDATE]: When response bodies, headers, or extractor behavior change
*/

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::server::{Authenticator, OpenKitUser};

/// Axum middleware guarding routes with OpenKitx403.
///
/// Install with `axum::middleware::from_fn_with_state(authenticator, openkit_middleware)`.
/// Accepted requests carry an `OpenKitUser` extension for handlers.
pub async fn openkit_middleware(
    State(auth): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if auth.config().is_excluded(&path) {
        return next.run(request).await;
    }

    let method = request.method().as_str().to_string();
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    match auth.verify(header.as_deref(), &method, &path).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) if err.is_rechallengeable() => challenge_response(&auth, &method, &path),
        Err(_) => unauthorized_response(),
    }
}

/// 403 with a fresh challenge in `WWW-Authenticate`
pub fn challenge_response(auth: &Authenticator, method: &str, path: &str) -> Response {
    let challenge = auth.issuer().issue(method, path);
    match auth.issuer().www_authenticate(&challenge) {
        Ok(value) => (
            StatusCode::FORBIDDEN,
            [(WWW_AUTHENTICATE, value)],
            Json(json!({"error": "Forbidden"})),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode challenge");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 401 with a generic body
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Unauthorized"})),
    )
        .into_response()
}

impl<S> FromRequestParts<S> for OpenKitUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OpenKitUser>()
            .cloned()
            .ok_or_else(unauthorized_response)
    }
}
