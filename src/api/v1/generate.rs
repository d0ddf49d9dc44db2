//! AI generation endpoint

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::api::middleware::Caller;
use crate::api::state::AppState;
use crate::api::types::{validate_body, ApiError, GenerateRequest, GenerateResponse, Json};
use crate::domain::rate_limit::RateLimitDecision;
use crate::domain::tenant::{ClubId, OrganizationId};
use crate::infrastructure::auth::SessionClaims;
use crate::infrastructure::gateway::{GatewayOutcome, GatewayReply, GatewayRequest};

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// POST /v1/generate
///
/// The caller limit is taken before the session token or the body is
/// looked at, so every rejection below it still carries quota headers.
pub async fn generate(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<GenerateRequest>, ApiError>,
) -> Response {
    let mut context = caller.context();

    let admission = match state.gateway.admit(&context).await {
        Ok(admission) => admission,
        Err(denied) => return reply_response(denied),
    };

    let (session, request) = match prepare(&state, &caller, body) {
        Ok(prepared) => prepared,
        Err(e) => {
            let quota = state.gateway.reject(admission);
            let mut response = e.into_response();
            apply_quota_headers(response.headers_mut(), &quota);
            return response;
        }
    };

    context.user_id = session.map(|claims| claims.sub);
    let reply = state.gateway.proceed(&context, admission, request).await;
    reply_response(reply)
}

/// Session, body and id checks, run once the caller slot is taken
fn prepare(
    state: &AppState,
    caller: &Caller,
    body: Result<Json<GenerateRequest>, ApiError>,
) -> Result<(Option<SessionClaims>, GatewayRequest), ApiError> {
    let session = caller.authenticate(state.jwt.as_deref())?;

    let Json(body) = body?;
    validate_body(&body)?;

    let organization_id = OrganizationId::new(body.organization_id)?;
    let club_id = body.club_id.map(ClubId::new).transpose()?;

    if let Some(ref session) = session {
        session.ensure_organization(&organization_id)?;
    }

    let request = GatewayRequest {
        organization_id,
        club_id,
        kind: body.kind,
        prompt: body.prompt,
        model: body.model,
        reference_image: body.reference_image.map(Into::into),
    };

    Ok((session, request))
}

fn reply_response(reply: GatewayReply) -> Response {
    let mut response = match reply.outcome {
        GatewayOutcome::Completed(result) => {
            (StatusCode::OK, Json(GenerateResponse::from(result))).into_response()
        }
        GatewayOutcome::RateLimited { scope, decision } => {
            debug!(scope = %scope, "Generation rate limited");
            ApiError::rate_limited(format!(
                "Rate limit exceeded ({} scope). Retry after {} seconds",
                scope,
                decision.retry_after_secs.unwrap_or(1)
            ))
            .into_response()
        }
        GatewayOutcome::Failed(e) => ApiError::from(e).into_response(),
    };

    if let Some(ref quota) = reply.quota {
        apply_quota_headers(response.headers_mut(), quota);
    }

    response
}

/// OPTIONS /v1/generate, headers come from the origin middleware
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn apply_quota_headers(headers: &mut HeaderMap, quota: &RateLimitDecision) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(quota.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(quota.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(quota.reset_at_secs()));

    if let Some(retry_after) = quota.retry_after_secs {
        headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    }
}
