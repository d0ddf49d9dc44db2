//! Gateway facade composing origin policy, limiters, resolver, provider and
//! usage recording

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use super::OriginPolicy;
use crate::domain::credentials::CredentialProvenance;
use crate::domain::generation::{
    GenerationKind, GenerationOutput, GenerationProvider, GenerationRequest, InlineImage,
};
use crate::domain::rate_limit::{LimitScope, RateLimitDecision, RateLimitPolicy};
use crate::domain::tenant::{ClubId, OrganizationId};
use crate::domain::usage::UsageEvent;
use crate::domain::DomainError;
use crate::infrastructure::credentials::CredentialResolver;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::usage::UsageRecorder;

/// Default model labels per generation kind
#[derive(Debug, Clone)]
pub struct ModelDefaults {
    pub text: String,
    pub image: String,
}

impl ModelDefaults {
    fn for_kind(&self, kind: GenerationKind) -> &str {
        if kind.produces_image() {
            &self.image
        } else {
            &self.text
        }
    }
}

/// Ambient context of the inbound call
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    /// Authenticated user, `None` for anonymous callers and until the session
    /// token has been validated
    pub user_id: Option<String>,
    /// Whether a bearer token was presented, valid or not
    pub presents_session: bool,
    /// Client network address used for caller-scoped limiting
    pub network_origin: String,
    /// `Origin` request header, if any
    pub origin: Option<String>,
}

impl CallerContext {
    /// Identity the caller-scoped limiter counts against
    ///
    /// Built only from what is known before the token is validated, so a
    /// forged token cannot pick its own bucket.
    pub fn limiter_identity(&self) -> String {
        let holder = if self.presents_session || self.user_id.is_some() {
            "session"
        } else {
            "anon"
        };
        format!("{}:{}", holder, self.network_origin)
    }
}

/// One inbound generation call
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub organization_id: OrganizationId,
    pub club_id: Option<ClubId>,
    pub kind: GenerationKind,
    pub prompt: String,
    pub model: Option<String>,
    pub reference_image: Option<InlineImage>,
}

/// Successful generation with the tier that paid for it
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub output: GenerationOutput,
    pub provenance: CredentialProvenance,
}

#[derive(Debug)]
pub enum GatewayOutcome {
    Completed(GenerationResult),
    RateLimited {
        scope: LimitScope,
        decision: RateLimitDecision,
    },
    Failed(DomainError),
}

impl GatewayOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::RateLimited { .. } => "rate_limited",
            Self::Failed(_) => "failed",
        }
    }
}

/// Everything the HTTP layer needs to build the response
#[derive(Debug)]
pub struct GatewayReply {
    /// Value for `Access-Control-Allow-Origin`
    pub allow_origin: String,
    /// Quota to report, the tighter of the layers consulted so far
    pub quota: Option<RateLimitDecision>,
    pub outcome: GatewayOutcome,
}

/// A caller that passed the origin check and the caller-scoped limit
///
/// Issued before the body or session token is trusted, so malformed and
/// unauthenticated requests still cost the caller a slot.
#[derive(Debug, Clone)]
pub struct Admission {
    pub allow_origin: String,
    pub decision: RateLimitDecision,
}

/// The request path for AI generation
///
/// [`admit`](Self::admit) runs the origin check and the caller limit.
/// [`proceed`](Self::proceed) runs the tenant limit, credential resolution,
/// the upstream call and usage recording. A single attempt per call.
#[derive(Debug, Clone)]
pub struct GatewayService {
    origins: Arc<OriginPolicy>,
    limiter: RateLimiter,
    caller_policy: RateLimitPolicy,
    tenant_policy: RateLimitPolicy,
    resolver: CredentialResolver,
    provider: Arc<dyn GenerationProvider>,
    recorder: UsageRecorder,
    models: ModelDefaults,
}

impl GatewayService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        origins: Arc<OriginPolicy>,
        limiter: RateLimiter,
        caller_policy: RateLimitPolicy,
        tenant_policy: RateLimitPolicy,
        resolver: CredentialResolver,
        provider: Arc<dyn GenerationProvider>,
        recorder: UsageRecorder,
        models: ModelDefaults,
    ) -> Self {
        Self {
            origins,
            limiter,
            caller_policy,
            tenant_policy,
            resolver,
            provider,
            recorder,
            models,
        }
    }

    pub fn origins(&self) -> &OriginPolicy {
        &self.origins
    }

    pub fn has_platform_key(&self) -> bool {
        self.resolver.has_platform_key()
    }

    /// Full pipeline for a request that is already parsed and authenticated
    pub async fn handle(&self, caller: &CallerContext, request: GatewayRequest) -> GatewayReply {
        match self.admit(caller).await {
            Ok(admission) => self.proceed(caller, admission, request).await,
            Err(denied) => denied,
        }
    }

    /// Origin check and caller-scoped limit, `Err` carries the denial reply
    pub async fn admit(&self, caller: &CallerContext) -> Result<Admission, GatewayReply> {
        let origin = self.origins.check(caller.origin.as_deref());
        if !origin.recognized {
            if let Some(ref unknown) = caller.origin {
                warn!(origin = %unknown, "Request from unrecognized origin");
            }
        }

        let decision = self
            .limiter
            .check(LimitScope::Caller, &self.caller_policy, &caller.limiter_identity())
            .await;
        if !decision.allowed {
            return Err(self.reply(origin.allow_origin, rate_limited(LimitScope::Caller, decision)));
        }

        Ok(Admission {
            allow_origin: origin.allow_origin,
            decision,
        })
    }

    /// Close an admission whose request was rejected before reaching the
    /// tenant limit, returning the quota to report
    pub fn reject(&self, admission: Admission) -> RateLimitDecision {
        counter!("gateway_requests_total", "outcome" => "rejected").increment(1);
        admission.decision
    }

    /// Tenant limit through to the response
    pub async fn proceed(
        &self,
        caller: &CallerContext,
        admission: Admission,
        request: GatewayRequest,
    ) -> GatewayReply {
        let tenant_decision = self
            .limiter
            .check(
                LimitScope::Tenant,
                &self.tenant_policy,
                request.organization_id.as_str(),
            )
            .await;
        if !tenant_decision.allowed {
            return self.reply(
                admission.allow_origin,
                rate_limited(LimitScope::Tenant, tenant_decision),
            );
        }

        let quota = Some(admission.decision.tighter(tenant_decision));
        let outcome = self.generate(caller, request).await;
        self.reply(admission.allow_origin, (quota, outcome))
    }

    fn reply(
        &self,
        allow_origin: String,
        (quota, outcome): (Option<RateLimitDecision>, GatewayOutcome),
    ) -> GatewayReply {
        counter!("gateway_requests_total", "outcome" => outcome.label()).increment(1);
        GatewayReply {
            allow_origin,
            quota,
            outcome,
        }
    }

    async fn generate(&self, caller: &CallerContext, request: GatewayRequest) -> GatewayOutcome {
        let generation = match self.build_generation(&request) {
            Ok(generation) => generation,
            Err(e) => return GatewayOutcome::Failed(e),
        };

        let credential = match self
            .resolver
            .resolve(&request.organization_id, request.club_id.as_ref())
            .await
        {
            Ok(credential) => credential,
            Err(e) => return GatewayOutcome::Failed(e),
        };
        let provenance = credential.provenance;

        let result = self.provider.generate(&credential.api_key, &generation).await;
        drop(credential);

        match result {
            Ok(output) => {
                let event = UsageEvent::new(
                    request.organization_id.clone(),
                    generation.kind.as_str(),
                    provenance,
                )
                .with_club(request.club_id.clone())
                .with_user(caller.user_id.clone())
                .with_sizes(generation.input_size(), output.output_size())
                .with_metadata("model", generation.model.clone())
                .with_metadata("provider", self.provider.provider_name());
                self.recorder.record(event).await;

                info!(
                    organization_id = %request.organization_id,
                    club_id = request.club_id.as_ref().map(ClubId::as_str),
                    kind = %generation.kind,
                    provenance = %provenance,
                    "Generation completed"
                );
                GatewayOutcome::Completed(GenerationResult { output, provenance })
            }
            Err(e) => {
                warn!(
                    organization_id = %request.organization_id,
                    kind = %generation.kind,
                    provenance = %provenance,
                    error = %e,
                    "Upstream generation failed"
                );
                GatewayOutcome::Failed(e)
            }
        }
    }

    fn build_generation(&self, request: &GatewayRequest) -> Result<GenerationRequest, DomainError> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(DomainError::validation("Prompt is required"));
        }

        let model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.models.for_kind(request.kind));

        let mut generation = GenerationRequest::new(request.kind, model, prompt);

        match (request.kind, &request.reference_image) {
            (GenerationKind::ImageEdit, Some(image)) => {
                if image.data.is_empty() || image.mime_type.is_empty() {
                    return Err(DomainError::validation(
                        "Reference image requires data and mime_type",
                    ));
                }
                generation = generation.with_reference_image(image.clone());
            }
            (GenerationKind::ImageEdit, None) => {
                return Err(DomainError::validation(
                    "Reference image is required for image_edit",
                ));
            }
            (_, Some(_)) => {
                return Err(DomainError::validation(format!(
                    "Reference image is only accepted for image_edit, not {}",
                    request.kind
                )));
            }
            (_, None) => {}
        }

        Ok(generation)
    }
}

fn rate_limited(
    scope: LimitScope,
    decision: RateLimitDecision,
) -> (Option<RateLimitDecision>, GatewayOutcome) {
    (
        Some(decision.clone()),
        GatewayOutcome::RateLimited { scope, decision },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::mock::MockGenerationProvider;
    use crate::domain::credentials::SecretValue;
    use crate::domain::tenant::{
        ClubAiMode, ClubAiSettings, CredentialSlot, OrganizationAiMode, OrganizationAiSettings,
    };
    use crate::domain::usage::UsageOutcome;
    use crate::infrastructure::tenant::InMemorySettingsRepository;
    use crate::infrastructure::usage::InMemoryUsageLog;
    use crate::infrastructure::vault::SecretVault;

    struct Harness {
        gateway: GatewayService,
        provider: Arc<MockGenerationProvider>,
        usage: Arc<InMemoryUsageLog>,
    }

    fn org() -> OrganizationId {
        OrganizationId::new("org-1").unwrap()
    }

    fn club() -> ClubId {
        ClubId::new("club-1").unwrap()
    }

    fn harness(provider: MockGenerationProvider, caller_max: u32, tenant_max: u32) -> Harness {
        let vault = Arc::new(SecretVault::new(&[3u8; 32]).unwrap());
        let sealed = CredentialSlot::Sealed(vault.encrypt("sk-club").unwrap());
        let settings = Arc::new(InMemorySettingsRepository::with_rows(
            vec![OrganizationAiSettings::new(org(), OrganizationAiMode::Managed)],
            vec![ClubAiSettings::new(club(), org(), ClubAiMode::Byok).with_credential(sealed)],
        ));
        let resolver =
            CredentialResolver::new(settings, vault, Some(SecretValue::new("sk-platform")));
        let provider = Arc::new(provider);
        let usage = Arc::new(InMemoryUsageLog::default());
        let origins = OriginPolicy::new(
            "https://app.clubhub.io",
            vec!["http://localhost:5173".to_string()],
            None,
        )
        .unwrap();

        let gateway = GatewayService::new(
            Arc::new(origins),
            RateLimiter::default(),
            RateLimitPolicy::new("caller", 60_000, caller_max),
            RateLimitPolicy::new("tenant", 60_000, tenant_max),
            resolver,
            provider.clone(),
            UsageRecorder::new(usage.clone()),
            ModelDefaults {
                text: "text-model".to_string(),
                image: "image-model".to_string(),
            },
        );

        Harness {
            gateway,
            provider,
            usage,
        }
    }

    fn caller(user: &str) -> CallerContext {
        CallerContext {
            user_id: Some(user.to_string()),
            presents_session: true,
            network_origin: "203.0.113.7".to_string(),
            origin: Some("http://localhost:5173".to_string()),
        }
    }

    fn text_request(club_id: Option<ClubId>) -> GatewayRequest {
        GatewayRequest {
            organization_id: org(),
            club_id,
            kind: GenerationKind::Text,
            prompt: "Write a match preview".to_string(),
            model: None,
            reference_image: None,
        }
    }

    #[test]
    fn test_limiter_identity() {
        let anonymous = CallerContext {
            network_origin: "10.0.0.1".to_string(),
            ..CallerContext::default()
        };
        assert_eq!(anonymous.limiter_identity(), "anon:10.0.0.1");
        assert_eq!(caller("u-1").limiter_identity(), "session:203.0.113.7");

        let unverified = CallerContext {
            presents_session: true,
            network_origin: "10.0.0.1".to_string(),
            ..CallerContext::default()
        };
        assert_eq!(unverified.limiter_identity(), "session:10.0.0.1");
    }

    #[tokio::test]
    async fn test_rejected_admission_keeps_caller_slot() {
        let h = harness(MockGenerationProvider::new(), 2, 10);
        let ctx = caller("u-1");

        let admission = h.gateway.admit(&ctx).await.unwrap();
        assert_eq!(admission.allow_origin, "http://localhost:5173");
        let quota = h.gateway.reject(admission);
        assert_eq!(quota.remaining, 1);

        h.gateway.admit(&ctx).await.unwrap();
        let denied = h.gateway.admit(&ctx).await.unwrap_err();
        assert!(matches!(
            denied.outcome,
            GatewayOutcome::RateLimited {
                scope: LimitScope::Caller,
                ..
            }
        ));
        assert_eq!(denied.quota.unwrap().remaining, 0);
        assert!(h.provider.seen_keys().is_empty());
    }

    #[tokio::test]
    async fn test_completed_call_uses_club_key_and_records_usage() {
        let h = harness(
            MockGenerationProvider::new().with_output(GenerationOutput::text("Preview!")),
            10,
            10,
        );

        let reply = h.gateway.handle(&caller("u-1"), text_request(Some(club()))).await;

        assert_eq!(reply.allow_origin, "http://localhost:5173");
        match reply.outcome {
            GatewayOutcome::Completed(result) => {
                assert_eq!(result.provenance, CredentialProvenance::ClubOverride);
                assert_eq!(result.output.text.as_deref(), Some("Preview!"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(reply.quota.unwrap().remaining, 9);
        assert_eq!(h.provider.seen_keys(), vec!["sk-club".to_string()]);

        let events = h.usage.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, UsageOutcome::Success);
        assert_eq!(events[0].action, "text");
        assert_eq!(events[0].user_id.as_deref(), Some("u-1"));
        assert_eq!(events[0].input_size, 21);
        assert_eq!(events[0].output_size, 8);
    }

    #[tokio::test]
    async fn test_caller_limit_denies_before_upstream() {
        let h = harness(
            MockGenerationProvider::new().with_output(GenerationOutput::text("ok")),
            1,
            10,
        );

        h.gateway.handle(&caller("u-1"), text_request(None)).await;
        let reply = h.gateway.handle(&caller("u-1"), text_request(None)).await;

        match reply.outcome {
            GatewayOutcome::RateLimited { scope, decision } => {
                assert_eq!(scope, LimitScope::Caller);
                assert!(decision.retry_after_secs.unwrap() >= 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!reply.quota.unwrap().allowed);
        assert_eq!(h.provider.seen_keys().len(), 1);
        assert_eq!(h.usage.len(), 1);
    }

    #[tokio::test]
    async fn test_tenant_limit_spans_callers() {
        let h = harness(
            MockGenerationProvider::new().with_output(GenerationOutput::text("ok")),
            10,
            2,
        );

        h.gateway.handle(&caller("u-1"), text_request(None)).await;
        h.gateway.handle(&caller("u-2"), text_request(None)).await;
        let reply = h.gateway.handle(&caller("u-3"), text_request(None)).await;

        assert!(matches!(
            reply.outcome,
            GatewayOutcome::RateLimited {
                scope: LimitScope::Tenant,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_quota_reports_tighter_layer() {
        let h = harness(
            MockGenerationProvider::new().with_output(GenerationOutput::text("ok")),
            10,
            3,
        );

        let reply = h.gateway.handle(&caller("u-1"), text_request(None)).await;
        let quota = reply.quota.unwrap();
        assert_eq!(quota.limit, 3);
        assert_eq!(quota.remaining, 2);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_propagated_without_usage() {
        let h = harness(
            MockGenerationProvider::new().with_error(Some(503), "model overloaded"),
            10,
            10,
        );

        let reply = h.gateway.handle(&caller("u-1"), text_request(None)).await;

        match reply.outcome {
            GatewayOutcome::Failed(DomainError::Upstream { status, message, .. }) => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "model overloaded");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(h.provider.seen_keys(), vec!["sk-platform".to_string()]);
        assert!(h.usage.is_empty());
    }

    #[tokio::test]
    async fn test_cross_tenant_club_fails_without_upstream_call() {
        let h = harness(
            MockGenerationProvider::new().with_output(GenerationOutput::text("ok")),
            10,
            10,
        );
        let mut request = text_request(Some(club()));
        request.organization_id = OrganizationId::new("org-2").unwrap();

        let reply = h.gateway.handle(&caller("u-1"), request).await;

        assert!(matches!(
            reply.outcome,
            GatewayOutcome::Failed(DomainError::Validation { .. })
        ));
        assert!(h.provider.seen_keys().is_empty());
        assert!(h.usage.is_empty());
    }

    #[tokio::test]
    async fn test_request_shape_validation() {
        let h = harness(MockGenerationProvider::new(), 10, 10);

        let mut blank = text_request(None);
        blank.prompt = "   ".to_string();
        let reply = h.gateway.handle(&caller("u-1"), blank).await;
        assert!(matches!(reply.outcome, GatewayOutcome::Failed(DomainError::Validation { .. })));

        let mut edit = text_request(None);
        edit.kind = GenerationKind::ImageEdit;
        let reply = h.gateway.handle(&caller("u-1"), edit).await;
        assert!(matches!(reply.outcome, GatewayOutcome::Failed(DomainError::Validation { .. })));

        let mut text_with_image = text_request(None);
        text_with_image.reference_image = Some(InlineImage::new("image/png", "AAAA"));
        let reply = h.gateway.handle(&caller("u-1"), text_with_image).await;
        assert!(matches!(reply.outcome, GatewayOutcome::Failed(DomainError::Validation { .. })));

        assert!(h.provider.seen_keys().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_origin_gets_canonical_but_is_served() {
        let h = harness(
            MockGenerationProvider::new().with_output(GenerationOutput::text("ok")),
            10,
            10,
        );
        let mut ctx = caller("u-1");
        ctx.origin = Some("https://evil.example".to_string());

        let reply = h.gateway.handle(&ctx, text_request(None)).await;

        assert_eq!(reply.allow_origin, "https://app.clubhub.io");
    }
}
