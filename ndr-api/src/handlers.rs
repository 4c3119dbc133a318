//! API Handlers
//!
//! HTTP handler implementations for NDR API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use ndr_core::{
    Adjudication, Alert, CarrierPeriodStat, Challenge, ChallengeId, DeliveryAttempt, NdrRecord,
    OrderId, OrderInfo, PendingResolution, ProofBundle, SellerDashboard, SellerId,
};
use ndr_engine::{AdjudicationResult, ReplyOutcome};
use std::sync::Arc;

use crate::dto::*;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::{AppState, ComponentHealthCheck, HealthStatus};

/// Health check handler
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let mut components = vec![ComponentHealthCheck::healthy("engine")];

    let overdue = state.engine.overdue_resolution_count().await;
    metrics::set_overdue_resolutions(overdue);
    if overdue == 0 {
        components.push(ComponentHealthCheck::healthy("resolutions"));
    } else {
        components.push(ComponentHealthCheck::degraded(
            "resolutions",
            format!("{} expired windows awaiting sweep", overdue),
        ));
    }

    let overall_status = if components.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Ok(Json(HealthResponse {
        status: overall_status.as_str().to_string(),
        version: state.config.version.clone(),
        uptime_secs: state.uptime_secs(),
        components: components
            .into_iter()
            .map(|c| ComponentHealth {
                name: c.name,
                status: c.status.as_str().to_string(),
                message: c.message,
            })
            .collect(),
    }))
}

/// Get engine statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        engine: state.engine.stats().await,
        requests: state.request_count(),
        uptime_secs: state.uptime_secs(),
    }))
}

// ============================================
// Orders
// ============================================

/// Register an order
pub async fn register_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderInfo>)> {
    state.increment_requests();
    let order = request.into_order(state.engine.now());
    let order = state.engine.register_order(order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Record a courier event
pub async fn record_attempt(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Json(request): Json<RecordAttemptRequest>,
) -> ApiResult<(StatusCode, Json<DeliveryAttempt>)> {
    state.increment_requests();
    let attempt = request.into_attempt(state.engine.now());
    let attempt = state
        .engine
        .record_attempt(&OrderId::new(order_id), attempt)
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Attach proof to the latest NDR attempt
pub async fn submit_proof(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Json(request): Json<SubmitProofRequest>,
) -> ApiResult<Json<ProofBundle>> {
    state.increment_requests();
    let bundle = request.into_bundle(state.engine.now());
    let bundle = state
        .engine
        .submit_proof(&OrderId::new(order_id), bundle)
        .await?;
    Ok(Json(bundle))
}

/// Classify the latest NDR attempt
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<NdrRecord>> {
    state.increment_requests();
    let record = state.engine.classify(&OrderId::new(order_id)).await?;
    metrics::record_verdict(record.verdict_kind().as_str());
    Ok(Json(record))
}

/// Every NDR record version of an order
pub async fn get_order_ndr(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<ListResponse<NdrRecord>>> {
    let history = state
        .engine
        .record_history(&OrderId::new(order_id))
        .await?;
    Ok(Json(ListResponse::new(history)))
}

/// Current NDR records
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<NdrRecord>>> {
    let filter = query.into_filter(state.engine.now())?;
    Ok(Json(ListResponse::new(state.engine.records(&filter).await)))
}

// ============================================
// Challenges
// ============================================

/// Submit a challenge
pub async fn submit_challenge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitChallengeRequest>,
) -> ApiResult<(StatusCode, Json<Challenge>)> {
    state.increment_requests();
    let challenge = state
        .engine
        .submit_challenge(
            &OrderId::new(request.order_id),
            &request.reason,
            request.requested_evidence,
            request.comments,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(challenge)))
}

/// List challenges
pub async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<Challenge>>> {
    let filter = query.into_filter(state.engine.now())?;
    Ok(Json(ListResponse::new(state.engine.challenges(&filter).await)))
}

/// Get a challenge
pub async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
) -> ApiResult<Json<Challenge>> {
    let challenge = state
        .engine
        .challenge(&ChallengeId::new(challenge_id))
        .await?;
    Ok(Json(challenge))
}

/// Attach evidence to a challenge
pub async fn provide_evidence(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
    Json(request): Json<ProvideEvidenceRequest>,
) -> ApiResult<Json<Challenge>> {
    state.increment_requests();
    let challenge = state
        .engine
        .provide_evidence(
            &ChallengeId::new(challenge_id),
            request.evidence_type,
            &request.reference,
        )
        .await?;
    Ok(Json(challenge))
}

/// Adjudicate a challenge
pub async fn adjudicate(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
    Json(adjudication): Json<Adjudication>,
) -> ApiResult<Json<AdjudicationResult>> {
    state.increment_requests();
    let result = state
        .engine
        .adjudicate(&ChallengeId::new(challenge_id), adjudication)
        .await?;
    Ok(Json(result))
}

// ============================================
// Customer resolution
// ============================================

/// Notify the customer and open a resolution window
pub async fn open_resolution(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenResolutionRequest>,
) -> ApiResult<(StatusCode, Json<PendingResolution>)> {
    state.increment_requests();
    let ttl = request.ttl()?;
    let entry = state
        .engine
        .open_resolution_window(&OrderId::new(request.order_id), request.phone, ttl)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// List resolution windows, optionally by status
pub async fn list_resolutions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolutionQuery>,
) -> ApiResult<Json<ListResponse<PendingResolution>>> {
    Ok(Json(ListResponse::new(
        state.engine.resolutions(query.status).await,
    )))
}

/// Record an explicit customer choice
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<PendingResolution>> {
    state.increment_requests();
    let entry = state
        .engine
        .resolve(&request.phone, &OrderId::new(request.order_id), request.action)
        .await?;
    Ok(Json(entry))
}

/// Escalate expired windows
pub async fn sweep(
    State(state): State<Arc<AppState>>,
    request: Option<Json<SweepRequest>>,
) -> ApiResult<Json<SweepResponse>> {
    let swept_at = request
        .and_then(|Json(r)| r.now)
        .unwrap_or_else(|| state.engine.now());
    let escalated = state.engine.sweep_expired(swept_at).await?;
    Ok(Json(SweepResponse {
        swept_at,
        escalated,
    }))
}

/// Inbound customer reply
pub async fn customer_reply(
    State(state): State<Arc<AppState>>,
    Json(webhook): Json<CustomerReplyWebhook>,
) -> ApiResult<Json<ReplyOutcome>> {
    state.increment_requests();
    if webhook.phone_number.trim().is_empty() {
        return Err(ApiError::validation("phone_number is required"));
    }
    tracing::info!(
        phone = %ndr_core::mask_phone(&webhook.phone_number),
        message_id = webhook.message_id.as_deref().unwrap_or("-"),
        "Received customer reply"
    );
    let outcome = state
        .engine
        .handle_customer_reply(&webhook.phone_number, &webhook.message)
        .await?;
    Ok(Json(outcome))
}

// ============================================
// Reporting
// ============================================

/// Carrier scorecard
pub async fn scorecard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<CarrierPeriodStat>>> {
    let filter = query.into_filter(state.engine.now())?;
    Ok(Json(ListResponse::new(state.engine.scorecard(&filter).await)))
}

/// Seller alerts
pub async fn seller_alerts(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<ListResponse<Alert>>> {
    let alerts = state
        .engine
        .alerts(&SellerId::new(seller_id), query.period)
        .await;
    Ok(Json(ListResponse::new(alerts)))
}

/// Seller dashboard
pub async fn seller_dashboard(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<SellerDashboard>> {
    let dashboard = state
        .engine
        .seller_dashboard(&SellerId::new(seller_id), query.period)
        .await;
    Ok(Json(dashboard))
}
