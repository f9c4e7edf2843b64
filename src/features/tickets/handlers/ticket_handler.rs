use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedDinas;
use crate::features::tickets::dtos::ticket_dto::{
    AnalyticsQuery, CreateTicketRequest, ListTicketsQuery, SubmitRatingRequest,
    UpdateTicketRequest,
};
use crate::features::tickets::routes::TicketsState;
use crate::shared::constants::{CACHE_TTL_LIST, CACHE_TTL_MAP, CACHE_TTL_STATS, CACHE_TTL_TRACK};
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// List tickets assigned to the caller's dinas
#[utoipa::path(
    get,
    path = "/api/tickets",
    params(ListTicketsQuery, PaginationQuery),
    responses(
        (status = 200, description = "Paginated ticket list"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn list_tickets(
    State(state): State<TicketsState>,
    actor: AuthenticatedDinas,
    Query(query): Query<ListTicketsQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Value>> {
    let cache_key = format!(
        "tickets:list:{}:{:?}:{:?}:{:?}:{:?}:{}:{}",
        scope_key(&actor),
        query.status,
        query.urgency,
        query.category,
        query.search,
        pagination.page,
        pagination.page_size,
    );

    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let (tickets, total) = state.tickets.list(&query, &pagination, &actor).await?;
    let body = to_value(ApiResponse::success(
        Some(tickets),
        None,
        Some(Meta { total }),
    ))?;

    state.cache.put(&cache_key, body.clone(), CACHE_TTL_LIST);
    Ok(Json(body))
}

/// Ticket detail with full timeline
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket detail"),
        (status = 403, description = "Ticket belongs to another dinas"),
        (status = 404, description = "Unknown ticket")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn get_ticket(
    State(state): State<TicketsState>,
    actor: AuthenticatedDinas,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let detail = state.tickets.get(&id, &actor).await?;
    Ok(Json(to_value(ApiResponse::success(
        Some(detail),
        None,
        None,
    ))?))
}

/// Create a ticket. Internal endpoint: requires the shared intake
/// secret, not a staff session.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 200, description = "Ticket created"),
        (status = 401, description = "Missing or wrong internal secret"),
        (status = 400, description = "Validation failure")
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    State(state): State<TicketsState>,
    headers: HeaderMap,
    Json(req): Json<CreateTicketRequest>,
) -> Result<Json<Value>> {
    check_internal_secret(&headers, &state.internal_secret)?;

    let created = state.tickets.create(req, None).await?;
    state.cache.invalidate_tickets();

    Ok(Json(to_value(ApiResponse::success(
        Some(created),
        Some("Tiket berhasil dibuat".to_string()),
        None,
    ))?))
}

/// Patch ticket status and/or photos
#[utoipa::path(
    patch,
    path = "/api/tickets/{id}",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Ticket updated"),
        (status = 400, description = "Photo required or invalid patch"),
        (status = 403, description = "Ticket belongs to another dinas")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn update_ticket(
    State(state): State<TicketsState>,
    actor: AuthenticatedDinas,
    Path(id): Path<String>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<Value>> {
    let updated = state.tickets.update(&id, req, &actor).await?;
    state.cache.invalidate_tickets();

    Ok(Json(to_value(ApiResponse::success(
        Some(updated),
        Some("Tiket diperbarui".to_string()),
        None,
    ))?))
}

/// Coordinate-bearing subset for the dashboard map
#[utoipa::path(
    get,
    path = "/api/tickets/map",
    responses((status = 200, description = "Map projection")),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn map_tickets(
    State(state): State<TicketsState>,
    actor: AuthenticatedDinas,
) -> Result<Json<Value>> {
    let cache_key = format!("tickets:map:{}", scope_key(&actor));
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let points = state.tickets.map_tickets(&actor).await?;
    let body = to_value(ApiResponse::success(Some(points), None, None))?;
    state.cache.put(&cache_key, body.clone(), CACHE_TTL_MAP);
    Ok(Json(body))
}

/// Role-scoped aggregate counts
#[utoipa::path(
    get,
    path = "/api/tickets/stats",
    responses((status = 200, description = "Aggregate counts")),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn stats(
    State(state): State<TicketsState>,
    actor: AuthenticatedDinas,
) -> Result<Json<Value>> {
    let cache_key = format!("tickets:stats:{}", scope_key(&actor));
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let stats = state.stats.stats(&actor).await?;
    let body = to_value(ApiResponse::success(Some(stats), None, None))?;
    state.cache.put(&cache_key, body.clone(), CACHE_TTL_STATS);
    Ok(Json(body))
}

/// Time-bucketed created/resolved counts for a day window
#[utoipa::path(
    get,
    path = "/api/tickets/analytics",
    params(AnalyticsQuery),
    responses((status = 200, description = "Per-day aggregates")),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn analytics(
    State(state): State<TicketsState>,
    actor: AuthenticatedDinas,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>> {
    let analytics = state.stats.analytics(query.days, &actor).await?;
    Ok(Json(to_value(ApiResponse::success(
        Some(analytics),
        None,
        None,
    ))?))
}

/// Public tracking lookup: sanitized, no session required
#[utoipa::path(
    get,
    path = "/api/track/{id}",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Public ticket view"),
        (status = 404, description = "Unknown ticket")
    ),
    tag = "public"
)]
pub async fn track_ticket(
    State(state): State<TicketsState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let cache_key = format!("tickets:track:{}", id);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let projected = state.tickets.track_public(&id).await?;
    let body = to_value(ApiResponse::success(Some(projected), None, None))?;
    state.cache.put(&cache_key, body.clone(), CACHE_TTL_TRACK);
    Ok(Json(body))
}

/// Issue a rating OTP to the reporter's phone
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/rating/otp",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "OTP sent"),
        (status = 400, description = "Ticket not resolved or already rated"),
        (status = 429, description = "Requested too recently")
    ),
    tag = "public"
)]
pub async fn request_otp(
    State(state): State<TicketsState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let sent = state.ratings.request_otp(&id).await?;
    Ok(Json(to_value(ApiResponse::success(
        Some(sent),
        Some("Kode verifikasi telah dikirim".to_string()),
        None,
    ))?))
}

/// Submit an OTP-verified rating
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/rating",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = SubmitRatingRequest,
    responses(
        (status = 200, description = "Rating recorded"),
        (status = 400, description = "Invalid rating, feedback, or OTP")
    ),
    tag = "public"
)]
pub async fn submit_rating(
    State(state): State<TicketsState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitRatingRequest>,
) -> Result<Json<Value>> {
    state.ratings.submit_rating(&id, req).await?;
    state.cache.invalidate_tickets();

    Ok(Json(to_value(ApiResponse::success(
        None::<()>,
        Some("Terima kasih atas penilaian Anda".to_string()),
        None,
    ))?))
}

fn check_internal_secret(headers: &HeaderMap, expected: &str) -> Result<()> {
    let provided = headers
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || provided != expected {
        return Err(AppError::Unauthorized(
            "Missing or invalid internal secret".to_string(),
        ));
    }
    Ok(())
}

fn scope_key(actor: &AuthenticatedDinas) -> &str {
    if actor.is_all_agencies() {
        "all"
    } else {
        &actor.sub
    }
}

fn to_value<T: serde::Serialize>(response: T) -> Result<Value> {
    serde_json::to_value(response)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))
}
