use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::tickets::handlers::ticket_handler;
use crate::features::tickets::services::rating_service::RatingService;
use crate::features::tickets::services::stats_service::StatsService;
use crate::features::tickets::services::ticket_service::TicketService;
use crate::shared::cache::ResponseCache;

#[derive(Clone)]
pub struct TicketsState {
    pub tickets: Arc<TicketService>,
    pub ratings: Arc<RatingService>,
    pub stats: Arc<StatsService>,
    pub cache: Arc<ResponseCache>,
    pub internal_secret: String,
}

/// Staff routes; the caller mounts these behind the auth middleware.
pub fn staff_routes(state: TicketsState) -> Router {
    Router::new()
        .route("/api/tickets", get(ticket_handler::list_tickets))
        .route("/api/tickets/map", get(ticket_handler::map_tickets))
        .route("/api/tickets/stats", get(ticket_handler::stats))
        .route("/api/tickets/analytics", get(ticket_handler::analytics))
        .route(
            "/api/tickets/{id}",
            get(ticket_handler::get_ticket).patch(ticket_handler::update_ticket),
        )
        .with_state(state)
}

/// Routes reachable without a staff session: ticket creation guarded by
/// the internal secret, public tracking, and the rating flow.
pub fn public_routes(state: TicketsState) -> Router {
    Router::new()
        .route("/api/tickets", post(ticket_handler::create_ticket))
        .route("/api/track/{id}", get(ticket_handler::track_ticket))
        .route(
            "/api/tickets/{id}/rating/otp",
            post(ticket_handler::request_otp),
        )
        .route(
            "/api/tickets/{id}/rating",
            post(ticket_handler::submit_rating),
        )
        .with_state(state)
}
