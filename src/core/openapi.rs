use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::tickets::{dtos::ticket_dto, handlers::ticket_handler, models};
use crate::shared::types::Meta;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Tickets (protected)
        ticket_handler::list_tickets,
        ticket_handler::get_ticket,
        ticket_handler::update_ticket,
        ticket_handler::map_tickets,
        ticket_handler::stats,
        ticket_handler::analytics,
        // Tickets (internal / public)
        ticket_handler::create_ticket,
        ticket_handler::track_ticket,
        ticket_handler::request_otp,
        ticket_handler::submit_rating,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Enums
            models::ticket::Category,
            models::ticket::Urgency,
            models::ticket::TicketStatus,
            models::timeline::TimelineAction,
            // Tickets
            ticket_dto::CreateTicketRequest,
            ticket_dto::CreateTicketResponse,
            ticket_dto::UpdateTicketRequest,
            ticket_dto::TicketResponse,
            ticket_dto::TicketDetailResponse,
            ticket_dto::TimelineEntryResponse,
            ticket_dto::PublicTicketResponse,
            ticket_dto::MapTicketResponse,
            ticket_dto::SubmitRatingRequest,
            ticket_dto::RequestOtpResponse,
            ticket_dto::StatsResponse,
            ticket_dto::CountBucket,
            ticket_dto::AnalyticsResponse,
            ticket_dto::DayBucket,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "tickets", description = "Staff ticket management"),
        (name = "public", description = "Citizen tracking and rating"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
