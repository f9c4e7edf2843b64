pub mod ticket;
pub mod timeline;

pub use ticket::{
    generate_ticket_id, is_normal_transition, parse_ticket_id_date, Category, Ticket, TicketStatus,
    Urgency,
};
pub use timeline::{NewTimelineEntry, TimelineAction, TimelineEntry};
