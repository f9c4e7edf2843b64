pub mod rating_service;
pub mod stats_service;
pub mod ticket_service;
