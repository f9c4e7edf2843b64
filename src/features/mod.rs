pub mod auth;
pub mod dinas;
pub mod intake;
pub mod notifications;
pub mod tickets;
