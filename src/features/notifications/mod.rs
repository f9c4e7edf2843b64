pub mod channel;
pub mod models;
pub mod service;
pub mod templates;
