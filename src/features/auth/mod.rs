pub mod model;
pub mod service;

pub use model::AuthenticatedDinas;
pub use service::TokenService;
