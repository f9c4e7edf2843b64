pub mod client;
pub mod parser;
pub mod response;

pub use client::{LlmClient, UserContent};
pub use parser::parse_with_fallback;
pub use response::LlmResponse;
