pub mod cache;
pub mod constants;
pub mod llm;
pub mod phone;
pub mod types;
