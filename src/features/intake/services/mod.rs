pub mod address_service;
pub mod classifier_service;
