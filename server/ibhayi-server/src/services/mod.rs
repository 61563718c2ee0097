//! Domain services: business rules factored out of the HTTP handlers.

pub mod dispense;
pub mod report_service;
