pub mod accounts;
pub mod authentication;
pub mod configuration;
pub mod domain;
pub mod email_client;
mod error_handling;
pub mod notifications;
pub mod repository;
pub mod routes;
pub mod startup;
pub mod telemetry;
