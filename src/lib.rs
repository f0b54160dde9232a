pub mod audit;
pub mod auth;
pub mod configuration;
pub mod directory;
pub mod domain;
pub mod email_client;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod validators;
