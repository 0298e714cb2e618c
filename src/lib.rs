//! Reconciles per-tenant user tables with the shared user registry of a
//! schema-per-tenant Postgres database.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod reconcile;
pub mod registry;
pub mod state;
pub mod telemetry;
pub mod tenants;
