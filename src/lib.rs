//! Loan Payment Reminder Library
//!
//! Reminds customers with unpaid loans to pay, serves the payment pages the
//! reminders link to, and records each confirmed payment exactly once.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Payment transition, reminder dispatch and urgency rules.
//! - `integrations`: PostgreSQL storage and the mail relay.
//! - `config`: Configuration management.
//! - `db`: Database connection pool and migrations.
//! - `db_storage`: PostgreSQL implementation of the loan store.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `mailer`: Outbound email transports.
//! - `memory_store`: In-process loan store for tests and local runs.
//! - `models`: Core data models.
//! - `payment_link`: Payment link construction.
//! - `payments`: Payment transition handler.
//! - `reminders`: Reminder dispatcher.
//! - `store`: Loan store abstraction.
//! - `templates`: Page and email templates.
//! - `urgency`: Due-date classification.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod mailer;
pub mod memory_store;
pub mod models;
pub mod payment_link;
pub mod payments;
pub mod reminders;
pub mod store;
pub mod templates;
pub mod urgency;
