//! Application layer orchestrating webhook deliveries.
//!
//! `ingestion` holds the admission checks for raw deliveries and `webhooks`
//! the `WebhookProcessor` that runs the transaction and appeal state machines
//! against the persistence ports.

pub mod ingestion;
pub mod webhooks;
