//! Outbound integration with the payment provider.

pub mod channel;
pub mod client;
pub mod normalizer;
pub mod transformers;

pub use client::ProviderClient;
