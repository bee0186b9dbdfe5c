pub mod in_memory;
pub mod log_store;
pub mod provider;
