pub mod country;
pub mod money;
pub mod ports;
pub mod signature;
pub mod transaction;
pub mod webhook;
