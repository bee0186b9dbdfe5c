//! Entry-point helpers for whatever fronts the gateway: bearer
//! authentication and JSON body readers.

pub mod auth;
pub mod json;
