//! Ambient building blocks shared by Aid Wallet services: environment config,
//! tracing setup, HTTP middleware, serde helpers and retry with backoff.

pub mod config;
pub mod health;
pub mod middleware;
pub mod retry;
pub mod serde;
pub mod tracing;
