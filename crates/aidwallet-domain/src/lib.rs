//! Domain types shared across Aid Wallet services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod id;
pub mod network;
pub mod onboarding;
pub mod user;
