//! Test utilities for Aid Wallet services.
//!
//! Provides `MockSession` for cookie-carrying requests and the golden fixture
//! loader. Import in tests only, never in production code.

pub mod fixture;
pub mod session;
