//! Session types shared by Aid Wallet services.
//!
//! Provides the session cookie builders and the `SessionTokens` extractor that
//! marshals the identity provider's bearer/refresh pair out of the cookie jar.

pub mod cookie;
pub mod session;
