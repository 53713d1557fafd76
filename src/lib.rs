//! Moderation and identity-verification core for a vintage watch marketplace.
//!
//! The crate is organized around a small set of cooperating state machines:
//! listing moderation, content reports, and seller applications under
//! [`moderation`], and vendor-backed identity checks reconciled via webhook
//! under [`identity`]. Persistence, email, vendor calls, and cache
//! invalidation are consumed through traits so the services can be exercised
//! against in-memory implementations ([`infra`]) in the demo server and tests.

pub mod config;
pub mod error;
pub mod identity;
pub mod infra;
pub mod moderation;
pub mod telemetry;
