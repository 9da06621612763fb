//! Test utilities for use-case and HTTP-level tests.
//!
//! This module provides:
//! - Test data factories for users, identities and identity headers
//! - Stub directory backends and a recording mailer
//! - `TestAppStateBuilder` for wiring routers against in-memory doubles

mod app_state_builder;
mod directory_mocks;
mod factories;
mod mail_mocks;

pub use app_state_builder::*;
pub use directory_mocks::*;
pub use factories::*;
pub use mail_mocks::*;
