//! HTTP service wiring.
//!
//! ## Structure
//!
//! - [`handler`] - routes, shared state, and the two dispatch handlers.

pub mod handler;
