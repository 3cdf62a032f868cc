//! # aroma-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** to switch fans and music on and off and to read
//!   their status (`/api/fan/...`, `/api/music/...`)
//! - Stream live status snapshots as **Server-Sent Events**
//!   (`/api/events/stream`), one dispatcher subscription per connection
//! - Serve the control page and its static assets
//!
//! ## Dependency rule
//! Depends on `aroma-app` (controllers and port traits) and `aroma-domain`
//! (for the types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
