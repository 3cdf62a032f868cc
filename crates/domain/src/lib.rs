//! # aroma-domain
//!
//! Pure domain model for the aroma fan and music controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **fan** state, commands and status snapshots
//! - Define **playback** state, commands, status snapshots and the track catalog
//! - Define **events** (immutable snapshots fanned out to observers)
//! - Contain all invariant enforcement (duration and range checks)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! Hardware boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod event;
pub mod fan;
pub mod playback;
