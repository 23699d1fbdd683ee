//! # cloudflow-core
//!
//! Foundation types for the CloudFlow dashboard's real-time sync layer.
//!
//! This crate provides the shared vocabulary the other CloudFlow crates
//! depend on:
//!
//! - **Events**: [`events::PushEvent`] — the closed set of push-channel
//!   message variants — plus [`events::EventKind`] and the dispatch-time
//!   wrapper [`events::DispatchedEvent`]
//! - **IDs**: [`ids::ClientId`], the once-per-session connection identity
//! - **Errors**: [`errors::EventDecodeError`] for malformed or unrecognized
//!   wire frames
//! - **Logging**: [`logging::init_tracing`] subscriber setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other cloudflow crates.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;
