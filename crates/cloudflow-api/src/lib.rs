//! # cloudflow-api
//!
//! REST data-access boundary for the CloudFlow dashboard sync layer.
//!
//! The reconciler treats server-held state as authoritative: after a
//! migration event it re-fetches all five collections through the
//! [`client::DashboardApi`] trait and replaces its cached view wholesale.
//! This crate provides that trait, the reqwest-backed [`client::HttpApi`]
//! implementation, and the collection types.
//!
//! ## Crate Position
//!
//! Consumed by `cloudflow-sync`; depends only on settings and the HTTP
//! stack.

#![deny(unsafe_code)]

pub mod client;
pub mod types;

pub use client::{ApiError, DashboardApi, HttpApi, fetch_snapshot};
pub use types::*;
