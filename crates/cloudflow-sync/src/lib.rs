//! # cloudflow-sync
//!
//! Real-time synchronization layer for the CloudFlow dashboard.
//!
//! Inbound push-channel frames flow through four cooperating pieces:
//!
//! - [`connection::ConnectionManager`] owns the socket and reconnects
//!   with linear backoff after abnormal closes.
//! - [`dispatcher::EventDispatcher`] fans decoded events out to per-kind
//!   subscribers.
//! - [`log::EventLog`] keeps a bounded, newest-first operator feed.
//! - [`reconciler::StateReconciler`] re-fetches REST state after
//!   migration events and raises operator banners.
//!
//! [`session::SyncSession`] assembles all four under one client identity.

#![deny(unsafe_code)]

pub mod connection;
pub mod dispatcher;
pub mod log;
pub mod reconciler;
pub mod session;

pub use connection::{ConnectionManager, ConnectionStatus, ReconnectPolicy};
pub use dispatcher::{EventDispatcher, Subscription};
pub use log::{EventLog, LogEntry};
pub use reconciler::{Banner, DashboardView, ReconcileAction, StateReconciler};
pub use session::SyncSession;
