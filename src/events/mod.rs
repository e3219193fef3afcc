//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: the supervisor loop (the only component that mutates
//!   worker state, and therefore the only source of lifecycle truth).
//! - **Consumers**: the subscriber listener, which fans events out to the
//!   [`SubscriberSet`](crate::subscribers::SubscriberSet) workers.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
