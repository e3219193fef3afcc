//! # Event subscribers for the taskmaster runtime.
//!
//! This module provides the [`Subscribe`] trait and the built-in
//! [`LogWriter`] for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Supervisor ── publish(Event) ──► Bus ──► subscriber listener
//!                                               │
//!                                               ▼
//!                                         SubscriberSet::emit
//!                                          │          │
//!                                          ▼          ▼
//!                                      LogWriter   custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use taskmaster::{Event, EventKind, Subscribe};
//!
//! struct AlertSubscriber;
//!
//! #[async_trait]
//! impl Subscribe for AlertSubscriber {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::WorkerFatal {
//!             // page someone...
//!         }
//!     }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
