//! # Multicopy Core
//!
//! Core types, traits, and errors shared by the multicopy router and the
//! contact simulator.
//!
//! The router itself lives in `multicopy-dtn`; this crate only carries the
//! state it operates on, so the same allocation policy can be driven by the
//! bundled simulator or by any other contact engine.
//!
//! ## Key Types
//!
//! - [`HostId`]: String identity of a host (hubs carry the `CC` prefix)
//! - [`Message`]: A message replica with its own replication credit count
//! - [`Contact`]: A transient link between two hosts with a service flag
//! - [`NetworkEvent`]: Observable events (contacts, transfers, deliveries)
//!
//! ## Key Traits
//!
//! - [`MessageStore`]: Per-host replica store (`has`/`get`/`put`/`remove`)

pub mod contact;
pub mod error;
pub mod event;
pub mod identity;
pub mod message;
pub mod store;

// Re-export main types
pub use contact::*;
pub use error::*;
pub use event::*;
pub use identity::*;
pub use message::*;
pub use store::*;
