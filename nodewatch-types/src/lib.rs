//! # nodewatch-types
//!
//! Core types for field bus node health monitoring. This crate defines the
//! vocabulary shared by the monitor and anything that feeds or observes it:
//! node addresses, reported health codes, heartbeats and status change events.
//!
//! ## Design Goals
//!
//! - **No allocation**: Every type is a small `Copy` value usable on embedded targets
//! - **`no_std` capable**: Disable the default `std` feature to build without the standard library
//! - **Optional serialization**: Enable `serde` and/or `minicbor` features as needed
//! - **Ordered health**: Health codes compare by severity, so "worst" is just `max`
//!
//! ## Features
//!
//! - `std` (default): Standard library support (`std::error::Error` impls)
//! - `serde`: JSON/MessagePack/etc. serialization via serde
//! - `minicbor`: Compact binary serialization via CBOR
//! - `all`: Enable all serialization formats
//!
//! ## Example
//!
//! ```rust
//! use nodewatch_types::{HealthCode, Heartbeat, NodeId};
//!
//! let node = NodeId::new(42).unwrap();
//! let heartbeat = Heartbeat::new(node, HealthCode::Warning);
//!
//! assert!(heartbeat.source.is_unicast());
//! assert!(HealthCode::Offline > HealthCode::Critical);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod event;
mod health;
mod node_id;

pub use error::*;
pub use event::*;
pub use health::*;
pub use node_id::*;

/// Time after which a silent node is considered offline, in milliseconds.
///
/// This is the protocol-wide constant every node is expected to honour by
/// publishing its heartbeat well within this window.
pub const OFFLINE_TIMEOUT_MS: u32 = 2000;
