//! Common types and utilities shared across the index.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration (branching factor, driver constants)
//! - Error types
//! - Identifiers (NodeId)
//! - The key/value domain

pub mod config;
pub mod error;
mod node_id;

pub use config::Order;
pub use error::{Error, Result};
pub use node_id::NodeId;

/// Keys are bounded 32-bit signed integers.
pub type Key = i32;

/// Values are 64-bit floats.
pub type Value = f64;
