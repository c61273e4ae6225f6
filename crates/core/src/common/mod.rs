//! Common types shared across the replay engine.
//!
//! This module provides the fundamental building blocks used by every other component:
//! 1. **Addresses:** Geometry-driven tag/index/offset decomposition and line splitting.
//! 2. **Access Records:** The read/write records a trace is made of.
//! 3. **Error Handling:** The fatal error taxonomy for configuration and replay.

/// Address decomposition and line splitting.
pub mod addr;

/// Memory access record definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::{AddressDecoder, DecodedAddr, SubAccess, SubAccesses};
pub use data::{AccessKind, AccessRecord};
pub use error::{GeometryError, SimError};
