//! Common component tests.

/// Tag/index/offset decomposition and line splitting.
pub mod address_decoding;


/// Error formatting and conversion.
pub mod error;
