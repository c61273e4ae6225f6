//! Statistics sink tests.


/// Byte usage samples.
pub mod usage;
